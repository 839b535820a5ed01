use crate::{DispatchKey, Node, NodeKind, Param, Query};
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};

// Emitted code names the runtime types through the `docgraph` crate, which re-exports this one.

impl ToTokens for Query {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let nodes = self.nodes();
        tokens.extend(quote!(docgraph::Query::new(::std::vec![#(#nodes),*])));
    }
}

impl ToTokens for Node {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let key = self.key();
        let node = match self.kind() {
            NodeKind::Property => quote!(docgraph::Node::property(#key)),
            NodeKind::Join => {
                let children = self.children();
                quote!(docgraph::Node::join(#key, ::std::vec![#(#children),*]))
            }
        };

        if self.params().is_empty() {
            tokens.extend(node);
        } else {
            let (names, values): (Vec<_>, Vec<_>) = self.params().iter().unzip();
            tokens.extend(quote!(
                #node.with_params(docgraph::Params::new()#(.with(#names, #values))*)
            ));
        }
    }
}

impl ToTokens for DispatchKey {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = self.name();
        tokens.extend(match self.qualifier() {
            Some(qualifier) => quote!(docgraph::DispatchKey::qualified(#qualifier, #name)),
            None => quote!(docgraph::DispatchKey::new(#name)),
        });
    }
}

impl ToTokens for Param {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(match self {
            Self::Int(i) => quote!(docgraph::Param::Int(#i)),
            Self::Float(x) => quote!(docgraph::Param::Float(#x)),
            Self::Str(s) => quote!(docgraph::Param::Str(::std::string::String::from(#s))),
            Self::Bool(b) => quote!(docgraph::Param::Bool(#b)),
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_query;
    use quote::quote;

    #[test]
    fn test_emit_join_with_params() {
        let query = parse_query("class/Movie(limit = 2) { title }").unwrap();
        let emitted = quote!(#query).to_string();
        let expected = quote!(docgraph::Query::new(::std::vec![
            docgraph::Node::join(
                docgraph::DispatchKey::qualified("class", "Movie"),
                ::std::vec![docgraph::Node::property(docgraph::DispatchKey::new("title"))]
            )
            .with_params(docgraph::Params::new().with("limit", docgraph::Param::Int(2i64)))
        ]))
        .to_string();
        assert_eq!(emitted, expected);
    }
}
