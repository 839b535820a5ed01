use crate::{DispatchKey, Node, Param, Params, Query};
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{braced, parenthesized, token, Ident, Lit, LitStr, Token};

// query    := node (',' node)* ','?
// node     := key params? children?
// key      := segment ('/' segment)?
// params   := '(' name '=' literal, ... ')'
// children := '{' query '}'

impl Parse for Query {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let nodes = Punctuated::<Node, Token![,]>::parse_terminated(input)?;
        Ok(Query::new(nodes.into_iter().collect()))
    }
}

impl Parse for Node {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: DispatchKey = input.parse()?;

        let params = if input.peek(token::Paren) {
            let inner;
            parenthesized!(inner in input);
            inner.parse()?
        } else {
            Params::default()
        };

        if !input.peek(token::Brace) {
            return Ok(Node::property(key).with_params(params));
        }

        let inner;
        let brace = braced!(inner in input);
        let children: Query = inner.parse()?;
        if children.is_empty() {
            return Err(syn::Error::new(
                brace.span.join(),
                format!("join `{key}` must request at least one field"),
            ));
        }
        Ok(Node::join(key, children.into_nodes()).with_params(params))
    }
}

impl Parse for DispatchKey {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let first = parse_segment(input)?;
        if input.peek(Token![/]) {
            input.parse::<Token![/]>()?;
            let name = parse_segment(input)?;
            Ok(DispatchKey::qualified(first, name))
        } else {
            Ok(DispatchKey::new(first))
        }
    }
}

/// Either a bare identifier (keywords included, `r#` stripped) or a non-empty string literal.
fn parse_segment(input: ParseStream) -> syn::Result<String> {
    if input.peek(LitStr) {
        let lit: LitStr = input.parse()?;
        let value = lit.value();
        if value.is_empty() {
            return Err(syn::Error::new(lit.span(), "key segments cannot be empty"));
        }
        return Ok(value);
    }
    if input.peek(Ident::peek_any) {
        let ident = Ident::parse_any(input)?;
        return Ok(ident.unraw().to_string());
    }
    Err(input.error("expected a key: an identifier or a string literal"))
}

struct ParamEntry {
    name: String,
    value: Param,
}

impl Parse for ParamEntry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name = Ident::parse_any(input)?.unraw().to_string();
        input.parse::<Token![=]>()?;
        let value = input.parse()?;
        Ok(Self { name, value })
    }
}

impl Parse for Params {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let entries = Punctuated::<ParamEntry, Token![,]>::parse_terminated(input)?;
        let mut params = Params::new();
        for ParamEntry { name, value } in entries {
            params.insert(name, value);
        }
        Ok(params)
    }
}

impl Parse for Param {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let negative = if input.peek(Token![-]) {
            input.parse::<Token![-]>()?;
            true
        } else {
            false
        };

        let lit: Lit = input.parse()?;
        let param = match lit {
            Lit::Int(i) => {
                let value: i64 = i.base10_parse()?;
                Param::Int(if negative { -value } else { value })
            }
            Lit::Float(x) => {
                let value: f64 = x.base10_parse()?;
                Param::Float(if negative { -value } else { value })
            }
            Lit::Str(s) if !negative => Param::Str(s.value()),
            Lit::Bool(b) if !negative => Param::Bool(b.value),
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "expected an integer, float, string or boolean parameter",
                ))
            }
        };
        Ok(param)
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse_query, DispatchKey, Node, NodeKind, Param, Params, Query};

    fn prop(name: &str) -> Node {
        Node::property(DispatchKey::new(name))
    }

    #[test]
    fn test_properties() {
        assert_eq!(
            parse_query("title, year").unwrap(),
            Query::new(vec![prop("title"), prop("year")])
        );
        assert_eq!(parse_query("").unwrap(), Query::default());
        assert_eq!(parse_query("title,").unwrap(), Query::new(vec![prop("title")]));
    }

    #[test]
    fn test_nested_joins() {
        let query =
            parse_query("class/Movie { title, director { name, Movie/_director { title } } }")
                .unwrap();

        assert_eq!(
            query,
            Query::new(vec![Node::join(
                DispatchKey::class("Movie"),
                vec![
                    prop("title"),
                    Node::join(
                        DispatchKey::new("director"),
                        vec![
                            prop("name"),
                            Node::join(DispatchKey::reverse("Movie", "director"), vec![prop("title")]),
                        ]
                    ),
                ]
            )])
        );
        assert_eq!(query.nodes()[0].kind(), NodeKind::Join);
        assert_eq!(query.depth(), 4);
    }

    #[test]
    fn test_keywords_and_strings() {
        let query = parse_query(r#"type, r#match, recent/"items this year""#).unwrap();
        assert_eq!(query.nodes()[0].key(), &DispatchKey::new("type"));
        assert_eq!(query.nodes()[1].key(), &DispatchKey::new("match"));
        assert_eq!(
            query.nodes()[2].key(),
            &DispatchKey::qualified("recent", "items this year")
        );
    }

    #[test]
    fn test_params() {
        let query = parse_query(r#"class/Movie(limit = 10, skip = -2, order = "title", asc = true) { title }"#)
            .unwrap();
        assert_eq!(
            query.nodes()[0].params(),
            &Params::new()
                .with("limit", Param::Int(10))
                .with("skip", Param::Int(-2))
                .with("order", Param::Str("title".into()))
                .with("asc", Param::Bool(true))
        );
    }

    #[test]
    fn test_display_reparses() {
        let source = r#"class/Movie(limit = 3, ratio = 0.5) { title, director { name } }, recent/"items this year""#;
        let query = parse_query(source).unwrap();
        assert_eq!(parse_query(query.to_string()).unwrap(), query);
    }

    #[test]
    fn test_errors() {
        assert!(parse_query("class/Movie { }").is_err());
        assert!(parse_query("class/").is_err());
        assert!(parse_query(r#"class/"""#).is_err());
        assert!(parse_query("class/Movie(limit = -true) { title }").is_err());
        assert!(parse_query("title title").is_err());
        assert!(parse_query("{").is_err());
    }
}
