use docgraph_query::Query;
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Builds a `docgraph::Query` from the literal query syntax at compile time.
///
/// Syntax errors are reported as compile errors at the offending token.
#[proc_macro]
pub fn query(input: TokenStream) -> TokenStream {
    let query = parse_macro_input!(input as Query);
    quote!(#query).into()
}
