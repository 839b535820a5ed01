//! Query trees for docgraph: the AST, a reader for the literal syntax, and (with the `emit`
//! feature) the code generation used by the `query!` macro.
//!
//! ```text
//! class/Movie(limit = 10) { title, director { name, Movie/_director { title } } }
//! ```
//!
//! A key is `name` or `qualifier/name`, where each part is an identifier or a string literal.
//! Parameters go in parentheses, nested fields in braces.

use proc_macro2::{LexError, TokenStream};
use thiserror::Error;

mod ast;
mod parse;

#[cfg(feature = "emit")]
mod emit;

pub use ast::{
    DispatchKey, Node, NodeKind, Param, Params, Query, CLASS_QUALIFIER, REVERSE_MARKER,
};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] syn::Error),
}

/// parse a string to a query
pub fn parse_query(input: impl AsRef<str>) -> Result<Query, ParseError> {
    let stream: TokenStream = input.as_ref().parse()?;
    Ok(parse_query_token_stream(stream)?)
}

/// parse a rust [`TokenStream`](TokenStream) to a query
pub fn parse_query_token_stream(input: TokenStream) -> syn::Result<Query> {
    syn::parse2(input)
}
