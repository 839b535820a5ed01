//! Answers tree-shaped graph queries from a document store that only knows flat lookups.
//!
//! A query names entity kinds, their fields, and the entities those fields point at:
//!
//! ```text
//! class/Movie { title, director { name, Movie/_director { title } } }
//! ```
//!
//! reads every `Movie` with its title and director, and for each director every movie whose
//! `director` points back at them. The [`Parser`] walks such a query against a [`Store`],
//! issuing one `find` per entity list, inlining the first level of references in the same
//! round-trip, and fetching deeper ones as needed. Results mirror the query: every entity is a
//! mapping with `id`, `createdAt`, `updatedAt` and `kind`, followed by the requested fields in
//! query order.
//!
//! ```
//! use docgraph::{query, MemoryStore, Parser, Record, Value};
//!
//! let store = MemoryStore::new();
//! let ridley = store.insert(Record::new("Person", "p1").with("name", "Ridley Scott"));
//! store.insert(Record::new("Movie", "m1").with("title", "Alien").with("director", ridley));
//!
//! let parser = Parser::new(store);
//! let query = query!(class/Movie { title, director { name } });
//! let response = futures::executor::block_on(parser.run(&query));
//!
//! let movies = response.value("class/Movie").and_then(Value::as_list).unwrap();
//! let director = movies[0].as_map().unwrap()["director"].as_map().unwrap();
//! assert_eq!(director["name"], Value::from("Ridley Scott"));
//! ```
//!
//! Custom behaviour hooks in at two places: [overrides](Parser::with_override) compute fields
//! of one entity kind, and [entry points](Parser::with_entry_point) answer top-level keys.

extern crate self as docgraph;

pub use docgraph_macros::query;
pub use docgraph_query::*;

mod cancel;
mod config;
mod entry;
mod error;
mod overrides;
mod parser;
mod pending;
mod predicate;
pub mod record;
pub mod resolve;
mod settle;
mod store;

pub use cancel::CancellationToken;
pub use config::ParserConfig;
pub use entry::{EntryPoint, RecentItems};
pub use error::{ErrorKind, Origin, QueryError, StoreError};
pub use overrides::{Computation, Computed, Overrides};
pub use parser::{Parser, Read, Response};
pub use pending::{Deferred, Pending};
pub use predicate::{include_set, select_set, Predicate};
pub use record::{Map, Record, Value};
pub use resolve::Context;
pub use settle::settle;
pub use store::{MemoryStore, Operation, Request, Store};

#[cfg(test)]
#[ctor::ctor]
fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
