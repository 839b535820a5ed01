//! The remote document store the parser reads from.
//!
//! Stores only offer flat operations over one entity kind at a time. Everything graph-shaped
//! (joins, reverse lookups) is built on top of them by the [resolver](crate::resolve).

use crate::{Predicate, Record, StoreError};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

mod memory;
pub use memory::{MemoryStore, Operation, Request};

/// Adapter to a document store.
///
/// Implementations must treat [`Predicate::Select`] as a hint: they may return more attributes,
/// but never fewer than requested. [`Predicate::Include`] asks for the referenced record to be
/// inlined (hydrated) in the same response.
pub trait Store {
    /// All records of `kind` matching every predicate, in the store's order.
    fn find<'a>(
        &'a self,
        kind: &'a str,
        predicates: &'a [Predicate],
    ) -> LocalBoxFuture<'a, Result<Vec<Record>, StoreError>>;

    /// Number of records of `kind` matching every predicate.
    fn count<'a>(
        &'a self,
        kind: &'a str,
        predicates: &'a [Predicate],
    ) -> LocalBoxFuture<'a, Result<u64, StoreError>>;

    fn get_by_id<'a>(
        &'a self,
        kind: &'a str,
        id: &'a str,
    ) -> LocalBoxFuture<'a, Result<Record, StoreError>>;
}

impl<S: Store + ?Sized> Store for Rc<S> {
    fn find<'a>(
        &'a self,
        kind: &'a str,
        predicates: &'a [Predicate],
    ) -> LocalBoxFuture<'a, Result<Vec<Record>, StoreError>> {
        (**self).find(kind, predicates)
    }

    fn count<'a>(
        &'a self,
        kind: &'a str,
        predicates: &'a [Predicate],
    ) -> LocalBoxFuture<'a, Result<u64, StoreError>> {
        (**self).count(kind, predicates)
    }

    fn get_by_id<'a>(
        &'a self,
        kind: &'a str,
        id: &'a str,
    ) -> LocalBoxFuture<'a, Result<Record, StoreError>> {
        (**self).get_by_id(kind, id)
    }
}
