use crate::{settle, QueryError, Value};
use futures::future::{self, LocalBoxFuture};
use futures::{FutureExt, TryFutureExt};
use indexmap::IndexMap;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A value that is still being read from the store.
///
/// Everything the parser hands out is a `Pending`, even when the value happens to be known
/// already, so that callers always await in the same way.
pub struct Pending<'a, T>(LocalBoxFuture<'a, Result<T, QueryError>>);

impl<'a, T: 'a> Pending<'a, T> {
    pub fn new(future: impl Future<Output = Result<T, QueryError>> + 'a) -> Self {
        Self(future.boxed_local())
    }

    pub fn ready(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    pub fn failed(error: QueryError) -> Self {
        Self::new(future::ready(Err(error)))
    }

    pub fn map<U: 'a>(self, f: impl FnOnce(T) -> U + 'a) -> Pending<'a, U> {
        Pending::new(self.0.map_ok(f))
    }

    pub fn map_err(self, f: impl FnOnce(QueryError) -> QueryError + 'a) -> Self {
        Self::new(self.0.map_err(f))
    }
}

impl<T> Future for Pending<'_, T> {
    type Output = Result<T, QueryError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().0.poll_unpin(cx)
    }
}

impl<T> Debug for Pending<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<pending>")
    }
}

/// An attribute of an entity under construction: known, in flight, or a mapping whose entries
/// may themselves be in flight.
#[derive(Debug)]
pub enum Deferred<'a> {
    Ready(Value),
    Pending(Pending<'a, Value>),
    Map(IndexMap<String, Deferred<'a>>),
}

impl<'a> Deferred<'a> {
    pub fn pending(future: impl Future<Output = Result<Value, QueryError>> + 'a) -> Self {
        Self::Pending(Pending::new(future))
    }

    /// Whether anything in this value still has to be awaited.
    pub fn is_pending(&self) -> bool {
        match self {
            Self::Ready(_) => false,
            Self::Pending(_) => true,
            Self::Map(entries) => entries.values().any(Deferred::is_pending),
        }
    }

    /// Awaits everything inside this value. Mappings are [settled](settle) entry by entry.
    pub fn into_pending(self) -> Pending<'a, Value> {
        match self {
            Self::Ready(value) => Pending::ready(value),
            Self::Pending(pending) => pending,
            Self::Map(entries) => settle(entries).map(Value::Map),
        }
    }
}

impl From<Value> for Deferred<'_> {
    fn from(value: Value) -> Self {
        Self::Ready(value)
    }
}

impl<'a> From<Pending<'a, Value>> for Deferred<'a> {
    fn from(pending: Pending<'a, Value>) -> Self {
        Self::Pending(pending)
    }
}

impl<'a> From<IndexMap<String, Deferred<'a>>> for Deferred<'a> {
    fn from(entries: IndexMap<String, Deferred<'a>>) -> Self {
        Self::Map(entries)
    }
}
