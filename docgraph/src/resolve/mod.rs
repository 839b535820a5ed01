//! Walks a query tree against a [`Store`], one round-trip per entity list.
//!
//! [`resolve_entity_list`] issues one `find` per list, asking the store to inline the first level
//! of joins. Each returned record goes through [`normalize_record`], which lists the entities of
//! reverse joins the same way and fetches references the store did not inline. The query tree is
//! validated once, before the first `find`.

use crate::{
    CancellationToken, Origin, Parser, ParserConfig, Pending, Predicate, QueryError, Record, Store,
    StoreError,
};
use futures::future::{self, Either, LocalBoxFuture, Shared};
use futures::FutureExt;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::time::Duration;

mod entities;
mod normalize;

pub use entities::resolve_entity_list;
pub use normalize::normalize_record;

type SharedFetch = Shared<LocalBoxFuture<'static, Result<Rc<Record>, QueryError>>>;

/// State of one submission: the parser it runs on, its cancellation token and the records
/// fetched by id so far.
pub struct Context<'p> {
    parser: &'p Parser,
    cancel: CancellationToken,
    fetches: RefCell<HashMap<(String, String), SharedFetch>>,
}

impl<'p> Context<'p> {
    pub(crate) fn new(parser: &'p Parser, cancel: CancellationToken) -> Self {
        Self {
            parser,
            cancel,
            fetches: RefCell::new(HashMap::new()),
        }
    }

    pub fn parser(&self) -> &'p Parser {
        self.parser
    }

    pub fn config(&self) -> &'p ParserConfig {
        self.parser.config()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn find<'a>(
        &'a self,
        kind: &'a str,
        predicates: Vec<Predicate>,
    ) -> Pending<'a, Vec<Record>> {
        Pending::new(async move {
            let call = || self.parser.store().find(kind, &predicates);
            round_trip(&self.cancel, self.config().timeout(), Origin::kind(kind), call).await
        })
    }

    pub fn count<'a>(&'a self, kind: &'a str, predicates: Vec<Predicate>) -> Pending<'a, u64> {
        log::debug!("count `{kind}` ({} predicates)", predicates.len());
        Pending::new(async move {
            let call = || self.parser.store().count(kind, &predicates);
            round_trip(&self.cancel, self.config().timeout(), Origin::kind(kind), call).await
        })
    }

    /// Fetches one record. Within a submission, every record is fetched at most once, and all
    /// callers share the result.
    pub fn get_by_id(&self, kind: &str, id: &str) -> Pending<'static, Rc<Record>> {
        let mut fetches = self.fetches.borrow_mut();
        let key = (kind.to_owned(), id.to_owned());
        if let Some(fetch) = fetches.get(&key) {
            log::trace!("reusing fetch of `{kind}` {id}");
            return Pending::new(fetch.clone());
        }

        log::debug!("get `{kind}` {id}");
        let store = Rc::clone(self.parser.store());
        let cancel = self.cancel.clone();
        let timeout = self.config().timeout();
        let (kind, id) = key.clone();
        let fetch = async move {
            let call = || store.get_by_id(&kind, &id);
            round_trip(&cancel, timeout, Origin::kind(kind.as_str()), call)
                .await
                .map(Rc::new)
        }
        .boxed_local()
        .shared();

        fetches.insert(key, fetch.clone());
        Pending::new(fetch)
    }
}

/// Runs one store call, turning its failure, a timeout or a cancellation into a [`QueryError`].
async fn round_trip<T, F>(
    cancel: &CancellationToken,
    timeout: Option<Duration>,
    origin: Origin,
    call: impl FnOnce() -> F,
) -> Result<T, QueryError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    if cancel.is_cancelled() {
        return Err(QueryError::Cancelled);
    }
    let call = call();

    let result = match timeout {
        None => call.await,
        Some(after) => match future::select(pin!(call), smol::Timer::after(after)).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => {
                log::debug!("store call for {origin} timed out");
                return Err(QueryError::Timeout { origin, after });
            }
        },
    };
    result.map_err(|source| QueryError::Store { origin, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, Operation};
    use futures::executor::block_on;

    #[test]
    fn test_get_by_id_is_shared() {
        let store = Rc::new(MemoryStore::new());
        store.insert(Record::new("Person", "p1").with("name", "Ridley Scott"));
        let parser = Parser::new(store.clone());
        let context = parser.context();

        let (a, b) = block_on(future::join(
            context.get_by_id("Person", "p1"),
            context.get_by_id("Person", "p1"),
        ));
        assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));

        let fetches = store
            .history()
            .iter()
            .filter(|r| r.operation == Operation::GetById)
            .count();
        assert_eq!(fetches, 1);
    }

    #[test]
    fn test_failures_carry_the_origin() {
        let parser = Parser::new(MemoryStore::new());
        let context = parser.context();
        let error = block_on(context.get_by_id("Person", "p9")).unwrap_err();
        assert_eq!(error.origin(), Some(&Origin::kind("Person")));
    }

    #[test]
    fn test_cancelled_context_issues_no_calls() {
        let store = Rc::new(MemoryStore::new());
        let parser = Parser::new(store.clone());
        let token = CancellationToken::new();
        token.cancel();
        let context = parser.context_with(token);

        assert_eq!(block_on(context.count("Movie", vec![])), Err(QueryError::Cancelled));
        assert!(store.history().is_empty());
    }
}
