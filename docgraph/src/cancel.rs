use crate::{Pending, QueryError};
use futures::future::{AbortHandle, Abortable};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    next_slot: AtomicU64,
    /// Abort handles of the guarded futures that have not finished yet, by slot.
    handles: Mutex<HashMap<u64, AbortHandle>>,
}

/// Removes its handle from the token once the guarded future completes or is dropped.
struct Slot {
    inner: Arc<Inner>,
    id: u64,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.inner
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Aborts a running submission.
///
/// Clones share their state, and the token may be cancelled from any thread. Once cancelled,
/// every guarded key fails with [`QueryError::Cancelled`], and no further store call is issued.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<Inner>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let mut handles = self.handles();
        self.0.cancelled.store(true, Ordering::SeqCst);
        for (_, handle) in handles.drain() {
            handle.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
        self.0.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of guarded futures still running under this token.
    pub fn in_flight(&self) -> usize {
        self.handles().len()
    }

    /// Makes `pending` fail with [`QueryError::Cancelled`] as soon as this token is cancelled,
    /// dropping whatever it was waiting on.
    pub(crate) fn guard<'a, T: 'a>(&self, pending: Pending<'a, T>) -> Pending<'a, T> {
        let (handle, registration) = AbortHandle::new_pair();
        let id = self.0.next_slot.fetch_add(1, Ordering::Relaxed);
        {
            let mut handles = self.handles();
            if self.is_cancelled() {
                return Pending::failed(QueryError::Cancelled);
            }
            handles.insert(id, handle);
        }

        let slot = Slot {
            inner: self.0.clone(),
            id,
        };
        Pending::new(
            Abortable::new(pending, registration).map(move |result| {
                drop(slot);
                match result {
                    Ok(result) => result,
                    Err(_aborted) => Err(QueryError::Cancelled),
                }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use crate::{query, MemoryStore, Parser, Record};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_guard_passes_results_through() {
        let token = CancellationToken::new();
        assert_eq!(block_on(token.guard(Pending::ready(5))), Ok(5));
    }

    #[test]
    fn test_cancel_aborts_waiting_futures() {
        let mut pool = LocalPool::new();
        let token = CancellationToken::new();
        let (_tx, rx) = oneshot::channel::<i32>();
        let result = Rc::new(RefCell::new(None));

        let guarded = token.guard(Pending::new(async move { Ok(rx.await.unwrap_or(0)) }));
        let out = result.clone();
        pool.spawner()
            .spawn_local(async move { *out.borrow_mut() = Some(guarded.await) })
            .unwrap();

        pool.run_until_stalled();
        assert!(result.borrow().is_none());

        token.clone().cancel();
        pool.run_until_stalled();
        assert_eq!(*result.borrow(), Some(Err(QueryError::Cancelled)));
    }

    #[test]
    fn test_guard_after_cancel_fails_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(block_on(token.guard(Pending::ready(1))), Err(QueryError::Cancelled));
    }

    #[test]
    fn test_finished_keys_release_their_handles() {
        let store = MemoryStore::new();
        store.insert(Record::new("Movie", "m1").with("title", "Alien"));
        store.insert(Record::new("Person", "p1").with("name", "Ridley Scott"));
        let parser = Parser::new(store);
        let token = CancellationToken::new();

        let query = query!(class/Movie { title }, class/Person { name });
        for _ in 0..1000 {
            let response = block_on(parser.run_with(&query, &token));
            assert_eq!(response.len(), 2);
        }
        assert_eq!(token.in_flight(), 0);
    }

    #[test]
    fn test_dropped_keys_release_their_handles() {
        let token = CancellationToken::new();
        let (_tx, rx) = oneshot::channel::<i32>();
        let guarded = token.guard(Pending::new(async move { Ok(rx.await.unwrap_or(0)) }));
        assert_eq!(token.in_flight(), 1);

        drop(guarded);
        assert_eq!(token.in_flight(), 0);
        assert!(!token.is_cancelled());
    }
}
