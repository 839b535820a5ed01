use crate::{Deferred, Map, Pending, Value};
use futures::future;
use indexmap::IndexMap;

/// Awaits every entry of `entries`, yielding a mapping with the same keys in the same order.
///
/// Entries are awaited concurrently and independently of each other; the first failure fails the
/// whole mapping. Plain values pass through untouched.
pub fn settle<'a>(entries: IndexMap<String, Deferred<'a>>) -> Pending<'a, Map> {
    let (keys, values): (Vec<String>, Vec<Pending<'a, Value>>) = entries
        .into_iter()
        .map(|(key, value)| (key, value.into_pending()))
        .unzip();

    Pending::new(async move {
        let values = future::try_join_all(values).await?;
        Ok(keys.into_iter().zip(values).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Origin, QueryError, StoreError};
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn entries<'a>(items: impl IntoIterator<Item = (&'static str, Deferred<'a>)>) -> IndexMap<String, Deferred<'a>> {
        items.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    fn gated<'a>(rx: oneshot::Receiver<i64>) -> Deferred<'a> {
        Deferred::pending(async move { Ok(Value::from(rx.await.unwrap_or(-1))) })
    }

    #[test]
    fn test_preserves_order() {
        let settled = block_on(settle(entries([
            ("x", Deferred::Pending(Pending::ready(Value::from(1)))),
            ("y", Deferred::from(Value::from(2))),
            ("z", Deferred::Pending(Pending::ready(Value::from(3)))),
        ])))
        .unwrap();

        let pairs: Vec<_> = settled.iter().map(|(k, v)| (k.as_str(), v.as_i64())).collect();
        assert_eq!(pairs, vec![("x", Some(1)), ("y", Some(2)), ("z", Some(3))]);
    }

    #[test]
    fn test_keys_complete_in_any_order() {
        let mut pool = LocalPool::new();
        let (tx_x, rx_x) = oneshot::channel();
        let (tx_z, rx_z) = oneshot::channel();
        let result = Rc::new(RefCell::new(None));

        let out = result.clone();
        pool.spawner()
            .spawn_local(async move {
                let settled = settle(entries([
                    ("x", gated(rx_x)),
                    ("y", Deferred::from(Value::from(2))),
                    ("z", gated(rx_z)),
                ]))
                .await;
                *out.borrow_mut() = Some(settled);
            })
            .unwrap();

        pool.run_until_stalled();
        tx_z.send(3).unwrap();
        pool.run_until_stalled();
        assert!(result.borrow().is_none());
        tx_x.send(1).unwrap();
        pool.run_until_stalled();

        let settled = result.borrow_mut().take().unwrap().unwrap();
        assert_eq!(settled.keys().collect::<Vec<_>>(), vec!["x", "y", "z"]);
        assert_eq!(settled["x"], Value::from(1));
        assert_eq!(settled["z"], Value::from(3));
    }

    #[test]
    fn test_empty_and_nested() {
        assert!(block_on(settle(IndexMap::new())).unwrap().is_empty());

        let inner = entries([("b", Deferred::Pending(Pending::ready(Value::from("deep"))))]);
        let settled = block_on(settle(entries([("a", Deferred::Map(inner))]))).unwrap();
        let inner = settled["a"].as_map().unwrap();
        assert_eq!(inner["b"], Value::from("deep"));
    }

    #[test]
    fn test_failure_fails_the_mapping() {
        let error = QueryError::Store {
            origin: Origin::kind("Movie"),
            source: StoreError::Backend("gone".into()),
        };
        let settled = block_on(settle(entries([
            ("ok", Deferred::from(Value::from(1))),
            ("bad", Deferred::Pending(Pending::failed(error.clone()))),
        ])));
        assert_eq!(settled, Err(error));
    }
}
