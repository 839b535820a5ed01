use crate::{Predicate, Record, Store, StoreError, Value};
use chrono::Utc;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use indexmap::IndexMap;
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Find,
    Count,
    GetById,
}

/// One call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub operation: Operation,
    pub kind: String,
    /// The predicates of a find or count; `[EqualTo("id", ..)]` for a get-by-id.
    pub predicates: Vec<Predicate>,
}

/// A [`Store`] that keeps records in memory and answers immediately.
///
/// References are stored as bare pointers, and are only hydrated in responses when included.
/// Every call is recorded, see [`MemoryStore::history`]. Finds and counts over a kind nothing was
/// inserted for match nothing; fetching an id of such a kind fails with
/// [`StoreError::UnknownKind`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    kinds: RefCell<IndexMap<String, Vec<Record>>>,
    history: RefCell<Vec<Request>>,
}

fn to_pointers(value: &mut Value) {
    match value {
        Value::Record(record) => **record = record.to_pointer(),
        Value::List(values) => values.iter_mut().for_each(to_pointers),
        Value::Map(map) => map.values_mut().for_each(to_pointers),
        _ => {}
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record`, replacing any record with the same kind and id, and returns a pointer
    /// to it. Missing timestamps are set to the current time.
    pub fn insert(&self, mut record: Record) -> Record {
        record.stamp(Utc::now());
        record.attrs_mut().values_mut().for_each(to_pointers);
        let pointer = record.to_pointer();

        let mut kinds = self.kinds.borrow_mut();
        let records = kinds.entry(record.kind().to_owned()).or_default();
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        pointer
    }

    pub fn history(&self) -> Vec<Request> {
        self.history.borrow().clone()
    }

    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    fn record(&self, operation: Operation, kind: &str, predicates: Vec<Predicate>) {
        self.history.borrow_mut().push(Request {
            operation,
            kind: kind.to_owned(),
            predicates,
        });
    }

    fn lookup(&self, kind: &str, id: &str) -> Option<Record> {
        self.kinds
            .borrow()
            .get(kind)?
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    fn matching(&self, kind: &str, predicates: &[Predicate]) -> Vec<Record> {
        self.kinds
            .borrow()
            .get(kind)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| predicates.iter().all(|p| p.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Applies the select and include hints to a matching record.
    fn shape(&self, mut record: Record, predicates: &[Predicate]) -> Record {
        let includes: Vec<&str> = predicates
            .iter()
            .filter_map(|p| match p {
                Predicate::Include(field) => Some(field.as_str()),
                _ => None,
            })
            .collect();

        let selects: Vec<&[String]> = predicates
            .iter()
            .filter_map(|p| match p {
                Predicate::Select(fields) => Some(fields.as_slice()),
                _ => None,
            })
            .collect();
        if !selects.is_empty() {
            record.attrs_mut().retain(|name, _| {
                selects.iter().any(|fields| fields.contains(name))
                    || includes.contains(&name.as_str())
            });
        }

        for field in includes {
            let Some(Value::Record(pointer)) = record.attr(field) else {
                continue;
            };
            if let Some(target) = self.lookup(pointer.kind(), pointer.id()) {
                record.set(field, target);
            }
        }
        record
    }
}

impl Store for MemoryStore {
    fn find<'a>(
        &'a self,
        kind: &'a str,
        predicates: &'a [Predicate],
    ) -> LocalBoxFuture<'a, Result<Vec<Record>, StoreError>> {
        self.record(Operation::Find, kind, predicates.to_vec());
        let records: Vec<Record> = self
            .matching(kind, predicates)
            .into_iter()
            .map(|r| self.shape(r, predicates))
            .collect();
        future::ready(Ok(records)).boxed_local()
    }

    fn count<'a>(
        &'a self,
        kind: &'a str,
        predicates: &'a [Predicate],
    ) -> LocalBoxFuture<'a, Result<u64, StoreError>> {
        self.record(Operation::Count, kind, predicates.to_vec());
        let count = self.matching(kind, predicates).len() as u64;
        future::ready(Ok(count)).boxed_local()
    }

    fn get_by_id<'a>(
        &'a self,
        kind: &'a str,
        id: &'a str,
    ) -> LocalBoxFuture<'a, Result<Record, StoreError>> {
        self.record(
            Operation::GetById,
            kind,
            vec![Predicate::equal_to(crate::record::ID, id)],
        );
        let result = if !self.kinds.borrow().contains_key(kind) {
            Err(StoreError::UnknownKind(kind.to_owned()))
        } else {
            self.lookup(kind, id).ok_or_else(|| StoreError::NotFound {
                kind: kind.to_owned(),
                id: id.to_owned(),
            })
        };
        future::ready(result).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CREATED_AT;
    use chrono::TimeZone;
    use futures::executor::block_on;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let ridley = store.insert(Record::new("Person", "p1").with("name", "Ridley Scott"));
        store.insert(
            Record::new("Movie", "m1")
                .with("title", "Alien")
                .with("year", 1979)
                .with("director", ridley.clone()),
        );
        store.insert(
            Record::new("Movie", "m2")
                .with("title", "Blade Runner")
                .with("year", 1982)
                .with("director", ridley),
        );
        store
    }

    #[test]
    fn test_select_keeps_metadata() {
        let store = seeded();
        let movies = block_on(store.find("Movie", &[Predicate::select(["title"])])).unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].attrs().map(|(n, _)| n).collect::<Vec<_>>(), vec!["title"]);
        assert_eq!(movies[0].id(), "m1");
        assert!(movies[0].created_at().is_some());
    }

    #[test]
    fn test_references_are_pointers_unless_included() {
        let store = seeded();

        let plain = block_on(store.find("Movie", &[])).unwrap();
        let director = plain[0].attr("director").and_then(Value::as_record).unwrap();
        assert!(!director.is_hydrated());
        assert_eq!(director.attr("name"), None);

        let included = block_on(store.find(
            "Movie",
            &[Predicate::select(["title"]), Predicate::include("director")],
        ))
        .unwrap();
        let director = included[0].attr("director").and_then(Value::as_record).unwrap();
        assert!(director.is_hydrated());
        assert_eq!(director.attr("name"), Some(&Value::from("Ridley Scott")));
    }

    #[test]
    fn test_filters() {
        let store = seeded();
        let by_director = [Predicate::equal_to("director", Record::pointer("Person", "p1"))];
        assert_eq!(block_on(store.count("Movie", &by_director)).unwrap(), 2);

        let later = [Predicate::greater_than("year", 1980)];
        let movies = block_on(store.find("Movie", &later)).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id(), "m2");

        assert!(block_on(store.find("Nothing", &[])).unwrap().is_empty());
    }

    #[test]
    fn test_get_by_id() {
        let store = seeded();
        assert_eq!(block_on(store.get_by_id("Person", "p1")).unwrap().id(), "p1");
        assert_eq!(
            block_on(store.get_by_id("Person", "p9")),
            Err(StoreError::NotFound {
                kind: "Person".into(),
                id: "p9".into()
            })
        );
        assert_eq!(
            block_on(store.get_by_id("Studio", "s1")),
            Err(StoreError::UnknownKind("Studio".into()))
        );
    }

    #[test]
    fn test_insert_keeps_given_timestamps_and_replaces() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        store.insert(Record::new("Item", "i1").with_timestamps(at, at).with("v", 1));
        store.insert(Record::new("Item", "i1").with_timestamps(at, at).with("v", 2));

        let items = block_on(store.find("Item", &[Predicate::equal_to(CREATED_AT, at)])).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].attr("v"), Some(&Value::from(2)));
    }

    #[test]
    fn test_history() {
        let store = seeded();
        block_on(store.count("Movie", &[])).unwrap();
        let _ = block_on(store.get_by_id("Person", "p1"));

        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].operation, Operation::Count);
        assert_eq!(history[1].operation, Operation::GetById);
        store.clear_history();
        assert!(store.history().is_empty());
    }
}
