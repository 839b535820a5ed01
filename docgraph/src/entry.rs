//! Hand-written readers for top-level keys that do not map onto a single entity kind.

use crate::record::CREATED_AT;
use crate::resolve::resolve_entity_list;
use crate::{Context, DispatchKey, Node, Pending, Predicate, Value};
use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Reads the value of one top-level key.
pub trait EntryPoint {
    fn read<'a>(&'a self, context: &'a Context<'a>, node: &'a Node) -> Pending<'a, Value>;
}

impl<F> EntryPoint for F
where
    F: for<'a> Fn(&'a Context<'a>, &'a Node) -> Pending<'a, Value>,
{
    fn read<'a>(&'a self, context: &'a Context<'a>, node: &'a Node) -> Pending<'a, Value> {
        self(context, node)
    }
}

/// Entities of one kind created since the start of the current year, in store order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentItems {
    kind: String,
    since: Option<DateTime<Utc>>,
}

impl RecentItems {
    /// The key this entry point is conventionally registered under.
    pub const KEY: (&'static str, &'static str) = ("recent", "items");

    pub fn key() -> DispatchKey {
        DispatchKey::qualified(Self::KEY.0, Self::KEY.1)
    }

    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            since: None,
        }
    }

    /// Uses a fixed lower bound instead of the start of the current year.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Items must be created strictly after this moment.
    pub fn lower_bound(&self) -> DateTime<Utc> {
        self.since.unwrap_or_else(|| {
            let year = Utc::now().year();
            Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        })
    }
}

impl EntryPoint for RecentItems {
    fn read<'a>(&'a self, context: &'a Context<'a>, node: &'a Node) -> Pending<'a, Value> {
        let bound = self.lower_bound();
        log::trace!("recent `{}` items created after {bound}", self.kind);
        resolve_entity_list(
            context,
            &self.kind,
            vec![Predicate::greater_than(CREATED_AT, bound)],
            node.children(),
        )
        .map(Value::List)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_bound_is_start_of_year() {
        let bound = RecentItems::new("Movie").lower_bound();
        assert_eq!((bound.month(), bound.day()), (1, 1));
        assert_eq!(bound.year(), Utc::now().year());

        let fixed = Utc.with_ymd_and_hms(2001, 5, 4, 0, 0, 0).unwrap();
        assert_eq!(RecentItems::new("Movie").since(fixed).lower_bound(), fixed);
        assert_eq!(RecentItems::key().to_string(), "recent/items");
    }
}
