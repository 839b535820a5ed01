//! Constraints and hints sent to a [`Store`](crate::Store) along with an entity kind.

use crate::{Node, Record, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Transfer only these attributes. A hint: stores may add their own metadata fields.
    Select(Vec<String>),
    /// Inline the record that this reference attribute points at, in the same round-trip.
    Include(String),
    EqualTo(String, Value),
    GreaterThan(String, Value),
}

impl Predicate {
    pub fn select<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::Select(fields.into_iter().map(Into::into).collect())
    }

    pub fn include(field: impl Into<String>) -> Self {
        Self::Include(field.into())
    }

    pub fn equal_to(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::EqualTo(field.into(), value.into())
    }

    pub fn greater_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::GreaterThan(field.into(), value.into())
    }

    /// Whether `record` satisfies this predicate. Hints are satisfied by every record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Select(_) | Self::Include(_) => true,
            Self::EqualTo(field, value) => record
                .field(field)
                .is_some_and(|actual| actual.same_as(value)),
            Self::GreaterThan(field, value) => record
                .field(field)
                .and_then(|actual| actual.compare(value))
                == Some(Ordering::Greater),
        }
    }
}

/// Names of the fields requested by `children`: the projection sent along with a `find`.
pub fn select_set(children: &[Node]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(children.len());
    for child in children {
        let name = child.key().name();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    }
    names
}

/// Names of the reference attributes to inline: every direct join, except reverse joins,
/// which do not name a stored attribute. Deeper joins are deliberately not included.
pub fn include_set(children: &[Node]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for child in children {
        if !child.is_join() || child.key().reverse_join().is_some() {
            continue;
        }
        let name = child.key().name();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_query, record::CREATED_AT};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn children(source: &str) -> Vec<crate::Node> {
        parse_query(source).unwrap().into_nodes()
    }

    #[test]
    fn test_select_set_is_direct_children() {
        let nodes = children("title, year, director { name, birthplace { city } }, Movie/_sequel { title }");
        let select: HashSet<_> = select_set(&nodes).into_iter().collect();
        let expected: HashSet<_> = ["title", "year", "director", "_sequel"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(select, expected);
    }

    #[test]
    fn test_select_set_deduplicates() {
        assert_eq!(select_set(&children("title, title")), vec!["title".to_owned()]);
        assert!(select_set(&[]).is_empty());
    }

    #[test]
    fn test_include_set_is_shallow() {
        let nodes = children(
            "title, director { name, birthplace { city, country { name } } }, studio { name }, Movie/_director { title }",
        );
        assert_eq!(include_set(&nodes), vec!["director".to_owned(), "studio".to_owned()]);
    }

    #[test]
    fn test_matches() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let movie = Record::new("Movie", "m1")
            .with_timestamps(feb, feb)
            .with("director", Record::pointer("Person", "p1"))
            .with("year", 1979);

        assert!(Predicate::equal_to("director", Record::new("Person", "p1")).matches(&movie));
        assert!(!Predicate::equal_to("director", Record::pointer("Person", "p2")).matches(&movie));
        assert!(Predicate::greater_than(CREATED_AT, jan).matches(&movie));
        assert!(!Predicate::greater_than(CREATED_AT, feb).matches(&movie));
        assert!(!Predicate::greater_than("missing", 1).matches(&movie));
        assert!(Predicate::greater_than("year", 1970).matches(&movie));
        assert!(Predicate::select(["anything"]).matches(&movie));
    }
}
