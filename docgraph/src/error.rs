use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a [`Store`](crate::Store) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown entity kind `{0}`")]
    UnknownKind(String),
    #[error("no `{kind}` with id `{id}`")]
    NotFound { kind: String, id: String },
    #[error("backend error: {0}")]
    Backend(String),
}

/// Where in the query a failure originated: the entity kind being read and, when known,
/// the dispatch key through which it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    kind: String,
    field: Option<String>,
}

impl Origin {
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            field: None,
        }
    }

    pub fn field(kind: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            field: Some(field.into()),
        }
    }

    pub fn entity_kind(&self) -> &str {
        &self.kind
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "`{}` (via `{field}`)", self.kind),
            None => write!(f, "`{}`", self.kind),
        }
    }
}

/// Discriminant of [`QueryError`], for callers that only branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Store,
    Malformed,
    TooDeep,
    Timeout,
    Cancelled,
}

/// Failure of one top-level key of a query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("store call for {origin} failed: {source}")]
    Store {
        origin: Origin,
        #[source]
        source: StoreError,
    },
    #[error("malformed query at {origin}: {reason}")]
    Malformed { origin: Origin, reason: String },
    #[error("query for `{key}` is nested {depth} levels deep, the limit is {limit}")]
    TooDeep {
        key: String,
        depth: usize,
        limit: usize,
    },
    #[error("store call for {origin} timed out after {after:?}")]
    Timeout { origin: Origin, after: Duration },
    #[error("query was cancelled")]
    Cancelled,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store { .. } => ErrorKind::Store,
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::TooDeep { .. } => ErrorKind::TooDeep,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Self::Store { origin, .. }
            | Self::Malformed { origin, .. }
            | Self::Timeout { origin, .. } => Some(origin),
            Self::TooDeep { .. } | Self::Cancelled => None,
        }
    }

    /// Records `key` as the field the failure was reached through, unless a nearer one is known.
    pub(crate) fn via(mut self, key: &str) -> Self {
        if let Self::Store { origin, .. }
        | Self::Malformed { origin, .. }
        | Self::Timeout { origin, .. } = &mut self
        {
            if origin.field.is_none() {
                origin.field = Some(key.to_owned());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_via_keeps_nearest_field() {
        let error = QueryError::Store {
            origin: Origin::kind("Movie"),
            source: StoreError::Backend("down".into()),
        }
        .via("Movie/_director")
        .via("director");

        assert_eq!(error.kind(), ErrorKind::Store);
        assert_eq!(
            error.origin(),
            Some(&Origin::field("Movie", "Movie/_director"))
        );
        assert_eq!(
            error.to_string(),
            "store call for `Movie` (via `Movie/_director`) failed: backend error: down"
        );
    }

    #[test]
    fn test_cancelled_has_no_origin() {
        assert_eq!(QueryError::Cancelled.via("title").origin(), None);
    }
}
