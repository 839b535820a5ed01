//! Raw records as stores return them, and the values they (and normalized results) are made of.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::cmp::Ordering;

/// Key of the stable identity of a normalized entity.
pub const ID: &str = "id";
/// Key of the creation timestamp of a normalized entity.
pub const CREATED_AT: &str = "createdAt";
/// Key of the last-update timestamp of a normalized entity.
pub const UPDATED_AT: &str = "updatedAt";
/// Key of the entity kind of a normalized entity.
pub const KIND: &str = "kind";

/// Keys present on every normalized entity, in the order they appear.
pub const METADATA_KEYS: [&str; 4] = [ID, CREATED_AT, UPDATED_AT, KIND];

/// Ordered string-keyed mapping; the shape of a normalized entity.
pub type Map = IndexMap<String, Value>;

/// Equality is structural, and maps are only equal when their entries appear in the same order.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(DateTime<Utc>),
    List(Vec<Value>),
    Map(Map),
    /// An embedded reference to another record, inlined or as a bare pointer.
    Record(Box<Record>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Equality as stores see it: references are equal when they point at the same entity,
    /// however much of it is inlined.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Record(a), Self::Record(b)) => a.kind == b.kind && a.id == b.id,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => {
                (*a as f64) == *b
            }
            (a, b) => a == b,
        }
    }

    /// Ordering of comparable scalars; `None` for mismatched or unordered values.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a.len() == b.len() && a.iter().eq(b.iter()),
            (Self::Record(a), Self::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(Box::new(value))
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One stored object.
///
/// A record is *hydrated* when its attributes were actually transferred. A bare pointer only
/// carries its kind and id; resolving fields through it takes another round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    kind: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    attrs: IndexMap<String, Value>,
    hydrated: bool,
}

impl Record {
    /// A hydrated record without attributes or timestamps.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            created_at: None,
            updated_at: None,
            attrs: IndexMap::new(),
            hydrated: true,
        }
    }

    /// A bare reference to the record `kind`/`id`.
    pub fn pointer(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            hydrated: false,
            ..Self::new(kind, id)
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// The stored attribute `name`, not including metadata.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Either a metadata field or an attribute, as predicates address them.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            ID => Some(Value::Text(self.id.clone())),
            KIND => Some(Value::Text(self.kind.clone())),
            CREATED_AT => Some(self.created_at.into()),
            UPDATED_AT => Some(self.updated_at.into()),
            _ => self.attr(name).cloned(),
        }
    }

    pub fn to_pointer(&self) -> Record {
        Record::pointer(self.kind.clone(), self.id.clone())
    }

    /// The four metadata entries every normalized entity starts with.
    pub fn metadata(&self) -> [(&'static str, Value); 4] {
        [
            (ID, Value::Text(self.id.clone())),
            (CREATED_AT, self.created_at.into()),
            (UPDATED_AT, self.updated_at.into()),
            (KIND, Value::Text(self.kind.clone())),
        ]
    }

    pub(crate) fn stamp(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at.get_or_insert(now);
        self.hydrated = true;
    }

    pub(crate) fn attrs_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.attrs
    }
}
