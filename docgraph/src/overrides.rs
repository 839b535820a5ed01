use crate::{Context, Deferred, DispatchKey, Node, Record};
use std::collections::HashMap;

/// Everything a computed attribute gets to work with.
pub struct Computed<'a> {
    /// The raw record whose attribute is computed.
    pub record: &'a Record,
    /// The query node asking for the attribute; its children shape nested results.
    pub node: &'a Node,
    /// Gives access to the store, through the same timeouts, cancellation and caches as the
    /// rest of the submission.
    pub context: &'a Context<'a>,
}

/// A computed attribute, registered for one entity kind and dispatch key.
pub type Computation = Box<dyn for<'a> Fn(Computed<'a>) -> Deferred<'a>>;

/// Model-specific computations that take precedence over plain attribute reads.
#[derive(Default)]
pub struct Overrides {
    computations: HashMap<String, HashMap<DispatchKey, Computation>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `computation` for `key` on entities of `kind`, replacing any earlier one.
    pub fn register<F>(&mut self, kind: impl Into<String>, key: DispatchKey, computation: F)
    where
        F: for<'a> Fn(Computed<'a>) -> Deferred<'a> + 'static,
    {
        self.computations
            .entry(kind.into())
            .or_default()
            .insert(key, Box::new(computation));
    }

    pub fn get(&self, kind: &str, key: &DispatchKey) -> Option<&Computation> {
        self.computations.get(kind)?.get(key)
    }

    pub fn len(&self) -> usize {
        self.computations.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_lookup_is_per_kind() {
        let mut overrides = Overrides::new();
        overrides.register("Person", DispatchKey::new("initials"), |c: Computed<'_>| {
            let name = c.record.attr("name").and_then(Value::as_str).unwrap_or_default();
            Deferred::from(Value::from(name.chars().take(1).collect::<String>()))
        });

        assert_eq!(overrides.len(), 1);
        assert!(overrides.get("Person", &DispatchKey::new("initials")).is_some());
        assert!(overrides.get("Movie", &DispatchKey::new("initials")).is_none());
        assert!(overrides.get("Person", &DispatchKey::new("name")).is_none());
    }
}
