use crate::entry::EntryPoint;
use crate::overrides::{Computed, Overrides};
use crate::resolve::resolve_entity_list;
use crate::{
    CancellationToken, Context, Deferred, DispatchKey, Node, Origin, ParserConfig, Pending, Query,
    QueryError, Store, Value,
};
use futures::future;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// What [`Parser::read`] found for a top-level key.
#[derive(Debug)]
pub enum Read<'a> {
    Value(Pending<'a, Value>),
    /// The key is answered elsewhere; the caller should forward it.
    Remote,
}

/// Answers graph queries from a [`Store`].
///
/// ```
/// use docgraph::{query, MemoryStore, Parser, Record};
///
/// let store = MemoryStore::new();
/// store.insert(Record::new("Movie", "m1").with("title", "Alien"));
///
/// let parser = Parser::new(store);
/// let response = futures::executor::block_on(parser.run(&query!(class/Movie { title })));
/// let movies = response.value("class/Movie").and_then(|v| v.as_list()).unwrap();
/// assert_eq!(movies.len(), 1);
/// ```
pub struct Parser {
    store: Rc<dyn Store>,
    config: ParserConfig,
    overrides: Overrides,
    entries: HashMap<DispatchKey, Box<dyn EntryPoint>>,
    remote: HashSet<DispatchKey>,
}

impl Parser {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Rc::new(store),
            config: ParserConfig::default(),
            overrides: Overrides::new(),
            entries: HashMap::new(),
            remote: HashSet::new(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Computes `key` on entities of `kind` with `computation` instead of reading it from the
    /// record. Embedded references and reverse joins take precedence.
    pub fn with_override<F>(
        mut self,
        kind: impl Into<String>,
        key: DispatchKey,
        computation: F,
    ) -> Self
    where
        F: for<'a> Fn(Computed<'a>) -> Deferred<'a> + 'static,
    {
        self.overrides.register(kind, key, computation);
        self
    }

    /// Answers the top-level `key` with `entry`.
    pub fn with_entry_point(mut self, key: DispatchKey, entry: impl EntryPoint + 'static) -> Self {
        self.entries.insert(key, Box::new(entry));
        self
    }

    /// Marks the top-level `key` as answered elsewhere, see [`Response::remote`].
    pub fn with_remote(mut self, key: DispatchKey) -> Self {
        self.remote.insert(key);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &Rc<dyn Store> {
        &self.store
    }

    pub(crate) fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// A fresh submission context.
    pub fn context(&self) -> Context<'_> {
        self.context_with(CancellationToken::new())
    }

    pub fn context_with(&self, cancel: CancellationToken) -> Context<'_> {
        Context::new(self, cancel)
    }

    /// Dispatches one top-level node. Keys nothing is registered for yield `None`.
    pub fn read<'a>(&'a self, context: &'a Context<'a>, node: &'a Node) -> Option<Read<'a>> {
        let key = node.key();
        if self.remote.contains(key) {
            log::trace!("`{key}` is remote");
            return Some(Read::Remote);
        }
        if let Some(entry) = self.entries.get(key) {
            log::trace!("`{key}` has an entry point");
            return Some(Read::Value(entry.read(context, node)));
        }

        let kind = key.class_kind()?;
        log::trace!("`{key}` lists every `{kind}`");
        if node.is_join() && node.children().is_empty() {
            return Some(Read::Value(Pending::failed(QueryError::Malformed {
                origin: Origin::kind(kind),
                reason: "join without fields".to_owned(),
            })));
        }
        Some(Read::Value(
            resolve_entity_list(context, kind, Vec::new(), node.children()).map(Value::List),
        ))
    }

    pub async fn run(&self, query: &Query) -> Response {
        self.run_with(query, &CancellationToken::new()).await
    }

    /// Reads every top-level key of `query` concurrently. Keys fail independently of each other.
    pub async fn run_with(&self, query: &Query, cancel: &CancellationToken) -> Response {
        let context = self.context_with(cancel.clone());
        let mut response = Response::default();
        let mut keys = Vec::new();
        let mut reads = Vec::new();

        for node in query {
            let path = node.key().path();
            let pending = match self.read(&context, node) {
                None => {
                    log::debug!("no reader for `{path}`");
                    continue;
                }
                Some(Read::Remote) => {
                    response.remote.push(node.clone());
                    continue;
                }
                Some(Read::Value(pending)) => pending,
            };

            let depth = node.depth();
            let pending = match self.config.max_depth() {
                Some(limit) if depth > limit => Pending::failed(QueryError::TooDeep {
                    key: path.clone(),
                    depth,
                    limit,
                }),
                _ => pending,
            };

            log::info!("reading `{path}`");
            keys.push(path);
            reads.push(cancel.guard(pending));
        }

        for (key, result) in keys.into_iter().zip(future::join_all(reads).await) {
            if let Err(error) = &result {
                log::warn!("`{key}` failed: {error}");
            }
            response.values.insert(key, result);
        }
        response
    }
}

/// The result of one submission.
#[derive(Debug, Default)]
pub struct Response {
    values: IndexMap<String, Result<Value, QueryError>>,
    remote: Vec<Node>,
}

impl Response {
    /// The outcome of the top-level key `key`, `None` if nothing answered it.
    pub fn get(&self, key: &str) -> Option<&Result<Value, QueryError>> {
        self.values.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key)?.as_ref().ok()
    }

    pub fn error(&self, key: &str) -> Option<&QueryError> {
        self.get(key)?.as_ref().err()
    }

    /// The top-level nodes registered as remote, in query order.
    pub fn remote(&self) -> &[Node] {
        &self.remote
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<Value, QueryError>)> {
        self.values.iter().map(|(key, result)| (key.as_str(), result))
    }

    pub fn into_values(self) -> IndexMap<String, Result<Value, QueryError>> {
        self.values
    }
}
