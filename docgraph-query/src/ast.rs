use std::fmt::{Display, Formatter};

/// Qualifier of top-level keys that list every entity of a kind, as in `class/Movie`.
pub const CLASS_QUALIFIER: &str = "class";

/// Prefix of a key name that turns it into a reverse join, as in `Movie/_director`.
pub const REVERSE_MARKER: char = '_';

/// Identifies what a query node reads: an optional qualifier and a name.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct DispatchKey {
    qualifier: Option<String>,
    name: String,
}

impl DispatchKey {
    /// An unqualified key, usually naming a field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    /// A key of the form `qualifier/name`.
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    /// `class/<kind>`: lists every entity of `kind`.
    pub fn class(kind: impl Into<String>) -> Self {
        Self::qualified(CLASS_QUALIFIER, kind)
    }

    /// `<kind>/_<field>`: every entity of `kind` whose `field` points at the enclosing entity.
    pub fn reverse(kind: impl Into<String>, field: impl AsRef<str>) -> Self {
        Self::qualified(kind, format!("{REVERSE_MARKER}{}", field.as_ref()))
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity kind this key lists, if it is a `class/<kind>` key.
    pub fn class_kind(&self) -> Option<&str> {
        match self.qualifier() {
            Some(CLASS_QUALIFIER) => Some(&self.name),
            _ => None,
        }
    }

    /// Splits a reverse join key into the entity kind to list and the field that points back.
    ///
    /// The field is empty for a bare `<kind>/_` key, which callers should reject.
    pub fn reverse_join(&self) -> Option<(&str, &str)> {
        let qualifier = self.qualifier()?;
        if qualifier == CLASS_QUALIFIER {
            return None;
        }
        let field = self.name.strip_prefix(REVERSE_MARKER)?;
        Some((qualifier, field))
    }

    /// The key as it appears in results: `qualifier/name` or `name`, never quoted.
    pub fn path(&self) -> String {
        match &self.qualifier {
            Some(qualifier) => format!("{qualifier}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

fn is_plain_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    segment != "_" && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn write_segment(f: &mut Formatter<'_>, segment: &str) -> std::fmt::Result {
    if is_plain_segment(segment) {
        write!(f, "{segment}")
    } else {
        write!(f, "{segment:?}")
    }
}

impl Display for DispatchKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write_segment(f, qualifier)?;
            write!(f, "/")?;
        }
        write_segment(f, &self.name)
    }
}

/// Whether a node reads a single value or a nested structure.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Property,
    Join,
}

/// A literal parameter attached to a node, e.g. `limit = 10`.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Ordered parameters of a node. Not interpreted by the resolver itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(String, Param)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the parameter `name`.
    pub fn with(mut self, name: impl Into<String>, value: Param) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Param) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One point of the query tree.
///
/// A [`NodeKind::Join`] is expected to carry at least one child. The constructors do not enforce
/// this, so that programmatically built queries can be rejected with a proper error at resolution
/// time instead of a panic here.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    key: DispatchKey,
    kind: NodeKind,
    children: Vec<Node>,
    params: Params,
}

impl Node {
    pub fn property(key: DispatchKey) -> Self {
        Self {
            key,
            kind: NodeKind::Property,
            children: Vec::new(),
            params: Params::default(),
        }
    }

    pub fn join(key: DispatchKey, children: Vec<Node>) -> Self {
        Self {
            key,
            kind: NodeKind::Join,
            children,
            params: Params::default(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn key(&self) -> &DispatchKey {
        &self.key
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_join(&self) -> bool {
        self.kind == NodeKind::Join
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of levels in this subtree; a property has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)?;
        if !self.params.is_empty() {
            write!(f, "(")?;
            for (i, (name, value)) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{name} = {value}")?;
            }
            write!(f, ")")?;
        }
        if self.is_join() {
            write!(f, " {{ ")?;
            write_nodes(f, &self.children)?;
            write!(f, " }}")?;
        }
        Ok(())
    }
}

fn write_nodes(f: &mut Formatter<'_>, nodes: &[Node]) -> std::fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

/// A complete query: the ordered top-level nodes of one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    nodes: Vec<Node>,
}

impl Query {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of the deepest top-level node, 0 for an empty query.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(Node::depth).max().unwrap_or(0)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_nodes(f, &self.nodes)
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
