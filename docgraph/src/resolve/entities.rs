use super::{normalize_record, Context};
use crate::predicate::{include_set, select_set};
use crate::{Node, Origin, Pending, Predicate, QueryError, Value};
use futures::{stream, StreamExt, TryStreamExt};

/// Lists the entities of `kind` matching `predicates`, normalized according to `children`.
///
/// The whole tree below `children` is checked first, reverse joins included. One `find` is then
/// issued, selecting the fields named by `children` and inlining the references they join on.
/// The records are normalized with at most [`concurrency`](crate::ParserConfig::concurrency) in
/// flight, and yielded in store order. Any failure fails the whole list.
pub fn resolve_entity_list<'a>(
    context: &'a Context<'a>,
    kind: &'a str,
    predicates: Vec<Predicate>,
    children: &'a [Node],
) -> Pending<'a, Vec<Value>> {
    if let Err(error) = validate(kind, children) {
        return Pending::failed(error);
    }
    list_entities(context, kind, predicates, children)
}

/// [`resolve_entity_list`] for a tree that was already validated.
pub(crate) fn list_entities<'a>(
    context: &'a Context<'a>,
    kind: &'a str,
    predicates: Vec<Predicate>,
    children: &'a [Node],
) -> Pending<'a, Vec<Value>> {
    let select = select_set(children);
    let include = include_set(children);
    log::debug!("find `{kind}` selecting {select:?}, including {include:?}");

    let mut all = Vec::with_capacity(1 + include.len() + predicates.len());
    all.push(Predicate::Select(select));
    all.extend(include.into_iter().map(Predicate::Include));
    all.extend(predicates);

    let concurrency = context.config().concurrency();
    Pending::new(async move {
        let records = context.find(kind, all).await?;
        log::trace!("normalizing {} `{kind}` records", records.len());

        stream::iter(records)
            .map(|record| normalize_record(context, record, children))
            .buffered(concurrency)
            .map_ok(Value::Map)
            .try_collect()
            .await
    })
}

/// Rejects query trees that cannot be resolved. The children of a reverse join are checked
/// against the kind it lists.
pub(crate) fn validate(kind: &str, nodes: &[Node]) -> Result<(), QueryError> {
    for node in nodes {
        let key = node.key();
        let malformed = |reason: &str| QueryError::Malformed {
            origin: Origin::field(kind, key.path()),
            reason: reason.to_owned(),
        };

        if key.name().is_empty() || key.qualifier().is_some_and(str::is_empty) {
            return Err(malformed("empty key"));
        }
        if node.is_join() && node.children().is_empty() {
            return Err(malformed("join without fields"));
        }
        match key.reverse_join() {
            Some((_, "")) => return Err(malformed("reverse join without a field")),
            Some((listed, _)) => validate(listed, node.children())?,
            None => validate(kind, node.children())?,
        }
    }
    Ok(())
}
