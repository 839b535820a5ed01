use super::entities::list_entities;
use super::Context;
use crate::overrides::Computed;
use crate::record::METADATA_KEYS;
use crate::{settle, Deferred, Map, Node, Pending, Predicate, Record, Value};
use indexmap::IndexMap;

/// Turns one raw record into an entity with the four metadata entries followed by one entry per
/// node of `children`, in order.
pub fn normalize_record<'a>(
    context: &'a Context<'a>,
    record: Record,
    children: &'a [Node],
) -> Pending<'a, Map> {
    log::trace!("normalize `{}` {}", record.kind(), record.id());

    Pending::new(async move {
        let mut entries: IndexMap<String, Deferred<'_>> = record
            .metadata()
            .into_iter()
            .map(|(key, value)| (key.to_owned(), Deferred::Ready(value)))
            .collect();

        for node in children {
            let key = node.key();
            if key.qualifier().is_none() && METADATA_KEYS.contains(&key.name()) {
                continue;
            }
            entries.insert(key.path(), compute(context, &record, node));
        }

        settle(entries).await
    })
}

/// The attribute of `record` that `node` asks for.
pub(crate) fn compute<'r>(
    context: &'r Context<'r>,
    record: &'r Record,
    node: &'r Node,
) -> Deferred<'r> {
    let key = node.key();
    let attribute = match key.qualifier() {
        None => record.attr(key.name()),
        Some(_) => None,
    };

    if let Some(Value::Record(target)) = attribute {
        log::trace!("`{key}` of {} is a reference to `{}`", record.id(), target.kind());
        let path = key.path();
        return normalize_reference(context, target, node.children())
            .map(Value::Map)
            .map_err(move |error| error.via(&path))
            .into();
    }

    if let Some((kind, field)) = key.reverse_join() {
        log::trace!("`{key}` of {} lists `{kind}` by `{field}`", record.id());
        let path = key.path();
        let predicates = vec![Predicate::equal_to(field, record.to_pointer())];
        return list_entities(context, kind, predicates, node.children())
            .map(Value::List)
            .map_err(move |error| error.via(&path))
            .into();
    }

    if let Some(computation) = context.parser().overrides().get(record.kind(), key) {
        log::trace!("`{key}` of {} is computed", record.id());
        return computation(Computed {
            record,
            node,
            context,
        });
    }

    Deferred::Ready(attribute.cloned().unwrap_or(Value::Null))
}

/// Normalizes an embedded reference, fetching it first when the store only returned a pointer
/// and fields of it were asked for.
fn normalize_reference<'r>(
    context: &'r Context<'r>,
    target: &Record,
    children: &'r [Node],
) -> Pending<'r, Map> {
    if target.is_hydrated() || children.is_empty() {
        return normalize_record(context, target.clone(), children);
    }

    let fetch = context.get_by_id(target.kind(), target.id());
    Pending::new(async move {
        let target = fetch.await?;
        normalize_record(context, Record::clone(&target), children).await
    })
}
