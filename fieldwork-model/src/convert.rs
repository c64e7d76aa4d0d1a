//! Structural conversion between raw mappings and entity instances.

use crate::error::{ModelError, ModelResult};
use crate::schema::EntitySchema;
use crate::{Entity, Mapping, Value};
use std::sync::Arc;
use tracing::trace;

/// Builds an entity from a raw mapping.
///
/// Declared fields are applied in declaration order; `null` values are
/// skipped. Remaining keys are applied through aliases or dotted paths when
/// they name one, kept as extras on flexible schemas, and ignored otherwise.
/// The first failure aborts the whole conversion.
pub fn from_mapping(schema: &Arc<EntitySchema>, raw: &Mapping) -> ModelResult<Entity> {
    let mut entity = Entity::new(schema);
    apply(&mut entity, raw, None)?;
    Ok(entity)
}

/// Applies `raw` onto `entity`. `base` is the path of `entity` inside the
/// value being adapted, prefixed to every reported path.
///
/// On error `entity` may be partially updated; callers that need atomicity
/// apply onto a copy.
pub(crate) fn apply(entity: &mut Entity, raw: &Mapping, base: Option<&str>) -> ModelResult<()> {
    let schema = Arc::clone(entity.schema());

    for field in schema.fields() {
        let Some(value) = raw.get(field.name()) else {
            continue;
        };
        if value.is_null() {
            if entity.contains(field.name()) {
                entity.put(field.name(), None);
            }
            continue;
        }
        let path = join(base, field.name());
        let adapted = field.kind().adapt_at(value, &path)?;
        entity.put(field.name(), Some(adapted));
    }

    for (key, value) in raw {
        if schema.field(key).is_some() {
            continue;
        }
        if let Some(alias) = schema.alias(key) {
            entity
                .set_path(alias.target(), value.clone())
                .map_err(|e| e.under(base))?;
        } else if is_field_path(&schema, key) {
            entity
                .set_path(key, value.clone())
                .map_err(|e| e.under(base))?;
        } else if schema.is_flexible() {
            entity.put_extra(key, value.clone());
        } else {
            trace!(entity = %schema.name(), key = %key, "Ignoring unknown key");
        }
    }
    Ok(())
}

/// Adapts a raw value for a nested-entity field.
pub(crate) fn adapt_entity(schema: &Arc<EntitySchema>, raw: &Value, path: &str) -> ModelResult<Value> {
    match raw {
        Value::Entity(entity) if Arc::ptr_eq(entity.schema(), schema) => Ok(raw.clone()),
        Value::Entity(entity) => nested(schema, &entity.flatten(), path),
        Value::Map(map) => nested(schema, map, path),
        other => Err(ModelError::adaptation(
            path,
            raw,
            format!("expected a mapping for {}, found {}", schema.name(), other.type_name()),
        )),
    }
}

fn nested(schema: &Arc<EntitySchema>, raw: &Mapping, path: &str) -> ModelResult<Value> {
    let mut child = Entity::new(schema);
    apply(&mut child, raw, Some(path))?;
    Ok(Value::Entity(child))
}

/// Present fields in declaration order, then extras in insertion order.
pub fn to_mapping(entity: &Entity) -> serde_json::Map<String, serde_json::Value> {
    let mut out = serde_json::Map::with_capacity(entity.len());
    for (name, value) in entity.iter() {
        out.insert(name.to_owned(), value.to_json());
    }
    for (name, value) in entity.extras() {
        out.insert(name.clone(), value.to_json());
    }
    out
}

pub(crate) fn flatten(entity: &Entity) -> Mapping {
    entity
        .iter()
        .map(|(name, value)| (name.to_owned(), value.flatten()))
        .chain(
            entity
                .extras()
                .iter()
                .map(|(name, value)| (name.clone(), value.flatten())),
        )
        .collect()
}

fn join(base: Option<&str>, name: &str) -> String {
    match base {
        Some(base) => format!("{base}.{name}"),
        None => name.to_owned(),
    }
}

fn is_field_path(schema: &EntitySchema, key: &str) -> bool {
    match key.split_once('.') {
        Some((head, _)) => schema.field(head.strip_suffix('?').unwrap_or(head)).is_some(),
        None => false,
    }
}
