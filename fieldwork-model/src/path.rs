//! Dotted field paths through nested entities, e.g. `child?.pos.top`.
//!
//! A `?` after a segment soaks an unset intermediate entity: the read
//! yields `Ok(None)` instead of failing with `UnsetParent`.

use crate::error::{ModelError, ModelResult};
use crate::schema::EntitySchema;
use crate::{Entity, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct Segment<'a> {
    name: &'a str,
    soak: bool,
}

fn parse(path: &str) -> Vec<Segment<'_>> {
    path.split('.')
        .map(|raw| match raw.strip_suffix('?') {
            Some(name) => Segment { name, soak: true },
            None => Segment {
                name: raw,
                soak: false,
            },
        })
        .collect()
}

fn display(segments: &[Segment<'_>]) -> String {
    segments
        .iter()
        .map(|segment| segment.name)
        .collect::<Vec<_>>()
        .join(".")
}

/// Checks every segment against the schema chain before any value is
/// touched. Returns the schema of each intermediate entity and of the leaf.
fn resolve_chain(
    root: &Arc<EntitySchema>,
    segments: &[Segment<'_>],
) -> ModelResult<(Vec<Arc<EntitySchema>>, Arc<EntitySchema>)> {
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(ModelError::unknown_field(root.name(), ""));
    };

    let mut chain = Vec::with_capacity(parents.len());
    let mut schema = Arc::clone(root);
    for (depth, segment) in parents.iter().enumerate() {
        let field = schema.require_field(segment.name)?;
        let Some(child) = field.kind().nested_schema()? else {
            return Err(ModelError::NotAnEntity {
                path: display(&segments[..=depth]),
            });
        };
        let child = Arc::clone(child);
        chain.push(Arc::clone(&child));
        schema = child;
    }

    if !schema.contains(leaf.name) && !schema.is_flexible() {
        return Err(ModelError::unknown_field(schema.name(), leaf.name));
    }
    Ok((chain, schema))
}

impl Entity {
    /// Reads a dotted path through nested entities.
    ///
    /// The whole path is checked against the schemas first, so a misspelt
    /// leaf is `UnknownField` even when its parent is unset.
    pub fn get_path(&self, path: &str) -> ModelResult<Option<&Value>> {
        let segments = parse(path);
        resolve_chain(self.schema(), &segments)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Ok(None);
        };

        let mut current = self;
        for (depth, segment) in parents.iter().enumerate() {
            match current.values().get(segment.name) {
                Some(Value::Entity(child)) => current = child,
                Some(_) => {
                    return Err(ModelError::NotAnEntity {
                        path: display(&segments[..=depth]),
                    });
                }
                None if segment.soak => return Ok(None),
                None => {
                    return Err(ModelError::UnsetParent {
                        path: display(&segments[..=depth]),
                    });
                }
            }
        }
        current.get(leaf.name)
    }

    /// Writes a dotted path, creating unset intermediate entities.
    ///
    /// The leaf is adapted before anything is created, so a rejected value
    /// leaves the instance untouched. Assigning `Null` unsets the leaf and
    /// never creates intermediates. Soak markers are ignored.
    pub fn set_path(&mut self, path: &str, raw: impl Into<Value>) -> ModelResult<()> {
        self.assign_path(path, raw.into(), true)
    }

    /// Expands a leaf alias at most once; a second alias at the expanded
    /// leaf is `UnknownField`.
    fn assign_path(&mut self, path: &str, raw: Value, expand_alias: bool) -> ModelResult<()> {
        let segments = parse(path);
        let (chain, leaf_schema) = resolve_chain(self.schema(), &segments)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Ok(());
        };

        if let Some(alias) = leaf_schema.alias(leaf.name) {
            if !expand_alias {
                return Err(ModelError::unknown_field(leaf_schema.name(), leaf.name));
            }
            let target = if parents.is_empty() {
                alias.target().to_owned()
            } else {
                format!("{}.{}", display(parents), alias.target())
            };
            return self.assign_path(&target, raw, false);
        }

        let adapted = match leaf_schema.field(leaf.name) {
            Some(_) if raw.is_null() => Leaf::Unset,
            Some(field) => Leaf::Field(field.kind().adapt_at(&raw, &display(&segments))?),
            None => Leaf::Extra(raw),
        };
        let clearing = matches!(adapted, Leaf::Unset)
            || matches!(&adapted, Leaf::Extra(value) if value.is_null());

        let mut current: &mut Entity = self;
        for (segment, child_schema) in parents.iter().zip(&chain) {
            if clearing && !current.values().contains_key(segment.name) {
                return Ok(());
            }
            current.mark_changed(segment.name);
            let slot = current
                .values_mut()
                .entry(segment.name.to_owned())
                .or_insert_with(|| Value::Entity(Entity::new(child_schema)));
            current = match slot {
                Value::Entity(child) => child,
                _ => {
                    return Err(ModelError::NotAnEntity {
                        path: display(parents),
                    });
                }
            };
        }

        match adapted {
            Leaf::Unset => current.put(leaf.name, None),
            Leaf::Field(value) => current.put(leaf.name, Some(value)),
            Leaf::Extra(value) => current.put_extra(leaf.name, value),
        }
        Ok(())
    }
}

enum Leaf {
    Unset,
    Field(Value),
    Extra(Value),
}
