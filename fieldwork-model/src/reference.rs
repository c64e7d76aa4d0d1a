//! Entity references and the schema registry they resolve against.
//!
//! A nested-entity field either holds its schema directly or names it.
//! Named references let schemas refer to themselves or to schemas declared
//! later; they are looked up in [`SchemaRegistry::global`] on first use and
//! the result is cached in the reference for its lifetime.

use crate::error::{ModelError, ModelResult};
use crate::schema::EntitySchema;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

/// A nested-entity field's target schema.
#[derive(Clone)]
pub enum EntityRef {
    Direct(Arc<EntitySchema>),
    Named {
        name: String,
        resolved: OnceLock<Arc<EntitySchema>>,
    },
}

impl EntityRef {
    #[must_use]
    pub fn direct(schema: &Arc<EntitySchema>) -> Self {
        Self::Direct(Arc::clone(schema))
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            resolved: OnceLock::new(),
        }
    }

    /// Name of the referenced schema.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Direct(schema) => schema.name(),
            Self::Named { name, .. } => name,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Direct(_) => true,
            Self::Named { resolved, .. } => resolved.get().is_some(),
        }
    }

    /// Returns the referenced schema, resolving a named reference on first
    /// call. Fails with `UnresolvedReference` while the name is undeclared;
    /// a failed attempt is not cached.
    pub fn resolve(&self) -> ModelResult<&Arc<EntitySchema>> {
        match self {
            Self::Direct(schema) => Ok(schema),
            Self::Named { name, resolved } => {
                if let Some(schema) = resolved.get() {
                    return Ok(schema);
                }
                let schema = SchemaRegistry::global().get(name).ok_or_else(|| {
                    ModelError::UnresolvedReference { name: name.clone() }
                })?;
                debug!(entity = %name, "Resolved deferred entity reference");
                Ok(resolved.get_or_init(|| schema))
            }
        }
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the resolved schema: references may be cyclic.
        match self {
            Self::Direct(schema) => f.debug_tuple("Direct").field(&schema.name()).finish(),
            Self::Named { name, resolved } => f
                .debug_struct("Named")
                .field("name", name)
                .field("resolved", &resolved.get().is_some())
                .finish(),
        }
    }
}

/// Declared entity schemas, keyed by name.
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<EntitySchema>>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry that named references resolve against.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Registers a schema under its name.
    ///
    /// Registering the same `Arc` again is a no-op; any other schema with a
    /// taken name fails with `DuplicateEntity`.
    pub fn register(&self, schema: Arc<EntitySchema>) -> ModelResult<()> {
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        match schemas.get(schema.name()) {
            Some(existing) if Arc::ptr_eq(existing, &schema) => Ok(()),
            Some(_) => Err(ModelError::DuplicateEntity {
                name: schema.name().to_owned(),
            }),
            None => {
                debug!(entity = %schema.name(), fields = schema.len(), "Declared entity schema");
                schemas.insert(schema.name().to_owned(), schema);
                Ok(())
            }
        }
    }

    /// Registers every schema or none of them.
    ///
    /// Each name is checked against the registry and the rest of the batch
    /// under one write lock before anything is inserted.
    pub fn register_all(&self, batch: &[Arc<EntitySchema>]) -> ModelResult<()> {
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        for (position, schema) in batch.iter().enumerate() {
            let taken = match schemas.get(schema.name()) {
                Some(existing) => !Arc::ptr_eq(existing, schema),
                None => batch[..position]
                    .iter()
                    .any(|earlier| earlier.name() == schema.name() && !Arc::ptr_eq(earlier, schema)),
            };
            if taken {
                return Err(ModelError::DuplicateEntity {
                    name: schema.name().to_owned(),
                });
            }
        }
        for schema in batch {
            if !schemas.contains_key(schema.name()) {
                debug!(entity = %schema.name(), fields = schema.len(), "Declared entity schema");
                schemas.insert(schema.name().to_owned(), Arc::clone(schema));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<EntitySchema>> {
        let schemas = self.schemas.read().unwrap_or_else(PoisonError::into_inner);
        schemas.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let schemas = self.schemas.read().unwrap_or_else(PoisonError::into_inner);
        schemas.contains_key(name)
    }

    /// All declared names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let schemas = self.schemas.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = schemas.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
