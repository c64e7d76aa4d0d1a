use crate::convert;
use crate::error::{ModelError, ModelResult};
use crate::kind::FieldKind;
use crate::schema::EntitySchema;
use crate::{Mapping, Value};
use indexmap::IndexSet;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A sparse instance of an [`EntitySchema`].
///
/// Only explicitly assigned fields are present; every present value is the
/// adapted form of what was assigned. `get` returns `Ok(None)` for unset
/// fields, which is distinct from `false`, `0` or `""`.
#[derive(Clone)]
pub struct Entity {
    schema: Arc<EntitySchema>,
    values: HashMap<String, Value>,
    extras: Mapping,
    changes: IndexSet<String>,
}

impl Entity {
    /// Creates an instance with no fields set.
    #[must_use]
    pub fn new(schema: &Arc<EntitySchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: HashMap::new(),
            extras: Mapping::new(),
            changes: IndexSet::new(),
        }
    }

    /// Builds an instance from a raw mapping. See [`convert::from_mapping`].
    pub fn from_mapping(schema: &Arc<EntitySchema>, raw: &Mapping) -> ModelResult<Self> {
        convert::from_mapping(schema, raw)
    }

    /// Builds an instance from a raw mapping value or an existing entity.
    pub fn from_value(schema: &Arc<EntitySchema>, raw: &Value) -> ModelResult<Self> {
        match raw {
            Value::Map(map) => convert::from_mapping(schema, map),
            Value::Entity(entity) if Arc::ptr_eq(&entity.schema, schema) => Ok(entity.clone()),
            Value::Entity(entity) => convert::from_mapping(schema, &entity.flatten()),
            other => Err(ModelError::NotAMapping {
                found: other.type_name().to_owned(),
            }),
        }
    }

    /// Builds an instance from a decoded JSON object.
    pub fn from_json(schema: &Arc<EntitySchema>, json: &serde_json::Value) -> ModelResult<Self> {
        Self::from_value(schema, &Value::from(json))
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Name of the entity's schema.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        self.schema.name()
    }

    // ── Field access ─────────────────────────────────────────────

    /// Adapts and stores `raw` under `name`.
    ///
    /// `Null` unsets the field. On failure the instance is unchanged.
    /// Aliases write through to their target path; flexible schemas store
    /// unknown names verbatim as extras.
    pub fn set(&mut self, name: &str, raw: impl Into<Value>) -> ModelResult<()> {
        let raw = raw.into();
        let schema = Arc::clone(&self.schema);

        if let Some(field) = schema.field(name) {
            let adapted = if raw.is_null() {
                None
            } else {
                Some(field.adapt(&raw)?)
            };
            self.put(name, adapted);
            return Ok(());
        }
        if let Some(alias) = schema.alias(name) {
            return self.set_path(alias.target(), raw);
        }
        if schema.is_flexible() {
            self.put_extra(name, raw);
            return Ok(());
        }
        Err(ModelError::unknown_field(schema.name(), name))
    }

    /// Returns the value of `name`, or `Ok(None)` when it is unset.
    pub fn get(&self, name: &str) -> ModelResult<Option<&Value>> {
        if self.schema.field(name).is_some() {
            return Ok(self.values.get(name));
        }
        if let Some(alias) = self.schema.alias(name) {
            return self.get_path(alias.target());
        }
        if self.schema.is_flexible() {
            return Ok(self.extras.get(name));
        }
        Err(ModelError::unknown_field(self.schema.name(), name))
    }

    /// Returns the value of `name`, falling back to the field's adapted
    /// default. The default is never stored.
    pub fn get_or_default(&self, name: &str) -> ModelResult<Option<Value>> {
        let field = self.schema.require_field(name)?;
        match self.values.get(name) {
            Some(value) => Ok(Some(value.clone())),
            None => field.default_value(),
        }
    }

    /// Mapping of the present subset of `names`.
    pub fn get_many(&self, names: &[&str]) -> ModelResult<Mapping> {
        let mut found = Mapping::new();
        for name in names {
            if let Some(value) = self.get(name)? {
                found.insert((*name).to_owned(), value.clone());
            }
        }
        Ok(found)
    }

    /// Removes `name`, returning its previous value.
    pub fn unset(&mut self, name: &str) -> ModelResult<Option<Value>> {
        if self.schema.field(name).is_some() {
            let previous = self.values.remove(name);
            self.changes.insert(name.to_owned());
            return Ok(previous);
        }
        if self.schema.is_flexible() {
            let previous = self.extras.shift_remove(name);
            if previous.is_some() {
                self.changes.insert(name.to_owned());
            }
            return Ok(previous);
        }
        Err(ModelError::unknown_field(self.schema.name(), name))
    }

    /// Unsets every field and extra.
    pub fn clear(&mut self) {
        let removed: Vec<String> = self
            .values
            .drain()
            .map(|(name, _)| name)
            .chain(self.extras.drain(..).map(|(name, _)| name))
            .collect();
        self.changes.extend(removed);
    }

    /// Applies a raw mapping to this instance with the same rules as
    /// [`convert::from_mapping`]. All-or-nothing.
    pub fn update(&mut self, raw: &Mapping) -> ModelResult<()> {
        let mut next = self.clone();
        convert::apply(&mut next, raw, None)?;
        *self = next;
        Ok(())
    }

    // ── Enumeration ──────────────────────────────────────────────

    /// True when `name` is a present field or extra.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.extras.contains_key(name)
    }

    /// Number of present fields and extras.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() + self.extras.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.extras.is_empty()
    }

    /// Present declared fields, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .filter_map(|field| {
                self.values
                    .get_key_value(field.name())
                    .map(|(name, value)| (name.as_str(), value))
            })
    }

    /// Names of the present declared fields, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(name, _)| name)
    }

    /// Names of declared fields that are not set.
    pub fn unset_fields(&self) -> impl Iterator<Item = &str> {
        self.schema
            .field_names()
            .filter(|name| !self.values.contains_key(*name))
    }

    /// Values held for names outside a flexible schema.
    #[must_use]
    pub fn extras(&self) -> &Mapping {
        &self.extras
    }

    // ── Change tracking ──────────────────────────────────────────

    /// Names assigned or unset since creation or the last `clear_changes`.
    pub fn changes(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_changed(&self, name: &str) -> bool {
        self.changes.contains(name)
    }

    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    // ── Collections ──────────────────────────────────────────────

    /// Adapts `raw` as one element and appends it to a collection field,
    /// creating the collection if the field is unset. Existing elements
    /// are not re-adapted.
    pub fn push(&mut self, name: &str, raw: impl Into<Value>) -> ModelResult<()> {
        let raw = raw.into();
        let schema = Arc::clone(&self.schema);
        let FieldKind::Collection(element) = schema.require_field(name)?.kind() else {
            return Err(ModelError::NotACollection {
                path: name.to_owned(),
            });
        };

        let len = self.values.get(name).and_then(Value::as_list).map_or(0, <[Value]>::len);
        let adapted = element.adapt_at(&raw, &format!("{name}[{len}]"))?;

        match self.values.get_mut(name) {
            Some(Value::List(items)) => items.push(adapted),
            _ => {
                self.values.insert(name.to_owned(), Value::List(vec![adapted]));
            }
        }
        self.changes.insert(name.to_owned());
        Ok(())
    }

    /// Removes and returns the element at `index` of a collection field.
    pub fn remove_at(&mut self, name: &str, index: usize) -> ModelResult<Value> {
        if !matches!(self.schema.require_field(name)?.kind(), FieldKind::Collection(_)) {
            return Err(ModelError::NotACollection {
                path: name.to_owned(),
            });
        }
        let len = self.values.get(name).and_then(Value::as_list).map_or(0, <[Value]>::len);
        match self.values.get_mut(name) {
            Some(Value::List(items)) if index < items.len() => {
                let removed = items.remove(index);
                self.changes.insert(name.to_owned());
                Ok(removed)
            }
            _ => Err(ModelError::IndexOutOfRange {
                path: name.to_owned(),
                index,
                len,
            }),
        }
    }

    /// Mutable access to a present nested entity. Marks the field changed.
    pub fn entity_mut(&mut self, name: &str) -> ModelResult<Option<&mut Entity>> {
        if !matches!(self.schema.require_field(name)?.kind(), FieldKind::Entity(_)) {
            return Err(ModelError::NotAnEntity {
                path: name.to_owned(),
            });
        }
        match self.values.get_mut(name) {
            Some(Value::Entity(child)) => {
                self.changes.insert(name.to_owned());
                Ok(Some(child))
            }
            _ => Ok(None),
        }
    }

    // ── Conversion ───────────────────────────────────────────────

    /// JSON-representable mapping of exactly the present fields, then extras.
    #[must_use]
    pub fn to_mapping(&self) -> serde_json::Map<String, serde_json::Value> {
        convert::to_mapping(self)
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.to_mapping())
    }

    /// Present fields as native values, nested entities flattened.
    #[must_use]
    pub fn flatten(&self) -> Mapping {
        convert::flatten(self)
    }

    // ── Internal mutation ────────────────────────────────────────

    /// Stores an already-adapted value, or unsets on `None`.
    pub(crate) fn put(&mut self, name: &str, adapted: Option<Value>) {
        match adapted {
            Some(value) => {
                self.values.insert(name.to_owned(), value);
            }
            None => {
                self.values.remove(name);
            }
        }
        self.changes.insert(name.to_owned());
    }

    pub(crate) fn put_extra(&mut self, name: &str, raw: Value) {
        if raw.is_null() {
            if self.extras.shift_remove(name).is_none() {
                return;
            }
        } else {
            self.extras.insert(name.to_owned(), raw);
        }
        self.changes.insert(name.to_owned());
    }

    pub(crate) fn values_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.values
    }

    pub(crate) fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    pub(crate) fn mark_changed(&mut self, name: &str) {
        self.changes.insert(name.to_owned());
    }
}

/// Same schema name and identical present fields and extras. Change
/// tracking is ignored.
impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name()
            && self.values == other.values
            && self.extras == other.extras
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} ", self.schema.name())?;
        f.debug_map()
            .entries(self.iter())
            .entries(self.extras.iter().map(|(k, v)| (k.as_str(), v)))
            .finish()?;
        f.write_str(">")
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
