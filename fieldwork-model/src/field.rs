//! A single declared attribute of an entity schema.

use crate::error::ModelResult;
use crate::kind::FieldKind;
use crate::schema::EntitySchema;
use crate::Value;
use std::fmt;
use std::sync::Arc;

/// A field's default, applied only when explicitly requested.
#[derive(Clone)]
pub enum FieldDefault {
    /// A raw value, adapted through the field's kind on request.
    Value(Value),
    /// Called on every request, e.g. `Timestamp::now`.
    Factory(fn() -> Value),
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// A named, typed attribute.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    doc: Option<String>,
    default: Option<FieldDefault>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            doc: None,
            default: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn slug(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Slug)
    }

    pub fn bytes(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bytes)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Timestamp)
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Url)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn entity(name: impl Into<String>, schema: &Arc<EntitySchema>) -> Self {
        Self::new(name, FieldKind::entity(schema))
    }

    /// A nested entity field whose schema is looked up by name on first use.
    pub fn entity_named(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, FieldKind::entity_named(entity))
    }

    pub fn collection(name: impl Into<String>, element: FieldKind) -> Self {
        Self::new(name, FieldKind::collection(element))
    }

    /// A field of a custom kind. Fails with `UnknownKind` if no adapter is
    /// registered for `tag`.
    pub fn custom(name: impl Into<String>, tag: &str) -> ModelResult<Self> {
        Ok(Self::new(name, FieldKind::custom(tag)?))
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, raw: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(raw.into()));
        self
    }

    #[must_use]
    pub fn with_default_fn(mut self, factory: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Factory(factory));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    #[must_use]
    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    /// Adapts a raw value through this field's kind. Never mutates `raw`.
    pub fn adapt(&self, raw: &Value) -> ModelResult<Value> {
        self.kind.adapt_at(raw, &self.name)
    }

    /// The adapted default, or `None` when the field declares none.
    pub fn default_value(&self) -> ModelResult<Option<Value>> {
        match &self.default {
            None => Ok(None),
            Some(FieldDefault::Value(raw)) => self.adapt(raw).map(Some),
            Some(FieldDefault::Factory(factory)) => self.adapt(&factory()).map(Some),
        }
    }
}
