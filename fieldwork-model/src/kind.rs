//! Field kinds: the closed set of adaptation rules a field can declare.

use crate::collection;
use crate::convert;
use crate::error::{ModelError, ModelResult};
use crate::reference::EntityRef;
use crate::registry::{AdaptFn, AdapterRegistry};
use crate::schema::EntitySchema;
use crate::{Value, coerce};
use std::sync::Arc;

/// Tags of the built-in scalar kinds, in documentation order.
pub const BUILTIN_KINDS: &[&str] = &[
    "integer",
    "float",
    "boolean",
    "text",
    "slug",
    "bytes",
    "timestamp",
    "url",
    "email",
];

/// How a field adapts raw values.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    Text,
    /// Text normalised to a lowercase, hyphen-separated identifier.
    Slug,
    Bytes,
    Timestamp,
    Url,
    Email,
    /// A kind registered in the [`AdapterRegistry`] by tag.
    Custom { tag: String, adapt: AdaptFn },
    /// A nested entity, declared directly or by name.
    Entity(EntityRef),
    /// An ordered sequence of elements of one kind.
    Collection(Box<FieldKind>),
}

impl FieldKind {
    /// Resolves a tag to a built-in kind, or to a custom kind registered in
    /// the global adapter registry. Fails with `UnknownKind` otherwise.
    pub fn from_tag(tag: &str) -> ModelResult<Self> {
        match Self::builtin(tag) {
            Some(kind) => Ok(kind),
            None => Self::custom(tag),
        }
    }

    /// Looks a custom tag up in the global adapter registry.
    pub fn custom(tag: &str) -> ModelResult<Self> {
        let adapt = AdapterRegistry::global().lookup(tag)?;
        Ok(Self::Custom {
            tag: tag.to_owned(),
            adapt,
        })
    }

    #[must_use]
    pub fn entity(schema: &Arc<EntitySchema>) -> Self {
        Self::Entity(EntityRef::direct(schema))
    }

    /// A nested entity resolved by name on first use.
    #[must_use]
    pub fn entity_named(name: impl Into<String>) -> Self {
        Self::Entity(EntityRef::named(name))
    }

    #[must_use]
    pub fn collection(element: FieldKind) -> Self {
        Self::Collection(Box::new(element))
    }

    pub(crate) fn builtin(tag: &str) -> Option<Self> {
        Some(match tag {
            "integer" => Self::Integer,
            "float" => Self::Float,
            "boolean" => Self::Boolean,
            "text" => Self::Text,
            "slug" => Self::Slug,
            "bytes" => Self::Bytes,
            "timestamp" => Self::Timestamp,
            "url" => Self::Url,
            "email" => Self::Email,
            _ => return None,
        })
    }

    /// The kind's tag. Structural kinds report `entity` and `collection`.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Slug => "slug",
            Self::Bytes => "bytes",
            Self::Timestamp => "timestamp",
            Self::Url => "url",
            Self::Email => "email",
            Self::Custom { tag, .. } => tag,
            Self::Entity(_) => "entity",
            Self::Collection(_) => "collection",
        }
    }

    /// The adapter function for scalar kinds; `None` for structural ones.
    #[must_use]
    pub fn scalar_adapter(&self) -> Option<AdaptFn> {
        let adapt: AdaptFn = match self {
            Self::Integer => coerce::integer,
            Self::Float => coerce::float,
            Self::Boolean => coerce::boolean,
            Self::Text => coerce::text,
            Self::Slug => coerce::slug,
            Self::Bytes => coerce::bytes,
            Self::Timestamp => coerce::timestamp,
            Self::Url => coerce::url,
            Self::Email => coerce::email,
            Self::Custom { adapt, .. } => *adapt,
            Self::Entity(_) | Self::Collection(_) => return None,
        };
        Some(adapt)
    }

    /// The nested schema of an entity kind, resolving deferred references.
    pub fn nested_schema(&self) -> ModelResult<Option<&Arc<EntitySchema>>> {
        match self {
            Self::Entity(reference) => reference.resolve().map(Some),
            _ => Ok(None),
        }
    }

    /// Adapts `raw`, reporting failures at `path`.
    pub fn adapt_at(&self, raw: &Value, path: &str) -> ModelResult<Value> {
        match self {
            Self::Entity(reference) => convert::adapt_entity(reference.resolve()?, raw, path),
            Self::Collection(element) => collection::adapt_collection(element, raw, path),
            scalar => match scalar.scalar_adapter() {
                Some(adapt) => adapt(raw).map_err(|reason| ModelError::adaptation(path, raw, reason)),
                None => Err(ModelError::UnknownKind {
                    kind: scalar.tag().to_owned(),
                }),
            },
        }
    }
}
