//! Error types for schema declaration, adaptation and conversion.

use crate::Value;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Longest rendering of an offending raw value kept in an error message.
const MAX_RAW_CHARS: usize = 80;

/// Errors that can occur while declaring schemas or adapting values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A raw value could not be coerced to its field's kind.
    #[error("cannot adapt {raw} at `{path}`: {reason}")]
    Adaptation {
        path: String,
        raw: String,
        reason: String,
    },

    /// A field name that the schema does not declare.
    #[error("unknown field `{name}` on entity `{entity}`")]
    UnknownField { entity: String, name: String },

    /// Two fields (or a field and an alias) share a name.
    #[error("duplicate field `{name}` on entity `{entity}`")]
    DuplicateField { entity: String, name: String },

    /// A deferred entity reference names a schema that was never declared.
    #[error("unresolved entity reference: {name}")]
    UnresolvedReference { name: String },

    /// A field kind tag with no registered adapter.
    #[error("no adapter registered for kind `{kind}`")]
    UnknownKind { kind: String },

    /// A different adapter is already registered under this kind tag.
    #[error("a different adapter is already registered for kind `{kind}`")]
    ConflictingAdapter { kind: String },

    /// An entity schema with this name is already declared.
    #[error("entity `{name}` is already declared")]
    DuplicateEntity { name: String },

    /// A dotted path walked through an unset nested entity.
    #[error("`{path}` is unset")]
    UnsetParent { path: String },

    /// A dotted path walked through a field that does not hold an entity.
    #[error("`{path}` is not an entity field")]
    NotAnEntity { path: String },

    /// An element operation on a field that is not a collection.
    #[error("`{path}` is not a collection field")]
    NotACollection { path: String },

    /// An element index past the end of a collection.
    #[error("index {index} out of range for `{path}` (len {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// Conversion input was not a mapping.
    #[error("expected a mapping, found {found}")]
    NotAMapping { found: String },

    /// A schema definition document is malformed.
    #[error("invalid schema definition: {0}")]
    Definition(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ModelError {
    pub(crate) fn adaptation(path: &str, raw: &Value, reason: impl Into<String>) -> Self {
        Self::Adaptation {
            path: path.to_owned(),
            raw: describe(raw),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_field(entity: &str, name: &str) -> Self {
        Self::UnknownField {
            entity: entity.to_owned(),
            name: name.to_owned(),
        }
    }

    /// Prefixes the path of an adaptation error with the path of the
    /// entity it was raised inside.
    pub(crate) fn under(self, base: Option<&str>) -> Self {
        match (self, base) {
            (Self::Adaptation { path, raw, reason }, Some(base)) => Self::Adaptation {
                path: format!("{base}.{path}"),
                raw,
                reason,
            },
            (other, _) => other,
        }
    }

    /// The field path an error refers to, when it has one.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Adaptation { path, .. }
            | Self::UnsetParent { path }
            | Self::NotAnEntity { path }
            | Self::NotACollection { path }
            | Self::IndexOutOfRange { path, .. } => Some(path),
            Self::UnknownField { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn describe(raw: &Value) -> String {
    let text = raw.to_string();
    if text.chars().count() > MAX_RAW_CHARS {
        let head: String = text.chars().take(MAX_RAW_CHARS).collect();
        format!("{head}…")
    } else {
        text
    }
}
