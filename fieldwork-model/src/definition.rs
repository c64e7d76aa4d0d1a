//! Schema definition documents.
//!
//! Schemas can be declared from JSON instead of code:
//!
//! ```json
//! [
//!   { "name": "Bookmark", "fields": [
//!       { "name": "uri", "kind": "url" },
//!       { "name": "verified", "kind": "boolean" } ] },
//!   { "name": "User", "fields": [
//!       { "name": "id", "kind": "integer" },
//!       { "name": "bookmarks", "kind": { "collection": { "entity": "Bookmark" } } } ] }
//! ]
//! ```
//!
//! Nested entities refer to each other by name, so definitions may appear
//! in any order. A definition that `extends` another is declared once its
//! parent is.

use crate::error::{ModelError, ModelResult};
use crate::field::{Field, FieldDefault};
use crate::kind::FieldKind;
use crate::reference::SchemaRegistry;
use crate::schema::{EntitySchema, SchemaBuilder};
use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A declarative description of one entity schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flexible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<AliasDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: KindDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasDefinition {
    pub name: String,
    pub target: String,
}

/// A field kind: a tag (`"integer"`, `"url"`, a custom tag), a nested
/// entity by name, or a collection of another kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindDefinition {
    Tag(String),
    Entity { entity: String },
    Collection { collection: Box<KindDefinition> },
}

impl KindDefinition {
    pub fn to_kind(&self) -> ModelResult<FieldKind> {
        match self {
            Self::Tag(tag) => FieldKind::from_tag(tag),
            Self::Entity { entity } => Ok(FieldKind::entity_named(entity)),
            Self::Collection { collection } => Ok(FieldKind::collection(collection.to_kind()?)),
        }
    }
}

impl From<&FieldKind> for KindDefinition {
    fn from(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Entity(reference) => Self::Entity {
                entity: reference.name().to_owned(),
            },
            FieldKind::Collection(element) => Self::Collection {
                collection: Box::new(Self::from(element.as_ref())),
            },
            scalar => Self::Tag(scalar.tag().to_owned()),
        }
    }
}

impl FieldDefinition {
    /// Builds the field. A static default is adapted once here so a bad
    /// default fails at declaration time.
    pub fn to_field(&self) -> ModelResult<Field> {
        if self.name.is_empty() {
            return Err(ModelError::Definition("field name is empty".into()));
        }
        let mut field = Field::new(&self.name, self.kind.to_kind()?);
        if let Some(doc) = &self.doc {
            field = field.with_doc(doc);
        }
        if let Some(default) = &self.default {
            field = field.with_default(Value::from(default));
            field.default_value()?;
        }
        Ok(field)
    }
}

impl SchemaDefinition {
    /// Parses a JSON document holding one definition or an array of them.
    pub fn parse_many(json: &str) -> ModelResult<Vec<Self>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Many(Vec<SchemaDefinition>),
            One(SchemaDefinition),
        }

        let document: Document = serde_json::from_str(json)?;
        match document {
            Document::Many(definitions) => Ok(definitions),
            Document::One(definition) => Ok(vec![definition]),
        }
    }

    /// A builder for this definition. The parent named by `extends` must
    /// already be declared.
    pub fn to_builder(&self) -> ModelResult<SchemaBuilder> {
        let parent = match &self.extends {
            Some(parent) => Some(SchemaRegistry::global().get(parent).ok_or_else(|| {
                ModelError::UnresolvedReference {
                    name: parent.clone(),
                }
            })?),
            None => None,
        };
        self.builder_with(parent.as_deref())
    }

    fn builder_with(&self, parent: Option<&EntitySchema>) -> ModelResult<SchemaBuilder> {
        if self.name.is_empty() {
            return Err(ModelError::Definition("schema name is empty".into()));
        }
        let mut builder = EntitySchema::builder(&self.name);
        if let Some(parent) = parent {
            builder = builder.extends(parent);
        }
        if let Some(doc) = &self.doc {
            builder = builder.doc(doc);
        }
        for field in &self.fields {
            builder = builder.field(field.to_field()?);
        }
        for alias in &self.aliases {
            builder = builder.alias(&alias.name, &alias.target);
        }
        if self.flexible {
            builder = builder.flexible();
        }
        Ok(builder)
    }

    /// Builds and registers the schema.
    pub fn declare(&self) -> ModelResult<Arc<EntitySchema>> {
        self.to_builder()?.declare()
    }
}

/// Declares every definition, parents before the schemas extending them.
///
/// All schemas are built before any is registered, so a failing batch
/// leaves the registry as it was. A parent is looked up in the batch first,
/// then in the registry. Returns the schemas in input order; fails with
/// `UnresolvedReference` when a parent is found in neither.
pub fn declare_all(definitions: &[SchemaDefinition]) -> ModelResult<Vec<Arc<EntitySchema>>> {
    let registry = SchemaRegistry::global();
    let mut built: Vec<Option<Arc<EntitySchema>>> = vec![None; definitions.len()];
    let mut by_name: HashMap<&str, Arc<EntitySchema>> = HashMap::new();

    loop {
        let mut progressed = false;
        for (slot, definition) in built.iter_mut().zip(definitions) {
            if slot.is_some() {
                continue;
            }
            let parent = match definition.extends.as_deref() {
                None => None,
                Some(name) => match by_name.get(name).cloned().or_else(|| registry.get(name)) {
                    Some(parent) => Some(parent),
                    // Parent not built yet; retry on the next pass.
                    None => continue,
                },
            };
            let schema = definition.builder_with(parent.as_deref())?.build()?;
            by_name.insert(definition.name.as_str(), Arc::clone(&schema));
            *slot = Some(schema);
            progressed = true;
        }
        if !progressed {
            break;
        }
    }

    if let Some(pending) = built
        .iter()
        .zip(definitions)
        .find_map(|(slot, definition)| slot.is_none().then_some(definition))
    {
        return Err(ModelError::UnresolvedReference {
            name: pending.extends.clone().unwrap_or_default(),
        });
    }

    let schemas: Vec<Arc<EntitySchema>> = built.into_iter().flatten().collect();
    registry.register_all(&schemas)?;
    debug!(schemas = schemas.len(), "Declared schema definitions");
    Ok(schemas)
}

impl From<&EntitySchema> for SchemaDefinition {
    /// Describes a schema with inherited fields inlined.
    fn from(schema: &EntitySchema) -> Self {
        Self {
            name: schema.name().to_owned(),
            extends: None,
            flexible: schema.is_flexible(),
            doc: schema.doc().map(str::to_owned),
            fields: schema
                .fields()
                .iter()
                .map(|field| FieldDefinition {
                    name: field.name().to_owned(),
                    kind: KindDefinition::from(field.kind()),
                    doc: field.doc().map(str::to_owned),
                    default: match field.default() {
                        Some(FieldDefault::Value(raw)) => Some(raw.to_json()),
                        Some(FieldDefault::Factory(_)) | None => None,
                    },
                })
                .collect(),
            aliases: schema
                .aliases()
                .iter()
                .map(|alias| AliasDefinition {
                    name: alias.name().to_owned(),
                    target: alias.target().to_owned(),
                })
                .collect(),
        }
    }
}
