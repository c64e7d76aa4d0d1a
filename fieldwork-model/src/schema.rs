use crate::error::{ModelError, ModelResult};
use crate::field::Field;
use crate::reference::SchemaRegistry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A non-serialized accessor that reads and writes another field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    name: String,
    target: String,
}

impl Alias {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path of the aliased field, e.g. `pos.top`.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// The ordered set of fields defining a named entity type.
///
/// Built once through [`SchemaBuilder`] and shared behind an `Arc`.
pub struct EntitySchema {
    name: String,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    aliases: Vec<Alias>,
    flexible: bool,
    doc: Option<String>,
}

impl EntitySchema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order (inherited fields first).
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Field::name)
    }

    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|alias| alias.name == name)
    }

    #[must_use]
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Whether unknown keys are kept as extras instead of being ignored.
    #[must_use]
    pub fn is_flexible(&self) -> bool {
        self.flexible
    }

    /// True for declared fields and aliases.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name) || self.alias(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn require_field(&self, name: &str) -> ModelResult<&Field> {
        self.field(name)
            .ok_or_else(|| ModelError::unknown_field(&self.name, name))
    }
}

impl fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("name", &self.name)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .field("flexible", &self.flexible)
            .finish()
    }
}

/// Declares an [`EntitySchema`].
///
/// ```
/// use fieldwork_model::{EntitySchema, Field};
///
/// let user = EntitySchema::builder("DocUser")
///     .field(Field::integer("id"))
///     .field(Field::email("email"))
///     .build()
///     .unwrap();
/// assert_eq!(user.field_names().collect::<Vec<_>>(), ["id", "email"]);
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    inherited: Vec<Field>,
    fields: Vec<Field>,
    inherited_aliases: Vec<Alias>,
    aliases: Vec<Alias>,
    flexible: bool,
    doc: Option<String>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherited: Vec::new(),
            fields: Vec::new(),
            inherited_aliases: Vec::new(),
            aliases: Vec::new(),
            flexible: false,
            doc: None,
        }
    }

    /// Inherits every field and alias of `parent`, ahead of the fields
    /// declared on this builder. Flexibility is inherited too.
    #[must_use]
    pub fn extends(mut self, parent: &EntitySchema) -> Self {
        self.inherited.extend(parent.fields.iter().cloned());
        self.inherited_aliases.extend(parent.aliases.iter().cloned());
        self.flexible |= parent.flexible;
        self
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn alias(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.push(Alias {
            name: name.into(),
            target: target.into(),
        });
        self
    }

    /// Documentation for the schema. Not inherited by `extends`.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Keep unknown keys as extras.
    #[must_use]
    pub fn flexible(mut self) -> Self {
        self.flexible = true;
        self
    }

    /// Builds the schema without registering it.
    ///
    /// Fails with `DuplicateField` when two fields or aliases share a name,
    /// and with `UnknownField` when an alias targets an undeclared field.
    pub fn build(self) -> ModelResult<Arc<EntitySchema>> {
        let fields: Vec<Field> = self.inherited.into_iter().chain(self.fields).collect();

        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if index.insert(field.name().to_owned(), position).is_some() {
                return Err(ModelError::DuplicateField {
                    entity: self.name,
                    name: field.name().to_owned(),
                });
            }
        }

        let aliases: Vec<Alias> = self
            .inherited_aliases
            .into_iter()
            .chain(self.aliases)
            .collect();
        for (position, alias) in aliases.iter().enumerate() {
            let taken = index.contains_key(&alias.name)
                || aliases[..position].iter().any(|a| a.name == alias.name);
            if taken {
                return Err(ModelError::DuplicateField {
                    entity: self.name,
                    name: alias.name.clone(),
                });
            }
            let head = alias.target.split('.').next().unwrap_or_default();
            let head = head.strip_suffix('?').unwrap_or(head);
            if !index.contains_key(head) {
                return Err(ModelError::unknown_field(&self.name, head));
            }
        }

        debug!(entity = %self.name, fields = fields.len(), aliases = aliases.len(), "Built entity schema");
        Ok(Arc::new(EntitySchema {
            name: self.name,
            fields,
            index,
            aliases,
            flexible: self.flexible,
            doc: self.doc,
        }))
    }

    /// Builds the schema and registers it in the global schema registry so
    /// named references can resolve to it.
    pub fn declare(self) -> ModelResult<Arc<EntitySchema>> {
        let schema = self.build()?;
        SchemaRegistry::global().register(Arc::clone(&schema))?;
        Ok(schema)
    }
}
