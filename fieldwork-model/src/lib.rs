//! Declarative entity schemas and field adaptation.
//!
//! A schema is an ordered list of typed [`Field`]s. Every value assigned to
//! an [`Entity`] passes through its field's adapter first, so a present
//! value is always in the canonical form for its kind:
//! - [`FieldKind`]: integer, float, boolean, text, slug, bytes, timestamp,
//!   url, email, custom tags, nested entities and collections
//! - [`AdapterRegistry`]: process-wide table of adapters by kind tag
//! - [`SchemaRegistry`]: declared schemas, used to resolve entity
//!   references by name (including self-references)
//! - [`convert`]: raw mapping to entity and back
//!
//! Instances are sparse: fields never assigned stay absent, and
//! [`Entity::to_mapping`] emits exactly the present ones.
//!
//! ```
//! use fieldwork_model::{EntitySchema, Field};
//! use serde_json::json;
//!
//! let user = EntitySchema::builder("ReadmeUser")
//!     .field(Field::integer("id"))
//!     .field(Field::email("email"))
//!     .field(Field::timestamp("created"))
//!     .build()
//!     .unwrap();
//!
//! let entity = fieldwork_model::Entity::from_json(&user, &json!({"id": "5", "email": "a@b.com"})).unwrap();
//! assert_eq!(entity.to_json(), json!({"id": 5, "email": "a@b.com"}));
//! assert!(entity.get("created").unwrap().is_none());
//! ```

pub mod codec;
mod coerce;
mod collection;
pub mod convert;
pub mod definition;
mod diff;
mod entity;
mod error;
mod field;
mod kind;
mod path;
mod reference;
mod registry;
mod schema;
mod value;

pub use definition::{SchemaDefinition, declare_all};
pub use diff::FieldDiff;
pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use field::{Field, FieldDefault};
pub use kind::{BUILTIN_KINDS, FieldKind};
pub use reference::{EntityRef, SchemaRegistry};
pub use registry::{AdaptFn, AdapterRegistry};
pub use schema::{Alias, EntitySchema, SchemaBuilder};
pub use value::{Mapping, Value};

pub use fieldwork_types::{ByteString, Timestamp};
