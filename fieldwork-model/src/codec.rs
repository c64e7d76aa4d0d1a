//! JSON and CSV boundary codecs.
//!
//! These only move text in and out of [`Value`] trees; every coercion
//! happens in the structural converter.

use crate::error::ModelResult;
use crate::schema::EntitySchema;
use crate::{Entity, Mapping, Value};
use std::io;
use std::sync::Arc;

/// Decodes one JSON object into an entity.
pub fn from_json_str(schema: &Arc<EntitySchema>, json: &str) -> ModelResult<Entity> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    Entity::from_json(schema, &raw)
}

/// Decodes a JSON object or an array of objects. Stops at the first record
/// that fails.
pub fn from_json_str_many(schema: &Arc<EntitySchema>, json: &str) -> ModelResult<Vec<Entity>> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    match raw {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| Entity::from_json(schema, item))
            .collect(),
        other => Entity::from_json(schema, &other).map(|entity| vec![entity]),
    }
}

pub fn to_json_string(entity: &Entity) -> ModelResult<String> {
    Ok(serde_json::to_string(&entity.to_json())?)
}

pub fn to_json_string_pretty(entity: &Entity) -> ModelResult<String> {
    Ok(serde_json::to_string_pretty(&entity.to_json())?)
}

/// Converts one CSV row into a text mapping keyed by header. Empty cells
/// are left out so they read as unset rather than as `""`.
#[must_use]
pub fn row_mapping(headers: &csv::StringRecord, row: &csv::StringRecord) -> Mapping {
    headers
        .iter()
        .zip(row.iter())
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(header, cell)| (header.to_owned(), Value::Text(cell.to_owned())))
        .collect()
}

/// Iterates the rows of a headed CSV document as entities.
///
/// A row that fails to parse or adapt yields an `Err` for that row only;
/// iteration continues with the next one.
pub struct CsvRecords<R> {
    schema: Arc<EntitySchema>,
    headers: csv::StringRecord,
    rows: csv::StringRecordsIntoIter<R>,
}

impl<R: io::Read> CsvRecords<R> {
    /// Reads the header row of `reader`.
    pub fn new(schema: &Arc<EntitySchema>, mut reader: csv::Reader<R>) -> ModelResult<Self> {
        let headers = reader.headers()?.clone();
        Ok(Self {
            schema: Arc::clone(schema),
            headers,
            rows: reader.into_records(),
        })
    }

    /// Wraps a byte source with trimmed, headed CSV defaults.
    pub fn from_reader(schema: &Arc<EntitySchema>, source: R) -> ModelResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source);
        Self::new(schema, reader)
    }

    #[must_use]
    pub fn headers(&self) -> &csv::StringRecord {
        &self.headers
    }
}

impl<R: io::Read> Iterator for CsvRecords<R> {
    type Item = ModelResult<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e.into())),
        };
        let raw = row_mapping(&self.headers, &row);
        Some(Entity::from_mapping(&self.schema, &raw))
    }
}
