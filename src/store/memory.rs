//! Volatile record store: one table per model, rows keyed by generated ids.

use crate::schema::IdKind;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("model '{0}' is not registered with the memory store")]
    UnknownModel(String),
    #[error("duplicate id {id} for model '{model}'")]
    DuplicateId { model: String, id: String },
    #[error("memory store lock poisoned")]
    Poisoned,
}

/// Record key. Numbers sort before text so listings stay deterministic even
/// when a table mixes generated and client-chosen ids.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl RecordId {
    pub fn as_value(&self) -> Value {
        match self {
            RecordId::Number(n) => Value::Number((*n).into()),
            RecordId::Text(s) => Value::String(s.clone()),
        }
    }

    /// Id carried in a JSON body. Anything but an unsigned integer or a
    /// non-empty string is unusable as a key.
    pub fn from_value(value: &Value) -> Option<RecordId> {
        match value {
            Value::Number(n) => n.as_u64().map(RecordId::Number),
            Value::String(s) if !s.is_empty() => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }

    /// Id taken from a URL path segment, typed by the model's id kind.
    pub fn parse(raw: &str, kind: IdKind) -> Option<RecordId> {
        match kind {
            IdKind::Auto => raw.parse().ok().map(RecordId::Number),
            IdKind::Uuid => (!raw.is_empty()).then(|| RecordId::Text(raw.to_string())),
        }
    }

    pub fn matches_kind(&self, kind: IdKind) -> bool {
        matches!(
            (self, kind),
            (RecordId::Number(_), IdKind::Auto) | (RecordId::Text(_), IdKind::Uuid)
        )
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

struct ModelTable {
    next_id: u64,
    rows: BTreeMap<RecordId, Value>,
}

impl ModelTable {
    fn new() -> ModelTable {
        ModelTable { next_id: 1, rows: BTreeMap::new() }
    }
}

/// In-memory tables for every model attached to the memory connector.
/// Dropped wholesale when its session is replaced.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, ModelTable>>,
}

impl MemoryStore {
    pub fn new<'a>(models: impl IntoIterator<Item = &'a str>) -> MemoryStore {
        let tables = models
            .into_iter()
            .map(|model| (model.to_string(), ModelTable::new()))
            .collect();
        MemoryStore { tables: RwLock::new(tables) }
    }

    /// Insert a record, generating an id unless the body carried one. A
    /// numeric id bumps the sequence past itself; the sequence saturates at
    /// the top of the id space, and a create never overwrites an existing
    /// row.
    pub fn create(
        &self,
        model: &str,
        explicit_id: Option<RecordId>,
        mut record: Map<String, Value>,
        id_property: &str,
        id_kind: IdKind,
    ) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let table = tables
            .get_mut(model)
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;

        let id = match explicit_id {
            Some(id) => id,
            None => match id_kind {
                IdKind::Auto => RecordId::Number(table.next_id),
                IdKind::Uuid => RecordId::Text(uuid::Uuid::new_v4().to_string()),
            },
        };
        if table.rows.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                model: model.to_string(),
                id: id.to_string(),
            });
        }
        if let RecordId::Number(n) = id {
            table.next_id = table.next_id.max(n.saturating_add(1));
        }

        record.insert(id_property.to_string(), id.as_value());
        let stored = Value::Object(record);
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    /// Snapshot of every row, in id order.
    pub fn all(&self, model: &str) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        let table = tables
            .get(model)
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;
        Ok(table.rows.values().cloned().collect())
    }

    pub fn find(&self, model: &str, id: &RecordId) -> Result<Option<Value>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        let table = tables
            .get(model)
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;
        Ok(table.rows.get(id).cloned())
    }

    /// Attribute merge into an existing row. The id property is immutable.
    pub fn update(
        &self,
        model: &str,
        id: &RecordId,
        patch: Map<String, Value>,
        id_property: &str,
    ) -> Result<Option<Value>, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let table = tables
            .get_mut(model)
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;
        let Some(row) = table.rows.get_mut(id) else {
            return Ok(None);
        };
        if let Value::Object(fields) = row {
            for (key, value) in patch {
                if key != id_property {
                    fields.insert(key, value);
                }
            }
        }
        Ok(Some(row.clone()))
    }

    pub fn remove(&self, model: &str, id: &RecordId) -> Result<Option<Value>, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let table = tables
            .get_mut(model)
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;
        Ok(table.rows.remove(id))
    }

    pub fn exists(&self, model: &str, id: &RecordId) -> Result<bool, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        let table = tables
            .get(model)
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;
        Ok(table.rows.contains_key(id))
    }
}
