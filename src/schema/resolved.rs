//! Registered models: definitions validated and flattened for request-time use.

use crate::error::SchemaError;
use crate::store::ConnectorKind;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Behavior class a model inherits from its declared base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseKind {
    /// Plain persisted model.
    Model,
    /// Credentialed principal: hashed password, login and logout.
    User,
    /// Token rows minted by login; never exposed over the API once auth is on.
    AccessToken,
    /// Outbound mail; routed to the mail connector.
    Email,
}

impl BaseKind {
    pub fn parse(base: Option<&str>) -> BaseKind {
        match base {
            Some("User") => BaseKind::User,
            Some("AccessToken") => BaseKind::AccessToken,
            Some("Email") | Some("Mail") => BaseKind::Email,
            _ => BaseKind::Model,
        }
    }
}

/// How ids are produced when a create omits one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdKind {
    /// Sequential numbers handed out by the store, starting at 1.
    Auto,
    /// String ids; a fresh UUIDv4 when the client does not pick one.
    Uuid,
}

/// One property after validation. The pattern is compiled once here so
/// request-time checks never re-parse it.
#[derive(Clone, Debug)]
pub struct ResolvedProperty {
    pub name: String,
    pub ty: crate::schema::PropertyType,
    pub required: bool,
    pub default: Option<serde_json::Value>,
    pub default_fn: Option<crate::schema::DefaultFn>,
    pub is_id: bool,
    pub pattern: Option<regex::Regex>,
    pub max_length: Option<u32>,
    pub min_length: Option<u32>,
}

/// A model ready to serve: resolved properties, id scheme, connector wiring.
#[derive(Clone, Debug)]
pub struct RegisteredModel {
    pub name: String,
    /// REST path segment under the backend root; the model name verbatim.
    pub path_segment: String,
    pub base: BaseKind,
    pub connector: ConnectorKind,
    /// Name of the data source the model is attached to.
    pub data_source: String,
    pub id_property: String,
    pub id_kind: IdKind,
    pub strict: bool,
    pub properties: Vec<ResolvedProperty>,
    /// Properties stripped from every response body.
    pub sensitive: HashSet<String>,
}

impl RegisteredModel {
    pub fn property(&self, name: &str) -> Option<&ResolvedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn is_user_base(&self) -> bool {
        self.base == BaseKind::User
    }
}

/// All models of one mounted backend, addressable by path segment.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: Vec<Arc<RegisteredModel>>,
    by_path: HashMap<String, Arc<RegisteredModel>>,
}

impl ModelRegistry {
    pub fn insert(&mut self, model: RegisteredModel) -> Result<(), SchemaError> {
        if self.by_path.contains_key(&model.path_segment) {
            return Err(SchemaError::DuplicateModel(model.name));
        }
        let model = Arc::new(model);
        self.by_path.insert(model.path_segment.clone(), model.clone());
        self.models.push(model);
        Ok(())
    }

    pub fn by_path(&self, path: &str) -> Option<&Arc<RegisteredModel>> {
        self.by_path.get(path)
    }

    /// Models in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RegisteredModel>> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
