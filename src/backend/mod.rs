//! Backend factory: assemble a runnable REST API from model definitions and
//! attached data sources.

pub mod handlers;
pub mod routes;

use crate::error::AppError;
use crate::schema::{resolve_model, BaseKind, ModelDefinition, ModelRegistry, RegisteredModel};
use crate::store::{ConnectorKind, MailConnector, MemoryStore};
use axum::extract::Request;
use axum::response::Response;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

pub const DB_DATA_SOURCE: &str = "db";
pub const MAIL_DATA_SOURCE: &str = "mail";

/// Model class a data source is the default home for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSourceType {
    Db,
    Mail,
}

#[derive(Clone, Copy, Debug)]
pub struct DataSourceConfig {
    pub connector: ConnectorKind,
    pub default_for: DataSourceType,
}

impl DataSourceConfig {
    pub fn memory() -> DataSourceConfig {
        DataSourceConfig { connector: ConnectorKind::Memory, default_for: DataSourceType::Db }
    }

    pub fn mail() -> DataSourceConfig {
        DataSourceConfig { connector: ConnectorKind::Mail, default_for: DataSourceType::Mail }
    }
}

/// Everything the model handlers need at request time.
pub struct BackendCore {
    pub registry: ModelRegistry,
    pub store: MemoryStore,
    pub mail: MailConnector,
    pub auth_enabled: bool,
}

/// A mounted backend: shared core plus the router serving its model API.
#[derive(Clone)]
pub struct Backend {
    core: Arc<BackendCore>,
    router: Router,
}

impl Backend {
    pub fn builder() -> BackendBuilder {
        BackendBuilder {
            data_sources: HashMap::new(),
            models: Vec::new(),
            auth: false,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.core.registry
    }

    pub fn core(&self) -> &Arc<BackendCore> {
        &self.core
    }

    /// Drive one request through the backend's router.
    pub async fn handle(&self, request: Request) -> Response {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        }
    }
}

pub struct BackendBuilder {
    data_sources: HashMap<String, DataSourceConfig>,
    models: Vec<(String, ModelDefinition)>,
    auth: bool,
}

impl BackendBuilder {
    /// Attach a named data source. Attaching the same name again replaces it.
    pub fn attach_data_source(mut self, name: &str, config: DataSourceConfig) -> Self {
        self.data_sources.insert(name.to_string(), config);
        self
    }

    /// Queue a model for registration. Definitions are resolved at mount, so
    /// registration order never hides errors.
    pub fn register_model(mut self, name: &str, definition: ModelDefinition) -> Self {
        self.models.push((name.to_string(), definition));
        self
    }

    /// Turn on the auth subsystem: built-in models plus access control.
    pub fn enable_auth(mut self) -> Self {
        self.auth = true;
        self
    }

    /// Resolve every definition and produce a mounted backend rooted at
    /// `root_path` ("/" mounts the model API at the router root).
    pub fn mount(mut self, root_path: &str) -> Result<Backend, AppError> {
        if self.auth {
            for (name, definition) in crate::auth::builtin_models() {
                if self.models.iter().any(|(existing, _)| existing == name) {
                    tracing::debug!(model = name, "client definition shadows built-in model");
                    continue;
                }
                self.models.push((name.to_string(), definition));
            }
        }

        let mut registry = ModelRegistry::default();
        for (name, definition) in &self.models {
            let model = self.resolve(name, definition)?;
            tracing::debug!(model = %model.name, source = %model.data_source, "registering model");
            registry.insert(model)?;
        }

        let memory_models: Vec<String> = registry
            .iter()
            .filter(|model| model.connector == ConnectorKind::Memory)
            .map(|model| model.name.clone())
            .collect();
        let core = Arc::new(BackendCore {
            store: MemoryStore::new(memory_models.iter().map(String::as_str)),
            mail: MailConnector::new(),
            auth_enabled: self.auth,
            registry,
        });

        let router = routes::model_routes(core.clone());
        let router = if root_path == "/" || root_path.is_empty() {
            router
        } else {
            Router::new().nest(root_path, router)
        };
        Ok(Backend { core, router })
    }

    fn resolve(&self, name: &str, definition: &ModelDefinition) -> Result<RegisteredModel, AppError> {
        let source_name = match &definition.data_source {
            Some(source) => source.clone(),
            None => self.default_source_for(definition),
        };
        let config = self.data_sources.get(&source_name).ok_or_else(|| {
            crate::error::SchemaError::UnknownDataSource {
                model: name.to_string(),
                data_source: source_name.clone(),
            }
        })?;
        Ok(resolve_model(name, definition, &source_name, config.connector)?)
    }

    /// Models without an explicit source land on the attachment marked
    /// default for their class: mail-based models on the mail default,
    /// everything else on the db default.
    fn default_source_for(&self, definition: &ModelDefinition) -> String {
        let wanted = match definition.base_kind() {
            BaseKind::Email => DataSourceType::Mail,
            _ => DataSourceType::Db,
        };
        self.data_sources
            .iter()
            .find(|(_, config)| config.default_for == wanted)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| DB_DATA_SOURCE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use serde_json::json;

    fn definition(value: serde_json::Value) -> ModelDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn builder() -> BackendBuilder {
        Backend::builder()
            .attach_data_source(DB_DATA_SOURCE, DataSourceConfig::memory())
            .attach_data_source(MAIL_DATA_SOURCE, DataSourceConfig::mail())
    }

    #[test]
    fn models_default_to_the_source_matching_their_class() {
        let backend = builder()
            .register_model("Customer", definition(json!({ "properties": {} })))
            .register_model("Notice", definition(json!({ "base": "Email", "properties": {} })))
            .mount("/")
            .unwrap();
        let customer = backend.registry().by_path("Customer").unwrap();
        assert_eq!(customer.connector, ConnectorKind::Memory);
        assert_eq!(customer.data_source, "db");
        let notice = backend.registry().by_path("Notice").unwrap();
        assert_eq!(notice.connector, ConnectorKind::Mail);
    }

    #[test]
    fn unknown_data_source_fails_the_mount() {
        let result = builder()
            .register_model("Customer", definition(json!({ "dataSource": "redis" })))
            .mount("/");
        match result {
            Err(AppError::Schema(SchemaError::UnknownDataSource { model, data_source })) => {
                assert_eq!(model, "Customer");
                assert_eq!(data_source, "redis");
                let rendered = SchemaError::UnknownDataSource { model, data_source }.to_string();
                assert_eq!(rendered, "model 'Customer' references unknown data source 'redis'");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("mount accepted an unknown data source"),
        }
    }

    #[test]
    fn an_explicit_data_source_overrides_the_class_default() {
        let backend = builder()
            .register_model("Audit", ModelDefinition::builder().data_source(MAIL_DATA_SOURCE).build())
            .mount("/")
            .unwrap();
        let audit = backend.registry().by_path("Audit").unwrap();
        assert_eq!(audit.connector, ConnectorKind::Mail);
        assert_eq!(audit.data_source, "mail");
    }

    #[test]
    fn enable_auth_registers_the_builtin_models() {
        let backend = builder().enable_auth().mount("/").unwrap();
        for name in ["User", "AccessToken", "Email"] {
            assert!(backend.registry().by_path(name).is_some(), "missing {}", name);
        }
        assert!(backend.core().auth_enabled);
    }

    #[test]
    fn client_definition_wins_over_the_builtin() {
        let backend = builder()
            .register_model("User", definition(json!({ "properties": { "nickname": "string" } })))
            .enable_auth()
            .mount("/")
            .unwrap();
        let user = backend.registry().by_path("User").unwrap();
        assert!(user.property("nickname").is_some());
        assert!(!user.is_user_base());
        assert_eq!(backend.registry().len(), 3);
    }

    #[test]
    fn duplicate_registrations_fail_the_mount() {
        let result = builder()
            .register_model("Customer", ModelDefinition::default())
            .register_model("Customer", ModelDefinition::default())
            .mount("/");
        assert!(matches!(
            result,
            Err(AppError::Schema(SchemaError::DuplicateModel(_)))
        ));
    }
}
