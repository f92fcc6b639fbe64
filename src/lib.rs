//! Single-session test harness. Browser suites POST model definitions to
//! /setup; the harness builds an in-memory REST backend from them, generates
//! an AngularJS services script describing it, and serves both until the next
//! setup replaces the session wholesale.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod extractors;
pub mod generator;
pub mod handlers;
pub mod routes;
pub mod schema;
pub mod server;
pub mod service;
pub mod session;
pub mod state;
pub mod store;

pub use backend::{Backend, BackendBuilder, BackendCore, DataSourceConfig};
pub use config::HarnessConfig;
pub use error::{AppError, SchemaError};
pub use generator::{services_script, GeneratorError, ERROR_SCRIPT};
pub use routes::harness_routes;
pub use schema::{ModelDefinition, PropertyConfig, PropertyType, SetupRequest};
pub use server::HarnessServer;
pub use service::CrudService;
pub use session::{Session, SessionHandle};
pub use state::HarnessState;
pub use store::{MailConnector, MemoryStore, RecordId};
