//! Model schema: raw setup types, validation, and the registered-model registry.

pub mod resolved;
pub mod types;
pub mod validator;

pub use resolved::{BaseKind, IdKind, ModelRegistry, RegisteredModel, ResolvedProperty};
pub use types::{
    DefaultFn, ModelDefinition, ModelDefinitionBuilder, ModelOptions, PropertyConfig, PropertyType,
    SetupRequest,
};
pub use validator::resolve_model;
