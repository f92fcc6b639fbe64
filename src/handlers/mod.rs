//! Harness endpoints: setup, the services script, and the API gateway.

pub mod gateway;
pub mod services;
pub mod setup;

pub use gateway::gateway;
pub use services::services;
pub use setup::{setup, SetupResponse};
