//! Route assembly for the harness server.

mod common;
mod harness;

pub use common::common_routes;
pub use harness::harness_routes;
