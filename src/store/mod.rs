//! Data sources backing a session: the volatile record store and the stub
//! mail connector.

mod mail;
mod memory;

pub use mail::MailConnector;
pub use memory::{MemoryStore, RecordId, StoreError};

/// Engine behind an attached data source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectorKind {
    Memory,
    Mail,
}
