//! Stub mail connector: records outbound messages instead of delivering them.

use crate::store::StoreError;
use serde_json::{Map, Value};
use std::sync::RwLock;

#[derive(Default)]
pub struct MailConnector {
    outbox: RwLock<Vec<Value>>,
}

impl MailConnector {
    pub fn new() -> MailConnector {
        MailConnector::default()
    }

    /// Record a message, stamping an id and a sentAt timestamp.
    pub fn send(&self, mut message: Map<String, Value>) -> Result<Value, StoreError> {
        let mut outbox = self.outbox.write().map_err(|_| StoreError::Poisoned)?;
        message.insert("id".to_string(), Value::Number(((outbox.len() + 1) as u64).into()));
        message.insert(
            "sentAt".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        let stored = Value::Object(message);
        outbox.push(stored.clone());
        Ok(stored)
    }

    /// Everything sent so far, oldest first.
    pub fn outbox(&self) -> Result<Vec<Value>, StoreError> {
        Ok(self.outbox.read().map_err(|_| StoreError::Poisoned)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_stamps_id_and_timestamp() {
        let mail = MailConnector::new();
        let message = json!({ "to": "ada@example.com", "subject": "hi" });
        let stored = mail.send(message.as_object().unwrap().clone()).unwrap();
        assert_eq!(stored["id"], json!(1));
        assert_eq!(stored["to"], json!("ada@example.com"));
        let sent_at = stored["sentAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(sent_at).is_ok());
    }

    #[test]
    fn outbox_accumulates_in_send_order() {
        let mail = MailConnector::new();
        for subject in ["first", "second"] {
            let message = json!({ "subject": subject });
            mail.send(message.as_object().unwrap().clone()).unwrap();
        }
        let outbox = mail.outbox().unwrap();
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox[0]["subject"], json!("first"));
        assert_eq!(outbox[1]["id"], json!(2));
    }
}
