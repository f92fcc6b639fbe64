//! The single live session: a configured backend plus its generated script.

use crate::backend::Backend;
use crate::error::AppError;
use std::sync::{Arc, RwLock};

pub struct Session {
    pub name: String,
    pub backend: Backend,
    pub script: String,
}

/// Shared handle to the current session. A whole session swaps in atomically
/// on each successful setup, so readers never see a backend from one setup
/// paired with a script from another.
#[derive(Clone, Default)]
pub struct SessionHandle {
    current: Arc<RwLock<Option<Arc<Session>>>>,
}

impl SessionHandle {
    pub fn new() -> SessionHandle {
        SessionHandle::default()
    }

    /// Install a new session, discarding any previous one and its data.
    pub fn replace(&self, session: Session) -> Result<(), AppError> {
        let mut guard = self.current.write().map_err(|_| AppError::lock_poisoned("session"))?;
        *guard = Some(Arc::new(session));
        Ok(())
    }

    pub fn current(&self) -> Result<Option<Arc<Session>>, AppError> {
        Ok(self.current.read().map_err(|_| AppError::lock_poisoned("session"))?.clone())
    }

    /// The session readers must have, or the standard not-configured error.
    pub fn require(&self) -> Result<Arc<Session>, AppError> {
        self.current()?.ok_or(AppError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, DataSourceConfig};

    fn session(name: &str) -> Session {
        let backend = Backend::builder()
            .attach_data_source("db", DataSourceConfig::memory())
            .mount("/")
            .unwrap();
        Session { name: name.to_string(), backend, script: format!("// {}", name) }
    }

    #[test]
    fn starts_unconfigured() {
        let handle = SessionHandle::new();
        assert!(handle.current().unwrap().is_none());
        let Err(err) = handle.require() else {
            panic!("a fresh handle produced a session");
        };
        assert_eq!(err.to_string(), "Call /setup first.");
    }

    #[test]
    fn replace_swaps_the_whole_session() {
        let handle = SessionHandle::new();
        handle.replace(session("first")).unwrap();
        assert_eq!(handle.require().unwrap().name, "first");

        handle.replace(session("second")).unwrap();
        let current = handle.require().unwrap();
        assert_eq!(current.name, "second");
        assert_eq!(current.script, "// second");
    }

    #[test]
    fn readers_keep_their_snapshot_across_a_swap() {
        let handle = SessionHandle::new();
        handle.replace(session("first")).unwrap();
        let snapshot = handle.require().unwrap();
        handle.replace(session("second")).unwrap();
        assert_eq!(snapshot.name, "first");
    }
}
