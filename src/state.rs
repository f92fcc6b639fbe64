//! Shared application state handed to every harness route.

use crate::session::SessionHandle;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct HarnessState {
    base_url: Arc<str>,
    api_url: Arc<str>,
    pub session: SessionHandle,
    /// Serializes whole setup calls: build, generate, and swap happen as one
    /// unit even when setups race.
    pub setup_lock: Arc<Mutex<()>>,
}

impl HarnessState {
    /// `base_url` is the advertised root; a trailing slash is added when
    /// missing. The API URL is derived from it.
    pub fn new(base_url: &str) -> HarnessState {
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let api_url = format!("{}api", base);
        HarnessState {
            base_url: base.into(),
            api_url: api_url.into(),
            session: SessionHandle::new(),
            setup_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Root URL, always with a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of the API gateway, no trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_normalized() {
        let state = HarnessState::new("http://localhost:3838");
        assert_eq!(state.base_url(), "http://localhost:3838/");
        assert_eq!(state.api_url(), "http://localhost:3838/api");

        let state = HarnessState::new("http://localhost:3838/");
        assert_eq!(state.base_url(), "http://localhost:3838/");
    }
}
