//! Environment-driven server configuration.

pub const DEFAULT_PORT: u16 = 3838;
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub body_limit: usize,
}

impl Default for HarnessConfig {
    fn default() -> HarnessConfig {
        HarnessConfig {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl HarnessConfig {
    /// Read `HOST`, `PORT`, and `REQUEST_BODY_LIMIT`. Unset or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> HarnessConfig {
        let defaults = HarnessConfig::default();
        HarnessConfig {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parsed("PORT").unwrap_or(defaults.port),
            body_limit: env_parsed("REQUEST_BODY_LIMIT").unwrap_or(defaults.body_limit),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.parse().ok())
}
