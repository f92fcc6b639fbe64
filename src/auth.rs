//! Auth subsystem: built-in models, credential hashing, login and logout,
//! and the access-control checks applied once auth is enabled.

use crate::backend::BackendCore;
use crate::error::AppError;
use crate::schema::{BaseKind, DefaultFn, ModelDefinition, PropertyConfig, PropertyType, RegisteredModel};
use crate::service::CrudService;
use crate::store::RecordId;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

pub const USER_MODEL: &str = "User";
pub const ACCESS_TOKEN_MODEL: &str = "AccessToken";
pub const EMAIL_MODEL: &str = "Email";

/// Default token lifetime: two weeks, in seconds.
pub const DEFAULT_TTL_SECONDS: i64 = 1_209_600;

/// Iterated-hash round count. Deliberately low: these are fixture credentials
/// for browser suites, and setup latency matters more than hash strength.
const HASH_ROUNDS: usize = 16;

/// Models registered automatically when a setup enables auth. A client
/// definition with the same name wins over the built-in.
pub fn builtin_models() -> Vec<(&'static str, ModelDefinition)> {
    let user = ModelDefinition::builder()
        .base("User")
        .property("email", PropertyConfig::of(PropertyType::String).required())
        .property("password", PropertyConfig::of(PropertyType::String).required())
        .property("username", PropertyConfig::of(PropertyType::String))
        .build();
    let access_token = ModelDefinition::builder()
        .base("AccessToken")
        .property("id", PropertyConfig::of(PropertyType::String).id().default_fn(DefaultFn::Guid))
        .property(
            "ttl",
            PropertyConfig::of(PropertyType::Number).default_value(json!(DEFAULT_TTL_SECONDS)),
        )
        .property("created", PropertyConfig::of(PropertyType::Date).default_fn(DefaultFn::Now))
        .property("userId", PropertyConfig::of(PropertyType::Number))
        .build();
    let email = ModelDefinition::builder()
        .base("Email")
        .property("to", PropertyConfig::of(PropertyType::String))
        .property("from", PropertyConfig::of(PropertyType::String))
        .property("subject", PropertyConfig::of(PropertyType::String))
        .property("text", PropertyConfig::of(PropertyType::String))
        .property("html", PropertyConfig::of(PropertyType::String))
        .build();
    vec![(USER_MODEL, user), (ACCESS_TOKEN_MODEL, access_token), (EMAIL_MODEL, email)]
}

/// Replace a plaintext password field with its salted hash, in place.
/// No-op when the field is absent or not a string.
pub fn hash_password_field(record: &mut Map<String, Value>) {
    let Some(plain) = record.get("password").and_then(Value::as_str) else {
        return;
    };
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let hashed = hash_password(plain, &salt);
    record.insert("password".to_string(), Value::String(hashed));
}

/// Salted iterated SHA-256, stored as `salt$hex`.
pub fn hash_password(plain: &str, salt: &str) -> String {
    let mut digest = format!("{}{}", salt, plain).into_bytes();
    for _ in 0..HASH_ROUNDS {
        digest = Sha256::digest(&digest).to_vec();
    }
    format!("{}${}", salt, hex_encode(&digest))
}

pub fn verify_password(plain: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, _)) => hash_password(plain, salt) == stored,
        None => false,
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{:02x}", byte);
        out
    })
}

/// Verify credentials against the addressed user model and mint an access
/// token row. Any user-based model can log its rows in; the token always
/// lands in the registered AccessToken table.
pub fn login(core: &BackendCore, model: &RegisteredModel, body: Map<String, Value>) -> Result<Value, AppError> {
    let (Some(email), Some(password)) = (
        body.get("email").and_then(Value::as_str),
        body.get("password").and_then(Value::as_str),
    ) else {
        return Err(AppError::BadRequest("email and password are required".to_string()));
    };
    let Some(token_model) = core.registry.by_path(ACCESS_TOKEN_MODEL) else {
        return Err(AppError::BadRequest("login requires an AccessToken model".to_string()));
    };

    // Raw rows: the stored hash is stripped from anything CrudService returns.
    let users = core.store.all(&model.name)?;
    let user = users
        .iter()
        .find(|row| row.get("email").and_then(Value::as_str) == Some(email));
    let Some(user) = user else {
        return Err(login_failed());
    };
    let stored = user.get("password").and_then(Value::as_str).unwrap_or_default();
    if !verify_password(password, stored) {
        return Err(login_failed());
    }

    let mut token = Map::new();
    if let Some(user_id) = user.get(&model.id_property) {
        token.insert("userId".to_string(), user_id.clone());
    }
    if let Some(ttl) = body.get("ttl").and_then(Value::as_i64) {
        token.insert("ttl".to_string(), json!(ttl));
    }
    CrudService::create(core, token_model, token)
}

/// Delete the access token named by the request credential.
pub fn logout(core: &BackendCore, credential: Option<&str>) -> Result<(), AppError> {
    let Some(token_id) = credential else {
        return Err(AppError::Unauthorized("access token is required to log out".to_string()));
    };
    let Some(token_model) = core.registry.by_path(ACCESS_TOKEN_MODEL) else {
        return Err(AppError::Unauthorized("could not find access token".to_string()));
    };
    let removed = core
        .store
        .remove(&token_model.name, &RecordId::Text(token_id.to_string()))?;
    if removed.is_none() {
        return Err(AppError::Unauthorized("could not find access token".to_string()));
    }
    Ok(())
}

/// A resolved, unexpired access token.
#[derive(Clone, Debug)]
pub struct TokenSession {
    pub token_id: String,
    pub user_id: Option<Value>,
}

/// Look a credential up in the token table. Missing, unknown, and expired
/// tokens all resolve to `None`.
pub fn resolve_token(core: &BackendCore, credential: Option<&str>) -> Result<Option<TokenSession>, AppError> {
    let Some(token_id) = credential else {
        return Ok(None);
    };
    let Some(token_model) = core.registry.by_path(ACCESS_TOKEN_MODEL) else {
        return Ok(None);
    };
    let Some(row) = core
        .store
        .find(&token_model.name, &RecordId::Text(token_id.to_string()))?
    else {
        return Ok(None);
    };
    if token_expired(&row) {
        tracing::debug!(token = token_id, "rejecting expired access token");
        return Ok(None);
    }
    Ok(Some(TokenSession {
        token_id: token_id.to_string(),
        user_id: row.get("userId").cloned(),
    }))
}

fn token_expired(row: &Value) -> bool {
    let Some(created) = row.get("created").and_then(Value::as_str) else {
        return false;
    };
    let Ok(created) = chrono::DateTime::parse_from_rfc3339(created) else {
        return false;
    };
    // The ttl comes from the login body, so it can be any i64. A lifetime
    // with no representable expiry instant counts as expired.
    let ttl = row.get("ttl").and_then(Value::as_i64).unwrap_or(DEFAULT_TTL_SECONDS);
    let Some(lifetime) = chrono::Duration::try_seconds(ttl) else {
        return true;
    };
    let Some(expires_at) = created.checked_add_signed(lifetime) else {
        return true;
    };
    chrono::Utc::now() >= expires_at
}

/// Operation classes the access-control rules distinguish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Read,
    Update,
    Delete,
    Count,
    Exists,
}

/// Apply the model's access rules. With auth off everything is open; with it
/// on, user rows are owner-only, user listings are denied, and token rows are
/// never served.
pub fn authorize(
    core: &BackendCore,
    model: &RegisteredModel,
    operation: Operation,
    target: Option<&RecordId>,
    credential: Option<&str>,
) -> Result<(), AppError> {
    if !core.auth_enabled {
        return Ok(());
    }
    match model.base {
        BaseKind::Model | BaseKind::Email => Ok(()),
        BaseKind::AccessToken => Err(authorization_required()),
        BaseKind::User => match operation {
            Operation::Create => Ok(()),
            Operation::Read | Operation::Update | Operation::Delete => {
                let session = resolve_token(core, credential)?.ok_or_else(authorization_required)?;
                let owns = match (target, &session.user_id) {
                    (Some(id), Some(user_id)) => RecordId::from_value(user_id).as_ref() == Some(id),
                    _ => false,
                };
                if owns {
                    Ok(())
                } else {
                    Err(authorization_required())
                }
            }
            Operation::List | Operation::Count | Operation::Exists => Err(authorization_required()),
        },
    }
}

fn authorization_required() -> AppError {
    AppError::Unauthorized("Authorization Required".to_string())
}

fn login_failed() -> AppError {
    AppError::Unauthorized("login failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_and_verify_round_trip() {
        let stored = hash_password("opensesame", "abcd");
        assert!(stored.starts_with("abcd$"));
        assert!(verify_password("opensesame", &stored));
        assert!(!verify_password("wrong", &stored));
        assert!(!verify_password("opensesame", "garbage-without-salt"));
    }

    #[test]
    fn same_password_with_different_salts_differs() {
        assert_ne!(hash_password("pw", "salt1"), hash_password("pw", "salt2"));
    }

    #[test]
    fn hash_password_field_replaces_the_plaintext() {
        let mut record = json!({ "email": "a@b", "password": "pw" })
            .as_object()
            .unwrap()
            .clone();
        hash_password_field(&mut record);
        let stored = record["password"].as_str().unwrap();
        assert_ne!(stored, "pw");
        assert!(verify_password("pw", stored));
    }

    #[test]
    fn token_expiry_respects_created_plus_ttl() {
        let fresh = json!({ "created": chrono::Utc::now().to_rfc3339(), "ttl": 3600 });
        assert!(!token_expired(&fresh));

        let stale = json!({ "created": "2001-01-01T00:00:00Z", "ttl": 3600 });
        assert!(token_expired(&stale));

        // Unparsable metadata never kills a token.
        assert!(!token_expired(&json!({ "created": "not-a-date" })));
        assert!(!token_expired(&json!({})));
    }

    #[test]
    fn unrepresentable_ttls_count_as_expired() {
        let now = chrono::Utc::now().to_rfc3339();
        // Beyond what a Duration can hold.
        assert!(token_expired(&json!({ "created": now.as_str(), "ttl": i64::MAX })));
        assert!(token_expired(&json!({ "created": now.as_str(), "ttl": i64::MIN })));
        // Held by a Duration, but past the end of representable time.
        assert!(token_expired(&json!({ "created": now.as_str(), "ttl": 4_000_000_000_000_000i64 })));
    }

    #[test]
    fn builtins_cover_the_three_auth_models() {
        let models = builtin_models();
        let names: Vec<_> = models.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, [USER_MODEL, ACCESS_TOKEN_MODEL, EMAIL_MODEL]);
        for (_, definition) in &models {
            assert_ne!(definition.base_kind(), BaseKind::Model);
        }
    }
}
