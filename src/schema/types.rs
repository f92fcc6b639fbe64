//! Raw setup types: the JSON shapes a test suite posts to configure a session.
//! Property specs accept a shorthand (a bare type name) or a full object.

use crate::error::AppError;
use crate::schema::resolved::BaseKind;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parsed body of a setup call.
///
/// Parsing is manual so the validation order and messages stay stable:
/// `name` is checked first, then `models`, then each definition in turn.
#[derive(Clone, Debug)]
pub struct SetupRequest {
    pub name: String,
    pub models: Vec<(String, ModelDefinition)>,
    pub enable_auth: bool,
}

impl SetupRequest {
    pub fn parse(body: Value) -> Result<SetupRequest, AppError> {
        let name = body
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("name is required".into()))?
            .to_string();

        let model_map = match body.get("models") {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(AppError::InvalidRequest(
                    "models must be a valid object".into(),
                ))
            }
        };

        let mut models = Vec::with_capacity(model_map.len());
        for (model_name, raw) in model_map {
            let definition: ModelDefinition = serde_json::from_value(raw.clone()).map_err(|e| {
                AppError::InvalidRequest(format!("model '{}' is not a valid definition: {}", model_name, e))
            })?;
            models.push((model_name.clone(), definition));
        }

        let enable_auth = body
            .get("enableAuth")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(SetupRequest { name, models, enable_auth })
    }
}

/// One model definition as submitted: property specs plus options.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModelDefinition {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyConfig>,
    #[serde(default)]
    pub options: ModelOptions,
    /// Base model, e.g. "User". May also appear under `options.base`.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default, rename = "dataSource")]
    pub data_source: Option<String>,
}

impl ModelDefinition {
    pub fn builder() -> ModelDefinitionBuilder {
        ModelDefinitionBuilder { definition: ModelDefinition::default() }
    }

    pub fn base_kind(&self) -> BaseKind {
        BaseKind::parse(self.base.as_deref().or(self.options.base.as_deref()))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModelOptions {
    #[serde(default)]
    pub base: Option<String>,
    /// Strict models reject properties that are not declared.
    #[serde(default)]
    pub strict: bool,
}

/// Programmatic construction; the JSON path goes through `Deserialize`.
pub struct ModelDefinitionBuilder {
    definition: ModelDefinition,
}

impl ModelDefinitionBuilder {
    pub fn property(mut self, name: &str, config: PropertyConfig) -> Self {
        self.definition.properties.insert(name.to_string(), config);
        self
    }

    pub fn base(mut self, base: &str) -> Self {
        self.definition.base = Some(base.to_string());
        self
    }

    pub fn data_source(mut self, source: &str) -> Self {
        self.definition.data_source = Some(source.to_string());
        self
    }

    pub fn strict(mut self) -> Self {
        self.definition.options.strict = true;
        self
    }

    pub fn build(self) -> ModelDefinition {
        self.definition
    }
}

/// Per-property rules. Deserializes from either `"string"` or
/// `{ "type": "string", "required": true, ... }`.
#[derive(Clone, Debug)]
pub struct PropertyConfig {
    pub ty: PropertyType,
    pub required: bool,
    pub default: Option<Value>,
    pub default_fn: Option<DefaultFn>,
    pub id: bool,
    pub pattern: Option<String>,
    pub max_length: Option<u32>,
    pub min_length: Option<u32>,
}

impl PropertyConfig {
    pub fn of(ty: PropertyType) -> PropertyConfig {
        PropertyConfig {
            ty,
            required: false,
            default: None,
            default_fn: None,
            id: false,
            pattern: None,
            max_length: None,
            min_length: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    pub fn default_fn(mut self, default_fn: DefaultFn) -> Self {
        self.default_fn = Some(default_fn);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }
}

impl<'de> Deserialize<'de> for PropertyConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(tag) => Ok(PropertyConfig::of(PropertyType::parse(&tag))),
            Value::Object(spec) => {
                let ty = match spec.get("type") {
                    Some(Value::String(tag)) => PropertyType::parse(tag),
                    None => PropertyType::Any,
                    Some(other) => {
                        return Err(serde::de::Error::custom(format!(
                            "property type must be a string, got {}",
                            json_type_name(other)
                        )))
                    }
                };
                let default_fn = match spec.get("defaultFn").and_then(Value::as_str) {
                    Some("now") => Some(DefaultFn::Now),
                    Some("guid") | Some("uuid") | Some("uuidv4") => Some(DefaultFn::Guid),
                    Some(other) => {
                        return Err(serde::de::Error::custom(format!(
                            "unsupported defaultFn '{}'",
                            other
                        )))
                    }
                    None => None,
                };
                Ok(PropertyConfig {
                    ty,
                    required: spec.get("required").and_then(Value::as_bool).unwrap_or(false),
                    default: spec.get("default").cloned(),
                    default_fn,
                    id: spec.get("id").and_then(Value::as_bool).unwrap_or(false),
                    pattern: spec.get("pattern").and_then(Value::as_str).map(str::to_string),
                    max_length: spec.get("maxLength").and_then(Value::as_u64).map(|n| n as u32),
                    min_length: spec.get("minLength").and_then(Value::as_u64).map(|n| n as u32),
                })
            }
            other => Err(serde::de::Error::custom(format!(
                "property spec must be a type name or an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// Value types a property can declare. Unknown names map to `Any`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
    Any,
}

impl PropertyType {
    pub fn parse(tag: &str) -> PropertyType {
        match tag.to_ascii_lowercase().as_str() {
            "string" | "text" => PropertyType::String,
            "number" | "integer" => PropertyType::Number,
            "boolean" | "bool" => PropertyType::Boolean,
            "date" => PropertyType::Date,
            "object" => PropertyType::Object,
            "array" => PropertyType::Array,
            _ => PropertyType::Any,
        }
    }

    /// Whether a JSON value is acceptable for this type. Dates arrive as
    /// RFC 3339 strings or epoch numbers.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            PropertyType::String => value.is_string(),
            PropertyType::Number => value.is_number(),
            PropertyType::Boolean => value.is_boolean(),
            PropertyType::Date => value.is_string() || value.is_number(),
            PropertyType::Object => value.is_object(),
            PropertyType::Array => value.is_array(),
            PropertyType::Any => true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Date => "date",
            PropertyType::Object => "object",
            PropertyType::Array => "array",
            PropertyType::Any => "any",
        }
    }
}

/// Generated default for a property the client did not send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultFn {
    /// Current timestamp, RFC 3339.
    Now,
    /// Fresh UUIDv4 string.
    Guid,
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
