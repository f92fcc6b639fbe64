//! Definition validation: flatten a submitted model into a `RegisteredModel`
//! or explain exactly what is wrong with it.

use crate::error::SchemaError;
use crate::schema::resolved::{BaseKind, IdKind, RegisteredModel, ResolvedProperty};
use crate::schema::types::{ModelDefinition, PropertyType};
use crate::store::ConnectorKind;
use regex::Regex;
use std::collections::HashSet;

/// Validate one definition against the data source it landed on.
///
/// Models without an id property get a numeric `id` injected; at most one
/// property may be marked as the id, and it must be a string or a number.
pub fn resolve_model(
    name: &str,
    definition: &ModelDefinition,
    data_source: &str,
    connector: ConnectorKind,
) -> Result<RegisteredModel, SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::EmptyModelName);
    }

    let base = definition.base_kind();
    let mut id_property: Option<(String, IdKind)> = None;
    let mut properties = Vec::with_capacity(definition.properties.len() + 1);

    for (prop_name, config) in &definition.properties {
        if prop_name.is_empty() {
            return Err(SchemaError::Definition {
                model: name.to_string(),
                message: "property names must be non-empty".to_string(),
            });
        }
        if config.id {
            if id_property.is_some() {
                return Err(SchemaError::MultipleIdProperties { model: name.to_string() });
            }
            let kind = match config.ty {
                PropertyType::Number => IdKind::Auto,
                PropertyType::String | PropertyType::Any => IdKind::Uuid,
                other => {
                    return Err(SchemaError::Definition {
                        model: name.to_string(),
                        message: format!(
                            "id property '{}' must be a string or a number, not {}",
                            prop_name,
                            other.name()
                        ),
                    })
                }
            };
            id_property = Some((prop_name.clone(), kind));
        }
        let pattern = match &config.pattern {
            Some(source) => Some(Regex::new(source).map_err(|_| SchemaError::Definition {
                model: name.to_string(),
                message: format!("property '{}' has an invalid pattern", prop_name),
            })?),
            None => None,
        };
        properties.push(ResolvedProperty {
            name: prop_name.clone(),
            ty: config.ty,
            required: config.required,
            default: config.default.clone(),
            default_fn: config.default_fn,
            is_id: config.id,
            pattern,
            max_length: config.max_length,
            min_length: config.min_length,
        });
    }

    let (id_property, id_kind) = id_property.unwrap_or_else(|| ("id".to_string(), IdKind::Auto));
    if !properties.iter().any(|p| p.name == id_property) {
        properties.push(ResolvedProperty {
            name: id_property.clone(),
            ty: PropertyType::Number,
            required: false,
            default: None,
            default_fn: None,
            is_id: true,
            pattern: None,
            max_length: None,
            min_length: None,
        });
    }

    let mut sensitive = HashSet::new();
    if base == BaseKind::User {
        sensitive.insert("password".to_string());
    }

    Ok(RegisteredModel {
        name: name.to_string(),
        path_segment: name.to_string(),
        base,
        connector,
        data_source: data_source.to_string(),
        id_property,
        id_kind,
        strict: definition.options.strict,
        properties,
        sensitive,
    })
}
