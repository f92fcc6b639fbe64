//! Request-body validation driven by the model's property rules.

use crate::error::AppError;
use crate::schema::{RegisteredModel, ResolvedProperty};
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body: required properties must be present and
    /// non-null, present values must match their declared rules.
    pub fn validate(body: &Map<String, Value>, model: &RegisteredModel) -> Result<(), AppError> {
        for prop in &model.properties {
            if prop.is_id {
                continue;
            }
            let value = body.get(&prop.name);
            if prop.required && matches!(value, None | Some(Value::Null)) {
                return Err(AppError::Validation(format!("{} is required", prop.name)));
            }
            if let Some(value) = value {
                validate_field(prop, value)?;
            }
        }
        check_strict(body, model)
    }

    /// Validate only the fields present; used for attribute merges, where
    /// required properties may be absent because they already have values.
    pub fn validate_partial(body: &Map<String, Value>, model: &RegisteredModel) -> Result<(), AppError> {
        for (name, value) in body {
            if let Some(prop) = model.property(name) {
                if prop.is_id {
                    continue;
                }
                validate_field(prop, value)?;
            }
        }
        check_strict(body, model)
    }
}

fn check_strict(body: &Map<String, Value>, model: &RegisteredModel) -> Result<(), AppError> {
    if !model.strict {
        return Ok(());
    }
    for name in body.keys() {
        if name != &model.id_property && model.property(name).is_none() {
            return Err(AppError::Validation(format!(
                "{} is not defined in the {} schema",
                name, model.name
            )));
        }
    }
    Ok(())
}

fn validate_field(prop: &ResolvedProperty, value: &Value) -> Result<(), AppError> {
    if value.is_null() {
        return Ok(());
    }
    if !prop.ty.accepts(value) {
        return Err(AppError::Validation(format!(
            "{} must be a {}",
            prop.name,
            prop.ty.name()
        )));
    }
    if let Some(s) = value.as_str() {
        if let Some(max) = prop.max_length {
            if s.len() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    prop.name, max
                )));
            }
        }
        if let Some(min) = prop.min_length {
            if s.len() < min as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    prop.name, min
                )));
            }
        }
        if let Some(pattern) = &prop.pattern {
            if !pattern.is_match(s) {
                return Err(AppError::Validation(format!(
                    "{} does not match the required pattern",
                    prop.name
                )));
            }
        }
    }
    Ok(())
}
