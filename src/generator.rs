//! Services-script generation: renders an AngularJS module that exposes every
//! registered model of a backend as an ngResource factory.

use crate::backend::Backend;
use crate::schema::RegisteredModel;
use thiserror::Error;

/// Script served when generation fails. Raises the moment a consumer runs it,
/// so broken setups fail loudly in the suite instead of half-working.
pub const ERROR_SCRIPT: &str = r#"throw new Error("Error generating services script.");"#;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("'{0}' is not usable as a script module name")]
    InvalidModuleName(String),
    #[error("model '{0}' cannot be expressed as a script identifier")]
    InvalidModelName(String),
    #[error("id property '{0}' cannot be expressed as a script identifier")]
    InvalidIdProperty(String),
}

/// Render the client services script for a mounted backend.
///
/// `module_name` becomes the Angular module; `api_url` is the absolute root
/// the factories call back to. The module name, every model name, and every
/// id property must be valid JavaScript identifiers: the first two are
/// injected by name, the id lands in each factory's `$resource` parameter
/// map.
pub fn services_script(
    backend: &Backend,
    module_name: &str,
    api_url: &str,
) -> Result<String, GeneratorError> {
    if !is_js_identifier(module_name) {
        return Err(GeneratorError::InvalidModuleName(module_name.to_string()));
    }
    for model in backend.registry().iter() {
        if !is_js_identifier(&model.name) {
            return Err(GeneratorError::InvalidModelName(model.name.clone()));
        }
        if !is_js_identifier(&model.id_property) {
            return Err(GeneratorError::InvalidIdProperty(model.id_property.clone()));
        }
    }

    let mut script = String::new();
    script.push_str("// Generated client services. Do not edit.\n");
    script.push_str("(function(window, angular, undefined) {\n");
    script.push_str("'use strict';\n\n");
    script.push_str(&format!("var urlBase = {};\n\n", js_string(api_url)));
    script.push_str(&format!(
        "var module = angular.module({}, ['ngResource']);\n",
        js_string(module_name)
    ));
    for model in backend.registry().iter() {
        render_factory(&mut script, model);
    }
    script.push_str("\n})(window, window.angular);\n");
    Ok(script)
}

fn render_factory(script: &mut String, model: &RegisteredModel) {
    let id = &model.id_property;
    let base = format!("urlBase + \"/{}\"", model.path_segment);
    let by_id = format!("urlBase + \"/{}/:{}\"", model.path_segment, id);

    script.push_str(&format!("\nmodule.factory({}, ['$resource', function($resource) {{\n", js_string(&model.name)));
    script.push_str(&format!("  return $resource({}, {{ {}: '@{}' }}, {{\n", by_id, id, id));
    script.push_str(&format!("    create: {{ method: 'POST', url: {} }},\n", base));
    script.push_str(&format!("    find: {{ method: 'GET', isArray: true, url: {} }},\n", base));
    script.push_str("    findById: { method: 'GET' },\n");
    script.push_str("    updateAttributes: { method: 'PUT' },\n");
    script.push_str("    deleteById: { method: 'DELETE' },\n");
    script.push_str(&format!("    count: {{ method: 'GET', url: {} + \"/count\" }},\n", base));
    script.push_str(&format!("    exists: {{ method: 'GET', url: {} + \"/exists\" }}", by_id));
    if model.is_user_base() {
        script.push_str(&format!(",\n    login: {{ method: 'POST', url: {} + \"/login\" }},\n", base));
        script.push_str(&format!("    logout: {{ method: 'POST', url: {} + \"/logout\" }}\n", base));
    } else {
        script.push('\n');
    }
    script.push_str("  });\n");
    script.push_str("}]);\n");
}

/// Quote a string as a JavaScript literal. JSON string syntax is a subset of
/// JavaScript's, so serde's escaping is reused.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "false", "finally", "for", "function", "if", "import", "in",
    "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw", "true",
    "try", "typeof", "var", "void", "while", "with", "yield",
];

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return false;
    }
    !RESERVED_WORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, DataSourceConfig};
    use crate::schema::ModelDefinition;

    fn backend_with(models: &[&str], auth: bool) -> Backend {
        let mut builder = Backend::builder()
            .attach_data_source("db", DataSourceConfig::memory())
            .attach_data_source("mail", DataSourceConfig::mail());
        for name in models {
            builder = builder.register_model(name, ModelDefinition::default());
        }
        if auth {
            builder = builder.enable_auth();
        }
        builder.mount("/").unwrap()
    }

    #[test]
    fn script_declares_the_module_and_a_factory_per_model() {
        let backend = backend_with(&["Customer", "Order"], false);
        let script = services_script(&backend, "lbServices", "http://localhost:3838/api").unwrap();
        assert!(script.contains("angular.module(\"lbServices\", ['ngResource'])"));
        assert!(script.contains("module.factory(\"Customer\""));
        assert!(script.contains("module.factory(\"Order\""));
        assert!(script.contains("var urlBase = \"http://localhost:3838/api\";"));
        assert!(script.contains("urlBase + \"/Customer/:id\""));
        assert!(script.contains("isArray: true"));
    }

    #[test]
    fn user_factories_get_login_and_logout_actions() {
        let backend = backend_with(&[], true);
        let script = services_script(&backend, "lbServices", "http://localhost:3838/api").unwrap();
        assert!(script.contains("login: { method: 'POST', url: urlBase + \"/User\" + \"/login\" }"));
        assert!(script.contains("logout: { method: 'POST'"));
    }

    #[test]
    fn custom_id_property_threads_through_the_resource() {
        let definition: ModelDefinition = serde_json::from_value(serde_json::json!({
            "properties": { "key": { "type": "string", "id": true } }
        }))
        .unwrap();
        let backend = Backend::builder()
            .attach_data_source("db", DataSourceConfig::memory())
            .register_model("Doc", definition)
            .mount("/")
            .unwrap();
        let script = services_script(&backend, "svc", "http://x/api").unwrap();
        assert!(script.contains("urlBase + \"/Doc/:key\""));
        assert!(script.contains("{ key: '@key' }"));
    }

    #[test]
    fn invalid_module_name_is_refused() {
        let backend = backend_with(&["Customer"], false);
        for bad in ["", "1services", "my-services", "class"] {
            let err = services_script(&backend, bad, "http://x/api").unwrap_err();
            assert!(matches!(err, GeneratorError::InvalidModuleName(_)), "accepted {:?}", bad);
        }
    }

    #[test]
    fn invalid_model_name_is_refused() {
        let backend = backend_with(&["not-a-js-identifier"], false);
        let err = services_script(&backend, "svc", "http://x/api").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidModelName(name) if name == "not-a-js-identifier"));
    }

    #[test]
    fn invalid_id_property_is_refused() {
        let definition: ModelDefinition = serde_json::from_value(serde_json::json!({
            "properties": { "my id": { "type": "string", "id": true } }
        }))
        .unwrap();
        let backend = Backend::builder()
            .attach_data_source("db", DataSourceConfig::memory())
            .register_model("Doc", definition)
            .mount("/")
            .unwrap();
        let err = services_script(&backend, "svc", "http://x/api").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidIdProperty(name) if name == "my id"));
    }

    #[test]
    fn identifier_check_accepts_the_usual_names() {
        for good in ["lbServices", "_private", "$scope", "Model2"] {
            assert!(is_js_identifier(good), "rejected {:?}", good);
        }
    }
}
