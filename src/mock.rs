use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Result, SlypressError};

/// The data object supplied to a compiled template during execution.
pub type MockContext = Map<String, Value>;

/// Fixed context every template execution starts from. Callers must merge
/// onto a fresh copy, never into a shared instance.
pub fn default_context() -> MockContext {
    let mut context = Map::new();
    context.insert("wcmmode".into(), Value::Bool(false));
    context.insert("properties".into(), Value::Object(Map::new()));
    context.insert("pageProperties".into(), Value::Object(Map::new()));
    context.insert("resources".into(), Value::Object(Map::new()));
    context
}

/// Build the mock context for one compile pass: the default context,
/// shallow-merged with the optional mock file inside `mock_dir`. Template
/// keys replace default keys wholesale; nested objects are not deep-merged.
pub fn load_mock_context(mock_dir: &Path, mock_file: &str) -> Result<MockContext> {
    let path = mock_dir.join(mock_file);

    if !path.exists() {
        return Ok(default_context());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| SlypressError::Io {
        context: format!("reading {}", path.display()),
        source: e,
    })?;

    let raw: Value = serde_json::from_str(&content).map_err(|e| SlypressError::MockParse {
        path: path.clone(),
        source: e,
    })?;

    let overrides = raw
        .as_object()
        .ok_or_else(|| SlypressError::MockNotObject { path: path.clone() })?;

    let mut merged = default_context();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }

    Ok(merged)
}

/// Look up a resource-path override in the context's `resources` bag.
pub fn resource_override<'a>(context: &'a MockContext, path: &str) -> Option<&'a str> {
    context.get("resources")?.as_object()?.get(path)?.as_str()
}
