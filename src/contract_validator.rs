//! Contract and JSON schema validation
//!
//! A contract is a JSON document shaped like the expected response whose
//! leaves are either `"required"` or `"type:<t>"`. Schemas are a practical
//! subset of JSON Schema: `type`, `required`, `properties`, `items`, `enum`,
//! `minimum`/`maximum` and `minLength`/`maxLength`.

use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ValidationError;
use crate::transport::ApiResponse;

#[derive(Debug, Default)]
pub struct ContractValidator {
    base_dir: PathBuf,
    schema_cache: RwLock<HashMap<PathBuf, Arc<JsonValue>>>,
}

impl ContractValidator {
    /// Relative contract and schema paths are resolved against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            schema_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Walk `contract` and report every place `json` falls short of it
    pub fn validate_against_contract(json: &JsonValue, contract: &JsonValue) -> Vec<String> {
        let mut errors = Vec::new();
        if let (Some(json), Some(contract)) = (json.as_object(), contract.as_object()) {
            walk_contract(json, contract, "", &mut errors);
        } else {
            errors.push("Missing or invalid object at path: ".to_string());
        }
        errors
    }

    /// Dotted paths that do not resolve through nested objects
    pub fn validate_required_fields<S: AsRef<str>>(json: &JsonValue, paths: &[S]) -> Vec<String> {
        paths
            .iter()
            .map(AsRef::as_ref)
            .filter(|path| !field_exists(json, path))
            .map(str::to_string)
            .collect()
    }

    pub fn validate_against_schema(json: &JsonValue, schema: &JsonValue) -> Vec<String> {
        let mut errors = Vec::new();
        check_schema(json, schema, "$", &mut errors);
        errors
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn read_json(&self, path: &Path) -> Result<JsonValue, ValidationError> {
        let resolved = self.resolve(path);
        if !resolved.exists() {
            return Err(ValidationError::ResourceNotFound(resolved.display().to_string()));
        }
        let content = std::fs::read_to_string(&resolved)?;
        serde_json::from_str(&content)
            .map_err(|e| ValidationError::InvalidJson(format!("{}: {}", resolved.display(), e)))
    }

    pub fn load_contract(&self, path: impl AsRef<Path>) -> Result<JsonValue, ValidationError> {
        self.read_json(path.as_ref())
    }

    /// Load a schema, reusing a previously parsed copy for the same path
    pub fn load_schema(&self, path: impl AsRef<Path>) -> Result<Arc<JsonValue>, ValidationError> {
        let key = self.resolve(path.as_ref());
        if let Some(schema) = self.schema_cache.read().get(&key) {
            return Ok(schema.clone());
        }

        let schema = Arc::new(self.read_json(&key)?);
        self.schema_cache.write().insert(key, schema.clone());
        Ok(schema)
    }

    pub fn schema_exists(&self, path: impl AsRef<Path>) -> bool {
        let exists = self.resolve(path.as_ref()).exists();
        if !exists {
            log::warn!("Schema file not found: {:?}", path.as_ref());
        }
        exists
    }

    pub fn cached_schemas(&self) -> usize {
        self.schema_cache.read().len()
    }

    pub fn assert_contract(&self, response: &ApiResponse, contract_path: impl AsRef<Path>) -> Result<(), ValidationError> {
        let contract = self.load_contract(contract_path.as_ref())?;
        let json = body_json(response)?;

        let errors = Self::validate_against_contract(&json, &contract);
        if errors.is_empty() {
            log::info!("Contract validation successful for: {:?}", contract_path.as_ref());
            Ok(())
        } else {
            let err = ValidationError::ContractViolations(errors);
            log::error!("{}", err);
            Err(err)
        }
    }

    pub fn assert_schema(&self, response: &ApiResponse, schema_path: impl AsRef<Path>) -> Result<(), ValidationError> {
        let schema = self.load_schema(schema_path.as_ref())?;
        let json = body_json(response)?;

        let errors = Self::validate_against_schema(&json, &schema);
        if errors.is_empty() {
            log::info!("Schema validation successful for: {:?}", schema_path.as_ref());
            Ok(())
        } else {
            let err = ValidationError::SchemaViolations(errors);
            log::error!("{}", err);
            Err(err)
        }
    }

    pub fn assert_required_fields<S: AsRef<str>>(response: &ApiResponse, paths: &[S]) -> Result<(), ValidationError> {
        let json = body_json(response)?;
        let missing = Self::validate_required_fields(&json, paths);
        if missing.is_empty() {
            log::info!("All required fields present in response");
            Ok(())
        } else {
            let err = ValidationError::MissingFields(missing);
            log::error!("{}", err);
            Err(err)
        }
    }
}

fn body_json(response: &ApiResponse) -> Result<JsonValue, ValidationError> {
    response.json().map_err(|e| ValidationError::InvalidJson(e.to_string()))
}

fn walk_contract(
    json: &serde_json::Map<String, JsonValue>,
    contract: &serde_json::Map<String, JsonValue>,
    path: &str,
    errors: &mut Vec<String>,
) {
    for (key, entry) in contract {
        let current_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };

        match entry {
            JsonValue::Object(nested) => match json.get(key).and_then(JsonValue::as_object) {
                Some(child) => walk_contract(child, nested, &current_path, errors),
                None => errors.push(format!("Missing or invalid object at path: {}", current_path)),
            },
            JsonValue::String(rule) => match json.get(key) {
                None if rule == "required" => {
                    errors.push(format!("Required field missing: {}", current_path));
                }
                None => {}
                Some(value) => {
                    if let Some(expected) = rule.strip_prefix("type:") {
                        if !type_matches(value, expected) {
                            errors.push(format!(
                                "Type mismatch for field {}. Expected: {}",
                                current_path, expected
                            ));
                        }
                    }
                }
            },
            _ => {}
        }
    }
}

fn type_matches(value: &JsonValue, expected: &str) -> bool {
    match expected.to_ascii_lowercase().as_str() {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => false,
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn field_exists(json: &JsonValue, path: &str) -> bool {
    let mut current = json;
    for part in path.split('.') {
        match current.as_object().and_then(|obj| obj.get(part)) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

fn check_schema(data: &JsonValue, schema: &JsonValue, path: &str, errors: &mut Vec<String>) {
    let schema_obj = match schema.as_object() {
        Some(obj) => obj,
        None => return,
    };

    if let Some(expected) = schema_obj.get("type") {
        let allowed: Vec<&str> = match expected {
            JsonValue::String(t) => vec![t.as_str()],
            JsonValue::Array(types) => types.iter().filter_map(JsonValue::as_str).collect(),
            _ => Vec::new(),
        };

        if !allowed.is_empty() && !allowed.iter().any(|t| type_matches(data, t)) {
            errors.push(format!(
                "{}: expected type {}, got {}",
                path,
                allowed.join("|"),
                type_name(data)
            ));
            return;
        }
    }

    if let Some(JsonValue::Array(options)) = schema_obj.get("enum") {
        if !options.contains(data) {
            errors.push(format!("{}: value {} is not one of the allowed values", path, data));
        }
    }

    match data {
        JsonValue::Number(n) => {
            if let Some(value) = n.as_f64() {
                if let Some(min) = schema_obj.get("minimum").and_then(JsonValue::as_f64) {
                    if value < min {
                        errors.push(format!("{}: {} is less than minimum {}", path, value, min));
                    }
                }
                if let Some(max) = schema_obj.get("maximum").and_then(JsonValue::as_f64) {
                    if value > max {
                        errors.push(format!("{}: {} is greater than maximum {}", path, value, max));
                    }
                }
            }
        }
        JsonValue::String(s) => {
            let len = s.chars().count() as u64;
            if let Some(min) = schema_obj.get("minLength").and_then(JsonValue::as_u64) {
                if len < min {
                    errors.push(format!("{}: length {} is shorter than minLength {}", path, len, min));
                }
            }
            if let Some(max) = schema_obj.get("maxLength").and_then(JsonValue::as_u64) {
                if len > max {
                    errors.push(format!("{}: length {} is longer than maxLength {}", path, len, max));
                }
            }
        }
        JsonValue::Object(obj) => {
            if let Some(JsonValue::Array(required)) = schema_obj.get("required") {
                for name in required.iter().filter_map(JsonValue::as_str) {
                    if !obj.contains_key(name) {
                        errors.push(format!("{}: required property '{}' is missing", path, name));
                    }
                }
            }
            if let Some(JsonValue::Object(properties)) = schema_obj.get("properties") {
                for (name, prop_schema) in properties {
                    if let Some(value) = obj.get(name) {
                        check_schema(value, prop_schema, &format!("{}.{}", path, name), errors);
                    }
                }
            }
        }
        JsonValue::Array(items) => {
            if let Some(item_schema) = schema_obj.get("items") {
                for (index, item) in items.iter().enumerate() {
                    check_schema(item, item_schema, &format!("{}[{}]", path, index), errors);
                }
            }
        }
        _ => {}
    }
}
