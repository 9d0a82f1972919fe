//! Output schema checking
//!
//! Models asked for JSON do not always return clean JSON. The text is
//! reduced to a JSON value (raw, fenced, or the outermost object span) and
//! then validated against a declared JSON Schema. Anything that fails either
//! step counts as an `invalid_response` from that provider.

use std::fmt;
use std::sync::Arc;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::ConfigurationError;
use crate::providers::ProviderFailure;

/// Compiled JSON Schema a model response must satisfy
#[derive(Clone)]
pub struct OutputSchema {
    schema: Arc<Value>,
    validator: Arc<Validator>,
}

impl OutputSchema {
    /// Compile a schema; an invalid schema is a startup defect
    pub fn new(schema: Value) -> Result<Self, ConfigurationError> {
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| ConfigurationError::InvalidOutputSchema(e.to_string()))?;
        Ok(Self {
            schema: Arc::new(schema),
            validator: Arc::new(validator),
        })
    }

    /// Schema requiring an object with the given keys present
    pub fn object_with(required: &[&str]) -> Result<Self, ConfigurationError> {
        Self::new(serde_json::json!({
            "type": "object",
            "required": required,
        }))
    }

    /// Extract JSON from model text and validate it
    pub fn check(&self, content: &str) -> Result<Value, ProviderFailure> {
        let value = extract_json(content).ok_or_else(|| {
            ProviderFailure::invalid_response("Response is not parseable as JSON")
        })?;

        if let Some(error) = self.validator.iter_errors(&value).next() {
            return Err(ProviderFailure::invalid_response(format!(
                "Response does not match output schema: {} at {}",
                error, error.instance_path
            )));
        }

        Ok(value)
    }
}

impl fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSchema")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Best-effort JSON extraction from model output
pub fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(inner) = strip_code_fence(trimmed) {
        if let Ok(value) = serde_json::from_str(inner) {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

fn strip_code_fence(s: &str) -> Option<&str> {
    let rest = s.strip_prefix("```")?;
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```")?;
    Some(rest.trim())
}
