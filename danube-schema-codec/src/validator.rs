use serde_json::Value;
use std::fmt;

use crate::errors::{Result, SchemaCodecError};

/// Trait for validating decoded or to-be-encoded values against a schema
pub trait PayloadValidator: Send + Sync + fmt::Debug {
    /// Validate `instance`, failing with the validator's explanation
    fn validate(&self, instance: &Value) -> Result<()>;
}

/// JSON Schema validator
pub struct JsonSchemaValidator {
    validator: jsonschema::Validator,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator").finish_non_exhaustive()
    }
}

impl JsonSchemaValidator {
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema).map_err(|e| {
            SchemaCodecError::Configuration(format!("Failed to compile JSON schema: {}", e))
        })?;

        Ok(Self { validator })
    }
}

impl PayloadValidator for JsonSchemaValidator {
    fn validate(&self, instance: &Value) -> Result<()> {
        if self.validator.is_valid(instance) {
            return Ok(());
        }

        let errors: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();
        Err(SchemaCodecError::Validation(errors.join(", ")))
    }
}
