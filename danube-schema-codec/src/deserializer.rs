use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tracing::trace;

use crate::{
    errors::{Result, SchemaCodecError},
    subject::SerializationContext,
    validator::{JsonSchemaValidator, PayloadValidator},
    wire::decode_envelope,
};

/// Converts a validated value into an application object.
pub type FromValueFn<T> =
    Box<dyn Fn(Value, Option<&SerializationContext>) -> Result<T> + Send + Sync + 'static>;

/// Deserializer for schema-registry framed JSON.
///
/// JSON payloads are self-describing, so the registry is never consulted:
/// the schema id in the envelope is read but payloads are validated against
/// the schema this deserializer was built with.
pub struct JsonDeserializer<T = Value> {
    validator: Box<dyn PayloadValidator>,
    from_value: FromValueFn<T>,
}

impl<T: DeserializeOwned + 'static> JsonDeserializer<T> {
    /// Returns a builder converting validated values through `Deserialize`.
    pub fn builder(schema_str: impl Into<String>) -> JsonDeserializerBuilder<T> {
        Self::builder_with_from_value(schema_str, serde_from_value::<T>)
    }
}

impl<T> JsonDeserializer<T> {
    /// Returns a builder that converts validated values with `from_value`.
    ///
    /// `T` needs no serde impls on this path.
    pub fn builder_with_from_value<F>(
        schema_str: impl Into<String>,
        from_value: F,
    ) -> JsonDeserializerBuilder<T>
    where
        F: Fn(Value, Option<&SerializationContext>) -> Result<T> + Send + Sync + 'static,
    {
        JsonDeserializerBuilder {
            schema_str: schema_str.into(),
            from_value: Box::new(from_value),
        }
    }

    /// Strip the envelope from `data`, validate the payload and convert it.
    ///
    /// `None` input yields `None`.
    pub fn deserialize(
        &self,
        data: Option<&[u8]>,
        ctx: Option<&SerializationContext>,
    ) -> Result<Option<T>> {
        let Some(data) = data else {
            return Ok(None);
        };

        let envelope = decode_envelope(data)?;
        trace!(schema_id = %envelope.schema_id, len = envelope.payload.len(), "decoding framed payload");

        let value: Value = serde_json::from_slice(envelope.payload)?;

        self.validator.validate(&value).map_err(|e| match e {
            SchemaCodecError::Validation(msg) => SchemaCodecError::Validation(format!(
                "{} (writer schema id {})",
                msg, envelope.schema_id
            )),
            other => other,
        })?;

        let obj = (self.from_value)(value, ctx)?;
        Ok(Some(obj))
    }
}

impl<T> fmt::Debug for JsonDeserializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDeserializer")
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

pub struct JsonDeserializerBuilder<T> {
    schema_str: String,
    from_value: FromValueFn<T>,
}

impl<T> JsonDeserializerBuilder<T> {
    pub fn with_from_value<F>(mut self, from_value: F) -> Self
    where
        F: Fn(Value, Option<&SerializationContext>) -> Result<T> + Send + Sync + 'static,
    {
        self.from_value = Box::new(from_value);
        self
    }

    pub fn build(self) -> Result<JsonDeserializer<T>> {
        let parsed: Value = serde_json::from_str(&self.schema_str).map_err(|e| {
            SchemaCodecError::Configuration(format!("Invalid JSON schema: {}", e))
        })?;
        let validator = JsonSchemaValidator::new(&parsed)?;

        Ok(JsonDeserializer {
            validator: Box::new(validator),
            from_value: self.from_value,
        })
    }
}

fn serde_from_value<T: DeserializeOwned>(
    value: Value,
    _ctx: Option<&SerializationContext>,
) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}
