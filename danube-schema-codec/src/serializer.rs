use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::trace;

use crate::{
    cache::SubjectCache,
    config::SerializerConfig,
    errors::{Result, SchemaCodecError},
    registry::SchemaRegistry,
    resolution::{resolve_schema_id, ResolutionMode},
    schema::{Schema, SchemaReference, SchemaType},
    subject::SerializationContext,
    validator::{JsonSchemaValidator, PayloadValidator},
    wire::encode_envelope,
};

/// Converts an application object into the value validated and written on the wire.
pub type ToValueFn<T> =
    Box<dyn Fn(&T, &SerializationContext) -> Result<Value> + Send + Sync + 'static>;

/// Serializer producing schema-registry framed JSON.
///
/// The schema named by the JSON Schema `title` is resolved to a registry id
/// the first time each subject is seen, then reused for the lifetime of the
/// serializer. Values are validated against the locally configured schema
/// before they are framed.
pub struct JsonSerializer<T = Value> {
    registry: Arc<dyn SchemaRegistry>,
    schema: Schema,
    schema_name: String,
    validator: Box<dyn PayloadValidator>,
    config: SerializerConfig,
    mode: ResolutionMode,
    known_subjects: SubjectCache,
    to_value: ToValueFn<T>,
}

impl<T: Serialize + 'static> JsonSerializer<T> {
    /// Returns a builder for a serializer using `schema_str` and `registry`.
    ///
    /// Objects are converted through their `Serialize` impl unless a hook is
    /// set with [`JsonSerializerBuilder::with_to_value`].
    pub fn builder(
        schema_str: impl Into<String>,
        registry: Arc<dyn SchemaRegistry>,
    ) -> JsonSerializerBuilder<T> {
        Self::builder_with_to_value(schema_str, registry, serde_to_value::<T>)
    }
}

impl<T> JsonSerializer<T> {
    /// Returns a builder that converts objects with `to_value`.
    ///
    /// `T` needs no serde impls on this path.
    pub fn builder_with_to_value<F>(
        schema_str: impl Into<String>,
        registry: Arc<dyn SchemaRegistry>,
        to_value: F,
    ) -> JsonSerializerBuilder<T>
    where
        F: Fn(&T, &SerializationContext) -> Result<Value> + Send + Sync + 'static,
    {
        JsonSerializerBuilder {
            schema_str: schema_str.into(),
            registry,
            config: SerializerConfig::default(),
            references: Vec::new(),
            to_value: Box::new(to_value),
        }
    }

    /// The record name taken from the schema `title`.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn resolution_mode(&self) -> ResolutionMode {
        self.mode
    }

    /// The cached schema id for `subject`, if it has been resolved.
    pub fn known_schema_id(&self, subject: &str) -> Option<u32> {
        self.known_subjects.get(subject)
    }

    /// Subject the configured naming strategy produces for `ctx`.
    pub fn subject_name(&self, ctx: &SerializationContext) -> String {
        self.config
            .subject_name_strategy
            .subject_name(ctx, &self.schema_name)
    }

    /// Serialize `obj` and prepend the wire envelope.
    ///
    /// `None` is passed through untouched: no registry call, no cache change.
    pub async fn serialize(
        &self,
        obj: Option<&T>,
        ctx: &SerializationContext,
    ) -> Result<Option<Vec<u8>>> {
        let Some(obj) = obj else {
            return Ok(None);
        };

        let subject = self.subject_name(ctx);

        let schema_id = self
            .known_subjects
            .get_or_resolve(&subject, || {
                resolve_schema_id(self.registry.as_ref(), &subject, &self.schema, self.mode)
            })
            .await
            .map_err(|source| SchemaCodecError::Registry {
                subject: subject.clone(),
                source,
            })?;

        let value = (self.to_value)(obj, ctx)?;

        self.validator.validate(&value).map_err(|e| match e {
            SchemaCodecError::Validation(msg) => SchemaCodecError::Validation(format!(
                "{} (subject {}, schema id {})",
                msg, subject, schema_id
            )),
            other => other,
        })?;

        let payload = to_payload(&value)?;
        trace!(subject = %subject, schema_id = %schema_id, len = payload.len(), "serialized value");

        Ok(Some(encode_envelope(schema_id, &payload)))
    }
}

impl<T> fmt::Debug for JsonSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSerializer")
            .field("schema_name", &self.schema_name)
            .field("config", &self.config)
            .field("known_subjects", &self.known_subjects)
            .finish_non_exhaustive()
    }
}

/// Builder for [`JsonSerializer`]. All checks run in `build`.
pub struct JsonSerializerBuilder<T> {
    schema_str: String,
    registry: Arc<dyn SchemaRegistry>,
    config: SerializerConfig,
    references: Vec<SchemaReference>,
    to_value: ToValueFn<T>,
}

impl<T> JsonSerializerBuilder<T> {
    pub fn with_config(mut self, config: SerializerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_to_value<F>(mut self, to_value: F) -> Self
    where
        F: Fn(&T, &SerializationContext) -> Result<Value> + Send + Sync + 'static,
    {
        self.to_value = Box::new(to_value);
        self
    }

    /// Schemas the configured one imports, sent to the registry with it.
    pub fn with_references(mut self, references: Vec<SchemaReference>) -> Self {
        self.references = references;
        self
    }

    /// Validates the configuration and parses the schema.
    ///
    /// Fails when the options conflict, the schema is not valid JSON Schema,
    /// or it has no `title` to name the record by.
    pub fn build(self) -> Result<JsonSerializer<T>> {
        self.config.validate()?;

        let parsed: Value = serde_json::from_str(&self.schema_str).map_err(|e| {
            SchemaCodecError::Configuration(format!("Invalid JSON schema: {}", e))
        })?;

        let schema_name = parsed
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SchemaCodecError::Configuration(
                    "Missing required JSON schema annotation title".into(),
                )
            })?
            .to_string();

        let validator = JsonSchemaValidator::new(&parsed)?;
        let mode = self.config.resolution_mode();

        Ok(JsonSerializer {
            registry: self.registry,
            schema: Schema::new(self.schema_str, SchemaType::Json)
                .with_references(self.references),
            schema_name,
            validator: Box::new(validator),
            config: self.config,
            mode,
            known_subjects: SubjectCache::new(),
            to_value: self.to_value,
        })
    }
}

fn serde_to_value<T: Serialize>(obj: &T, _ctx: &SerializationContext) -> Result<Value> {
    Ok(serde_json::to_value(obj)?)
}

/// JSON text with `", "` between elements and `": "` after keys.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn to_payload(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_uses_spaced_separators() {
        let payload = to_payload(&json!({"id": 42})).unwrap();
        assert_eq!(payload, br#"{"id": 42}"#);

        let payload = to_payload(&json!({"a": [1, 2, {"b": null}], "c": "x"})).unwrap();
        assert_eq!(
            String::from_utf8(payload).unwrap(),
            r#"{"a": [1, 2, {"b": null}], "c": "x"}"#
        );
    }

    #[test]
    fn test_empty_containers_have_no_separators() {
        assert_eq!(to_payload(&json!({})).unwrap(), b"{}");
        assert_eq!(to_payload(&json!([])).unwrap(), b"[]");
    }
}
