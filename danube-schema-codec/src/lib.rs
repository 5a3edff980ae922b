//! Danube-Schema-Codec
//!
//! Schema-registry aware JSON serializer and deserializer. Payloads are
//! wrapped in a five byte envelope (magic byte + big-endian schema id) and
//! validated against a JSON Schema on both ends.
//!
//! ```no_run
//! use std::sync::Arc;
//! use danube_schema_codec::{JsonSerializer, MemoryRegistry, SerializationContext};
//! use serde_json::{json, Value};
//!
//! # async fn example() -> danube_schema_codec::errors::Result<()> {
//! let schema = r#"{"title":"Order","type":"object","required":["id"],"properties":{"id":{"type":"integer"}}}"#;
//! let serializer: JsonSerializer<Value> =
//!     JsonSerializer::builder(schema, Arc::new(MemoryRegistry::new())).build()?;
//!
//! let bytes = serializer
//!     .serialize(Some(&json!({"id": 42})), &SerializationContext::value("orders"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub use errors::{FramingError, SchemaCodecError};

pub mod wire;
pub use wire::{decode_envelope, encode_envelope, Envelope, HEADER_LEN, MAGIC_BYTE};

mod schema;
pub use schema::{RegisteredSchema, Schema, SchemaReference, SchemaType};

mod subject;
pub use subject::{MessageField, SerializationContext, SubjectNameFn, SubjectNameStrategy};

mod registry;
pub use registry::{MemoryRegistry, RegistryError, SchemaRegistry};

mod cache;
pub use cache::SubjectCache;

mod resolution;
pub use resolution::{resolve_schema_id, ResolutionMode};

mod validator;
pub use validator::{JsonSchemaValidator, PayloadValidator};

pub mod config;
pub use config::SerializerConfig;

mod serializer;
pub use serializer::{JsonSerializer, JsonSerializerBuilder, ToValueFn};

mod deserializer;
pub use deserializer::{FromValueFn, JsonDeserializer, JsonDeserializerBuilder};
