use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema languages understood by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    /// Apache Avro schema format
    Avro,
    /// JSON Schema format
    Json,
    /// Protocol Buffers schema format
    Protobuf,
}

impl SchemaType {
    /// Convert to string representation for registry calls
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Json => "JSON",
            SchemaType::Protobuf => "PROTOBUF",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer to another registered schema that a composite schema imports.
///
/// References are carried to the registry as-is; they are not resolved here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaReference {
    pub name: String,
    pub subject: String,
    pub version: i32,
}

/// A schema definition as sent to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Raw definition text, exactly as configured
    pub definition: String,
    pub schema_type: SchemaType,
    #[serde(default)]
    pub references: Vec<SchemaReference>,
}

impl Schema {
    pub fn new(definition: impl Into<String>, schema_type: SchemaType) -> Self {
        Schema {
            definition: definition.into(),
            schema_type,
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<SchemaReference>) -> Self {
        self.references = references;
        self
    }
}

/// Result of a registry operation.
///
/// The codec only keeps `schema_id`; subject and version are informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSchema {
    pub schema_id: u32,
    pub subject: String,
    pub version: u32,
}
