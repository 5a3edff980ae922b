use thiserror::Error;

use crate::registry::RegistryError;

pub type Result<T> = std::result::Result<T, SchemaCodecError>;

#[derive(Debug, Error)]
pub enum SchemaCodecError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error("schema registry error for subject '{subject}': {source}")]
    Registry {
        subject: String,
        #[source]
        source: RegistryError,
    },

    #[error("schema validation failed: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Malformed wire envelope. Fatal for the message, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error(
        "Expecting data framing of length 6 bytes or more but total data size is {len} bytes. \
         This message was not produced with a schema registry serializer"
    )]
    TooShort { len: usize },

    #[error(
        "Unexpected magic byte {found}. This message was not produced with a schema registry serializer"
    )]
    UnexpectedMagicByte { found: u8 },
}

impl SchemaCodecError {
    /// The subject whose resolution failed, if this is a registry error.
    pub fn subject(&self) -> Option<&str> {
        match self {
            SchemaCodecError::Registry { subject, .. } => Some(subject),
            _ => None,
        }
    }
}
