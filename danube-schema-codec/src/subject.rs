//! Subject naming.
//!
//! A subject is the registry slot a schema is registered against. It is
//! derived from the stream name, the message field and the schema's own
//! record name by a [`SubjectNameStrategy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which part of a message is being (de)serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageField {
    Key,
    Value,
}

impl MessageField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageField::Key => "key",
            MessageField::Value => "value",
        }
    }
}

impl fmt::Display for MessageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call metadata supplied by the caller. Never retained by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializationContext {
    pub stream_name: String,
    pub field: MessageField,
}

impl SerializationContext {
    pub fn new(stream_name: impl Into<String>, field: MessageField) -> Self {
        SerializationContext {
            stream_name: stream_name.into(),
            field,
        }
    }

    pub fn key(stream_name: impl Into<String>) -> Self {
        Self::new(stream_name, MessageField::Key)
    }

    pub fn value(stream_name: impl Into<String>) -> Self {
        Self::new(stream_name, MessageField::Value)
    }
}

/// User supplied naming function: `(context, record_name) -> subject`.
///
/// Must be pure: the same inputs always yield the same subject, since the
/// result is used as a cache key.
pub type SubjectNameFn = Arc<dyn Fn(&SerializationContext, &str) -> String + Send + Sync>;

#[derive(Clone, Default)]
pub enum SubjectNameStrategy {
    /// `{stream}-{field}`
    #[default]
    TopicName,
    /// `{stream}-{record_name}`
    TopicRecordName,
    /// `{record_name}`
    RecordName,
    Custom(SubjectNameFn),
}

impl SubjectNameStrategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&SerializationContext, &str) -> String + Send + Sync + 'static,
    {
        SubjectNameStrategy::Custom(Arc::new(f))
    }

    pub fn subject_name(&self, ctx: &SerializationContext, record_name: &str) -> String {
        match self {
            SubjectNameStrategy::TopicName => format!("{}-{}", ctx.stream_name, ctx.field),
            SubjectNameStrategy::TopicRecordName => {
                format!("{}-{}", ctx.stream_name, record_name)
            }
            SubjectNameStrategy::RecordName => record_name.to_string(),
            SubjectNameStrategy::Custom(f) => f(ctx, record_name),
        }
    }
}

impl fmt::Debug for SubjectNameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectNameStrategy::TopicName => f.write_str("TopicName"),
            SubjectNameStrategy::TopicRecordName => f.write_str("TopicRecordName"),
            SubjectNameStrategy::RecordName => f.write_str("RecordName"),
            SubjectNameStrategy::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

impl FromStr for SubjectNameStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "topic_name" | "TopicNameStrategy" | "topic_subject_name_strategy" => {
                Ok(SubjectNameStrategy::TopicName)
            }
            "topic_record_name"
            | "TopicRecordNameStrategy"
            | "topic_record_subject_name_strategy" => Ok(SubjectNameStrategy::TopicRecordName),
            "record_name" | "RecordNameStrategy" | "record_subject_name_strategy" => {
                Ok(SubjectNameStrategy::RecordName)
            }
            other => Err(format!("unknown subject name strategy: '{}'", other)),
        }
    }
}
