use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use thiserror::Error;
use tracing::info;

use crate::schema::{RegisteredSchema, Schema};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("subject '{0}' not found")]
    SubjectNotFound(String),

    #[error("schema not found under subject '{0}'")]
    SchemaNotFound(String),

    #[error("schema conflicts with subject '{subject}': {reason}")]
    Conflict { subject: String, reason: String },

    #[error("registry transport error: {0}")]
    Transport(String),
}

/// Logical operations of a schema registry consumed by the codec.
///
/// Transport, authentication and retries belong to the implementor.
#[async_trait]
pub trait SchemaRegistry: Send + Sync + 'static {
    /// Register `schema` under `subject`, returning its id. Registering
    /// identical content again returns the existing id.
    async fn register_schema(
        &self,
        subject: &str,
        schema: &Schema,
        normalize: bool,
    ) -> Result<u32, RegistryError>;

    /// Find `schema` among the versions already registered under `subject`.
    async fn lookup_schema(
        &self,
        subject: &str,
        schema: &Schema,
        normalize: bool,
    ) -> Result<RegisteredSchema, RegistryError>;

    /// The schema currently occupying `subject`.
    async fn get_latest_version(&self, subject: &str) -> Result<RegisteredSchema, RegistryError>;
}

#[derive(Debug, Clone)]
struct SubjectVersion {
    version: u32,
    schema_id: u32,
    schema: Schema,
    fingerprint: String,
}

/// MemoryRegistry is an in-process registry that implements the SchemaRegistry trait.
/// SHOULD BE USED ONLY FOR TESTING PURPOSES
///
/// Identical content shares one id across subjects, every new content under
/// a subject gets the next version. No compatibility checks are made.
#[derive(Debug)]
pub struct MemoryRegistry {
    subjects: DashMap<String, Vec<SubjectVersion>>,
    ids_by_fingerprint: DashMap<String, u32>,
    next_id: AtomicU32,
    register_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
    latest_calls: AtomicUsize,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Registry whose first assigned schema id is `first_id`.
    pub fn starting_at(first_id: u32) -> Self {
        MemoryRegistry {
            subjects: DashMap::new(),
            ids_by_fingerprint: DashMap::new(),
            next_id: AtomicU32::new(first_id),
            register_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            latest_calls: AtomicUsize::new(0),
        }
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    /// Total number of registry operations served.
    pub fn total_calls(&self) -> usize {
        self.register_calls() + self.lookup_calls() + self.latest_calls()
    }

    /// Versions registered under `subject`, oldest first.
    pub fn versions(&self, subject: &str) -> Vec<u32> {
        self.subjects
            .get(subject)
            .map(|versions| versions.iter().map(|v| v.version).collect())
            .unwrap_or_default()
    }

    /// Parse and re-serialize a JSON definition. Keys come out sorted and
    /// whitespace is dropped. Non-JSON definitions are returned untouched.
    fn canonicalize(definition: &str) -> String {
        serde_json::from_str::<Value>(definition)
            .and_then(|value| serde_json::to_string(&sort_keys(value)))
            .unwrap_or_else(|_| definition.to_string())
    }

    fn fingerprint(schema: &Schema, normalize: bool) -> String {
        let mut hasher = Sha256::new();
        hasher.update(schema.schema_type.as_str().as_bytes());
        if normalize {
            hasher.update(Self::canonicalize(&schema.definition).as_bytes());
        } else {
            hasher.update(schema.definition.as_bytes());
        }
        for reference in &schema.references {
            hasher.update(
                format!(
                    "|{}:{}:{}",
                    reference.name, reference.subject, reference.version
                )
                .as_bytes(),
            );
        }
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

// Rebuilds objects in key order so the output does not depend on the
// map implementation serde_json was compiled with.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[async_trait]
impl SchemaRegistry for MemoryRegistry {
    async fn register_schema(
        &self,
        subject: &str,
        schema: &Schema,
        normalize: bool,
    ) -> Result<u32, RegistryError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);

        let stored = if normalize {
            Schema {
                definition: Self::canonicalize(&schema.definition),
                ..schema.clone()
            }
        } else {
            schema.clone()
        };
        let fingerprint = Self::fingerprint(&stored, false);

        let mut versions = self.subjects.entry(subject.to_string()).or_default();

        if let Some(existing) = versions.iter().find(|v| v.fingerprint == fingerprint) {
            return Ok(existing.schema_id);
        }

        let schema_id = *self
            .ids_by_fingerprint
            .entry(fingerprint.clone())
            .or_insert_with(|| self.next_id.fetch_add(1, Ordering::SeqCst));
        let version = versions.last().map(|v| v.version + 1).unwrap_or(1);

        versions.push(SubjectVersion {
            version,
            schema_id,
            schema: stored,
            fingerprint,
        });

        info!(subject = %subject, schema_id = %schema_id, version = %version, "registered schema version");
        Ok(schema_id)
    }

    async fn lookup_schema(
        &self,
        subject: &str,
        schema: &Schema,
        normalize: bool,
    ) -> Result<RegisteredSchema, RegistryError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);

        let versions = self
            .subjects
            .get(subject)
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))?;

        let wanted = Self::fingerprint(schema, normalize);
        versions
            .iter()
            .find(|v| {
                if normalize {
                    Self::fingerprint(&v.schema, true) == wanted
                } else {
                    v.fingerprint == wanted
                }
            })
            .map(|v| RegisteredSchema {
                schema_id: v.schema_id,
                subject: subject.to_string(),
                version: v.version,
            })
            .ok_or_else(|| RegistryError::SchemaNotFound(subject.to_string()))
    }

    async fn get_latest_version(&self, subject: &str) -> Result<RegisteredSchema, RegistryError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);

        self.subjects
            .get(subject)
            .and_then(|versions| {
                versions.last().map(|v| RegisteredSchema {
                    schema_id: v.schema_id,
                    subject: subject.to_string(),
                    version: v.version,
                })
            })
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;

    const ORDER: &str = r#"{"title": "Order", "type": "object"}"#;
    const ORDER_REORDERED: &str = r#"{"type":"object","title":"Order"}"#;

    #[tokio::test]
    async fn test_register_is_idempotent_per_content() {
        let registry = MemoryRegistry::new();
        let schema = Schema::new(ORDER, SchemaType::Json);

        let first = registry.register_schema("orders-value", &schema, false).await.unwrap();
        let second = registry.register_schema("orders-value", &schema, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.versions("orders-value"), vec![1]);
        assert_eq!(registry.register_calls(), 2);
    }

    #[tokio::test]
    async fn test_same_content_shares_id_across_subjects() {
        let registry = MemoryRegistry::new();
        let schema = Schema::new(ORDER, SchemaType::Json);

        let a = registry.register_schema("orders-value", &schema, false).await.unwrap();
        let b = registry.register_schema("Order", &schema, false).await.unwrap();
        assert_eq!(a, b);

        let other = Schema::new(r#"{"title": "Refund"}"#, SchemaType::Json);
        let c = registry.register_schema("orders-value", &other, false).await.unwrap();
        assert_ne!(a, c);
        assert_eq!(registry.versions("orders-value"), vec![1, 2]);

        let latest = registry.get_latest_version("orders-value").await.unwrap();
        assert_eq!(latest.schema_id, c);
        assert_eq!(latest.version, 2);
    }

    #[tokio::test]
    async fn test_lookup_requires_prior_registration() {
        let registry = MemoryRegistry::new();
        let schema = Schema::new(ORDER, SchemaType::Json);

        assert_eq!(
            registry.lookup_schema("orders-value", &schema, false).await,
            Err(RegistryError::SubjectNotFound("orders-value".into()))
        );

        registry
            .register_schema("orders-value", &Schema::new(r#"{"title":"X"}"#, SchemaType::Json), false)
            .await
            .unwrap();
        assert_eq!(
            registry.lookup_schema("orders-value", &schema, false).await,
            Err(RegistryError::SchemaNotFound("orders-value".into()))
        );
    }

    #[tokio::test]
    async fn test_normalize_matches_reformatted_content() {
        let registry = MemoryRegistry::starting_at(100);
        let id = registry
            .register_schema("orders-value", &Schema::new(ORDER, SchemaType::Json), true)
            .await
            .unwrap();
        assert_eq!(id, 100);

        let reordered = Schema::new(ORDER_REORDERED, SchemaType::Json);
        assert!(registry
            .lookup_schema("orders-value", &reordered, false)
            .await
            .is_err());

        let found = registry
            .lookup_schema("orders-value", &reordered, true)
            .await
            .unwrap();
        assert_eq!(found.schema_id, 100);
    }

    #[tokio::test]
    async fn test_latest_on_unknown_subject_fails() {
        let registry = MemoryRegistry::new();
        assert!(matches!(
            registry.get_latest_version("missing").await,
            Err(RegistryError::SubjectNotFound(_))
        ));
        assert_eq!(registry.latest_calls(), 1);
    }
}
