//! Turning a (subject, schema) pair into a registry schema id.

use std::fmt;
use tracing::{info, warn};

use crate::registry::{RegistryError, SchemaRegistry};
use crate::schema::Schema;

/// How a serializer obtains the schema id for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Register the schema, creating the subject association if missing.
    AutoRegister { normalize: bool },
    /// Bind to whatever schema currently occupies the subject.
    /// The local schema is not compared against it.
    UseLatest,
    /// The schema must already be registered under the subject.
    LookupOnly { normalize: bool },
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMode::AutoRegister { .. } => f.write_str("auto-register"),
            ResolutionMode::UseLatest => f.write_str("use-latest"),
            ResolutionMode::LookupOnly { .. } => f.write_str("lookup-only"),
        }
    }
}

/// Resolve the schema id for `subject` with a single registry call.
///
/// Failures are returned as-is; there is no retry at this level.
pub async fn resolve_schema_id(
    registry: &dyn SchemaRegistry,
    subject: &str,
    schema: &Schema,
    mode: ResolutionMode,
) -> Result<u32, RegistryError> {
    let result = match mode {
        ResolutionMode::AutoRegister { normalize } => {
            registry.register_schema(subject, schema, normalize).await
        }
        ResolutionMode::UseLatest => registry
            .get_latest_version(subject)
            .await
            .map(|latest| latest.schema_id),
        ResolutionMode::LookupOnly { normalize } => registry
            .lookup_schema(subject, schema, normalize)
            .await
            .map(|registered| registered.schema_id),
    };

    match &result {
        Ok(schema_id) => {
            info!(subject = %subject, schema_id = %schema_id, mode = %mode, "resolved schema id for subject")
        }
        Err(e) => {
            warn!(subject = %subject, mode = %mode, error = %e, "failed to resolve schema id for subject")
        }
    }

    result
}
