use crate::errors::{Result, SchemaCodecError};
use crate::resolution::ResolutionMode;
use crate::subject::SubjectNameStrategy;

pub const AUTO_REGISTER_SCHEMAS: &str = "auto.register.schemas";
pub const NORMALIZE_SCHEMAS: &str = "normalize.schemas";
pub const USE_LATEST_VERSION: &str = "use.latest.version";
pub const SUBJECT_NAME_STRATEGY: &str = "subject.name.strategy";

/// Serializer configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Register the schema under the subject if it is not there yet.
    pub auto_register_schemas: bool,
    /// Ask the registry to canonicalize the schema before matching.
    /// Ignored when `use_latest_version` is set.
    pub normalize_schemas: bool,
    /// Bind to the latest schema of the subject. No compatibility check is
    /// made between that schema and the values being serialized.
    pub use_latest_version: bool,
    pub subject_name_strategy: SubjectNameStrategy,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        SerializerConfig {
            auto_register_schemas: true,
            normalize_schemas: false,
            use_latest_version: false,
            subject_name_strategy: SubjectNameStrategy::TopicName,
        }
    }
}

impl SerializerConfig {
    /// Build a configuration from string properties, starting from the defaults.
    ///
    /// Any key other than the four recognized ones is rejected.
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = SerializerConfig::default();
        let mut unrecognized = Vec::new();

        for (key, value) in properties {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                AUTO_REGISTER_SCHEMAS => config.auto_register_schemas = parse_bool(key, value)?,
                NORMALIZE_SCHEMAS => config.normalize_schemas = parse_bool(key, value)?,
                USE_LATEST_VERSION => config.use_latest_version = parse_bool(key, value)?,
                SUBJECT_NAME_STRATEGY => {
                    config.subject_name_strategy =
                        value.parse().map_err(SchemaCodecError::Configuration)?
                }
                other => unrecognized.push(other.to_string()),
            }
        }

        if !unrecognized.is_empty() {
            unrecognized.sort();
            return Err(SchemaCodecError::Configuration(format!(
                "Unrecognized properties: {}",
                unrecognized.join(", ")
            )));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_subject_name_strategy(mut self, strategy: SubjectNameStrategy) -> Self {
        self.subject_name_strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.use_latest_version && self.auto_register_schemas {
            return Err(SchemaCodecError::Configuration(format!(
                "cannot enable both {} and {}",
                USE_LATEST_VERSION, AUTO_REGISTER_SCHEMAS
            )));
        }
        Ok(())
    }

    pub fn resolution_mode(&self) -> ResolutionMode {
        if self.use_latest_version {
            ResolutionMode::UseLatest
        } else if self.auto_register_schemas {
            ResolutionMode::AutoRegister {
                normalize: self.normalize_schemas,
            }
        } else {
            ResolutionMode::LookupOnly {
                normalize: self.normalize_schemas,
            }
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .trim()
        .parse::<bool>()
        .map_err(|_| SchemaCodecError::Configuration(format!("{} must be a boolean value", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SerializerConfig::default();
        assert!(config.auto_register_schemas);
        assert!(!config.normalize_schemas);
        assert!(!config.use_latest_version);
        assert!(matches!(
            config.subject_name_strategy,
            SubjectNameStrategy::TopicName
        ));
        assert_eq!(
            config.resolution_mode(),
            ResolutionMode::AutoRegister { normalize: false }
        );
    }

    #[test]
    fn test_from_properties_parses_known_keys() {
        let config = SerializerConfig::from_properties([
            (AUTO_REGISTER_SCHEMAS, "false"),
            (NORMALIZE_SCHEMAS, "true"),
            (SUBJECT_NAME_STRATEGY, "record_name"),
        ])
        .unwrap();

        assert_eq!(
            config.resolution_mode(),
            ResolutionMode::LookupOnly { normalize: true }
        );
        assert!(matches!(
            config.subject_name_strategy,
            SubjectNameStrategy::RecordName
        ));
    }

    #[test]
    fn test_auto_register_and_use_latest_conflict() {
        let err = SerializerConfig::from_properties([(USE_LATEST_VERSION, "true")]).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot enable both use.latest.version and auto.register.schemas"));

        let config = SerializerConfig::from_properties([
            (USE_LATEST_VERSION, "true"),
            (AUTO_REGISTER_SCHEMAS, "false"),
            (NORMALIZE_SCHEMAS, "true"),
        ])
        .unwrap();
        assert_eq!(config.resolution_mode(), ResolutionMode::UseLatest);
    }

    #[test]
    fn test_unrecognized_keys_are_rejected() {
        let err = SerializerConfig::from_properties([
            ("use.schema.id", "1"),
            (NORMALIZE_SCHEMAS, "true"),
            ("auto.offset.reset", "earliest"),
        ])
        .unwrap_err();

        match err {
            SchemaCodecError::Configuration(msg) => {
                assert_eq!(msg, "Unrecognized properties: auto.offset.reset, use.schema.id")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_boolean_value_is_rejected() {
        let err = SerializerConfig::from_properties([(AUTO_REGISTER_SCHEMAS, "yes")]).unwrap_err();
        assert!(err
            .to_string()
            .contains("auto.register.schemas must be a boolean value"));
    }
}
