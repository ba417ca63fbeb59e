//! GraphQL configuration.
//!
//! Configuration can be specified in `schemagraft.toml` under the
//! `[graphql]` section.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! schema_path = "schema/schema.graphql"
//! export_schema_path = "schema/merged.graphql"
//! merge_policy = "reject"
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schema::MergePolicy;

/// GraphQL API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Schema file exported by the introspection middleware.
    /// Default: schema/schema.graphql
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Where to write the merged schema at startup. Not written if unset.
    #[serde(default)]
    pub export_schema_path: Option<PathBuf>,

    /// Where to write the resolver-derived schema at startup. Not written if unset.
    #[serde(default)]
    pub auto_schema_path: Option<PathBuf>,

    /// HTTP path of the query endpoint.
    /// Default: /graphql
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// How to handle a type defined in both schemas.
    /// Default: reject
    #[serde(default)]
    pub merge_policy: MergePolicy,

    /// Maximum query depth allowed.
    /// Limits nesting of fields to prevent denial-of-service attacks.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Allow multiple operations in a single request.
    /// Default: true
    #[serde(default = "default_batching")]
    pub batching: bool,

    /// Maximum batch size for batched queries.
    /// Only applies if batching is enabled.
    /// Default: 10
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema/schema.graphql")
}

fn default_endpoint() -> String {
    "/graphql".into()
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_batching() -> bool {
    true
}

fn default_max_batch_size() -> usize {
    10
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            schema_path: default_schema_path(),
            export_schema_path: None,
            auto_schema_path: None,
            endpoint: default_endpoint(),
            merge_policy: MergePolicy::default(),
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            batching: default_batching(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_path.as_os_str().is_empty() {
            return Err("graphql.schema_path must not be empty".into());
        }
        if !self.endpoint.starts_with('/') {
            return Err("graphql.endpoint must start with '/'".into());
        }
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        if self.batching && self.max_batch_size == 0 {
            return Err("graphql.max_batch_size must be > 0 when batching is enabled".into());
        }
        Ok(())
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> crate::SchemaBuilderConfig {
        crate::SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphQLConfig::default();
        assert_eq!(config.schema_path, PathBuf::from("schema/schema.graphql"));
        assert_eq!(config.endpoint, "/graphql");
        assert_eq!(config.merge_policy, MergePolicy::Reject);
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert!(config.batching);
        assert_eq!(config.max_batch_size, 10);
        assert!(config.export_schema_path.is_none());
    }

    #[test]
    fn test_valid_config() {
        assert!(GraphQLConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_endpoint() {
        let mut config = GraphQLConfig::default();
        config.endpoint = "graphql".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_max_depth() {
        let mut config = GraphQLConfig::default();
        config.max_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_batch_size() {
        let mut config = GraphQLConfig::default();
        config.max_batch_size = 0;
        assert!(config.validate().is_err());
        config.batching = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            schema_path = "db/schema.graphql"
            export_schema_path = "out/merged.graphql"
            merge_policy = "deep_merge"
            max_depth = 20
            introspection = false
        "#;

        let config: GraphQLConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.schema_path, PathBuf::from("db/schema.graphql"));
        assert_eq!(
            config.export_schema_path,
            Some(PathBuf::from("out/merged.graphql"))
        );
        assert_eq!(config.merge_policy, MergePolicy::DeepMerge);
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 500);
        assert!(!config.introspection);
    }
}
