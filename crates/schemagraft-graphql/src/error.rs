//! Error types for schema loading, merging and GraphQL execution.
//!
//! Startup errors (`SchemaParseError`, `SchemaMergeError`) are fatal and are
//! surfaced to the process entry point. `GraphQLError` covers schema assembly
//! and request-level failures that map onto HTTP responses.

use std::path::PathBuf;

/// Errors raised while reading or parsing a schema definition.
#[derive(Debug, thiserror::Error)]
pub enum SchemaParseError {
    /// The schema file is missing or could not be read.
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema text is not valid SDL.
    #[error("invalid schema syntax in {origin}: {message}")]
    Syntax { origin: String, message: String },

    /// The schema parsed but is structurally inconsistent.
    #[error("invalid schema in {origin}: {message}")]
    Invalid { origin: String, message: String },
}

impl SchemaParseError {
    pub(crate) fn invalid(origin: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            origin: origin.to_string(),
            message: message.into(),
        }
    }
}

/// Errors raised while merging two schema documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaMergeError {
    /// A type is defined differently in both schemas.
    #[error("type '{type_name}' is defined in both schemas")]
    TypeCollision { type_name: String },

    /// A root operation field is defined in both schemas.
    #[error("field '{type_name}.{field_name}' is defined in both schemas")]
    FieldCollision {
        type_name: String,
        field_name: String,
    },

    /// A type has a different kind in each schema.
    #[error("type '{type_name}' is {primary} in one schema and {secondary} in the other")]
    KindMismatch {
        type_name: String,
        primary: &'static str,
        secondary: &'static str,
    },

    /// Both schemas name the same root operation differently.
    #[error("{operation} root is '{primary}' in one schema and '{secondary}' in the other")]
    RootMismatch {
        operation: &'static str,
        primary: String,
        secondary: String,
    },
}

impl SchemaMergeError {
    /// Returns the name of the type the conflict was found on.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::TypeCollision { type_name }
            | Self::FieldCollision { type_name, .. }
            | Self::KindMismatch { type_name, .. } => type_name,
            Self::RootMismatch { primary, .. } => primary,
        }
    }
}

/// Errors that can occur while assembling or serving the GraphQL schema.
#[derive(Debug, thiserror::Error)]
pub enum GraphQLError {
    /// The executable schema could not be built from the merged document.
    #[error("Failed to build GraphQL schema: {0}")]
    SchemaBuildFailed(String),

    /// A batched request was sent while batching is disabled.
    #[error("Batched queries are not enabled")]
    BatchingDisabled,

    /// A batched request exceeded the configured size.
    #[error("Batch of {actual} queries exceeds maximum allowed {max}")]
    BatchTooLarge {
        /// Number of operations in the batch.
        actual: usize,
        /// Maximum allowed batch size.
        max: usize,
    },

    /// Writing a generated schema artifact failed.
    #[error("Failed to export schema to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphQLError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaBuildFailed(_) | Self::Export { .. } => 500,
            Self::BatchingDisabled | Self::BatchTooLarge { .. } => 400,
        }
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::BatchingDisabled => "BATCHING_DISABLED",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            Self::Export { .. } => "SCHEMA_EXPORT_FAILED",
        }
    }

    /// Converts the error to a GraphQL response body.
    #[must_use]
    pub fn to_response_body(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": [{
                "message": self.to_string(),
                "extensions": { "code": self.error_code() }
            }]
        })
    }
}
