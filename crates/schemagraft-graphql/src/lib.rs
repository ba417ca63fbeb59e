//! # schemagraft-graphql
//!
//! GraphQL layer for the schemagraft server.
//!
//! This crate combines a schema exported by a Postgres-introspection tool
//! with a hand-written schema declared in-process, and serves the result
//! from a single endpoint. It supports:
//!
//! - Loading and re-serializing schema definition files
//! - Declaring hand-written fields and their resolvers
//! - Merging both schemas under an explicit collision policy
//! - Building an async-graphql dynamic schema from the merged document
//! - Axum handlers with batching and an optional GraphiQL explorer
//!
//! ## Configuration
//!
//! Add to `schemagraft.toml`:
//!
//! ```toml
//! [graphql]
//! schema_path = "schema/schema.graphql"
//! merge_policy = "reject"
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`schema`] - Schema model, loading, merging and assembly
//! - [`resolvers`] - In-process field declarations
//! - [`handler`] - Axum HTTP handlers
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod handler;
pub mod resolvers;
pub mod schema;

// Re-export main types
pub use config::GraphQLConfig;
pub use error::{GraphQLError, SchemaMergeError, SchemaParseError};
pub use handler::{GraphQLState, graphql_routes};
pub use resolvers::{FieldDescriptor, ResolverSet};
pub use schema::{
    ExecutableSchemaBuilder, MergePolicy, SchemaBuilderConfig, SchemaDocument, load_schema, merge,
};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
