//! Schema loading, merging and assembly.
//!
//! ## Components
//!
//! - [`SchemaDocument`] - In-memory schema representation
//! - [`load_schema`] - Reads a schema file into a document
//! - [`merge`] - Combines the resolver-derived and file-based documents
//! - [`ExecutableSchemaBuilder`] - Builds the async-graphql schema
//!
//! ## Architecture
//!
//! The startup sequence is strictly ordered:
//! 1. The file-based schema is loaded
//! 2. The resolver set produces the primary schema
//! 3. Both are merged under a [`MergePolicy`]
//! 4. The merged document becomes the executable schema, which is then
//!    shared read-only for the life of the process

mod builder;
mod document;
mod loader;
mod merge;

pub use builder::{ExecutableSchemaBuilder, SchemaBuilderConfig, to_dynamic_type};
pub use document::{
    BUILTIN_SCALARS, EnumValueDefinition, FieldDefinition, FieldsDefinition, InputValueDefinition,
    RootOperations, SchemaDocument, TypeDefinition, TypeKind, TypeRef, is_builtin_scalar,
};
pub use loader::{export_schema, load_schema, parse_schema_str};
pub use merge::{MergePolicy, merge};
