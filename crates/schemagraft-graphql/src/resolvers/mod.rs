//! In-process resolver declarations.
//!
//! Hand-written queries are declared as [`FieldDescriptor`]s and collected in
//! a [`ResolverSet`]. The set produces the primary [`SchemaDocument`] that is
//! merged with the file-based schema, and supplies the resolver functions
//! when the executable schema is assembled.
//!
//! - `descriptor`: descriptors and the resolver set
//! - `fallback`: resolution for fields without a declared resolver

mod descriptor;
mod fallback;

pub use descriptor::{FieldDescriptor, ResolverFn, ResolverSet};
pub(crate) use fallback::FallbackResolver;
