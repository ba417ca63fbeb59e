//! Field descriptors and the resolver set.

use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::SchemaParseError;
use crate::schema::{
    FieldDefinition, FieldsDefinition, InputValueDefinition, RootOperations, SchemaDocument,
    TypeDefinition, TypeKind, TypeRef,
};

const ORIGIN: &str = "resolver declarations";

/// A resolver function as accepted by the dynamic schema.
pub type ResolverFn = Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

/// Declaration of one resolvable field.
#[derive(Clone)]
pub struct FieldDescriptor {
    parent_type: String,
    field: FieldDefinition,
    resolver: ResolverFn,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("parent_type", &self.parent_type)
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

impl FieldDescriptor {
    /// Declares a field on an arbitrary object type.
    pub fn new<F>(parent_type: impl Into<String>, name: impl Into<String>, ty: TypeRef, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        Self {
            parent_type: parent_type.into(),
            field: FieldDefinition::new(name, ty),
            resolver: Arc::new(resolver),
        }
    }

    /// Declares a field on the `Query` root.
    pub fn query<F>(name: impl Into<String>, ty: TypeRef, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        Self::new("Query", name, ty, resolver)
    }

    /// Declares a field on the `Mutation` root.
    pub fn mutation<F>(name: impl Into<String>, ty: TypeRef, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        Self::new("Mutation", name, ty, resolver)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.field.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.field.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.field.name
    }
}

/// All in-process declarations: resolvable fields plus supporting types.
#[derive(Debug, Clone, Default)]
pub struct ResolverSet {
    descriptors: Vec<FieldDescriptor>,
    types: Vec<TypeDefinition>,
}

impl ResolverSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field descriptor.
    #[must_use]
    pub fn with(mut self, descriptor: FieldDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Adds a type that declared fields refer to (object, enum, input, ...).
    #[must_use]
    pub fn with_type(mut self, ty: TypeDefinition) -> Self {
        self.register_type(ty);
        self
    }

    pub fn register(&mut self, descriptor: FieldDescriptor) {
        self.descriptors.push(descriptor);
    }

    pub fn register_type(&mut self, ty: TypeDefinition) {
        self.types.push(ty);
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.descriptors.iter()
    }

    /// Returns the resolver declared for `type_name.field_name`.
    #[must_use]
    pub fn resolver(&self, type_name: &str, field_name: &str) -> Option<&ResolverFn> {
        self.descriptors
            .iter()
            .find(|d| d.parent_type == type_name && d.field.name == field_name)
            .map(|d| &d.resolver)
    }

    /// Builds the schema described by these declarations.
    ///
    /// Supporting types come first, then each descriptor's field is added to
    /// its parent object, which is created on first use.
    ///
    /// # Errors
    ///
    /// Returns `SchemaParseError::Invalid` for duplicate types or fields, or
    /// when a descriptor targets a type that is not an object.
    pub fn build_schema(&self) -> Result<SchemaDocument, SchemaParseError> {
        let mut types: IndexMap<String, TypeDefinition> = IndexMap::new();

        for ty in &self.types {
            if types.insert(ty.name.clone(), ty.clone()).is_some() {
                return Err(SchemaParseError::invalid(
                    ORIGIN,
                    format!("type '{}' is declared more than once", ty.name),
                ));
            }
        }

        for descriptor in &self.descriptors {
            let parent = types
                .entry(descriptor.parent_type.clone())
                .or_insert_with(|| TypeDefinition::object(descriptor.parent_type.clone(), Vec::new()));
            let kind_name = parent.kind.as_str();
            let TypeKind::Object(FieldsDefinition { fields, .. }) = &mut parent.kind else {
                return Err(SchemaParseError::invalid(
                    ORIGIN,
                    format!(
                        "'{}.{}' is declared on {}, not an object",
                        descriptor.parent_type,
                        descriptor.field.name,
                        kind_name
                    ),
                ));
            };
            if fields
                .insert(descriptor.field.name.clone(), descriptor.field.clone())
                .is_some()
            {
                return Err(SchemaParseError::invalid(
                    ORIGIN,
                    format!(
                        "field '{}.{}' is declared more than once",
                        descriptor.parent_type, descriptor.field.name
                    ),
                ));
            }
        }

        let document = SchemaDocument::from_parts(RootOperations::default(), types);
        let roots = document.conventional_roots();
        debug!(
            types = document.len(),
            fields = self.descriptors.len(),
            "Built schema from resolver declarations"
        );
        Ok(document.with_roots(roots))
    }
}
