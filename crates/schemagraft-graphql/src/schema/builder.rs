//! Executable schema builder.
//!
//! This module provides `ExecutableSchemaBuilder`, which turns a merged
//! [`SchemaDocument`] into an async-graphql dynamic schema. Declared
//! resolvers are attached where the [`ResolverSet`] has one; every other
//! field gets the fallback resolver.

use async_graphql::dynamic::{
    Enum, EnumItem, Field, InputObject, InputValue, Interface, InterfaceField, Object, Scalar,
    Schema, SchemaBuilder, TypeRef as DynTypeRef, Union,
};
use tracing::{debug, warn};

use super::document::{FieldDefinition, FieldsDefinition, InputValueDefinition, SchemaDocument, TypeKind, TypeRef};
use crate::error::GraphQLError;
use crate::resolvers::{FallbackResolver, ResolverSet};

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
        }
    }
}

/// Builds the executable schema from a merged document.
///
/// # Example
///
/// ```ignore
/// let merged = merge(&resolvers.build_schema()?, &file_schema, MergePolicy::Reject)?;
/// let schema = ExecutableSchemaBuilder::new(&merged, &resolvers, SchemaBuilderConfig::default())
///     .build()?;
/// ```
pub struct ExecutableSchemaBuilder<'a> {
    document: &'a SchemaDocument,
    resolvers: &'a ResolverSet,
    config: SchemaBuilderConfig,
}

impl<'a> ExecutableSchemaBuilder<'a> {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new(document: &'a SchemaDocument, resolvers: &'a ResolverSet, config: SchemaBuilderConfig) -> Self {
        Self {
            document,
            resolvers,
            config,
        }
    }

    /// Builds the GraphQL schema.
    ///
    /// Subscription roots are not served; a subscription root type in the
    /// document is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaBuildFailed` if async-graphql rejects the
    /// schema, e.g. when a field refers to an undefined type.
    pub fn build(&self) -> Result<Schema, GraphQLError> {
        debug!(types = self.document.len(), "Starting GraphQL schema build");

        let roots = self.document.roots();
        let mut schema_builder = Schema::build(&roots.query, roots.mutation.as_deref(), None);

        for ty in self.document.types() {
            if roots.subscription.as_deref() == Some(ty.name.as_str()) {
                warn!(type_name = %ty.name, "Subscription root is not served; skipping");
                continue;
            }
            schema_builder = match &ty.kind {
                TypeKind::Scalar => {
                    let mut scalar = Scalar::new(&ty.name);
                    if let Some(description) = &ty.description {
                        scalar = scalar.description(description);
                    }
                    schema_builder.register(scalar)
                }
                TypeKind::Object(def) => schema_builder.register(self.build_object(&ty.name, ty.description.as_deref(), def)),
                TypeKind::Interface(def) => {
                    schema_builder.register(build_interface(&ty.name, ty.description.as_deref(), def))
                }
                TypeKind::Union { members } => {
                    let mut union = Union::new(&ty.name);
                    if let Some(description) = &ty.description {
                        union = union.description(description);
                    }
                    for member in members {
                        union = union.possible_type(member);
                    }
                    schema_builder.register(union)
                }
                TypeKind::Enum { values } => {
                    let mut enum_type = Enum::new(&ty.name);
                    if let Some(description) = &ty.description {
                        enum_type = enum_type.description(description);
                    }
                    for value in values {
                        let mut item = EnumItem::new(&value.name);
                        if let Some(description) = &value.description {
                            item = item.description(description);
                        }
                        enum_type = enum_type.item(item);
                    }
                    schema_builder.register(enum_type)
                }
                TypeKind::InputObject { fields } => {
                    let mut input = InputObject::new(&ty.name);
                    if let Some(description) = &ty.description {
                        input = input.description(description);
                    }
                    for field in fields.values() {
                        input = input.field(build_input_value(field));
                    }
                    schema_builder.register(input)
                }
            };
        }

        let schema_builder = self.apply_limits(schema_builder);

        let schema = schema_builder
            .finish()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;

        debug!("GraphQL schema build complete");
        Ok(schema)
    }

    fn apply_limits(&self, builder: SchemaBuilder) -> SchemaBuilder {
        let mut builder = builder
            .limit_depth(self.config.max_depth)
            .limit_complexity(self.config.max_complexity);
        if !self.config.introspection_enabled {
            builder = builder.disable_introspection();
        }
        builder
    }

    fn build_object(&self, name: &str, description: Option<&str>, def: &FieldsDefinition) -> Object {
        let mut object = Object::new(name);
        if let Some(description) = description {
            object = object.description(description);
        }
        for interface in &def.implements {
            object = object.implement(interface);
        }
        for field in def.fields.values() {
            object = object.field(self.build_field(name, field));
        }
        object
    }

    fn build_field(&self, parent: &str, field: &FieldDefinition) -> Field {
        let ty = to_dynamic_type(&field.ty);
        let mut built = match self.resolvers.resolver(parent, &field.name) {
            Some(resolver) => {
                let resolver = resolver.clone();
                Field::new(&field.name, ty, move |ctx| resolver(ctx))
            }
            None => {
                let abstract_type = self
                    .document
                    .get_type(field.ty.base_name())
                    .is_some_and(|t| t.kind.is_abstract());
                Field::new(
                    &field.name,
                    ty,
                    FallbackResolver::resolve(field.name.clone(), abstract_type),
                )
            }
        };
        if let Some(description) = &field.description {
            built = built.description(description);
        }
        for argument in &field.arguments {
            built = built.argument(build_input_value(argument));
        }
        built
    }
}

fn build_interface(name: &str, description: Option<&str>, def: &FieldsDefinition) -> Interface {
    let mut interface = Interface::new(name);
    if let Some(description) = description {
        interface = interface.description(description);
    }
    for parent in &def.implements {
        interface = interface.implement(parent);
    }
    for field in def.fields.values() {
        let mut built = InterfaceField::new(&field.name, to_dynamic_type(&field.ty));
        if let Some(description) = &field.description {
            built = built.description(description);
        }
        for argument in &field.arguments {
            built = built.argument(build_input_value(argument));
        }
        interface = interface.field(built);
    }
    interface
}

fn build_input_value(value: &InputValueDefinition) -> InputValue {
    let mut input = InputValue::new(&value.name, to_dynamic_type(&value.ty));
    if let Some(description) = &value.description {
        input = input.description(description);
    }
    if let Some(default) = &value.default_value {
        input = input.default_value(default.clone());
    }
    input
}

/// Converts a document type reference into the dynamic schema's form.
#[must_use]
pub fn to_dynamic_type(ty: &TypeRef) -> DynTypeRef {
    match ty {
        TypeRef::Named(name) => DynTypeRef::Named(name.clone().into()),
        TypeRef::List(inner) => DynTypeRef::List(Box::new(to_dynamic_type(inner))),
        TypeRef::NonNull(inner) => DynTypeRef::NonNull(Box::new(to_dynamic_type(inner))),
    }
}
