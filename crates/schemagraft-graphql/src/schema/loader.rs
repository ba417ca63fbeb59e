//! Schema file loading.
//!
//! Parsing is delegated to `async-graphql-parser`; this module converts the
//! parser's AST into a [`SchemaDocument`], folding `extend` definitions into
//! their base types. Directive definitions and applied directives are not
//! part of the document.

use std::path::Path;

use async_graphql_parser::types::{
    BaseType, FieldDefinition as AstField, InputValueDefinition as AstInputValue,
    SchemaDefinition, Type, TypeDefinition as AstType, TypeKind as AstKind, TypeSystemDefinition,
};
use async_graphql_parser::Positioned;
use indexmap::IndexMap;
use tracing::{debug, info};

use super::document::{
    is_builtin_scalar, EnumValueDefinition, FieldDefinition, FieldsDefinition, InputValueDefinition,
    RootOperations, SchemaDocument, TypeDefinition, TypeKind, TypeRef,
};
use crate::error::{GraphQLError, SchemaParseError};

/// Reads and parses the schema file at `path`.
///
/// Performs exactly one file read. Calling it again on an unchanged file
/// returns an equal document.
///
/// # Errors
///
/// Returns `SchemaParseError::Io` if the file is missing or unreadable, and
/// `Syntax`/`Invalid` if its contents are not a valid schema.
pub async fn load_schema(path: impl AsRef<Path>) -> Result<SchemaDocument, SchemaParseError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SchemaParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let document = parse_schema_str(&text, &path.display().to_string())?;
    info!(
        path = %path.display(),
        types = document.len(),
        "Loaded schema file"
    );
    Ok(document)
}

/// Parses SDL text into a document. `origin` names the source in errors.
///
/// # Errors
///
/// Returns `SchemaParseError::Syntax` for invalid SDL and
/// `SchemaParseError::Invalid` for duplicate or dangling definitions.
pub fn parse_schema_str(text: &str, origin: &str) -> Result<SchemaDocument, SchemaParseError> {
    let ast = async_graphql_parser::parse_schema(text).map_err(|e| SchemaParseError::Syntax {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;

    let mut builder = DocumentBuilder::new(origin);
    for definition in ast.definitions {
        match definition {
            TypeSystemDefinition::Schema(schema) => builder.schema(schema.node)?,
            TypeSystemDefinition::Type(ty) => builder.type_definition(ty.node)?,
            TypeSystemDefinition::Directive(directive) => {
                debug!(
                    directive = %directive.node.name.node,
                    "Ignoring directive definition"
                );
            }
        }
    }
    builder.finish()
}

/// Writes SDL to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns `GraphQLError::Export` if the file cannot be written.
pub async fn export_schema(path: impl AsRef<Path>, sdl: &str) -> Result<(), GraphQLError> {
    let path = path.as_ref();
    let export_err = |source| GraphQLError::Export {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(export_err)?;
    }
    tokio::fs::write(path, sdl).await.map_err(export_err)?;

    info!(path = %path.display(), bytes = sdl.len(), "Exported schema");
    Ok(())
}

struct DocumentBuilder<'a> {
    origin: &'a str,
    roots: Option<RootOperations>,
    types: IndexMap<String, TypeDefinition>,
    extensions: Vec<TypeDefinition>,
    schema_extensions: Vec<SchemaDefinition>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(origin: &'a str) -> Self {
        Self {
            origin,
            roots: None,
            types: IndexMap::new(),
            extensions: Vec::new(),
            schema_extensions: Vec::new(),
        }
    }

    fn schema(&mut self, schema: SchemaDefinition) -> Result<(), SchemaParseError> {
        if schema.extend {
            self.schema_extensions.push(schema);
            return Ok(());
        }
        if self.roots.is_some() {
            return Err(SchemaParseError::invalid(
                self.origin,
                "multiple schema definitions",
            ));
        }
        let query = schema.query.map(|name| name.node.to_string()).ok_or_else(|| {
            SchemaParseError::invalid(self.origin, "schema definition must declare a query root")
        })?;
        self.roots = Some(RootOperations {
            query,
            mutation: schema.mutation.map(|name| name.node.to_string()),
            subscription: schema.subscription.map(|name| name.node.to_string()),
        });
        Ok(())
    }

    fn type_definition(&mut self, ast: AstType) -> Result<(), SchemaParseError> {
        let name = ast.name.node.to_string();
        if is_builtin_scalar(&name) {
            debug!(name = %name, "Skipping built-in scalar declaration");
            return Ok(());
        }

        let definition = TypeDefinition {
            name: name.clone(),
            description: ast.description.map(|d| d.node),
            kind: convert_kind(self.origin, &name, ast.kind)?,
        };

        if ast.extend {
            self.extensions.push(definition);
            return Ok(());
        }
        if self.types.contains_key(&name) {
            return Err(SchemaParseError::invalid(
                self.origin,
                format!("type '{name}' is defined more than once"),
            ));
        }
        self.types.insert(name, definition);
        Ok(())
    }

    fn finish(mut self) -> Result<SchemaDocument, SchemaParseError> {
        for extension in std::mem::take(&mut self.extensions) {
            self.apply_extension(extension)?;
        }

        let document = SchemaDocument::from_parts(RootOperations::default(), self.types);
        let mut roots = self.roots.unwrap_or_else(|| document.conventional_roots());
        for extension in self.schema_extensions {
            if let Some(mutation) = extension.mutation {
                roots.mutation = Some(mutation.node.to_string());
            }
            if let Some(subscription) = extension.subscription {
                roots.subscription = Some(subscription.node.to_string());
            }
        }

        Ok(document.with_roots(roots))
    }

    fn apply_extension(&mut self, extension: TypeDefinition) -> Result<(), SchemaParseError> {
        let origin = self.origin;
        let name = extension.name.clone();
        let Some(base) = self.types.get_mut(&name) else {
            return Err(SchemaParseError::invalid(
                origin,
                format!("cannot extend undefined type '{name}'"),
            ));
        };

        let duplicate = |what: &str, item: &str| {
            SchemaParseError::invalid(origin, format!("{what} '{name}.{item}' is defined more than once"))
        };

        match (&mut base.kind, extension.kind) {
            (TypeKind::Scalar, TypeKind::Scalar) => {}
            (TypeKind::Object(base), TypeKind::Object(ext))
            | (TypeKind::Interface(base), TypeKind::Interface(ext)) => {
                for interface in ext.implements {
                    if !base.implements.contains(&interface) {
                        base.implements.push(interface);
                    }
                }
                for (field_name, field) in ext.fields {
                    if base.fields.contains_key(&field_name) {
                        return Err(duplicate("field", &field_name));
                    }
                    base.fields.insert(field_name, field);
                }
            }
            (TypeKind::Union { members }, TypeKind::Union { members: ext }) => {
                for member in ext {
                    if !members.contains(&member) {
                        members.push(member);
                    }
                }
            }
            (TypeKind::Enum { values }, TypeKind::Enum { values: ext }) => {
                for value in ext {
                    if values.iter().any(|v| v.name == value.name) {
                        return Err(duplicate("enum value", &value.name));
                    }
                    values.push(value);
                }
            }
            (TypeKind::InputObject { fields }, TypeKind::InputObject { fields: ext }) => {
                for (field_name, field) in ext {
                    if fields.contains_key(&field_name) {
                        return Err(duplicate("input field", &field_name));
                    }
                    fields.insert(field_name, field);
                }
            }
            (base_kind, ext_kind) => {
                return Err(SchemaParseError::invalid(
                    origin,
                    format!(
                        "type '{name}' is {} but is extended as {}",
                        base_kind.as_str(),
                        ext_kind.as_str()
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn convert_kind(origin: &str, type_name: &str, kind: AstKind) -> Result<TypeKind, SchemaParseError> {
    let duplicate = |what: &str, item: &str| {
        SchemaParseError::invalid(origin, format!("{what} '{type_name}.{item}' is defined more than once"))
    };

    let kind = match kind {
        AstKind::Scalar => TypeKind::Scalar,
        AstKind::Object(object) => TypeKind::Object(FieldsDefinition {
            implements: names(object.implements),
            fields: convert_fields(object.fields, &duplicate)?,
        }),
        AstKind::Interface(interface) => TypeKind::Interface(FieldsDefinition {
            implements: names(interface.implements),
            fields: convert_fields(interface.fields, &duplicate)?,
        }),
        AstKind::Union(union) => TypeKind::Union {
            members: names(union.members),
        },
        AstKind::Enum(enum_type) => {
            let mut values: Vec<EnumValueDefinition> = Vec::with_capacity(enum_type.values.len());
            for value in enum_type.values {
                let value = EnumValueDefinition {
                    name: value.node.value.node.to_string(),
                    description: value.node.description.map(|d| d.node),
                };
                if values.iter().any(|v| v.name == value.name) {
                    return Err(duplicate("enum value", &value.name));
                }
                values.push(value);
            }
            TypeKind::Enum { values }
        }
        AstKind::InputObject(input) => {
            let mut fields = IndexMap::with_capacity(input.fields.len());
            for field in input.fields {
                let field = convert_input_value(field.node);
                if fields.contains_key(&field.name) {
                    return Err(duplicate("input field", &field.name));
                }
                fields.insert(field.name.clone(), field);
            }
            TypeKind::InputObject { fields }
        }
    };
    Ok(kind)
}

fn names(names: Vec<Positioned<async_graphql_value::Name>>) -> Vec<String> {
    names.into_iter().map(|name| name.node.to_string()).collect()
}

fn convert_fields(
    fields: Vec<Positioned<AstField>>,
    duplicate: &impl Fn(&str, &str) -> SchemaParseError,
) -> Result<IndexMap<String, FieldDefinition>, SchemaParseError> {
    let mut converted = IndexMap::with_capacity(fields.len());
    for field in fields {
        let field = field.node;
        let name = field.name.node.to_string();
        let mut arguments: Vec<InputValueDefinition> = Vec::with_capacity(field.arguments.len());
        for argument in field.arguments {
            let argument = convert_input_value(argument.node);
            if arguments.iter().any(|a| a.name == argument.name) {
                return Err(duplicate("argument", &format!("{name}({})", argument.name)));
            }
            arguments.push(argument);
        }
        if converted.contains_key(&name) {
            return Err(duplicate("field", &name));
        }
        let definition = FieldDefinition {
            name: name.clone(),
            description: field.description.map(|d| d.node),
            arguments,
            ty: convert_type(&field.ty.node),
        };
        converted.insert(name, definition);
    }
    Ok(converted)
}

fn convert_input_value(value: AstInputValue) -> InputValueDefinition {
    InputValueDefinition {
        name: value.name.node.to_string(),
        description: value.description.map(|d| d.node),
        ty: convert_type(&value.ty.node),
        default_value: value.default_value.map(|v| v.node),
    }
}

fn convert_type(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::Named(name.to_string()),
        BaseType::List(inner) => TypeRef::List(Box::new(convert_type(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}
