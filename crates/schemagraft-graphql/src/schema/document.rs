//! In-memory schema representation.
//!
//! A `SchemaDocument` is an ordered map from type name to definition plus the
//! names of the root operation types. Built-in scalars are implicit and never
//! stored. Documents are built once at startup and never mutated afterwards.

use std::fmt::{self, Write as _};

use async_graphql::Value;
use indexmap::IndexMap;

/// Scalars every GraphQL schema provides without declaring them.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Returns true if `name` is one of the built-in scalars.
#[must_use]
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// Reference to a type, with list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Nullable named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Non-null named type.
    pub fn named_nn(name: impl Into<String>) -> Self {
        Self::NonNull(Box::new(Self::named(name)))
    }

    /// Nullable list of nullable named items.
    pub fn named_list(name: impl Into<String>) -> Self {
        Self::List(Box::new(Self::named(name)))
    }

    /// Non-null list of non-null named items.
    pub fn named_nn_list_nn(name: impl Into<String>) -> Self {
        Self::NonNull(Box::new(Self::List(Box::new(Self::named_nn(name)))))
    }

    /// The innermost named type.
    #[must_use]
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// An argument or input object field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

impl InputValueDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// A field on an object or interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: TypeRef,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            ty,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// A single enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
}

/// Fields shared by object and interface types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldsDefinition {
    pub implements: Vec<String>,
    pub fields: IndexMap<String, FieldDefinition>,
}

/// The kind-specific part of a type definition.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Scalar,
    Object(FieldsDefinition),
    Interface(FieldsDefinition),
    Union { members: Vec<String> },
    Enum { values: Vec<EnumValueDefinition> },
    InputObject { fields: IndexMap<String, InputValueDefinition> },
}

impl TypeKind {
    /// Human-readable kind name, used in error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "a scalar",
            Self::Object(_) => "an object",
            Self::Interface(_) => "an interface",
            Self::Union { .. } => "a union",
            Self::Enum { .. } => "an enum",
            Self::InputObject { .. } => "an input object",
        }
    }

    /// Returns true for interfaces and unions.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union { .. })
    }
}

/// A named type in a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub kind: TypeKind,
}

impl TypeDefinition {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: TypeKind::Scalar,
        }
    }

    /// An object type with the given fields.
    pub fn object(name: impl Into<String>, fields: impl IntoIterator<Item = FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: TypeKind::Object(FieldsDefinition {
                implements: Vec::new(),
                fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
            }),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Object or interface fields, if this type has any.
    #[must_use]
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDefinition>> {
        match &self.kind {
            TypeKind::Object(def) | TypeKind::Interface(def) => Some(&def.fields),
            _ => None,
        }
    }

    /// Looks up a field on an object or interface type.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields().and_then(|fields| fields.get(name))
    }

    /// Compares two definitions while ignoring descriptions.
    ///
    /// Interfaces, union members and enum values compare as sets.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.without_descriptions() == other.without_descriptions()
    }

    fn without_descriptions(&self) -> Self {
        let strip_input = |v: &InputValueDefinition| InputValueDefinition {
            description: None,
            ..v.clone()
        };
        let sorted = |names: &[String]| {
            let mut names = names.to_vec();
            names.sort();
            names
        };
        let strip_fields = |def: &FieldsDefinition| FieldsDefinition {
            implements: sorted(&def.implements),
            fields: def
                .fields
                .iter()
                .map(|(name, field)| {
                    let field = FieldDefinition {
                        name: field.name.clone(),
                        description: None,
                        arguments: field.arguments.iter().map(strip_input).collect(),
                        ty: field.ty.clone(),
                    };
                    (name.clone(), field)
                })
                .collect(),
        };
        let kind = match &self.kind {
            TypeKind::Scalar => TypeKind::Scalar,
            TypeKind::Object(def) => TypeKind::Object(strip_fields(def)),
            TypeKind::Interface(def) => TypeKind::Interface(strip_fields(def)),
            TypeKind::Union { members } => TypeKind::Union {
                members: sorted(members),
            },
            TypeKind::Enum { values } => {
                let mut values: Vec<_> = values
                    .iter()
                    .map(|v| EnumValueDefinition {
                        name: v.name.clone(),
                        description: None,
                    })
                    .collect();
                values.sort_by(|a, b| a.name.cmp(&b.name));
                TypeKind::Enum { values }
            }
            TypeKind::InputObject { fields } => TypeKind::InputObject {
                fields: fields
                    .iter()
                    .map(|(name, field)| (name.clone(), strip_input(field)))
                    .collect(),
            },
        };
        Self {
            name: self.name.clone(),
            description: None,
            kind,
        }
    }
}

/// Names of the root operation types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootOperations {
    pub query: String,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
}

impl Default for RootOperations {
    fn default() -> Self {
        Self {
            query: "Query".to_string(),
            mutation: None,
            subscription: None,
        }
    }
}

impl RootOperations {
    /// Returns true if `name` is one of the root operation types.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.query == name
            || self.mutation.as_deref() == Some(name)
            || self.subscription.as_deref() == Some(name)
    }
}

/// A parsed or generated schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    roots: RootOperations,
    types: IndexMap<String, TypeDefinition>,
}

impl SchemaDocument {
    /// Creates a document with conventionally named roots and no types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(roots: RootOperations, types: IndexMap<String, TypeDefinition>) -> Self {
        Self { roots, types }
    }

    pub(crate) fn with_roots(mut self, roots: RootOperations) -> Self {
        self.roots = roots;
        self
    }

    #[must_use]
    pub fn roots(&self) -> &RootOperations {
        &self.roots
    }

    /// Iterates over all declared types in document order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    #[must_use]
    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of declared (non built-in) types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The roots a document without a `schema { ... }` block would get.
    #[must_use]
    pub fn conventional_roots(&self) -> RootOperations {
        RootOperations {
            query: "Query".to_string(),
            mutation: self
                .contains_type("Mutation")
                .then(|| "Mutation".to_string()),
            subscription: self
                .contains_type("Subscription")
                .then(|| "Subscription".to_string()),
        }
    }

    /// Serializes the document back to SDL.
    ///
    /// Parsing the output yields a document equal to `self`.
    #[must_use]
    pub fn to_sdl(&self) -> String {
        let mut out = String::new();

        if self.roots != self.conventional_roots() {
            out.push_str("schema {\n");
            let _ = writeln!(out, "  query: {}", self.roots.query);
            if let Some(mutation) = &self.roots.mutation {
                let _ = writeln!(out, "  mutation: {mutation}");
            }
            if let Some(subscription) = &self.roots.subscription {
                let _ = writeln!(out, "  subscription: {subscription}");
            }
            out.push_str("}\n\n");
        }

        for ty in self.types.values() {
            write_type(&mut out, ty);
            out.push('\n');
        }

        out
    }
}

fn write_type(out: &mut String, ty: &TypeDefinition) {
    write_description(out, ty.description.as_deref(), "");
    match &ty.kind {
        TypeKind::Scalar => {
            let _ = writeln!(out, "scalar {}", ty.name);
        }
        TypeKind::Object(def) => write_fields_type(out, "type", &ty.name, def),
        TypeKind::Interface(def) => write_fields_type(out, "interface", &ty.name, def),
        TypeKind::Union { members } => {
            let _ = write!(out, "union {}", ty.name);
            if !members.is_empty() {
                let _ = write!(out, " = {}", members.join(" | "));
            }
            out.push('\n');
        }
        TypeKind::Enum { values } => {
            let _ = write!(out, "enum {}", ty.name);
            if values.is_empty() {
                out.push('\n');
                return;
            }
            out.push_str(" {\n");
            for value in values {
                write_description(out, value.description.as_deref(), "  ");
                let _ = writeln!(out, "  {}", value.name);
            }
            out.push_str("}\n");
        }
        TypeKind::InputObject { fields } => {
            let _ = write!(out, "input {}", ty.name);
            if fields.is_empty() {
                out.push('\n');
                return;
            }
            out.push_str(" {\n");
            for field in fields.values() {
                write_description(out, field.description.as_deref(), "  ");
                out.push_str("  ");
                write_input_value(out, field);
                out.push('\n');
            }
            out.push_str("}\n");
        }
    }
}

fn write_fields_type(out: &mut String, keyword: &str, name: &str, def: &FieldsDefinition) {
    let _ = write!(out, "{keyword} {name}");
    if !def.implements.is_empty() {
        let _ = write!(out, " implements {}", def.implements.join(" & "));
    }
    if def.fields.is_empty() {
        out.push('\n');
        return;
    }
    out.push_str(" {\n");
    for field in def.fields.values() {
        write_description(out, field.description.as_deref(), "  ");
        let _ = write!(out, "  {}", field.name);
        if !field.arguments.is_empty() {
            out.push('(');
            for (i, arg) in field.arguments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if let Some(description) = &arg.description {
                    write_string_literal(out, description);
                    out.push(' ');
                }
                write_input_value(out, arg);
            }
            out.push(')');
        }
        let _ = writeln!(out, ": {}", field.ty);
    }
    out.push_str("}\n");
}

fn write_input_value(out: &mut String, value: &InputValueDefinition) {
    let _ = write!(out, "{}: {}", value.name, value.ty);
    if let Some(default) = &value.default_value {
        let _ = write!(out, " = {default}");
    }
}

fn write_description(out: &mut String, description: Option<&str>, indent: &str) {
    if let Some(description) = description {
        out.push_str(indent);
        write_string_literal(out, description);
        out.push('\n');
    }
}

// Quoted (not block) strings keep descriptions byte-exact across a re-parse.
fn write_string_literal(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display() {
        assert_eq!(TypeRef::named("String").to_string(), "String");
        assert_eq!(TypeRef::named_nn("ID").to_string(), "ID!");
        assert_eq!(TypeRef::named_list("Int").to_string(), "[Int]");
        assert_eq!(TypeRef::named_nn_list_nn("Foo").to_string(), "[Foo!]!");
        assert_eq!(TypeRef::named_nn_list_nn("Foo").base_name(), "Foo");
    }

    #[test]
    fn test_same_shape_ignores_descriptions() {
        let a = TypeDefinition::object("Foo", [FieldDefinition::new("id", TypeRef::named("ID"))]);
        let b = TypeDefinition::object(
            "Foo",
            [FieldDefinition::new("id", TypeRef::named("ID")).description("identifier")],
        )
        .description("A foo");
        assert!(a.same_shape(&b));
        assert_ne!(a, b);

        let c = TypeDefinition::object("Foo", [FieldDefinition::new("id", TypeRef::named_nn("ID"))]);
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn test_to_sdl_object() {
        let mut types = IndexMap::new();
        let query = TypeDefinition::object(
            "Query",
            [FieldDefinition::new("foo", TypeRef::named("Foo"))
                .argument(InputValueDefinition::new("id", TypeRef::named_nn("ID")))
                .argument(InputValueDefinition::new("first", TypeRef::named("Int")).default_value(10))],
        );
        types.insert("Query".to_string(), query);
        let doc = SchemaDocument::from_parts(RootOperations::default(), types);

        let sdl = doc.to_sdl();
        assert!(!sdl.contains("schema {"));
        assert!(sdl.contains("type Query {\n  foo(id: ID!, first: Int = 10): Foo\n}\n"));
    }

    #[test]
    fn test_to_sdl_emits_schema_block_for_custom_roots() {
        let mut types = IndexMap::new();
        types.insert(
            "RootQuery".to_string(),
            TypeDefinition::object("RootQuery", [FieldDefinition::new("ok", TypeRef::named("Boolean"))]),
        );
        let roots = RootOperations {
            query: "RootQuery".to_string(),
            mutation: None,
            subscription: None,
        };
        let doc = SchemaDocument::from_parts(roots, types);
        assert!(doc.to_sdl().starts_with("schema {\n  query: RootQuery\n}\n"));
    }

    #[test]
    fn test_string_literal_escaping() {
        let mut out = String::new();
        write_string_literal(&mut out, "say \"hi\"\nback\\slash");
        assert_eq!(out, r#""say \"hi\"\nback\\slash""#);
    }
}
