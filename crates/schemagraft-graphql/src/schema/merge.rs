//! Schema merging.
//!
//! Combines the resolver-derived schema (primary) with the file-based schema
//! (secondary) into one document. Root operation types are always combined
//! field by field. Any other type defined in both inputs is handled by the
//! [`MergePolicy`]; definitions that differ only in descriptions are never a
//! collision.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::document::{FieldDefinition, FieldsDefinition, RootOperations, SchemaDocument, TypeDefinition, TypeKind};
use crate::error::SchemaMergeError;

/// How to handle a type defined in both schemas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Fail on the first conflicting type.
    #[default]
    Reject,
    /// Merge member by member; the primary schema wins on conflicting fields.
    DeepMerge,
}

/// Merges `secondary` into `primary`.
///
/// The result lists primary types first, then types only the secondary
/// schema defines.
///
/// # Errors
///
/// Returns `SchemaMergeError` when a conflict cannot be resolved under
/// `policy`, or when the two schemas name a root operation differently.
pub fn merge(
    primary: &SchemaDocument,
    secondary: &SchemaDocument,
    policy: MergePolicy,
) -> Result<SchemaDocument, SchemaMergeError> {
    let roots = merge_roots(primary.roots(), secondary.roots())?;

    let mut types: IndexMap<String, TypeDefinition> = IndexMap::with_capacity(primary.len() + secondary.len());
    for ty in primary.types() {
        let merged = match secondary.get_type(&ty.name) {
            None => ty.clone(),
            Some(other) if roots.contains(&ty.name) => merge_root(ty, other, policy)?,
            Some(other) if ty.same_shape(other) => keep_primary(ty, other),
            Some(other) => match policy {
                MergePolicy::Reject => {
                    return Err(SchemaMergeError::TypeCollision {
                        type_name: ty.name.clone(),
                    });
                }
                MergePolicy::DeepMerge => {
                    debug!(type_name = %ty.name, "Deep-merging type defined in both schemas");
                    deep_merge(ty, other)?
                }
            },
        };
        types.insert(ty.name.clone(), merged);
    }

    for ty in secondary.types() {
        if !types.contains_key(&ty.name) {
            types.insert(ty.name.clone(), ty.clone());
        }
    }

    Ok(SchemaDocument::from_parts(roots, types))
}

fn merge_roots(primary: &RootOperations, secondary: &RootOperations) -> Result<RootOperations, SchemaMergeError> {
    if primary.query != secondary.query {
        return Err(SchemaMergeError::RootMismatch {
            operation: "query",
            primary: primary.query.clone(),
            secondary: secondary.query.clone(),
        });
    }
    Ok(RootOperations {
        query: primary.query.clone(),
        mutation: merge_optional_root("mutation", &primary.mutation, &secondary.mutation)?,
        subscription: merge_optional_root("subscription", &primary.subscription, &secondary.subscription)?,
    })
}

fn merge_optional_root(
    operation: &'static str,
    primary: &Option<String>,
    secondary: &Option<String>,
) -> Result<Option<String>, SchemaMergeError> {
    match (primary, secondary) {
        (Some(p), Some(s)) if p != s => Err(SchemaMergeError::RootMismatch {
            operation,
            primary: p.clone(),
            secondary: s.clone(),
        }),
        (Some(p), _) => Ok(Some(p.clone())),
        (None, s) => Ok(s.clone()),
    }
}

fn keep_primary(primary: &TypeDefinition, secondary: &TypeDefinition) -> TypeDefinition {
    let mut kept = primary.clone();
    if kept.description.is_none() {
        kept.description = secondary.description.clone();
    }
    kept
}

fn kind_mismatch(primary: &TypeDefinition, secondary: &TypeDefinition) -> SchemaMergeError {
    SchemaMergeError::KindMismatch {
        type_name: primary.name.clone(),
        primary: primary.kind.as_str(),
        secondary: secondary.kind.as_str(),
    }
}

fn merge_root(
    primary: &TypeDefinition,
    secondary: &TypeDefinition,
    policy: MergePolicy,
) -> Result<TypeDefinition, SchemaMergeError> {
    let (TypeKind::Object(p), TypeKind::Object(s)) = (&primary.kind, &secondary.kind) else {
        return Err(kind_mismatch(primary, secondary));
    };

    let mut merged = p.clone();
    union_into(&mut merged.implements, &s.implements);
    for (name, field) in &s.fields {
        match merged.fields.get(name) {
            None => {
                merged.fields.insert(name.clone(), field.clone());
            }
            Some(existing) if same_signature(existing, field) => {}
            Some(_) if policy == MergePolicy::Reject => return Err(field_collision(primary, name)),
            Some(_) => {
                debug!(type_name = %primary.name, field = %name, "Keeping primary definition of root field");
            }
        }
    }

    Ok(TypeDefinition {
        name: primary.name.clone(),
        description: primary.description.clone().or_else(|| secondary.description.clone()),
        kind: TypeKind::Object(merged),
    })
}

fn same_signature(a: &FieldDefinition, b: &FieldDefinition) -> bool {
    a.ty == b.ty
        && a.arguments.len() == b.arguments.len()
        && a
            .arguments
            .iter()
            .zip(&b.arguments)
            .all(|(x, y)| x.name == y.name && x.ty == y.ty && x.default_value == y.default_value)
}

fn field_collision(ty: &TypeDefinition, field: &str) -> SchemaMergeError {
    SchemaMergeError::FieldCollision {
        type_name: ty.name.clone(),
        field_name: field.to_string(),
    }
}

fn deep_merge(primary: &TypeDefinition, secondary: &TypeDefinition) -> Result<TypeDefinition, SchemaMergeError> {
    let kind = match (&primary.kind, &secondary.kind) {
        (TypeKind::Scalar, TypeKind::Scalar) => TypeKind::Scalar,
        (TypeKind::Object(p), TypeKind::Object(s)) => TypeKind::Object(merge_fields(p, s)),
        (TypeKind::Interface(p), TypeKind::Interface(s)) => TypeKind::Interface(merge_fields(p, s)),
        (TypeKind::Union { members: p }, TypeKind::Union { members: s }) => {
            let mut members = p.clone();
            union_into(&mut members, s);
            TypeKind::Union { members }
        }
        (TypeKind::Enum { values: p }, TypeKind::Enum { values: s }) => {
            let mut values = p.clone();
            for value in s {
                if !values.iter().any(|v| v.name == value.name) {
                    values.push(value.clone());
                }
            }
            TypeKind::Enum { values }
        }
        (TypeKind::InputObject { fields: p }, TypeKind::InputObject { fields: s }) => {
            let mut fields = p.clone();
            for (name, field) in s {
                fields.entry(name.clone()).or_insert_with(|| field.clone());
            }
            TypeKind::InputObject { fields }
        }
        _ => return Err(kind_mismatch(primary, secondary)),
    };

    Ok(TypeDefinition {
        name: primary.name.clone(),
        description: primary.description.clone().or_else(|| secondary.description.clone()),
        kind,
    })
}

fn merge_fields(primary: &FieldsDefinition, secondary: &FieldsDefinition) -> FieldsDefinition {
    let mut merged = primary.clone();
    union_into(&mut merged.implements, &secondary.implements);
    for (name, field) in &secondary.fields {
        merged.fields.entry(name.clone()).or_insert_with(|| field.clone());
    }
    merged
}

fn union_into(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::document::TypeRef;
    use crate::schema::parse_schema_str;

    fn doc(sdl: &str) -> SchemaDocument {
        parse_schema_str(sdl, "test").unwrap()
    }

    #[test]
    fn test_disjoint_union() {
        let primary = doc("type Query { hello: String }\ntype A { x: Int }");
        let secondary = doc("type Query { allB: [B] }\ntype B { y: Int }\nscalar Cursor");

        let merged = merge(&primary, &secondary, MergePolicy::Reject).unwrap();
        assert_eq!(
            merged.type_names().collect::<Vec<_>>(),
            vec!["Query", "A", "B", "Cursor"]
        );
        let query = merged.get_type("Query").unwrap();
        assert!(query.field("hello").is_some());
        assert!(query.field("allB").is_some());
    }

    #[test]
    fn test_reject_names_colliding_type() {
        let primary = doc("type Query { a: Int }\ntype Foo { id: ID, label: String }");
        let secondary = doc("type Query { b: Int }\ntype Foo { id: ID }");

        let err = merge(&primary, &secondary, MergePolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            SchemaMergeError::TypeCollision {
                type_name: "Foo".into()
            }
        );
    }

    #[test]
    fn test_deep_merge_unions_fields() {
        let primary = doc("type Query { a: Int }\ntype Foo { id: ID, label: String }");
        let secondary = doc("type Query { b: Int }\ntype Foo { id: ID }");

        let merged = merge(&primary, &secondary, MergePolicy::DeepMerge).unwrap();
        let foo = merged.get_type("Foo").unwrap();
        assert_eq!(foo.fields().unwrap().len(), 2);
        assert_eq!(foo.field("label").unwrap().ty, TypeRef::named("String"));
    }

    #[test]
    fn test_deep_merge_primary_wins() {
        let primary = doc("type Query { a: Int }\ntype Foo { id: ID! }");
        let secondary = doc("type Query { b: Int }\ntype Foo { id: Int, extra: String }");

        let merged = merge(&primary, &secondary, MergePolicy::DeepMerge).unwrap();
        let foo = merged.get_type("Foo").unwrap();
        assert_eq!(foo.field("id").unwrap().ty, TypeRef::named_nn("ID"));
        assert!(foo.field("extra").is_some());
    }

    #[test]
    fn test_deep_merge_kind_mismatch() {
        let primary = doc("type Query { a: Int }\ntype Foo { id: ID }");
        let secondary = doc("type Query { b: Int }\nenum Foo { A }");

        let err = merge(&primary, &secondary, MergePolicy::DeepMerge).unwrap_err();
        assert!(matches!(err, SchemaMergeError::KindMismatch { ref type_name, .. } if type_name == "Foo"));
    }

    #[test]
    fn test_identical_types_are_not_collisions() {
        let primary = doc("type Query { a: Int }\nscalar Cursor\ntype Foo { id: ID }");
        let secondary = doc("type Query { b: Int }\nscalar Cursor\n\"described\" type Foo { id: ID }");

        let merged = merge(&primary, &secondary, MergePolicy::Reject).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(
            merged.get_type("Foo").unwrap().description.as_deref(),
            Some("described")
        );
    }

    #[test]
    fn test_member_order_is_not_a_collision() {
        let primary = doc(
            "type Query { a: Int }\ninterface A { id: ID }\ninterface B { id: ID }\n\
             type Foo implements A & B { id: ID }\nunion U = Foo | Bar\ntype Bar { id: ID }\nenum E { X Y }",
        );
        let secondary = doc(
            "type Query { b: Int }\ninterface A { id: ID }\ninterface B { id: ID }\n\
             type Foo implements B & A { id: ID }\nunion U = Bar | Foo\ntype Bar { id: ID }\nenum E { Y X }",
        );

        let merged = merge(&primary, &secondary, MergePolicy::Reject).unwrap();
        let TypeKind::Object(def) = &merged.get_type("Foo").unwrap().kind else {
            panic!("Foo should be an object");
        };
        assert_eq!(def.implements, vec!["A", "B"]);
    }

    #[test]
    fn test_root_field_collision() {
        let primary = doc("type Query { user: String }");
        let secondary = doc("type Query { user(id: Int!): String }");

        let err = merge(&primary, &secondary, MergePolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            SchemaMergeError::FieldCollision {
                type_name: "Query".into(),
                field_name: "user".into()
            }
        );

        let merged = merge(&primary, &secondary, MergePolicy::DeepMerge).unwrap();
        let user = merged.get_type("Query").unwrap().field("user").unwrap();
        assert!(user.arguments.is_empty());
    }

    #[test]
    fn test_identical_root_fields_are_shared() {
        let primary = doc("type Query { ping: String }");
        let secondary = doc("type Query { ping: String, pong: String }");

        let merged = merge(&primary, &secondary, MergePolicy::Reject).unwrap();
        assert_eq!(merged.get_type("Query").unwrap().fields().unwrap().len(), 2);
    }

    #[test]
    fn test_mutation_root_taken_from_either_side() {
        let primary = doc("type Query { a: Int }");
        let secondary = doc("type Query { b: Int }\ntype Mutation { createFoo: Int }");

        let merged = merge(&primary, &secondary, MergePolicy::Reject).unwrap();
        assert_eq!(merged.roots().mutation.as_deref(), Some("Mutation"));
    }

    #[test]
    fn test_root_mismatch() {
        let primary = doc("type Query { a: Int }");
        let secondary = doc("schema { query: Root }\ntype Root { b: Int }");

        let err = merge(&primary, &secondary, MergePolicy::DeepMerge).unwrap_err();
        assert!(matches!(err, SchemaMergeError::RootMismatch { operation: "query", .. }));
    }

    #[test]
    fn test_merge_with_programmatic_primary() {
        let primary = SchemaDocument::from_parts(
            RootOperations::default(),
            [(
                "Query".to_string(),
                TypeDefinition::object("Query", [FieldDefinition::new("get", TypeRef::named_nn("String"))]),
            )]
            .into_iter()
            .collect(),
        );
        let secondary = doc("type Query { allFoos: [Int] }");

        let merged = merge(&primary, &secondary, MergePolicy::Reject).unwrap();
        let query = merged.get_type("Query").unwrap();
        assert_eq!(
            query.fields().unwrap().keys().collect::<Vec<_>>(),
            vec!["get", "allFoos"]
        );
    }
}
