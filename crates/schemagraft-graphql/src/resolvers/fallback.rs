//! Resolution for fields that have no declared resolver.
//!
//! Fields that come from the file-based schema are served by reading the
//! same-named key from the parent value. Root parents carry no value, so such
//! root fields resolve to null. Values of interface or union fields are
//! tagged with their concrete type taken from the `__typename` key.

use async_graphql::Value;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};

/// Builds fallback resolvers for fields of the merged schema.
pub(crate) struct FallbackResolver;

impl FallbackResolver {
    /// Creates a resolver reading `field_name` from the parent object.
    ///
    /// `abstract_type` is set when the field's base type is an interface or
    /// union.
    pub(crate) fn resolve(
        field_name: String,
        abstract_type: bool,
    ) -> impl for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + Clone + 'static {
        move |ctx| {
            let field_name = field_name.clone();
            FieldFuture::new(async move {
                let value = match ctx.parent_value.as_value() {
                    Some(Value::Object(object)) => object.get(field_name.as_str()).cloned(),
                    _ => None,
                };

                match value {
                    None | Some(Value::Null) => Ok(None),
                    Some(value) => Ok(Some(to_field_value(value, abstract_type))),
                }
            })
        }
    }
}

fn to_field_value<'a>(value: Value, abstract_type: bool) -> FieldValue<'a> {
    if !abstract_type {
        return FieldValue::value(value);
    }
    match value {
        Value::List(items) => FieldValue::list(items.into_iter().map(|item| to_field_value(item, true))),
        Value::Object(object) => {
            let type_name = match object.get("__typename") {
                Some(Value::String(name)) => Some(name.clone()),
                _ => None,
            };
            let field_value = FieldValue::value(Value::Object(object));
            match type_name {
                Some(name) => field_value.with_type(name),
                None => field_value,
            }
        }
        other => FieldValue::value(other),
    }
}

#[cfg(test)]
mod tests {
    use async_graphql::dynamic::{Field, Object, Schema, TypeRef};
    use async_graphql::{Name, Value};

    use super::*;

    fn schema() -> Schema {
        let mut inner = indexmap::IndexMap::new();
        inner.insert(Name::new("label"), Value::from("first"));

        let query = Object::new("Query")
            .field(Field::new("thing", TypeRef::named("Thing"), move |_| {
                let inner = inner.clone();
                FieldFuture::new(async move { Ok(Some(Value::Object(inner))) })
            }))
            .field(Field::new(
                "missing",
                TypeRef::named(TypeRef::STRING),
                FallbackResolver::resolve("missing".to_string(), false),
            ));
        let thing = Object::new("Thing")
            .field(Field::new(
                "label",
                TypeRef::named(TypeRef::STRING),
                FallbackResolver::resolve("label".to_string(), false),
            ))
            .field(Field::new(
                "absent",
                TypeRef::named(TypeRef::INT),
                FallbackResolver::resolve("absent".to_string(), false),
            ));

        Schema::build("Query", None, None)
            .register(query)
            .register(thing)
            .finish()
            .unwrap()
    }

    #[tokio::test]
    async fn test_reads_parent_key() {
        let response = schema().execute("{ thing { label absent } missing }").await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["thing"]["label"], "first");
        assert!(data["thing"]["absent"].is_null());
        assert!(data["missing"].is_null());
    }
}
