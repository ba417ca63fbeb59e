//! Hand-written application fields served next to the introspected schema.

use async_graphql::Value;
use async_graphql::dynamic::FieldFuture;
use schemagraft_graphql::ResolverSet;
use schemagraft_graphql::resolvers::FieldDescriptor;
use schemagraft_graphql::schema::TypeRef;

/// The application's resolver set.
pub fn app_resolvers() -> ResolverSet {
    ResolverSet::new()
        .with(
            FieldDescriptor::query("get", TypeRef::named_nn("String"), |_| {
                FieldFuture::new(async { Ok(Some(Value::from("HOlas"))) })
            })
            .description("Greeting served by the application"),
        )
        .with(FieldDescriptor::query(
            "user_custom",
            TypeRef::named_nn("String"),
            |_| FieldFuture::new(async { Ok(Some(Value::from("jj"))) }),
        ))
}
