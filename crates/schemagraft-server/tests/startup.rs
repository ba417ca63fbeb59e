use std::process::Command;

use schemagraft_graphql::{SchemaMergeError, SchemaParseError};
use schemagraft_server::{AppConfig, RuntimeEnvironment, ServerBuilder, StartupError};

const FILE_FOO: &str = "type Foo { id: ID } type Query { foo: Foo }";

#[test]
fn missing_schema_exits_non_zero() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let missing = dir.path().join("absent.graphql");

    let output = Command::new(env!("CARGO_BIN_EXE_schemagraft-server"))
        .current_dir(dir.path())
        .env("SCHEMAGRAFT__GRAPHQL__SCHEMA_PATH", &missing)
        .env_remove("SCHEMAGRAFT_CONFIG")
        .output()
        .expect("run server binary");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.graphql"), "{stderr}");
}

#[tokio::test]
async fn missing_schema_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.graphql.schema_path = dir.path().join("absent.graphql");

    let err = ServerBuilder::new().with_config(cfg).build().await.err().unwrap();
    assert!(matches!(err, StartupError::Parse(SchemaParseError::Io { .. })));
}

mod foo {
    use async_graphql::Value;
    use async_graphql::dynamic::FieldFuture;
    use schemagraft_graphql::schema::{TypeDefinition, TypeRef};
    use schemagraft_graphql::{FieldDescriptor, MergePolicy, ResolverSet};

    use super::*;

    // Declares Foo { id: ID, label: String } next to the app fields
    fn resolvers_with_foo() -> ResolverSet {
        schemagraft_server::app_resolvers()
            .with_type(TypeDefinition::object(
                "Foo",
                [
                    schemagraft_graphql::schema::FieldDefinition::new("id", TypeRef::named("ID")),
                    schemagraft_graphql::schema::FieldDefinition::new("label", TypeRef::named("String")),
                ],
            ))
            .with(FieldDescriptor::query("foo_label", TypeRef::named("String"), |_| {
                FieldFuture::new(async { Ok(Some(Value::from("bar"))) })
            }))
    }

    fn config(dir: &std::path::Path, policy: MergePolicy) -> AppConfig {
        let path = dir.join("schema.graphql");
        std::fs::write(&path, FILE_FOO).unwrap();
        let mut cfg = AppConfig::default();
        cfg.graphql.schema_path = path;
        cfg.graphql.merge_policy = policy;
        cfg
    }

    #[tokio::test]
    async fn reject_names_foo() {
        let dir = tempfile::tempdir().unwrap();
        let err = schemagraft_server::prepare(
            &config(dir.path(), MergePolicy::Reject),
            RuntimeEnvironment::default(),
            &resolvers_with_foo(),
        )
        .await
        .err()
        .unwrap();

        match err {
            StartupError::Merge(SchemaMergeError::TypeCollision { type_name }) => {
                assert_eq!(type_name, "Foo")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn deep_merge_keeps_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let prepared = schemagraft_server::prepare(
            &config(dir.path(), MergePolicy::DeepMerge),
            RuntimeEnvironment::default(),
            &resolvers_with_foo(),
        )
        .await
        .expect("deep merge succeeds");

        let foo = prepared.document.get_type("Foo").unwrap();
        let fields: Vec<_> = foo.fields().unwrap().keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["id", "label"]);

        let response = prepared.schema.execute("{ foo { id label } foo_label get }").await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert!(data["foo"].is_null());
        assert_eq!(data["foo_label"], "bar");
    }
}
