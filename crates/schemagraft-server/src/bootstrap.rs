//! Startup sequence.
//!
//! Runs once, strictly in order: load the exported schema, build the primary
//! schema from the application resolvers, merge, export, assemble the
//! executable schema, and construct the introspection middleware. Any failure
//! is returned as a [`StartupError`] before a listener is bound.

use std::net::SocketAddr;
use std::sync::Arc;

use async_graphql::dynamic::Schema;
use schemagraft_graphql::schema::export_schema;
use schemagraft_graphql::{
    ExecutableSchemaBuilder, GraphQLError, ResolverSet, SchemaDocument, SchemaMergeError,
    SchemaParseError, load_schema, merge,
};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, RuntimeEnvironment};
use crate::introspection::{GraphiqlMiddleware, IntrospectionMiddleware};

/// Fatal errors raised before the server starts serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("schema load failed: {0}")]
    Parse(#[from] SchemaParseError),

    #[error("schema merge failed: {0}")]
    Merge(#[from] SchemaMergeError),

    #[error("schema assembly failed: {0}")]
    Schema(#[from] GraphQLError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the router needs, produced by [`prepare`].
pub struct PreparedApp {
    /// The merged executable schema.
    pub schema: Arc<Schema>,
    /// The merged document the schema was built from.
    pub document: SchemaDocument,
    pub middleware: Arc<dyn IntrospectionMiddleware>,
    pub runtime: RuntimeEnvironment,
}

impl PreparedApp {
    pub fn explorer_enabled(&self) -> bool {
        self.runtime.explorer_enabled()
    }
}

/// Runs the startup sequence.
pub async fn prepare(
    cfg: &AppConfig,
    runtime: RuntimeEnvironment,
    resolvers: &ResolverSet,
) -> Result<PreparedApp, StartupError> {
    info!(
        environment = runtime.name(),
        explorer = runtime.explorer_enabled(),
        "Starting schema bootstrap"
    );

    let file_schema = load_schema(&cfg.graphql.schema_path).await?;

    let primary = resolvers.build_schema()?;
    debug!(
        fields = resolvers.descriptors().count(),
        types = primary.len(),
        "Built schema from resolver declarations"
    );
    if let Some(path) = &cfg.graphql.auto_schema_path {
        export_schema(path, &primary.to_sdl()).await?;
    }

    let document = merge(&primary, &file_schema, cfg.graphql.merge_policy)?;
    info!(
        policy = ?cfg.graphql.merge_policy,
        types = document.len(),
        "Merged schemas"
    );
    if let Some(path) = &cfg.graphql.export_schema_path {
        export_schema(path, &document.to_sdl()).await?;
    }

    let schema = ExecutableSchemaBuilder::new(
        &document,
        resolvers,
        cfg.graphql.to_schema_builder_config(),
    )
    .build()?;

    let options = cfg.introspection.clone();
    for note in options.mismatches(&cfg.graphql) {
        warn!(note = %note, "Introspection options disagree with GraphQL config");
    }
    info!(
        schemas = ?options.schemas,
        watch_pg = options.watch_pg,
        graphiql_route = %options.graphiql_route,
        append_plugins = ?options.append_plugins,
        "Introspection middleware configured"
    );
    let middleware: Arc<dyn IntrospectionMiddleware> =
        Arc::new(GraphiqlMiddleware::new(options, runtime.explorer_enabled()));

    Ok(PreparedApp {
        schema: Arc::new(schema),
        document,
        middleware,
        runtime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::app_resolvers;

    fn config_for(dir: &std::path::Path, schema: &str) -> AppConfig {
        let path = dir.join("schema.graphql");
        std::fs::write(&path, schema).unwrap();
        let mut cfg = AppConfig::default();
        cfg.graphql.schema_path = path;
        cfg
    }

    #[tokio::test]
    async fn missing_schema_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        cfg.graphql.schema_path = dir.path().join("missing.graphql");

        let err = prepare(&cfg, RuntimeEnvironment::default(), &app_resolvers())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::Parse(SchemaParseError::Io { .. })));
    }

    #[tokio::test]
    async fn exports_both_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_for(dir.path(), "type Widget { id: Int! } type Query { widget: Widget }");
        cfg.graphql.export_schema_path = Some(dir.path().join("out/merged.graphql"));
        cfg.graphql.auto_schema_path = Some(dir.path().join("out/auto.graphql"));

        let prepared = prepare(&cfg, RuntimeEnvironment::default(), &app_resolvers())
            .await
            .unwrap();
        assert!(prepared.explorer_enabled());
        assert!(prepared.document.contains_type("Widget"));

        let merged = std::fs::read_to_string(dir.path().join("out/merged.graphql")).unwrap();
        assert!(merged.contains("type Widget"));
        assert!(merged.contains("user_custom: String!"));

        let auto = std::fs::read_to_string(dir.path().join("out/auto.graphql")).unwrap();
        assert!(auto.contains("get: String!"));
        assert!(!auto.contains("Widget"));
    }

    #[tokio::test]
    async fn colliding_root_field_aborts_startup() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_for(dir.path(), "type Query { get: Int }");

        let err = prepare(&cfg, RuntimeEnvironment::production(), &app_resolvers())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::Merge(SchemaMergeError::FieldCollision { .. })));
    }
}
