//! Postgres introspection middleware integration.
//!
//! The introspection tool itself runs out of process: it reads the database
//! catalog and exports the schema file that bootstrap loads. This module owns
//! the static options object handed to it and the explorer route it exposes.
//!
//! ## Passthrough
//!
//! The explorer route is owned by the middleware. [`passthrough_route`] mounts
//! exactly one `GET` rule on that path and hands the request to
//! [`IntrospectionMiddleware::handle`] without touching it.

use std::path::PathBuf;
use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};

use schemagraft_graphql::GraphQLConfig;

/// Options for the introspection middleware.
///
/// Defaults match the deployment the server was written against: the
/// `public` schema, live watching, GraphiQL on `/graphiql`, batching on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionOptions {
    /// Connection string of the introspected database.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Database schemas to introspect.
    #[serde(default = "default_schemas")]
    pub schemas: Vec<String>,

    #[serde(default = "default_true")]
    pub subscriptions: bool,

    /// Re-export the schema when the database changes.
    #[serde(default = "default_true")]
    pub watch_pg: bool,

    #[serde(default = "default_true")]
    pub dynamic_json: bool,

    #[serde(default)]
    pub setof_functions_contain_nulls: bool,

    #[serde(default)]
    pub ignore_rbac: bool,

    /// How error stacks are reported: `json`, `true` or `false`.
    #[serde(default = "default_show_error_stack")]
    pub show_error_stack: String,

    /// Extra error fields surfaced to clients.
    #[serde(default = "default_extended_errors")]
    pub extended_errors: Vec<String>,

    #[serde(default = "default_append_plugins")]
    pub append_plugins: Vec<String>,

    /// Where the middleware writes the schema file.
    #[serde(default = "default_export_gql_schema_path")]
    pub export_gql_schema_path: Option<PathBuf>,

    /// Serve the interactive explorer.
    #[serde(default = "default_true")]
    pub graphiql: bool,

    #[serde(default = "default_true")]
    pub enhance_graphiql: bool,

    #[serde(default = "default_true")]
    pub enable_query_batching: bool,

    #[serde(default = "default_legacy_relations")]
    pub legacy_relations: String,

    /// Path the explorer is served on.
    #[serde(default = "default_graphiql_route")]
    pub graphiql_route: String,

    /// Endpoint the explorer sends queries to.
    #[serde(default = "default_graphql_route")]
    pub graphql_route: String,
}

fn default_true() -> bool {
    true
}
fn default_schemas() -> Vec<String> {
    vec!["public".into()]
}
fn default_show_error_stack() -> String {
    "json".into()
}
fn default_extended_errors() -> Vec<String> {
    vec!["hint".into(), "detail".into(), "errcode".into()]
}
fn default_append_plugins() -> Vec<String> {
    vec!["pg-simplify-inflector".into()]
}
fn default_export_gql_schema_path() -> Option<PathBuf> {
    Some(PathBuf::from("schema/schema.graphql"))
}
fn default_legacy_relations() -> String {
    "omit".into()
}
fn default_graphiql_route() -> String {
    "/graphiql".into()
}
fn default_graphql_route() -> String {
    "/graphql".into()
}

impl Default for IntrospectionOptions {
    fn default() -> Self {
        Self {
            database_url: None,
            schemas: default_schemas(),
            subscriptions: true,
            watch_pg: true,
            dynamic_json: true,
            setof_functions_contain_nulls: false,
            ignore_rbac: false,
            show_error_stack: default_show_error_stack(),
            extended_errors: default_extended_errors(),
            append_plugins: default_append_plugins(),
            export_gql_schema_path: default_export_gql_schema_path(),
            graphiql: true,
            enhance_graphiql: true,
            enable_query_batching: true,
            legacy_relations: default_legacy_relations(),
            graphiql_route: default_graphiql_route(),
            graphql_route: default_graphql_route(),
        }
    }
}

impl IntrospectionOptions {
    pub fn validate(&self) -> Result<(), String> {
        if !self.graphiql_route.starts_with('/') {
            return Err("introspection.graphiql_route must start with '/'".into());
        }
        if !self.graphql_route.starts_with('/') {
            return Err("introspection.graphql_route must start with '/'".into());
        }
        if self.schemas.is_empty() {
            return Err("introspection.schemas must not be empty".into());
        }
        let modes = ["json", "true", "false"];
        if !modes.contains(&self.show_error_stack.as_str()) {
            return Err(format!("introspection.show_error_stack must be one of {modes:?}"));
        }
        Ok(())
    }

    /// Reports settings that disagree with the GraphQL layer.
    ///
    /// These are not fatal: the middleware runs out of process and the
    /// server still serves what it loaded.
    pub fn mismatches(&self, graphql: &GraphQLConfig) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(path) = &self.export_gql_schema_path
            && path != &graphql.schema_path
        {
            notes.push(format!(
                "middleware exports to {} but graphql.schema_path is {}",
                path.display(),
                graphql.schema_path.display()
            ));
        }
        if self.enable_query_batching != graphql.batching {
            notes.push(format!(
                "middleware batching is {} but graphql.batching is {}",
                self.enable_query_batching, graphql.batching
            ));
        }
        if self.graphql_route != graphql.endpoint {
            notes.push(format!(
                "explorer targets {} but the endpoint is mounted on {}",
                self.graphql_route, graphql.endpoint
            ));
        }
        notes
    }
}

/// Handler surface of the introspection middleware.
#[async_trait]
pub trait IntrospectionMiddleware: Send + Sync {
    /// Path of the explorer route owned by the middleware.
    fn explorer_route(&self) -> &str;

    /// Handles a request routed to [`explorer_route`](Self::explorer_route).
    async fn handle(&self, request: Request<Body>) -> Response;
}

/// Serves GraphiQL on the explorer route.
pub struct GraphiqlMiddleware {
    options: IntrospectionOptions,
    explorer_enabled: bool,
}

impl GraphiqlMiddleware {
    /// `explorer_enabled` comes from the runtime environment; the explorer
    /// is only served when both it and `options.graphiql` allow it.
    pub fn new(options: IntrospectionOptions, explorer_enabled: bool) -> Self {
        Self {
            options,
            explorer_enabled,
        }
    }

    pub fn options(&self) -> &IntrospectionOptions {
        &self.options
    }

    pub fn serves_explorer(&self) -> bool {
        self.options.graphiql && self.explorer_enabled
    }

    fn render(&self) -> String {
        let title = if self.options.enhance_graphiql {
            "schemagraft GraphiQL (enhanced)"
        } else {
            "schemagraft GraphiQL"
        };
        GraphiQLSource::build()
            .endpoint(&self.options.graphql_route)
            .title(title)
            .finish()
    }
}

#[async_trait]
impl IntrospectionMiddleware for GraphiqlMiddleware {
    fn explorer_route(&self) -> &str {
        &self.options.graphiql_route
    }

    async fn handle(&self, request: Request<Body>) -> Response {
        if !self.serves_explorer() {
            tracing::debug!(path = %request.uri().path(), "Explorer disabled");
            return StatusCode::NOT_FOUND.into_response();
        }
        if request.method() != Method::GET && request.method() != Method::HEAD {
            return StatusCode::METHOD_NOT_ALLOWED.into_response();
        }
        Html(self.render()).into_response()
    }
}

/// Mounts the middleware's explorer route and forwards requests to it.
pub fn passthrough_route(middleware: Arc<dyn IntrospectionMiddleware>) -> Router {
    let route = middleware.explorer_route().to_string();
    Router::new()
        .route(&route, get(forward))
        .with_state(middleware)
}

async fn forward(
    State(middleware): State<Arc<dyn IntrospectionMiddleware>>,
    request: Request<Body>,
) -> Response {
    middleware.handle(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_deployment() {
        let options = IntrospectionOptions::default();
        assert_eq!(options.schemas, vec!["public"]);
        assert!(options.subscriptions && options.watch_pg && options.dynamic_json);
        assert!(!options.setof_functions_contain_nulls);
        assert!(!options.ignore_rbac);
        assert_eq!(options.show_error_stack, "json");
        assert_eq!(options.extended_errors, vec!["hint", "detail", "errcode"]);
        assert_eq!(options.append_plugins, vec!["pg-simplify-inflector"]);
        assert!(options.graphiql && options.enhance_graphiql);
        assert!(options.enable_query_batching);
        assert_eq!(options.legacy_relations, "omit");
        assert_eq!(options.graphiql_route, "/graphiql");
        assert_eq!(options.graphql_route, "/graphql");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn defaults_agree_with_graphql_layer() {
        let options = IntrospectionOptions::default();
        assert!(options.mismatches(&GraphQLConfig::default()).is_empty());
    }

    #[test]
    fn mismatched_export_path_is_reported() {
        let options = IntrospectionOptions {
            export_gql_schema_path: Some(PathBuf::from("elsewhere.graphql")),
            ..IntrospectionOptions::default()
        };
        let notes = options.mismatches(&GraphQLConfig::default());
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("elsewhere.graphql"));
    }

    #[test]
    fn invalid_error_stack_mode() {
        let options = IntrospectionOptions {
            show_error_stack: "verbose".into(),
            ..IntrospectionOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[tokio::test]
    async fn disabled_explorer_is_not_found() {
        let middleware = GraphiqlMiddleware::new(IntrospectionOptions::default(), false);
        let response = middleware
            .handle(Request::get("/graphiql").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn enabled_explorer_serves_html() {
        let middleware = GraphiqlMiddleware::new(IntrospectionOptions::default(), true);
        assert_eq!(middleware.explorer_route(), "/graphiql");
        let response = middleware
            .handle(Request::get("/graphiql").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
