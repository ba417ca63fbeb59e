//! Axum HTTP handlers for the GraphQL endpoint.
//!
//! - `POST <endpoint>` - Executes a query, or a batch when batching is enabled
//! - `GET <endpoint>` - GraphiQL explorer, only when the explorer is enabled

use std::sync::Arc;

use async_graphql::{BatchRequest, Executor};
use async_graphql::dynamic::Schema;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLBatchRequest, GraphQLResponse};
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tracing::{debug, warn};

use crate::config::GraphQLConfig;
use crate::error::GraphQLError;

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    /// The merged, executable schema.
    pub schema: Arc<Schema>,

    /// Path the endpoint is mounted on.
    pub endpoint: String,

    /// Whether GET serves the interactive explorer.
    pub explorer_enabled: bool,

    pub batching: bool,
    pub max_batch_size: usize,
}

impl GraphQLState {
    #[must_use]
    pub fn new(schema: Arc<Schema>, config: &GraphQLConfig, explorer_enabled: bool) -> Self {
        Self {
            schema,
            endpoint: config.endpoint.clone(),
            explorer_enabled,
            batching: config.batching,
            max_batch_size: config.max_batch_size,
        }
    }

    fn check_batch(&self, batch: &BatchRequest) -> Result<(), GraphQLError> {
        let BatchRequest::Batch(requests) = batch else {
            return Ok(());
        };
        if !self.batching {
            return Err(GraphQLError::BatchingDisabled);
        }
        if requests.len() > self.max_batch_size {
            return Err(GraphQLError::BatchTooLarge {
                actual: requests.len(),
                max: self.max_batch_size,
            });
        }
        Ok(())
    }
}

/// Routes for the query endpoint.
pub fn graphql_routes(state: GraphQLState) -> Router {
    let endpoint = state.endpoint.clone();
    Router::new()
        .route(&endpoint, get(explorer_handler).post(graphql_handler))
        .with_state(state)
}

/// Handles POST requests to the query endpoint.
pub async fn graphql_handler(State(state): State<GraphQLState>, request: GraphQLBatchRequest) -> Response {
    let batch = request.into_inner();
    if let Err(err) = state.check_batch(&batch) {
        warn!(error = %err, "Rejected GraphQL batch");
        return error_response(&err);
    }

    debug!(batch = matches!(batch, BatchRequest::Batch(_)), "Processing GraphQL request");
    GraphQLResponse::from(state.schema.execute_batch(batch).await).into_response()
}

/// Serves the GraphiQL explorer when it is enabled.
pub async fn explorer_handler(State(state): State<GraphQLState>) -> Response {
    if !state.explorer_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }
    Html(GraphiQLSource::build().endpoint(&state.endpoint).finish()).into_response()
}

fn error_response(err: &GraphQLError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(err.to_response_body())).into_response()
}

#[cfg(test)]
mod tests {
    use async_graphql::Request;

    use super::*;
    use crate::resolvers::ResolverSet;
    use crate::schema::{ExecutableSchemaBuilder, SchemaBuilderConfig, parse_schema_str};

    fn state(batching: bool, max_batch_size: usize) -> GraphQLState {
        let doc = parse_schema_str("type Query { ok: Boolean }", "test").unwrap();
        let schema = ExecutableSchemaBuilder::new(&doc, &ResolverSet::new(), SchemaBuilderConfig::default())
            .build()
            .unwrap();
        GraphQLState {
            schema: Arc::new(schema),
            endpoint: "/graphql".into(),
            explorer_enabled: true,
            batching,
            max_batch_size,
        }
    }

    fn batch(n: usize) -> BatchRequest {
        BatchRequest::Batch((0..n).map(|_| Request::new("{ ok }")).collect())
    }

    /// Builds the extractor via `FromRequest`; its tuple constructor is private.
    async fn batch_request(n: usize) -> GraphQLBatchRequest {
        use axum::extract::FromRequest;
        let body = serde_json::Value::Array((0..n).map(|_| serde_json::json!({ "query": "{ ok }" })).collect());
        let req = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap();
        match GraphQLBatchRequest::from_request(req, &()).await {
            Ok(request) => request,
            Err(_) => panic!("failed to build batch request"),
        }
    }

    #[test]
    fn test_single_request_always_allowed() {
        let state = state(false, 1);
        assert!(state.check_batch(&BatchRequest::Single(Request::new("{ ok }"))).is_ok());
    }

    #[test]
    fn test_batch_rejected_when_disabled() {
        let state = state(false, 10);
        assert!(matches!(
            state.check_batch(&batch(2)),
            Err(GraphQLError::BatchingDisabled)
        ));
    }

    #[tokio::test]
    async fn test_handler_executes_batch() {
        let response = graphql_handler(State(state(true, 5)), batch_request(2).await).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert!(json[0]["data"]["ok"].is_null());
    }

    #[tokio::test]
    async fn test_handler_rejects_oversized_batch() {
        let response = graphql_handler(State(state(true, 1)), batch_request(2).await).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_batch_size_limit() {
        let state = state(true, 2);
        assert!(state.check_batch(&batch(2)).is_ok());
        assert!(matches!(
            state.check_batch(&batch(3)),
            Err(GraphQLError::BatchTooLarge { actual: 3, max: 2 })
        ));
    }
}
