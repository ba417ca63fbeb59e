use std::net::SocketAddr;

use axum::{Router, middleware, routing::get};
use schemagraft_graphql::{GraphQLState, ResolverSet, graphql_routes};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::bootstrap::{self, PreparedApp, StartupError};
use crate::config::{AppConfig, RuntimeEnvironment};
use crate::introspection::passthrough_route;
use crate::resolvers::app_resolvers;
use crate::{handlers, middleware as app_middleware};

pub struct SchemagraftServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig, prepared: &PreparedApp) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    // GET on the endpoint follows the same switches as the middleware's route
    let graphql_state = GraphQLState::new(
        prepared.schema.clone(),
        &cfg.graphql,
        prepared.explorer_enabled() && cfg.introspection.graphiql,
    );

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        // Query endpoint and the middleware's explorer route
        .merge(graphql_routes(graphql_state))
        .merge(passthrough_route(prepared.middleware.clone()))
        // Middleware stack (order: request id -> compression/cors/trace -> timeout -> body limit)
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .headers()
                        .get(app_middleware::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(TimeoutLayer::new(cfg.request_timeout()))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    runtime: RuntimeEnvironment,
    resolvers: ResolverSet,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            runtime: RuntimeEnvironment::from_env(),
            resolvers: app_resolvers(),
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeEnvironment) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_resolvers(mut self, resolvers: ResolverSet) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Runs the startup sequence and builds the router. Nothing is bound yet.
    pub async fn build(self) -> Result<SchemagraftServer, StartupError> {
        let prepared = bootstrap::prepare(&self.config, self.runtime, &self.resolvers).await?;
        let app = build_app(&self.config, &prepared);

        Ok(SchemagraftServer {
            addr: self.addr,
            app,
        })
    }
}

impl SchemagraftServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn into_router(self) -> Router {
        self.app
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| StartupError::Bind {
                addr: self.addr,
                source,
            })?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
