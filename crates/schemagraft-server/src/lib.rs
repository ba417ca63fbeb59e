pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod introspection;
pub mod middleware;
pub mod observability;
pub mod resolvers;
pub mod server;

pub use bootstrap::{PreparedApp, StartupError, prepare};
pub use config::{AppConfig, LoggingConfig, RuntimeEnvironment, ServerConfig};
pub use introspection::{
    GraphiqlMiddleware, IntrospectionMiddleware, IntrospectionOptions, passthrough_route,
};
pub use observability::init_tracing;
pub use resolvers::app_resolvers;
pub use server::{SchemagraftServer, ServerBuilder, build_app};
