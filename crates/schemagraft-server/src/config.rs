use schemagraft_graphql::GraphQLConfig;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

use crate::introspection::IntrospectionOptions;

/// Name of the variable that selects the runtime environment.
pub const APP_ENV_VAR: &str = "APP_ENV";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub graphql: GraphQLConfig,
    /// Options handed to the Postgres introspection middleware
    #[serde(default)]
    pub introspection: IntrospectionOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.request_timeout_ms == 0 {
            return Err("server.request_timeout_ms must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        self.graphql.validate()?;
        self.introspection.validate()?;
        if self.introspection.graphiql_route == self.graphql.endpoint {
            return Err(format!(
                "introspection.graphiql_route must differ from graphql.endpoint ({})",
                self.graphql.endpoint
            ));
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Runtime environment, read once at startup from `APP_ENV`.
///
/// Only the exact value `production` counts as production; any other value,
/// or an unset variable, leaves the interactive explorer enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    name: Option<String>,
}

impl RuntimeEnvironment {
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(APP_ENV_VAR).ok().as_deref())
    }

    pub fn from_value(value: Option<&str>) -> Self {
        Self {
            name: value.map(str::to_string),
        }
    }

    pub fn production() -> Self {
        Self::from_value(Some("production"))
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("development")
    }

    pub fn is_production(&self) -> bool {
        self.name.as_deref() == Some("production")
    }

    pub fn explorer_enabled(&self) -> bool {
        !self.is_production()
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default configuration file, looked up in the working directory.
    pub const DEFAULT_CONFIG_FILE: &str = "schemagraft.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        } else if path.is_some() {
            tracing::warn!(path = %pathbuf.display(), "Configuration file not found, using defaults");
        }
        // Environment variable overrides, e.g., SCHEMAGRAFT__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAGRAFT")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_toggle_follows_app_env() {
        assert!(RuntimeEnvironment::from_value(None).explorer_enabled());
        assert!(RuntimeEnvironment::from_value(Some("development")).explorer_enabled());
        assert!(RuntimeEnvironment::from_value(Some("staging")).explorer_enabled());
        assert!(RuntimeEnvironment::from_value(Some("")).explorer_enabled());
        assert!(RuntimeEnvironment::from_value(Some("Production")).explorer_enabled());
        assert!(!RuntimeEnvironment::from_value(Some("production")).explorer_enabled());
        assert!(!RuntimeEnvironment::production().explorer_enabled());
    }

    #[test]
    fn runtime_name_defaults_to_development() {
        assert_eq!(RuntimeEnvironment::default().name(), "development");
        assert_eq!(RuntimeEnvironment::production().name(), "production");
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.addr().port(), 3000);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn explorer_route_must_not_shadow_endpoint() {
        let mut cfg = AppConfig::default();
        cfg.introspection.graphiql_route = "/graphql".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("graphiql_route"));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());
    }
}
