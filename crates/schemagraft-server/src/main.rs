use std::env;

use schemagraft_server::config::loader::{DEFAULT_CONFIG_FILE, load_config};
use schemagraft_server::{RuntimeEnvironment, ServerBuilder, StartupError};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From SCHEMAGRAFT_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (schemagraft.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (SCHEMAGRAFT_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    schemagraft_server::observability::init_tracing();

    let (config_path, source) = resolve_config_path();

    let explicit_path = match source {
        ConfigSource::Default => None,
        _ => Some(config_path.as_str()),
    };
    let cfg = match load_config(explicit_path) {
        Ok(c) => c,
        Err(e) => fail(StartupError::Config(e)),
    };

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );
    schemagraft_server::observability::apply_logging_config(&cfg.logging);

    let server = match ServerBuilder::new()
        .with_config(cfg)
        .with_runtime(RuntimeEnvironment::from_env())
        .build()
        .await
    {
        Ok(s) => s,
        Err(e) => fail(e),
    };

    if let Err(err) = server.run().await {
        match err.downcast::<StartupError>() {
            Ok(startup) => fail(startup),
            Err(other) => tracing::error!(error = %other, "Server error"),
        }
    }
}

fn fail(err: StartupError) -> ! {
    tracing::error!(error = %err, "Startup failed");
    eprintln!("Startup failed: {err}");
    std::process::exit(2);
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: SCHEMAGRAFT_CONFIG
/// 3. Default: schemagraft.toml
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config"
            && let Some(path) = args.next()
        {
            return (path, ConfigSource::CliArgument);
        }
    }

    if let Ok(path) = env::var("SCHEMAGRAFT_CONFIG")
        && !path.is_empty()
    {
        return (path, ConfigSource::EnvironmentVariable);
    }

    (DEFAULT_CONFIG_FILE.to_string(), ConfigSource::Default)
}
