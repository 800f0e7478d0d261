//! postnorm-api - Social post normalization service
//!
//! Serves posts from every configured platform translated into the common
//! post schema.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use postnorm_common::config::{load_toml_config, ConfigOverrides, ServiceConfig};
use postnorm_common::registry::{CachedRegistry, FileRegistry, RegistrySource};
use postnorm_common::PostService;
use postnorm_api::{build_router, logging, AppState};
use tokio::signal;
use tracing::info;

/// Command-line arguments for postnorm-api
#[derive(Parser, Debug)]
#[command(name = "postnorm-api")]
#[command(about = "Social post normalization service")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "POSTNORM_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "POSTNORM_PORT")]
    port: Option<u16>,

    /// Registry document (platform mappings JSON)
    #[arg(short, long, env = "POSTNORM_REGISTRY")]
    registry: Option<PathBuf>,

    /// Directory that relative data file paths are resolved against
    #[arg(long, env = "POSTNORM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Cache the parsed registry until the document changes
    #[arg(long, env = "POSTNORM_CACHE_REGISTRY")]
    cache_registry: Option<bool>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "POSTNORM_LOG_LEVEL")]
    log_level: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "POSTNORM_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            registry_path: self.registry.clone(),
            base_dir: self.data_dir.clone(),
            cache_registry: self.cache_registry,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config file is read before tracing exists so its log level can apply
    let file_config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration file")?;
    let config = ServiceConfig::resolve(&args.overrides(), &file_config);

    logging::init_tracing(&config.log_level, std::io::stdout);

    info!(
        "Starting postnorm-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Registry document: {}", config.registry_path.display());
    if let Some(base_dir) = &config.base_dir {
        info!("Data directory: {}", base_dir.display());
    }

    let registry = registry_source(&config);
    let state = AppState::new(PostService::new(registry));
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("postnorm-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn registry_source(config: &ServiceConfig) -> Arc<dyn RegistrySource> {
    if config.cache_registry {
        info!("Registry cache enabled");
        let mut cached = CachedRegistry::new(&config.registry_path);
        if let Some(base_dir) = &config.base_dir {
            cached = cached.with_base_dir(base_dir);
        }
        Arc::new(cached)
    } else {
        let mut file = FileRegistry::new(&config.registry_path);
        if let Some(base_dir) = &config.base_dir {
            file = file.with_base_dir(base_dir);
        }
        Arc::new(file)
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
