//! Cassette gateway - serves compiled script, stylesheet and HTML template
//! bundles with ETag validation, plus the `/_Cassette` diagnostics page.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use service::{Config, ServiceState};

mod process;

/// Cassette gateway - serves compiled asset bundles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for HTTP requests
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the bundle manifest
    #[arg(short, long, default_value = "cassette.toml")]
    manifest: PathBuf,

    /// Directory asset paths are relative to (overrides the manifest's source_dir)
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Directory compiled bundles are cached in
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Keep bundles in memory and expose raw assets on the diagnostics page
    #[arg(long)]
    debug: bool,

    /// Report HTML rewriting as enabled on the diagnostics page
    #[arg(long)]
    html_rewriting: bool,

    /// Milliseconds a request waits for the bundle registry lock
    #[arg(long, default_value = "30000")]
    lock_timeout_ms: u64,

    /// Prefix for generated bundle urls, when mounted below a sub path
    #[arg(long, default_value = "")]
    url_base: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Directory for daily rolling log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn service_config(&self) -> Config {
        Config {
            manifest_path: self.manifest.clone(),
            source_dir: self.source_dir.clone(),
            storage_dir: self.storage_dir.clone(),
            debug: self.debug,
            html_rewriting: self.html_rewriting,
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            url_base: self.url_base.clone(),
            log_level: self.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guards = process::init_logging(args.log_level, args.log_dir.as_deref());

    let config = args.service_config();
    let state = match tokio::task::spawn_blocking(move || ServiceState::from_config(&config)).await? {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create service state: {}", e);
            std::process::exit(3);
        }
    };

    let (signal_handle, shutdown_rx) = process::shutdown_on_signal()?;

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let http_config = service::http::Config::new(listen_addr, args.log_level);
    if let Err(e) = service::http::run(http_config, state, shutdown_rx).await {
        tracing::error!("HTTP server error: {}", e);
    }
    signal_handle.abort();

    if common::storage::process_storage().dispose() {
        tracing::info!("Released bundle cache storage");
    }

    tracing::info!("Gateway shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_map_to_service_config() {
        let config = Args::parse_from(["cassette-gateway"]).service_config();
        assert_eq!(config.manifest_path, PathBuf::from("cassette.toml"));
        assert_eq!(config.lock_timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, tracing::Level::INFO);
        assert!(!config.debug);
        assert!(config.storage_dir.is_none());
    }

    #[test]
    fn test_flags_map_to_service_config() {
        let config = Args::parse_from([
            "cassette-gateway",
            "--manifest",
            "demos/cassette.toml",
            "--debug",
            "--lock-timeout-ms",
            "250",
            "--url-base",
            "/static",
            "--log-level",
            "debug",
        ])
        .service_config();
        assert_eq!(config.manifest_path, PathBuf::from("demos/cassette.toml"));
        assert!(config.debug);
        assert_eq!(config.lock_timeout, Duration::from_millis(250));
        assert_eq!(config.url_base, "/static");
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }
}
