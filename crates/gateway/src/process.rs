//! Process plumbing for the gateway binary: log sinks, shutdown signals and
//! panic reporting.

use std::path::Path;
use std::time::Duration;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Time in-flight bundle responses get to finish after SIGTERM
const SIGTERM_DRAIN_PERIOD: Duration = Duration::from_secs(10);

const LOG_FILE_PREFIX: &str = "cassette-gateway.log";

/// Keeps the non-blocking log writers flushing; drop it last.
pub struct LogGuards {
    _writers: Vec<WorkerGuard>,
}

/// Compact stdout logging, plus a daily rolling plain-text file in `log_dir`.
///
/// `RUST_LOG` directives refine `level` for both sinks.
pub fn init_logging(level: tracing::Level, log_dir: Option<&Path>) -> LogGuards {
    let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let console = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout)
        .with_filter(filter_for(level));

    let file = log_dir.and_then(|dir| match std::fs::create_dir_all(dir) {
        Ok(()) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
            guards.push(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(filter_for(level)),
            )
        }
        Err(e) => {
            eprintln!("log directory {} unusable, logging to stdout only: {}", dir.display(), e);
            None
        }
    });

    // an absent file layer is a no-op layer
    tracing_subscriber::registry().with(console).with(file).init();

    log_panics();
    log_build();

    LogGuards { _writers: guards }
}

fn filter_for(level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Fires the returned receiver on SIGINT right away, or on SIGTERM once the
/// drain period has passed.
pub fn shutdown_on_signal() -> anyhow::Result<(JoinHandle<()>, watch::Receiver<()>)> {
    let interrupt = signal(SignalKind::interrupt())?;
    let terminate = signal(SignalKind::terminate())?;
    let (tx, rx) = watch::channel(());

    let handle = tokio::spawn(async move {
        wait_for_stop(interrupt, terminate).await;
        let _ = tx.send(());
    });

    Ok((handle, rx))
}

async fn wait_for_stop(mut interrupt: Signal, mut terminate: Signal) {
    tokio::select! {
        _ = interrupt.recv() => {
            tracing::info!("SIGINT received, stopping");
        }
        _ = terminate.recv() => {
            tracing::info!(drain = ?SIGTERM_DRAIN_PERIOD, "SIGTERM received, draining requests");
            tokio::time::sleep(SIGTERM_DRAIN_PERIOD).await;
        }
    }
}

fn log_panics() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location();
        tracing::error!(
            message = %info,
            file = location.map(|l| l.file()),
            line = location.map(|l| l.line()),
            "gateway panicked"
        );
    }));
}

fn log_build() {
    let build = common::version::build_info();
    tracing::info!(
        version = build.version,
        repo_version = build.repo_version,
        profile = build.build_profile,
        built_at = build.build_timestamp,
        "cassette gateway starting"
    );
}
