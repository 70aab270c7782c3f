//! Scheduler service startup.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cronwright_config::{Config, ConfigValidator};
use cronwright_scheduler::{CatchUpEngine, EngineSettings, LoopSettings, Scheduler, SingleInstance};

use crate::adapters::{http_trigger, open_registry, open_snapshot_store};
use crate::signal::shutdown_token;

/// Initialize tracing with console and file output.
///
/// Log files are written to `log_dir` with daily rotation.
pub(crate) fn init_tracing(log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("cronwright")
        .filename_suffix("log")
        .max_log_files(30)
        .build(log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop; keep it for the process lifetime.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Console-only tracing for short-lived admin commands.
pub(crate) fn init_console_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Run the scheduler in foreground until SIGTERM or SIGINT.
pub(crate) async fn run_scheduler(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting cronwright v{}", env!("CARGO_PKG_VERSION"));

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        info!(path = %warning.path, "Config warning: {}", warning.message);
    }
    if !validation.is_valid() {
        for err in &validation.errors {
            error!(path = %err.path, "Config error: {}", err.message);
        }
        return Err(format!("invalid configuration ({} errors)", validation.errors.len()).into());
    }

    let registry = open_registry(&config).await?;
    let snapshot = open_snapshot_store(&config).await?;
    let trigger = http_trigger(&config)?;

    info!(
        registry = ?config.registry.backend,
        snapshot = %snapshot.location(),
        endpoint = %config.trigger.endpoint,
        "Components initialized"
    );

    let engine = Arc::new(CatchUpEngine::new(
        snapshot.clone(),
        trigger,
        EngineSettings::from_config(&config)?,
    ));
    let scheduler = Scheduler::new(
        registry,
        snapshot,
        engine,
        Arc::new(SingleInstance),
        LoopSettings::from_config(&config),
    );

    let cancel = shutdown_token()?;
    if let Err(e) = scheduler.run(cancel).await {
        error!("Scheduler stopped: {}", e);
        return Err(e.into());
    }

    info!("Shutting down...");
    Ok(())
}
