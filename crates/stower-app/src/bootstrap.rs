//! Service wiring and the scoped shutdown sequence.
//!
//! Startup order: settings, logging, metrics, event bus, queue, worker,
//! listener. Shutdown reverses it: the listener stops admitting work, the
//! queue sender goes down with the router state, the worker drains whatever
//! was already accepted, and bootstrap joins it before returning.

use stower_api::ApiServer;
use stower_config::{LogFormatSetting, Settings};
use stower_dispatch::{CopyRoots, CopyWorker, JobQueue};
use stower_events::EventBus;
use stower_telemetry::{LogFormat, LoggingConfig, Metrics, init_logging};
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the Stower service.
pub(crate) struct BootstrapDependencies {
    settings: Settings,
    events: EventBus,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let settings =
            Settings::load().map_err(|err| AppError::config("settings.load", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        let events = EventBus::new();
        Ok(Self {
            settings,
            events,
            telemetry,
        })
    }
}

/// Entry point for the Stower boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or startup fails, or if the
/// API server terminates abnormally.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify testing.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies {
        settings,
        events,
        telemetry,
    } = dependencies;

    init_logging(&logging_config(&settings))
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!(
        instance = %settings.instance_name,
        source_root = %settings.source_root.display(),
        library_root = %settings.library_root.display(),
        "stower bootstrap starting"
    );

    let roots = CopyRoots {
        source_root: settings.source_root.clone(),
        library_root: settings.library_root.clone(),
    };
    let (queue, receiver) = JobQueue::bounded(settings.queue_capacity);
    let worker = CopyWorker::new(events.clone(), telemetry.clone()).spawn(receiver);
    info!(capacity = settings.queue_capacity, "copy worker ready");

    let api = ApiServer::new(queue, roots, events, telemetry);
    let addr = settings.listen_addr();
    let serve_result = api.serve_with_shutdown(addr, shutdown_signal()).await;

    // The listener is gone, so admission has stopped and the last queue
    // sender went down with the router state; the worker finishes its
    // backlog and exits on its own.
    if let Err(err) = worker.await {
        warn!(error = %err, "copy worker join failed");
    }

    serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("shutdown complete");
    Ok(())
}

fn logging_config(settings: &Settings) -> LoggingConfig<'_> {
    let format = match settings.log.format {
        LogFormatSetting::Auto => LogFormat::infer(),
        LogFormatSetting::Json => LogFormat::Json,
        LogFormatSetting::Pretty => LogFormat::Pretty,
    };
    LoggingConfig {
        level: &settings.log.level,
        format,
        build_sha: option_env!("STOWER_BUILD_SHA").unwrap_or("dev"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
