// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent lifecycle: boot sequencing, runtime wiring, coordinated shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lookout_core::context::StaticHostname;
use lookout_core::identity::LocalIdentityProvider;
use lookout_core::{AgentContext, Config, ConfigError, Message, SystemClock};

use crate::commandchannel::handlers::{
    backoff_command_channel, run_integration, set_feature_flag, stop_integration,
    FeatureManager, IntegrationSupervisor,
};
use crate::commandchannel::{CommandChannelService, HttpCommandApi};
use crate::control::{self, NotificationHandler};
use crate::emitter::LogEmitter;
use crate::instrument;
use crate::logging::{LogControl, LoggingError};
use crate::plugins::config_attrs::AgentConfigPlugin;
use crate::plugins::external_files::ExternalFilesPlugin;
use crate::plugins::{PluginRuntime, RegistryError};
use crate::retry::{wait_for_network, Backoff, ProbeError};
use crate::samplers::HeartbeatSampler;
use crate::scheduler::{SamplerScheduler, SchedulerError};
use crate::supervisor::{spawn_supervised, PanicPolicy};
use crate::surfaces::{self, SurfaceError};

/// Heartbeat cadence; host metric samplers plug in beside it.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Window given to cancelled subsystems before the process exits.
const DRAIN_WINDOW: Duration = Duration::from_millis(200);

/// A failed boot step. The message names the step; the process exits
/// non-zero with exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("cannot load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot configure logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("cannot build http client: {0}")]
    HttpClient(String),

    #[error("collector unreachable: {0}")]
    Network(#[from] ProbeError),

    #[error("cannot select instrumentation: {0}")]
    Instrumentation(#[from] instrument::AlreadySelected),

    #[error("cannot register plugin: {0}")]
    Plugin(#[from] RegistryError),

    #[error("cannot start sampler scheduler: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("cannot start surface: {0}")]
    Surface(#[from] SurfaceError),

    #[error("cannot start control plane: {0}")]
    Control(std::io::Error),
}

/// Integration execution is an external collaborator; until one is wired,
/// lifecycle commands are acknowledged in the log.
struct LoggingSupervisor;

impl IntegrationSupervisor for LoggingSupervisor {
    fn start(&self, name: &str, args: &[String]) -> Result<(), String> {
        info!(integration = %name, args = ?args, "run_integration acknowledged");
        Ok(())
    }

    fn stop(&self, name: &str) -> Result<(), String> {
        info!(integration = %name, "stop_integration acknowledged");
        Ok(())
    }
}

/// OS-specific process init: restrictive file-creation mask on unix.
pub fn process_init() {
    #[cfg(unix)]
    {
        use nix::sys::stat::{umask, Mode};
        let previous = umask(Mode::from_bits_truncate(0o022));
        tracing::debug!(previous = ?previous, "file mode mask set");
    }
}

fn resolve_hostname(config: &Config) -> StaticHostname {
    if let Some(name) = &config.override_hostname {
        return StaticHostname(name.clone());
    }
    let name = std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string());
    StaticHostname(name)
}

/// Boot the runtime and block until a stop-class control message cancels
/// the root token.
pub async fn run(config: Arc<Config>, log_control: Arc<LogControl>) -> Result<(), BootError> {
    let cancel = CancellationToken::new();

    // OS process init, then gate on the network.
    process_init();
    let client = reqwest::Client::builder()
        .timeout(config.client_timeout())
        .build()
        .map_err(|e| BootError::HttpClient(e.to_string()))?;
    let mut backoff = Backoff::new();
    wait_for_network(
        &client,
        &config.collector_url,
        config.startup_connection_timeout(),
        config.startup_connection_retries,
        &mut backoff,
        &cancel,
    )
    .await?;

    // Identity and instrumentation, before anything samples.
    let identity = LocalIdentityProvider::new();
    instrument::select_from_token(&config.self_instrumentation, None)?;

    // Event/inventory collaborators and the shared context.
    let emitter = Arc::new(LogEmitter);
    let plugin_runtime = PluginRuntime::new(emitter.clone());
    let ctx = AgentContext::new(
        config.clone(),
        identity.clone(),
        Arc::new(resolve_hostname(&config)),
        cancel.clone(),
        emitter.clone(),
        plugin_runtime.clone(),
    );

    // Command channel with its built-in handlers; initial fetch before the
    // loop starts.
    let features = FeatureManager::new(config.features.clone());
    let supervisor: Arc<dyn IntegrationSupervisor> = Arc::new(LoggingSupervisor);
    let command_channel = if config.command_channel_url.is_empty() {
        None
    } else {
        let api = Arc::new(HttpCommandApi::new(
            client.clone(),
            &config.command_channel_url,
            &config.command_channel_endpoint,
        ));
        let mut service = CommandChannelService::new(
            api,
            identity.clone(),
            config.command_channel_interval(),
        );
        service.register_handler("set_feature_flag", set_feature_flag(features.clone()));
        service.register_handler("run_integration", run_integration(supervisor.clone()));
        service.register_handler("stop_integration", stop_integration(supervisor.clone()));
        service.register_handler(
            "backoff_command_channel",
            backoff_command_channel(service.backoff_slot()),
        );
        service.initial_fetch().await;
        Some(service)
    };

    // Optional surfaces.
    if config.status_server_enabled {
        let (addr, listener) =
            surfaces::status::bind(&config.status_server_host, config.status_server_port).await?;
        info!(%addr, "starting status surface");
        let surface_ctx = ctx.clone();
        spawn_supervised("status-surface", PanicPolicy::LogAndContinue, async move {
            if let Err(e) = surfaces::status::serve(listener, surface_ctx).await {
                warn!("status surface stopped: {e}");
            }
        });
    }
    if config.tcp_server_enabled {
        let (addr, listener) = surfaces::tcp::bind(config.tcp_server_port).await?;
        info!(%addr, "starting tcp ingest surface");
        let surface_ctx = ctx.clone();
        spawn_supervised("tcp-ingest", PanicPolicy::LogAndContinue, async move {
            surfaces::tcp::serve(listener, surface_ctx).await;
        });
    }

    // Inventory plugins.
    let config_plugin = Arc::new(AgentConfigPlugin);
    plugin_runtime.register(config_plugin.clone())?;
    plugin_runtime.add_reconnecting(config_plugin);
    plugin_runtime.register(Arc::new(ExternalFilesPlugin))?;
    plugin_runtime.start_all(&ctx);

    // Sampler pipeline.
    let mut scheduler = SamplerScheduler::new(SystemClock);
    scheduler.add_sampler(Box::new(HeartbeatSampler::new(HEARTBEAT_INTERVAL)));
    scheduler.start(&ctx)?;

    // Command-channel poll loop.
    if let Some(service) = command_channel {
        let loop_cancel = cancel.child_token();
        spawn_supervised("command-channel", PanicPolicy::LogAndContinue, async move {
            service.run(loop_cancel).await;
        });
    }

    // Control plane last: once handlers are bound, stop-class signals
    // cancel the root token.
    let monitor = control::init_platform_monitor().await;
    let mut notifications = NotificationHandler::new(monitor);
    let stop_cancel = cancel.clone();
    notifications.register(Message::Stop, move |_| {
        info!("stop requested, cancelling root token");
        stop_cancel.cancel();
        Ok(())
    });
    let shutdown_cancel = cancel.clone();
    notifications.register(Message::Shutdown, move |_| {
        info!("host shutdown in progress, cancelling root token");
        shutdown_cancel.cancel();
        Ok(())
    });
    notifications.register(Message::EnableVerboseLogging, move |_| {
        log_control.raise_verbosity();
        Ok(())
    });

    let dispatch_cancel = notifications.cancel_token();
    #[cfg(unix)]
    let _listener =
        control::signals::spawn_signal_listener(notifications.notifier(), cancel.child_token())
            .map_err(BootError::Control)?;
    #[cfg(windows)]
    let _listener =
        control::pipe::spawn_pipe_listener(notifications.notifier(), cancel.child_token())
            .map_err(BootError::Control)?;
    spawn_supervised("control-dispatch", PanicPolicy::LogAndContinue, notifications.start());

    info!(version = env!("CARGO_PKG_VERSION"), "agent started");

    // Block until a terminal control message (or an internal fatal path)
    // cancels the root token.
    cancel.cancelled().await;

    info!("shutting down");
    if let Err(e) = scheduler.stop() {
        warn!("scheduler stop: {e}");
    }
    dispatch_cancel.cancel();
    tokio::time::sleep(DRAIN_WINDOW).await;
    info!("agent terminated");
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
