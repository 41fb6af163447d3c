// ABOUTME: Worker message loop: inbound room messages through the adapter, replies back out.
// ABOUTME: Adapter failures are per-message; transport failures trigger bounded reconnects.

use crate::config::AgentConfig;
use crate::error::Error;
use crate::proc::{AgentProcessRecord, ProcessRegistry};
use crate::transport::{Messaging, WsTransport};
use anyhow::Result;
use huddle_agent::{Adapter, AdapterConfig, RoomContext};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Counters for one connection session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub handled: u64,
    pub replied: u64,
    pub errors: u64,
}

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Peer closed the connection cleanly.
    Closed,
    /// Shutdown was requested locally.
    Shutdown,
    /// The transport failed mid-session.
    TransportError(anyhow::Error),
}

/// Drive one connection session to completion.
///
/// Messages from the agent itself are skipped so an adapter that echoes
/// cannot feed itself. Adapter errors are logged and counted but never
/// end the session; only transport failures, a clean close, or a
/// shutdown signal do.
pub async fn run_session<T: Messaging>(
    transport: &mut T,
    adapter: &dyn Adapter,
    ctx: &RoomContext,
    shutdown: &mut watch::Receiver<bool>,
) -> (SessionStats, SessionEnd) {
    let mut stats = SessionStats::default();

    loop {
        let msg = tokio::select! {
            _ = shutdown.changed() => {
                debug!("Shutdown requested, leaving session loop");
                return (stats, SessionEnd::Shutdown);
            }
            msg = transport.next_message() => msg,
        };

        let msg = match msg {
            Ok(Some(msg)) => msg,
            Ok(None) => return (stats, SessionEnd::Closed),
            Err(e) => return (stats, SessionEnd::TransportError(e)),
        };

        if msg.sender_id == ctx.agent_id {
            continue;
        }

        stats.handled += 1;
        match adapter.handle(&msg, ctx).await {
            Ok(Some(reply)) => {
                // Replies mention the sender so they surface in busy rooms
                let mentions = std::slice::from_ref(&msg.sender_id);
                if let Err(e) = transport.send_reply(&msg.room_id, &reply, mentions).await {
                    return (stats, SessionEnd::TransportError(e));
                }
                stats.replied += 1;
            }
            Ok(None) => {}
            Err(e) => {
                stats.errors += 1;
                error!(room = %msg.room_id, error = %e, "Adapter failed to handle message");
            }
        }
    }
}

/// Options resolved by the run command before the loop starts.
pub struct WorkerOptions {
    pub agent_name: String,
    pub adapter_name: String,
    pub adapter_config: AdapterConfig,
    pub credentials: AgentConfig,
    pub ws_url: String,
}

/// Run an agent worker in the current process until closed or signalled.
///
/// Writes its own process record once the adapter is constructed, so a
/// worker that dies during startup never looks healthy in `status`.
/// The record is removed again on the way out.
pub async fn run_worker(registry: &ProcessRegistry, opts: WorkerOptions) -> Result<()> {
    let adapter = huddle_agent::construct(&opts.adapter_name, &opts.adapter_config)
        .map_err(Error::from)?;

    let record = AgentProcessRecord::new(
        std::process::id() as i32,
        &opts.agent_name,
        &opts.adapter_name,
        opts.adapter_config.model.clone(),
    );
    registry.write(&record)?;

    let ctx = RoomContext {
        agent_id: opts.credentials.agent_id.clone(),
        agent_name: opts.agent_name.clone(),
    };

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    spawn_signal_listener(shutdown_tx);

    let result = connect_and_run(&opts, adapter.as_ref(), &ctx, &mut shutdown_rx).await;

    if let Err(e) = adapter.shutdown().await {
        warn!(error = %e, "Adapter shutdown failed");
    }

    // Clean exits remove the record; a transport failure leaves it so
    // the next registry read recognizes it as stale instead
    if result.is_ok() {
        registry.remove(&opts.agent_name)?;
    }
    info!(agent = %opts.agent_name, "Worker exited");
    result
}

/// Reconnect accounting: a fixed number of attempts with exponentially
/// growing, capped delays. Both mid-session transport failures and
/// failed reconnect attempts draw from the same budget.
#[derive(Debug, Default)]
struct RetryBudget {
    attempts: u32,
}

impl RetryBudget {
    /// Delay before the next attempt, or None when the budget is spent.
    fn next_delay(&mut self) -> Option<Duration> {
        self.attempts += 1;
        if self.attempts > MAX_RECONNECT_ATTEMPTS {
            return None;
        }
        Some(
            (RECONNECT_BASE_DELAY * 2u32.saturating_pow(self.attempts - 1))
                .min(RECONNECT_MAX_DELAY),
        )
    }

    fn reset(&mut self) {
        self.attempts = 0;
    }
}

async fn connect_and_run(
    opts: &WorkerOptions,
    adapter: &dyn Adapter,
    ctx: &RoomContext,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<()> {
    let mut budget = RetryBudget::default();
    let mut connected_once = false;

    loop {
        let mut transport = match WsTransport::connect(
            &opts.ws_url,
            &opts.credentials.agent_id,
            &opts.credentials.api_key,
        )
        .await
        {
            Ok(transport) => transport,
            // The very first connect is fail-fast so misconfiguration
            // surfaces immediately; later ones draw from the budget
            Err(e) if !connected_once => return Err(e),
            Err(e) => {
                let Some(delay) = budget.next_delay() else {
                    return Err(e);
                };
                warn!(delay_secs = delay.as_secs(), error = %e, "Reconnect failed, retrying");
                tokio::select! {
                    _ = shutdown.changed() => return Ok(()),
                    _ = tokio::time::sleep(delay) => {}
                }
                continue;
            }
        };
        connected_once = true;
        info!(agent = %opts.agent_name, adapter = adapter.name(), "Connected, entering message loop");

        let (stats, end) = run_session(&mut transport, adapter, ctx, shutdown).await;
        info!(
            handled = stats.handled,
            replied = stats.replied,
            errors = stats.errors,
            "Session ended"
        );
        let _ = transport.close().await;

        match end {
            SessionEnd::Closed | SessionEnd::Shutdown => return Ok(()),
            SessionEnd::TransportError(e) => {
                // A session that handled traffic earns a fresh budget
                if stats.handled > 0 {
                    budget.reset();
                }
                let Some(delay) = budget.next_delay() else {
                    return Err(e);
                };
                warn!(delay_secs = delay.as_secs(), error = %e, "Transport failed, reconnecting");
                tokio::select! {
                    _ = shutdown.changed() => return Ok(()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

fn spawn_signal_listener(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    error!(error = %e, "Failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    let _ = shutdown_tx.send(true);
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("Received Ctrl-C, shutting down");
        }

        let _ = shutdown_tx.send(true);
    });
}
