// ABOUTME: Start/stop state machine for background agent workers.
// ABOUTME: Spawns detached re-execs of the current binary and signals them down.

use crate::error::Error;
use crate::proc::registry::{pid_alive, AgentProcessRecord, ProcessRegistry};
use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INITIAL: Duration = Duration::from_millis(50);
const POLL_MAX: Duration = Duration::from_millis(500);
const FORCE_KILL_GRACE: Duration = Duration::from_secs(5);

/// How a stop request resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Exited after SIGTERM within the timeout.
    Graceful,
    /// Needed SIGKILL.
    Forced,
}

/// Per-agent results of a stop-everything sweep.
#[derive(Debug, Default)]
pub struct StopAllReport {
    pub stopped: Vec<String>,
    /// Agents that could not be stopped, with the failure message.
    pub failed: Vec<(String, String)>,
}

/// Manages worker process lifecycles against the registry.
pub struct ProcessSupervisor {
    registry: ProcessRegistry,
}

impl ProcessSupervisor {
    pub fn new(registry: ProcessRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Spawn a detached worker running the given agent.
    ///
    /// The worker is a re-exec of the current binary in its own process
    /// group with stdio detached, so it survives the parent's terminal.
    /// The record is written immediately with the child pid; the worker
    /// rewrites it once its adapter is up, so a worker that dies during
    /// startup leaves only a stale record that pruning clears.
    pub fn start_background(
        &self,
        agent_name: &str,
        adapter: &str,
        model: Option<&str>,
        plain_output: bool,
    ) -> Result<AgentProcessRecord> {
        if let Some(existing) = self.registry.read(agent_name)? {
            return Err(Error::AlreadyRunning(agent_name.to_string())).with_context(|| {
                format!("pid {} started at {}", existing.pid, existing.started_at)
            });
        }

        let exe = std::env::current_exe().context("Failed to locate current executable")?;
        let mut cmd = Command::new(exe);
        cmd.arg("run").arg(agent_name).arg("--adapter").arg(adapter);
        if let Some(model) = model {
            cmd.arg("--model").arg(model);
        }
        if plain_output {
            cmd.arg("--plain");
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().context("Failed to spawn worker process")?;
        let pid = child.id() as i32;

        let record = AgentProcessRecord::new(pid, agent_name, adapter, model.map(String::from));
        self.registry.write(&record)?;

        info!(agent = %agent_name, pid, adapter = %adapter, "Started background worker");
        Ok(record)
    }

    /// Stop a running worker.
    ///
    /// Sends SIGTERM and polls for exit up to `timeout`. With `force`,
    /// escalates to SIGKILL after the timeout instead of failing. The
    /// record is removed once the process is gone.
    pub fn stop(&self, agent_name: &str, timeout: Duration, force: bool) -> Result<StopOutcome> {
        let record = self
            .registry
            .read(agent_name)?
            .ok_or_else(|| Error::NotRunning(agent_name.to_string()))?;

        debug!(agent = %agent_name, pid = record.pid, "Sending SIGTERM");
        signal(record.pid, libc::SIGTERM)?;

        if wait_for_exit(record.pid, timeout) {
            self.registry.remove(agent_name)?;
            info!(agent = %agent_name, pid = record.pid, "Worker stopped");
            return Ok(StopOutcome::Graceful);
        }

        if !force {
            return Err(Error::ShutdownTimeout {
                agent: agent_name.to_string(),
                timeout_secs: timeout.as_secs(),
            }
            .into());
        }

        warn!(agent = %agent_name, pid = record.pid, "Escalating to SIGKILL");
        signal(record.pid, libc::SIGKILL)?;
        if !wait_for_exit(record.pid, FORCE_KILL_GRACE) {
            return Err(Error::ShutdownTimeout {
                agent: agent_name.to_string(),
                timeout_secs: (timeout + FORCE_KILL_GRACE).as_secs(),
            }
            .into());
        }

        self.registry.remove(agent_name)?;
        info!(agent = %agent_name, pid = record.pid, "Worker killed");
        Ok(StopOutcome::Forced)
    }

    /// Stop every live worker. One agent failing does not abort the
    /// sweep; failures are collected in the report.
    pub fn stop_all(&self, timeout: Duration, force: bool) -> Result<StopAllReport> {
        let mut report = StopAllReport::default();
        for record in self.registry.list_all()? {
            if !record.is_alive() {
                continue;
            }
            match self.stop(&record.agent_name, timeout, force) {
                Ok(_) => report.stopped.push(record.agent_name),
                Err(e) => {
                    warn!(agent = %record.agent_name, error = %e, "Failed to stop worker");
                    report.failed.push((record.agent_name, format!("{:#}", e)));
                }
            }
        }
        Ok(report)
    }
}

fn signal(pid: i32, sig: i32) -> Result<()> {
    let ret = unsafe { libc::kill(pid, sig) };
    if ret == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    // ESRCH means it exited between our liveness check and the signal
    if err.raw_os_error() == Some(libc::ESRCH) {
        return Ok(());
    }
    Err(err).with_context(|| format!("Failed to signal pid {}", pid))
}

// Polls with a growing interval so fast exits return quickly and slow
// ones do not spin.
fn wait_for_exit(pid: i32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let mut interval = POLL_INITIAL;
    loop {
        if !pid_alive(pid) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(interval.min(deadline - now));
        interval = (interval * 2).min(POLL_MAX);
    }
}
