// ABOUTME: The stop command: graceful SIGTERM with polling, --force escalates to SIGKILL.
// ABOUTME: --all sweeps every live worker in the registry.

use crate::proc::{ProcessRegistry, ProcessSupervisor, StopOutcome};
use anyhow::Result;
use std::time::Duration;

pub struct StopArgs {
    pub agent_name: Option<String>,
    pub all: bool,
    pub force: bool,
    pub timeout_secs: u64,
}

pub fn execute(args: StopArgs) -> Result<()> {
    let supervisor = ProcessSupervisor::new(ProcessRegistry::open_default());
    let timeout = Duration::from_secs(args.timeout_secs);

    if args.all {
        let report = supervisor.stop_all(timeout, args.force)?;
        if report.stopped.is_empty() && report.failed.is_empty() {
            println!("No agents running.");
            return Ok(());
        }
        for name in &report.stopped {
            println!("Stopped '{}'", name);
        }
        for (name, reason) in &report.failed {
            eprintln!("Failed to stop '{}': {}", name, reason);
        }
        if !report.failed.is_empty() {
            anyhow::bail!("{} agent(s) could not be stopped", report.failed.len());
        }
        return Ok(());
    }

    // clap enforces that one of agent_name / --all is present
    let Some(name) = args.agent_name else {
        anyhow::bail!("agent name required unless --all is given");
    };

    match supervisor.stop(&name, timeout, args.force)? {
        StopOutcome::Graceful => println!("Stopped '{}'", name),
        StopOutcome::Forced => println!("Killed '{}' (did not exit gracefully)", name),
    }
    Ok(())
}
