// ABOUTME: The run command: validate, resolve credentials, then start a worker.
// ABOUTME: Foreground runs the loop in-process; --background spawns a detached re-exec.

use crate::config::ConfigStore;
use crate::error::Error;
use crate::proc::{ProcessRegistry, ProcessSupervisor};
use crate::run_loop::{self, WorkerOptions};
use anyhow::Result;
use huddle_agent::AdapterConfig;
use tracing::info;

pub struct RunArgs {
    pub agent_name: String,
    pub adapter: String,
    pub model: Option<String>,
    pub background: bool,
    pub plain_output: bool,
}

/// Validation order matters: unknown adapter, missing build features,
/// missing env, missing credentials, already-running, in that order,
/// all before any process record is touched.
pub async fn execute(args: RunArgs) -> Result<()> {
    let descriptor = huddle_agent::get(&args.adapter).map_err(Error::from)?;

    let missing = descriptor.missing_features();
    if !missing.is_empty() {
        return Err(Error::from(huddle_agent::AdapterError::MissingDependencies {
            adapter: descriptor.name.to_string(),
            missing: missing.into_iter().map(String::from).collect(),
        })
        .into());
    }

    for var in descriptor.required_env {
        if std::env::var(var).map(|v| v.is_empty()).unwrap_or(true) {
            return Err(Error::MissingEnv(var.to_string()).into());
        }
    }

    let credentials = ConfigStore::open_default().resolve(&args.agent_name)?;

    let model = args
        .model
        .clone()
        .or_else(|| descriptor.default_model.map(String::from));

    let registry = ProcessRegistry::open_default();

    if args.background {
        let supervisor = ProcessSupervisor::new(registry);
        let record = supervisor.start_background(
            &args.agent_name,
            descriptor.name,
            model.as_deref(),
            args.plain_output,
        )?;
        println!(
            "Started '{}' in the background (pid {}, adapter {})",
            record.agent_name, record.pid, record.adapter
        );
        println!("Check on it with: huddle status {}", record.agent_name);
        return Ok(());
    }

    // A record carrying our own pid was written by the parent that
    // spawned this re-exec; only a record for some other live process
    // means a second worker.
    if let Some(existing) = registry.read(&args.agent_name)? {
        if existing.pid != std::process::id() as i32 {
            info!(pid = existing.pid, "Refusing to start a second worker");
            return Err(Error::AlreadyRunning(args.agent_name).into());
        }
    }

    let opts = WorkerOptions {
        agent_name: args.agent_name,
        adapter_name: descriptor.name.to_string(),
        adapter_config: AdapterConfig {
            model,
            plain_output: args.plain_output,
        },
        credentials,
        ws_url: crate::transport::ws_url(),
    };
    run_loop::run_worker(&registry, opts).await
}
