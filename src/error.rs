// ABOUTME: Typed error kinds surfaced to the CLI with exit codes and hints.
// ABOUTME: Library modules return these; anyhow carries them to main for rendering.

use huddle_agent::AdapterError;

/// Error kinds that map to distinct CLI failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("agent '{0}' not found in configuration")]
    ConfigNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("agent '{0}' is already running")]
    AlreadyRunning(String),

    #[error("agent '{0}' is not running")]
    NotRunning(String),

    #[error("agent '{agent}' did not stop within {timeout_secs}s")]
    ShutdownTimeout { agent: String, timeout_secs: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("required environment variable '{0}' is not set")]
    MissingEnv(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl Error {
    /// Process exit code for this failure kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Transport(_) => 2,
            _ => 1,
        }
    }

    /// Actionable remediation line printed under the error, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            Error::ConfigNotFound(_) => Some(
                "Run 'huddle config list' to see configured agents, \
                 or 'huddle config set' to add one."
                    .to_string(),
            ),
            Error::NotRunning(agent) => {
                Some(format!("Start the agent with: huddle run {}", agent))
            }
            Error::ShutdownTimeout { agent, .. } => {
                Some(format!("Retry with: huddle stop {} --force", agent))
            }
            Error::AlreadyRunning(agent) => {
                Some(format!("Stop it first with: huddle stop {}", agent))
            }
            Error::MissingEnv(var) => Some(format!("Set the variable: export {}=<value>", var)),
            Error::Adapter(AdapterError::MissingDependencies { adapter, .. }) => Some(format!(
                "Rebuild with the feature enabled: cargo install huddle --features {}",
                adapter
            )),
            _ => None,
        }
    }
}
