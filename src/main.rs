// ABOUTME: Main entry point: parse the CLI, dispatch to a command, render failures.
// ABOUTME: Typed errors carry exit codes and remediation hints; everything else exits 1.

use anyhow::Result;
use clap::{Parser, Subcommand};
use huddle::commands::{adapters, config_cmd, run, status, stop};
use huddle::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "huddle", version, about = "Run chat agents against the Huddle platform")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent, connecting it to its rooms
    Run {
        /// Configured agent name
        agent_name: String,
        /// Adapter that handles inbound messages
        #[arg(long, default_value = "passthrough")]
        adapter: String,
        /// Model override for adapters that take one
        #[arg(long)]
        model: Option<String>,
        /// Detach and keep running after this command returns
        #[arg(long)]
        background: bool,
        /// Plain text output instead of JSON (passthrough adapter)
        #[arg(long)]
        plain: bool,
    },
    /// Show running agents
    Status {
        /// Limit to one agent
        agent_name: Option<String>,
        /// Remove stale records while reporting
        #[arg(long)]
        clean: bool,
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },
    /// Stop a running agent
    Stop {
        /// Agent to stop
        #[arg(required_unless_present = "all")]
        agent_name: Option<String>,
        /// Stop every running agent
        #[arg(long)]
        all: bool,
        /// Escalate to SIGKILL if the agent ignores SIGTERM
        #[arg(long)]
        force: bool,
        /// Seconds to wait for graceful exit
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
    /// Inspect available adapters
    Adapters {
        #[command(subcommand)]
        command: AdaptersCommands,
    },
    /// Manage stored agent credentials
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum AdaptersCommands {
    /// List all adapters and their availability
    List {
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },
    /// Show details for one adapter
    Info { name: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Add or update an agent's credentials
    Set {
        name: String,
        #[arg(long)]
        agent_id: String,
        #[arg(long)]
        api_key: String,
    },
    /// List configured agent names
    List,
    /// Show one agent's entry (API key redacted)
    Show { name: String },
    /// Remove an agent's credentials
    Delete { name: String },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so passthrough output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        if let Some(err) = e.downcast_ref::<Error>() {
            eprintln!("Error: {}", err);
            if let Some(hint) = err.hint() {
                eprintln!("{}", hint);
            }
            std::process::exit(err.exit_code());
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            agent_name,
            adapter,
            model,
            background,
            plain,
        } => {
            run::execute(run::RunArgs {
                agent_name,
                adapter,
                model,
                background,
                plain_output: plain,
            })
            .await
        }
        Commands::Status {
            agent_name,
            clean,
            json,
        } => status::execute(status::StatusArgs {
            agent_name,
            clean,
            json,
        }),
        Commands::Stop {
            agent_name,
            all,
            force,
            timeout,
        } => stop::execute(stop::StopArgs {
            agent_name,
            all,
            force,
            timeout_secs: timeout,
        }),
        Commands::Adapters { command } => match command {
            AdaptersCommands::List { json } => adapters::list(json),
            AdaptersCommands::Info { name } => adapters::info(&name),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Set {
                name,
                agent_id,
                api_key,
            } => config_cmd::set(&name, &agent_id, &api_key),
            ConfigCommands::List => config_cmd::list(),
            ConfigCommands::Show { name } => config_cmd::show(&name),
            ConfigCommands::Delete { name } => config_cmd::delete(&name),
        },
    }
}
