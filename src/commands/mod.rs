// ABOUTME: CLI subcommand implementations.
// ABOUTME: Each module owns one verb; main.rs only parses and dispatches.

pub mod adapters;
pub mod config_cmd;
pub mod run;
pub mod status;
pub mod stop;
