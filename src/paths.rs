// ABOUTME: XDG Base Directory paths for per-user state storage.
// ABOUTME: Process records live under the state dir, one file per agent.

use directories::ProjectDirs;
use std::path::PathBuf;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "huddle";
const APPLICATION: &str = "huddle";

/// Get XDG-compliant directories for the application
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the state directory for process records
/// (e.g., ~/.local/state/huddle/ on Linux).
/// `HUDDLE_STATE_DIR` overrides; falls back to ./state if XDG
/// directories are unavailable.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HUDDLE_STATE_DIR") {
        return PathBuf::from(dir);
    }
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .or_else(|| project_dirs().map(|p| p.data_local_dir().join("state")))
        .unwrap_or_else(|| PathBuf::from("./state"))
}

/// Get the default agent credential file path.
/// `HUDDLE_CONFIG_PATH` overrides; defaults to ./agent_config.yaml so
/// per-project credential files work out of the box.
pub fn config_file() -> PathBuf {
    if let Ok(path) = std::env::var("HUDDLE_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    PathBuf::from("agent_config.yaml")
}
