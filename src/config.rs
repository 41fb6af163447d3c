// ABOUTME: YAML-backed agent credential store with environment variable overrides.
// ABOUTME: Maps agent names to platform credentials; env vars beat file entries.

use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Overrides the stored agent UUID when set.
pub const ENV_AGENT_ID: &str = "HUDDLE_AGENT_ID";
/// Overrides the stored API key when set.
pub const ENV_API_KEY: &str = "HUDDLE_API_KEY";

/// One stored credential entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    pub agent_id: String,
    pub api_key: String,
}

/// Resolved credentials for a run (file entry plus env overrides).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub agent_id: String,
    pub api_key: String,
}

/// YAML credential store, one file holding a map of agent name to entry.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location (HUDDLE_CONFIG_PATH or ./agent_config.yaml)
    pub fn open_default() -> Self {
        Self::new(crate::paths::config_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, AgentEntry>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&content)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", self.path.display(), e)).into())
    }

    fn save(&self, entries: &BTreeMap<String, AgentEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let yaml = serde_yaml::to_string(entries).context("Failed to serialize config")?;
        std::fs::write(&self.path, yaml)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        // Credentials file is owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Resolve credentials for an agent name.
    ///
    /// HUDDLE_AGENT_ID / HUDDLE_API_KEY take precedence over file
    /// entries; when both are set the file is not consulted at all.
    pub fn resolve(&self, name: &str) -> Result<AgentConfig> {
        let env_agent_id = std::env::var(ENV_AGENT_ID).ok().filter(|v| !v.is_empty());
        let env_api_key = std::env::var(ENV_API_KEY).ok().filter(|v| !v.is_empty());

        if let (Some(agent_id), Some(api_key)) = (env_agent_id.clone(), env_api_key.clone()) {
            return Ok(AgentConfig { agent_id, api_key });
        }

        let entries = self.load()?;
        let entry = entries
            .get(name)
            .ok_or_else(|| Error::ConfigNotFound(name.to_string()))?;

        Ok(AgentConfig {
            agent_id: env_agent_id.unwrap_or_else(|| entry.agent_id.clone()),
            api_key: env_api_key.unwrap_or_else(|| entry.api_key.clone()),
        })
    }

    /// Save credentials for an agent; returns true when the entry is new.
    /// The agent_id must be a valid UUID.
    pub fn save_agent(&self, name: &str, agent_id: &str, api_key: &str) -> Result<bool> {
        if uuid::Uuid::parse_str(agent_id).is_err() {
            return Err(Error::InvalidConfig(format!(
                "invalid agent_id '{}': must be a valid UUID",
                agent_id
            ))
            .into());
        }

        let mut entries = self.load()?;
        let is_new = !entries.contains_key(name);
        entries.insert(
            name.to_string(),
            AgentEntry {
                agent_id: agent_id.to_string(),
                api_key: api_key.to_string(),
            },
        );
        self.save(&entries)?;
        Ok(is_new)
    }

    /// Delete an agent entry; returns false when it did not exist.
    pub fn delete_agent(&self, name: &str) -> Result<bool> {
        let mut entries = self.load()?;
        if entries.remove(name).is_none() {
            return Ok(false);
        }
        self.save(&entries)?;
        Ok(true)
    }

    /// All configured agent names in sorted order.
    pub fn list_agents(&self) -> Result<Vec<String>> {
        Ok(self.load()?.keys().cloned().collect())
    }

    /// Full stored entry for an agent, without env overrides.
    pub fn get(&self, name: &str) -> Result<AgentEntry> {
        let entries = self.load()?;
        entries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ConfigNotFound(name.to_string()).into())
    }

    /// Whether the file permissions are owner-only.
    #[cfg(unix)]
    pub fn permissions_secure(&self) -> bool {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&self.path) {
            Ok(meta) => meta.permissions().mode() & 0o077 == 0,
            Err(_) => true,
        }
    }

    #[cfg(not(unix))]
    pub fn permissions_secure(&self) -> bool {
        true
    }
}
