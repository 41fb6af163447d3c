// ABOUTME: On-disk registry of running agent processes, one JSON record per agent.
// ABOUTME: Records are written atomically and stale entries self-heal on read.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persistent record of one running agent worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProcessRecord {
    pub pid: i32,
    pub agent_name: String,
    pub adapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl AgentProcessRecord {
    pub fn new(pid: i32, agent_name: &str, adapter: &str, model: Option<String>) -> Self {
        Self {
            pid,
            agent_name: agent_name.to_string(),
            adapter: adapter.to_string(),
            model,
            started_at: Utc::now(),
        }
    }

    /// Whether the recorded pid refers to a live process.
    ///
    /// Signal 0 probes without delivering; EPERM means the process
    /// exists but belongs to another user, which still counts as alive.
    pub fn is_alive(&self) -> bool {
        pid_alive(self.pid)
    }

    /// Seconds since the process was started.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

pub(crate) fn pid_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    let ret = unsafe { libc::kill(pid, 0) };
    if ret == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Directory of agent process records.
pub struct ProcessRegistry {
    dir: PathBuf,
}

impl ProcessRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Registry at the default state directory.
    pub fn open_default() -> Self {
        Self::new(crate::paths::state_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, agent_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", agent_name))
    }

    /// Write a record atomically (temp file then rename).
    pub fn write(&self, record: &AgentProcessRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.record_path(&record.agent_name);
        let tmp = self.dir.join(format!(".{}.json.tmp", record.agent_name));
        let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to rename {} into place", tmp.display()))?;

        debug!(agent = %record.agent_name, pid = record.pid, "Wrote process record");
        Ok(())
    }

    /// Read the record for an agent, pruning it if the process is dead.
    ///
    /// Returns None when there is no record, the record is unreadable,
    /// or the process has exited. Unreadable and stale records are
    /// removed so the registry self-heals.
    pub fn read(&self, agent_name: &str) -> Result<Option<AgentProcessRecord>> {
        match self.read_raw(agent_name)? {
            Some(record) if record.is_alive() => Ok(Some(record)),
            Some(record) => {
                debug!(agent = %agent_name, pid = record.pid, "Pruning stale process record");
                self.remove(agent_name)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Read the record without liveness pruning.
    ///
    /// Corrupt records are removed and reported as absent.
    pub fn read_raw(&self, agent_name: &str) -> Result<Option<AgentProcessRecord>> {
        let path = self.record_path(agent_name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(agent = %agent_name, error = %e, "Removing corrupt process record");
                self.remove(agent_name)?;
                Ok(None)
            }
        }
    }

    /// Remove an agent's record. Missing records are not an error.
    pub fn remove(&self, agent_name: &str) -> Result<()> {
        let path = self.record_path(agent_name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    /// All records on disk, sorted by agent name, without pruning.
    ///
    /// Callers decide how to present dead entries; `status` flags them
    /// as stale rather than silently dropping them.
    pub fn list_all(&self) -> Result<Vec<AgentProcessRecord>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.dir.display()))
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json") != Some(true) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            if let Some(record) = self.read_raw(stem)? {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.agent_name.cmp(&b.agent_name));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> ProcessRegistry {
        ProcessRegistry::new(dir.path())
    }

    #[test]
    fn test_write_read_round_trip_for_live_process() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        // Our own pid is guaranteed alive
        let record = AgentProcessRecord::new(std::process::id() as i32, "my-agent", "echo", None);
        registry.write(&record).unwrap();

        let read = registry.read("my-agent").unwrap().unwrap();
        assert_eq!(read.pid, record.pid);
        assert_eq!(read.adapter, "echo");
    }

    #[test]
    fn test_read_prunes_dead_pid() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        // Spawn and reap a child so its pid is known-dead
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id() as i32;
        child.wait().unwrap();

        let record = AgentProcessRecord::new(pid, "my-agent", "echo", None);
        registry.write(&record).unwrap();

        assert!(registry.read("my-agent").unwrap().is_none());
        // Record file is gone after the pruning read
        assert!(registry.read_raw("my-agent").unwrap().is_none());
    }

    #[test]
    fn test_read_raw_keeps_dead_records() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id() as i32;
        child.wait().unwrap();

        registry
            .write(&AgentProcessRecord::new(pid, "my-agent", "echo", None))
            .unwrap();

        let record = registry.read_raw("my-agent").unwrap().unwrap();
        assert!(!record.is_alive());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        registry.remove("never-existed").unwrap();
        registry.remove("never-existed").unwrap();
    }

    #[test]
    fn test_corrupt_record_is_removed_on_read() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        assert!(registry.read_raw("broken").unwrap().is_none());
        assert!(!dir.path().join("broken.json").exists());
    }

    #[test]
    fn test_list_all_sorted_and_skips_temp_files() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let pid = std::process::id() as i32;
        registry
            .write(&AgentProcessRecord::new(pid, "zed", "echo", None))
            .unwrap();
        registry
            .write(&AgentProcessRecord::new(pid, "abe", "passthrough", None))
            .unwrap();
        std::fs::write(dir.path().join(".partial.json.tmp"), "{}").unwrap();

        let names: Vec<String> = registry
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.agent_name)
            .collect();
        assert_eq!(names, vec!["abe", "zed"]);
    }

    #[test]
    fn test_list_all_empty_when_dir_missing() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new(dir.path().join("nonexistent"));
        assert!(registry.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_pid_zero_is_not_alive() {
        assert!(!pid_alive(0));
        assert!(!pid_alive(-1));
    }
}
