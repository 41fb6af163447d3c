// ABOUTME: Integration tests for credential resolution with environment overrides.
// ABOUTME: Env-mutating tests run serially so they cannot race each other.

use huddle::config::{AgentEntry, ConfigStore, ENV_AGENT_ID, ENV_API_KEY};
use huddle::Error;
use serial_test::serial;
use tempfile::TempDir;

const UUID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";
const OTHER_UUID: &str = "99999999-8888-7777-6666-555555555555";

fn clear_env() {
    std::env::remove_var(ENV_AGENT_ID);
    std::env::remove_var(ENV_API_KEY);
}

#[test]
#[serial]
fn test_file_entry_used_when_no_env_set() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::new(dir.path().join("agent_config.yaml"));
    store.save_agent("my-agent", UUID, "sk-file").unwrap();

    let config = store.resolve("my-agent").unwrap();
    assert_eq!(config.agent_id, UUID);
    assert_eq!(config.api_key, "sk-file");
}

#[test]
#[serial]
fn test_both_env_vars_skip_the_file_entirely() {
    clear_env();
    std::env::set_var(ENV_AGENT_ID, OTHER_UUID);
    std::env::set_var(ENV_API_KEY, "sk-env");

    // No file exists at all, resolution still succeeds
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::new(dir.path().join("agent_config.yaml"));
    let config = store.resolve("anything").unwrap();
    assert_eq!(config.agent_id, OTHER_UUID);
    assert_eq!(config.api_key, "sk-env");

    clear_env();
}

#[test]
#[serial]
fn test_partial_env_override_merges_with_file_entry() {
    clear_env();
    std::env::set_var(ENV_API_KEY, "sk-env-only");

    let dir = TempDir::new().unwrap();
    let store = ConfigStore::new(dir.path().join("agent_config.yaml"));
    store.save_agent("my-agent", UUID, "sk-file").unwrap();

    let config = store.resolve("my-agent").unwrap();
    assert_eq!(config.agent_id, UUID);
    assert_eq!(config.api_key, "sk-env-only");

    clear_env();
}

#[test]
#[serial]
fn test_partial_env_with_unknown_agent_still_fails() {
    clear_env();
    std::env::set_var(ENV_API_KEY, "sk-env-only");

    let dir = TempDir::new().unwrap();
    let store = ConfigStore::new(dir.path().join("agent_config.yaml"));
    let err = store.resolve("ghost").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::ConfigNotFound(_))
    ));

    clear_env();
}

#[test]
#[serial]
fn test_empty_env_values_do_not_override() {
    clear_env();
    std::env::set_var(ENV_API_KEY, "");

    let dir = TempDir::new().unwrap();
    let store = ConfigStore::new(dir.path().join("agent_config.yaml"));
    store.save_agent("my-agent", UUID, "sk-file").unwrap();

    let config = store.resolve("my-agent").unwrap();
    assert_eq!(config.api_key, "sk-file");

    clear_env();
}

#[test]
#[serial]
fn test_yaml_file_round_trips_entries_map() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent_config.yaml");
    let store = ConfigStore::new(&path);
    store.save_agent("alpha", UUID, "k1").unwrap();
    store.save_agent("beta", OTHER_UUID, "k2").unwrap();

    // The on-disk format is a plain name -> entry mapping
    let content = std::fs::read_to_string(&path).unwrap();
    let parsed: std::collections::BTreeMap<String, AgentEntry> =
        serde_yaml::from_str(&content).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed["alpha"].agent_id, UUID);
    assert_eq!(parsed["beta"].api_key, "k2");
}
