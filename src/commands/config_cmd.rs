// ABOUTME: The config command: manage stored agent credentials.
// ABOUTME: set/list/show/delete against the YAML store; keys are never echoed in full.

use crate::config::ConfigStore;
use anyhow::Result;

pub fn set(name: &str, agent_id: &str, api_key: &str) -> Result<()> {
    let store = ConfigStore::open_default();
    let is_new = store.save_agent(name, agent_id, api_key)?;
    if is_new {
        println!("Added agent '{}' to {}", name, store.path().display());
    } else {
        println!("Updated agent '{}' in {}", name, store.path().display());
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let store = ConfigStore::open_default();
    let agents = store.list_agents()?;
    if agents.is_empty() {
        println!("No agents configured in {}", store.path().display());
        println!("Add one with: huddle config set <name> --agent-id <uuid> --api-key <key>");
        return Ok(());
    }
    for name in agents {
        println!("{}", name);
    }
    Ok(())
}

pub fn show(name: &str) -> Result<()> {
    let store = ConfigStore::open_default();
    let entry = store.get(name)?;
    println!("Agent:    {}", name);
    println!("Agent ID: {}", entry.agent_id);
    println!("API key:  {}", redact(&entry.api_key));
    if !store.permissions_secure() {
        println!();
        println!(
            "Warning: {} is readable by other users. Fix with: chmod 600 {}",
            store.path().display(),
            store.path().display()
        );
    }
    Ok(())
}

pub fn delete(name: &str) -> Result<()> {
    let store = ConfigStore::open_default();
    if store.delete_agent(name)? {
        println!("Deleted agent '{}'", name);
    } else {
        println!("No agent named '{}' in {}", name, store.path().display());
    }
    Ok(())
}

/// Keep enough of the key to recognize it, never enough to use it.
/// Counts chars, not bytes, so multi-byte keys cannot split a boundary.
fn redact(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_short_keys_entirely() {
        assert_eq!(redact("abc"), "********");
        assert_eq!(redact("12345678"), "********");
    }

    #[test]
    fn test_redact_keeps_prefix_and_suffix() {
        assert_eq!(redact("sk-test-1234567890"), "sk-t...7890");
    }

    #[test]
    fn test_redact_handles_multibyte_keys() {
        assert_eq!(redact("aключ-сервиса"), "aклю...виса");
        assert_eq!(redact("日本語キー"), "********");
    }
}
