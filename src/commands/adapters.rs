// ABOUTME: The adapters command: list the compiled-in adapter table.
// ABOUTME: Availability reflects build features, checked at runtime via cfg.

use crate::error::Error;
use anyhow::Result;
use huddle_agent::descriptors;
use serde::Serialize;

#[derive(Serialize)]
struct AdapterRow {
    name: &'static str,
    description: &'static str,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_model: Option<&'static str>,
    required_env: &'static [&'static str],
}

pub fn list(json: bool) -> Result<()> {
    if json {
        let rows: Vec<AdapterRow> = descriptors()
            .iter()
            .map(|d| AdapterRow {
                name: d.name,
                description: d.description,
                available: d.available(),
                default_model: d.default_model,
                required_env: d.required_env,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<14} {:<12} {}", "NAME", "AVAILABLE", "DESCRIPTION");
    for desc in descriptors() {
        let available = if desc.available() { "yes" } else { "no" };
        println!("{:<14} {:<12} {}", desc.name, available, desc.description);
    }
    Ok(())
}

pub fn info(name: &str) -> Result<()> {
    let desc = huddle_agent::get(name).map_err(Error::from)?;

    println!("Name:        {}", desc.name);
    println!("Description: {}", desc.description);
    println!(
        "Available:   {}",
        if desc.available() { "yes" } else { "no" }
    );
    if let Some(model) = desc.default_model {
        println!("Default model: {}", model);
    }
    if !desc.required_env.is_empty() {
        println!("Required env:  {}", desc.required_env.join(", "));
    }

    let missing = desc.missing_features();
    if !missing.is_empty() {
        println!();
        println!(
            "Not compiled in. Rebuild with: cargo install huddle --features {}",
            missing.join(",")
        );
    }
    Ok(())
}
