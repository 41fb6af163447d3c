// ABOUTME: The status command: report running agents from the process registry.
// ABOUTME: Stale records are flagged, never pruned, unless --clean is passed.

use crate::error::Error;
use crate::proc::{AgentProcessRecord, ProcessRegistry};
use anyhow::Result;
use serde::Serialize;

pub struct StatusArgs {
    pub agent_name: Option<String>,
    pub clean: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct StatusRow {
    agent_name: String,
    pid: i32,
    adapter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    running: bool,
    uptime: String,
}

impl StatusRow {
    fn from_record(record: &AgentProcessRecord) -> Self {
        let running = record.is_alive();
        Self {
            agent_name: record.agent_name.clone(),
            pid: record.pid,
            adapter: record.adapter.clone(),
            model: record.model.clone(),
            running,
            uptime: if running {
                format_uptime(record.uptime_secs())
            } else {
                "stale".to_string()
            },
        }
    }
}

pub fn execute(args: StatusArgs) -> Result<()> {
    let registry = ProcessRegistry::open_default();

    let records = match &args.agent_name {
        Some(name) => {
            let record = registry
                .read_raw(name)?
                .ok_or_else(|| Error::NotRunning(name.clone()))?;
            vec![record]
        }
        None => registry.list_all()?,
    };

    let rows: Vec<StatusRow> = records.iter().map(StatusRow::from_record).collect();

    if args.clean {
        for row in rows.iter().filter(|r| !r.running) {
            registry.remove(&row.agent_name)?;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No agents running.");
        return Ok(());
    }

    println!(
        "{:<20} {:>8} {:<14} {:<10} {}",
        "AGENT", "PID", "ADAPTER", "STATUS", "UPTIME"
    );
    for row in &rows {
        let status = if row.running { "running" } else { "stale" };
        let uptime = if row.running { row.uptime.as_str() } else { "-" };
        println!(
            "{:<20} {:>8} {:<14} {:<10} {}",
            row.agent_name, row.pid, row.adapter, status, uptime
        );
    }

    let stale = rows.iter().filter(|r| !r.running).count();
    if stale > 0 && !args.clean {
        println!();
        println!(
            "{} stale record(s). Remove them with: huddle status --clean",
            stale
        );
    }

    Ok(())
}

/// Human uptime: seconds under a minute, then the two largest units.
pub fn format_uptime(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        return format!("{}s", secs);
    }
    if secs < 3600 {
        let (m, s) = (secs / 60, secs % 60);
        return if s == 0 {
            format!("{}m", m)
        } else {
            format!("{}m {}s", m, s)
        };
    }
    if secs < 86400 {
        let (h, m) = (secs / 3600, (secs % 3600) / 60);
        return if m == 0 {
            format!("{}h", h)
        } else {
            format!("{}h {}m", h, m)
        };
    }
    let (d, h) = (secs / 86400, (secs % 86400) / 3600);
    if h == 0 {
        format!("{}d", d)
    } else {
        format!("{}d {}h", d, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime_seconds_only() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(42), "42s");
    }

    #[test]
    fn test_format_uptime_minutes() {
        assert_eq!(format_uptime(190), "3m 10s");
        assert_eq!(format_uptime(180), "3m");
    }

    #[test]
    fn test_format_uptime_hours() {
        assert_eq!(format_uptime(2 * 3600 + 5 * 60), "2h 5m");
        assert_eq!(format_uptime(3 * 3600), "3h");
    }

    #[test]
    fn test_format_uptime_days() {
        assert_eq!(format_uptime(86400 + 3 * 3600), "1d 3h");
        assert_eq!(format_uptime(2 * 86400), "2d");
    }

    #[test]
    fn test_format_uptime_clamps_negative() {
        assert_eq!(format_uptime(-5), "0s");
    }
}
