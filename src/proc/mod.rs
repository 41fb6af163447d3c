// ABOUTME: Process lifecycle management for background agent workers.
// ABOUTME: Registry persists pid records; supervisor starts, inspects, stops.

pub mod registry;
pub mod supervisor;

pub use registry::{AgentProcessRecord, ProcessRegistry};
pub use supervisor::{ProcessSupervisor, StopAllReport, StopOutcome};
