// ABOUTME: Integration tests for the run command's validation ordering.
// ABOUTME: Env-driven state and credentials, so everything runs serially.

use huddle::commands::run::{self, RunArgs};
use huddle::proc::{AgentProcessRecord, ProcessRegistry};
use huddle::Error;
use serial_test::serial;
use tempfile::TempDir;

const UUID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

fn set_env(state_dir: &std::path::Path) {
    std::env::set_var("HUDDLE_STATE_DIR", state_dir);
    std::env::set_var("HUDDLE_AGENT_ID", UUID);
    std::env::set_var("HUDDLE_API_KEY", "sk-test");
    // Nothing listens here; connect attempts fail immediately
    std::env::set_var("HUDDLE_WS_URL", "ws://127.0.0.1:1");
}

fn clear_env() {
    std::env::remove_var("HUDDLE_STATE_DIR");
    std::env::remove_var("HUDDLE_AGENT_ID");
    std::env::remove_var("HUDDLE_API_KEY");
    std::env::remove_var("HUDDLE_WS_URL");
}

fn args(agent: &str) -> RunArgs {
    RunArgs {
        agent_name: agent.to_string(),
        adapter: "passthrough".to_string(),
        model: None,
        background: false,
        plain_output: false,
    }
}

#[tokio::test]
#[serial]
async fn test_worker_proceeds_past_its_own_record() {
    let state = TempDir::new().unwrap();
    set_env(state.path());

    // The background-start parent writes the record with the child's
    // pid before the child runs its own checks; from the child's view
    // that is a record carrying its own pid.
    let registry = ProcessRegistry::new(state.path());
    registry
        .write(&AgentProcessRecord::new(
            std::process::id() as i32,
            "bot",
            "passthrough",
            None,
        ))
        .unwrap();

    let err = run::execute(args("bot")).await.unwrap_err();

    // Must get past the already-running check and fail on the
    // unreachable endpoint instead
    match err.downcast_ref::<Error>() {
        Some(Error::Transport(_)) => {}
        other => panic!("Expected Transport, got {:?}", other),
    }

    clear_env();
}

#[tokio::test]
#[serial]
async fn test_run_rejects_record_owned_by_another_live_process() {
    let state = TempDir::new().unwrap();
    set_env(state.path());

    // pid 1 is always alive and is never us
    let registry = ProcessRegistry::new(state.path());
    registry
        .write(&AgentProcessRecord::new(1, "bot", "passthrough", None))
        .unwrap();

    let err = run::execute(args("bot")).await.unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::AlreadyRunning(name)) => assert_eq!(name, "bot"),
        other => panic!("Expected AlreadyRunning, got {:?}", other),
    }

    clear_env();
}

#[tokio::test]
#[serial]
async fn test_run_unknown_adapter_checked_before_credentials() {
    let state = TempDir::new().unwrap();
    set_env(state.path());

    let mut bad = args("bot");
    bad.adapter = "crewai".to_string();
    let err = run::execute(bad).await.unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::Adapter(_)) => {}
        other => panic!("Expected Adapter error, got {:?}", other),
    }

    clear_env();
}
