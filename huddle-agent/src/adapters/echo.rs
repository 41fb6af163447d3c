// ABOUTME: Echo adapter that replies with the inbound text verbatim.
// ABOUTME: Exercises the full receive-dispatch-send path without an LLM.

use crate::message::{RoomContext, RoomMessage};
use crate::traits::Adapter;
use anyhow::Result;
use async_trait::async_trait;

/// Replies to every message with its own text.
pub struct EchoAdapter;

impl EchoAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for EchoAdapter {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn handle(&self, msg: &RoomMessage, _ctx: &RoomContext) -> Result<Option<String>> {
        Ok(Some(msg.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_message_text() {
        let adapter = EchoAdapter::new();
        let msg = RoomMessage {
            room_id: "r1".to_string(),
            sender_id: "u1".to_string(),
            sender_name: None,
            text: "ping".to_string(),
            mentions: Vec::new(),
        };
        let ctx = RoomContext {
            agent_id: "a1".to_string(),
            agent_name: "bot".to_string(),
        };
        let reply = adapter.handle(&msg, &ctx).await.unwrap();
        assert_eq!(reply.as_deref(), Some("ping"));
    }
}
