// ABOUTME: Passthrough adapter that prints inbound messages to stdout.
// ABOUTME: Never replies; useful for piping room traffic into external tooling.

use crate::message::{RoomContext, RoomMessage};
use crate::traits::Adapter;
use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;

/// Prints each inbound message to stdout and sends nothing back.
///
/// Default output is one JSON object per line so downstream scripts can
/// parse the stream; plain mode prints `[room] sender: text`.
pub struct PassthroughAdapter {
    plain: bool,
}

impl PassthroughAdapter {
    pub fn new(plain: bool) -> Self {
        Self { plain }
    }
}

#[async_trait]
impl Adapter for PassthroughAdapter {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    async fn handle(&self, msg: &RoomMessage, _ctx: &RoomContext) -> Result<Option<String>> {
        let mut stdout = std::io::stdout().lock();
        if self.plain {
            let sender = msg.sender_name.as_deref().unwrap_or(&msg.sender_id);
            writeln!(stdout, "[{}] {}: {}", msg.room_id, sender, msg.text)?;
        } else {
            writeln!(stdout, "{}", serde_json::to_string(msg)?)?;
        }
        stdout.flush()?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> RoomMessage {
        RoomMessage {
            room_id: "r1".to_string(),
            sender_id: "u1".to_string(),
            sender_name: None,
            text: text.to_string(),
            mentions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_passthrough_never_replies() {
        let adapter = PassthroughAdapter::new(false);
        let ctx = RoomContext {
            agent_id: "a1".to_string(),
            agent_name: "bot".to_string(),
        };
        let reply = adapter.handle(&message("hello"), &ctx).await.unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_passthrough_plain_mode_never_replies() {
        let adapter = PassthroughAdapter::new(true);
        let ctx = RoomContext {
            agent_id: "a1".to_string(),
            agent_name: "bot".to_string(),
        };
        let reply = adapter.handle(&message("hi"), &ctx).await.unwrap();
        assert!(reply.is_none());
    }
}
