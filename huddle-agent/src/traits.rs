// ABOUTME: Core Adapter trait that all message handlers implement.
// ABOUTME: One inbound message in, at most one outbound reply out.

use crate::message::{RoomContext, RoomMessage};
use anyhow::Result;
use async_trait::async_trait;

/// A pluggable message handler.
///
/// The run loop invokes `handle` once per inbound message, in delivery
/// order. Returning `Ok(Some(text))` sends `text` back to the
/// originating room; `Ok(None)` sends nothing. Errors are logged by the
/// caller and never terminate the loop.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    /// Process one inbound message, optionally producing a reply
    async fn handle(&self, msg: &RoomMessage, ctx: &RoomContext) -> Result<Option<String>>;

    /// Teardown hook invoked once on graceful shutdown
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter").field("name", &self.name()).finish()
    }
}
