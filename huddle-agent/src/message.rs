// ABOUTME: Message and context types exchanged between the transport and adapters.
// ABOUTME: Mirrors the platform wire format: room, sender, text, mentions.

use serde::{Deserialize, Serialize};

/// An inbound room message delivered to an adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessage {
    /// Room the message was sent in
    pub room_id: String,
    /// Platform identifier of the sender
    pub sender_id: String,
    /// Display name of the sender, if the platform provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Message body
    pub text: String,
    /// Participant ids mentioned in the message
    #[serde(default)]
    pub mentions: Vec<String>,
}

/// Identity of the agent a run loop is driving, passed to adapters on
/// every invocation.
#[derive(Debug, Clone)]
pub struct RoomContext {
    /// Agent UUID on the platform
    pub agent_id: String,
    /// Configured agent name (local alias)
    pub agent_name: String,
}
