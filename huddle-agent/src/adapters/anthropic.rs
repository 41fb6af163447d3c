// ABOUTME: Anthropic adapter forwarding message text to the messages API.
// ABOUTME: Compiled only with the `anthropic` feature; needs ANTHROPIC_API_KEY.

use crate::message::{RoomContext, RoomMessage};
use crate::registry::AdapterError;
use crate::traits::Adapter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Forwards each message to the Anthropic messages API and replies with
/// the first text block of the response.
pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicAdapter {
    /// Build from the environment; fails when ANTHROPIC_API_KEY is unset.
    pub fn from_env(model: String) -> Result<Self, AdapterError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| AdapterError::MissingEnv {
            var: "ANTHROPIC_API_KEY".to_string(),
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Adapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn handle(&self, msg: &RoomMessage, ctx: &RoomContext) -> Result<Option<String>> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": format!("You are '{}', an agent in a multi-party chat room.", ctx.agent_name),
            "messages": [{"role": "user", "content": msg.text}],
        });

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .context("Anthropic API request failed")?
            .error_for_status()
            .context("Anthropic API returned an error status")?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        let text = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|t| !t.is_empty());

        Ok(text)
    }
}
