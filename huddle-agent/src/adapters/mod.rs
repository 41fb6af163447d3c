// ABOUTME: Built-in adapter implementations.
// ABOUTME: passthrough and echo are always compiled; anthropic is feature-gated.

pub mod echo;
pub mod passthrough;

#[cfg(feature = "anthropic")]
pub mod anthropic;
