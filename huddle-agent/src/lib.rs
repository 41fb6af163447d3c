// ABOUTME: Pluggable message adapter abstraction for huddle.
// ABOUTME: Closed set of trait-based adapters (passthrough, echo, anthropic) selected by name.

pub mod adapters;
pub mod message;
pub mod registry;
pub mod traits;

pub use message::{RoomContext, RoomMessage};
pub use registry::{construct, descriptors, get, AdapterConfig, AdapterDescriptor, AdapterError};
pub use traits::Adapter;
