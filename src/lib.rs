// ABOUTME: Root library module exposing all public modules
// ABOUTME: Commands sit on top of config, process, transport, and run loop layers

pub mod commands;
pub mod config;
pub mod error;
pub mod paths;
pub mod proc;
pub mod run_loop;
pub mod transport;

pub use error::Error;
