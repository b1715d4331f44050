//! chat-relay - streaming chat-completion relay
//!
//! Accepts chat requests, resolves the caller's stored OpenAI credentials,
//! starts a streaming completion upstream and relays the text back to the
//! caller as it arrives.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod profile;
pub mod telemetry;
pub mod upstream;
