//! Command-line interface for chat-relay
//!
//! Provides argument parsing and subcommand handling for the chat-relay binary.

use clap::{Parser, Subcommand};

/// Streaming chat-completion relay for OpenAI
#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(version)]
#[command(about = "Streaming chat-completion relay for OpenAI")]
#[command(
    long_about = "chat-relay accepts chat requests, looks up the caller's stored OpenAI \
    credentials and streams the completion back as plain text."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# chat-relay Configuration
# ========================

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# UPSTREAM PROVIDER
# ─────────────────────────────────────────────────────────────────────────────

[upstream]
# Chat Completions API base URL ("/chat/completions" is appended)
base_url = "https://api.openai.com/v1"

# Model used for every relayed request
model = "gpt-3.5-turbo"

# Maximum output tokens requested per completion
max_tokens = 4096

# Used when the request's chatSettings.temperature is missing (0.0-2.0)
default_temperature = 0.7

# Connect timeout in seconds (1-300). Streams themselves are not time-limited.
connect_timeout_seconds = 10

# Provider name used in key validation messages
provider_label = "OpenAI"

# ─────────────────────────────────────────────────────────────────────────────
# PROFILES
# ─────────────────────────────────────────────────────────────────────────────
#
# Callers authenticate with "Authorization: Bearer <token>". Each token maps to
# one profile holding that user's OpenAI credentials.

[[profiles]]
token = "replace-with-a-long-random-token"
user_id = "example-user"
openai_api_key = "sk-your-key"
# openai_organization_id = "org-your-org"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
