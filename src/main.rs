//! chat-relay HTTP server
//!
//! Starts an Axum web server exposing the streaming chat relay.

use chat_relay::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting chat-relay server on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!(
        upstream = %config.upstream.base_url(),
        model = %config.upstream.model(),
        profiles = config.profiles.len(),
        "Upstream provider configured"
    );

    let addr = config.server.socket_addr()?;

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!(
        "Chat relay available at http://{}{}",
        addr,
        handlers::chat::CHAT_ROUTE
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
