//! Huddle server binary.
//!
//! Run with: `cargo run --package huddle-server -- --bind 127.0.0.1:8080`

mod config;

use huddle::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{ConfigError, ServerConfig, USAGE};

#[tokio::main]
async fn main() -> Result<(), HuddleError> {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::Help) => {
            print!("{USAGE}");
            return Ok(());
        }
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("huddle=info")))
        .init();

    let room_config = RoomConfig {
        send_timeout: config.send_timeout,
        ..RoomConfig::default()
    };
    let server = HuddleServer::builder()
        .bind(&config.bind.to_string())
        .room_config(room_config)
        .idle_timeout(config.idle_timeout)
        .build()
        .await?;

    tracing::info!(
        bind = %config.bind,
        send_timeout_ms = config.send_timeout.as_millis() as u64,
        idle_timeout_secs = config.idle_timeout.map(|d| d.as_secs()),
        "huddle server starting"
    );

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
    }
}
