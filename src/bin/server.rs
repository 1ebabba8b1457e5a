use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use signal_relay::auth::token::TokenManager;
use signal_relay::config::RelayConfig;
use signal_relay::core::server::RelayServer;
use signal_relay::handlers::websocket::relay_routes;

#[tokio::main]
async fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    // Load config from the environment
    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, credential check={}",
        config.host,
        config.port,
        if config.requires_auth() { "on" } else { "off" }
    );

    // Shared relay state, injected into every connection's handler
    let relay = Arc::new(RelayServer::new());

    let verifier = config
        .jwt_secret
        .as_deref()
        .map(|secret| Arc::new(TokenManager::new(secret)));

    let routes = relay_routes(relay, verifier, config.max_message_size);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    // Start the server
    info!("Starting signaling relay on {}", addr);

    warp::serve(routes).run(addr).await;
}
