//! RPC Mock Server
//!
//! Standalone explorer + JSON-RPC mock for local development of the bridge.

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use rpc_mock::{run_server, MockBehavior, MockState};

#[derive(Debug)]
struct Config {
    server_host: String,
    server_port: u16,
    gas_price: Option<String>,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8545".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        let gas_price = env::var("MOCK_GAS_PRICE").ok();

        Ok(Self {
            server_host,
            server_port,
            gas_price,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting RPC Mock Server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    log::info!("Server will listen on {}:{}", config.server_host, config.server_port);

    let mut behavior = MockBehavior::default();
    if let Some(gas_price) = config.gas_price {
        behavior.gas_price = gas_price;
    }

    run_server(Arc::new(MockState::new(behavior)), config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
