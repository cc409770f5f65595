use dapp_bridge::api::server;
use dapp_bridge::BridgeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BridgeConfig::from_env();

    log::info!("Starting DApp bridge host on {}", config.bind_address);
    server::start_server(config).await?;
    Ok(())
}
