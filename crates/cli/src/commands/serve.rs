//! `streamlens serve` — Start the HTTP Q&A gateway.

use streamlens_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🔎 streamlens gateway");
    println!(
        "   Listening: {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("   Chat table: {} ({})", config.store.table, config.store.region);

    streamlens_gateway::start(config).await?;

    Ok(())
}
