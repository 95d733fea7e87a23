//! `zonewatch serve` — Start the HTTP gateway.

use super::{CmdResult, load_config};

pub async fn run(port_override: Option<u16>, init: bool) -> CmdResult {
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if init {
        config.check_build_credentials()?;
    }

    println!("🛰  ZoneWatch Gateway");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Data dir:  {}", config.paths.data_dir.display());
    println!("   Init on start: {init}");

    zonewatch_gateway::start(config, init).await?;

    Ok(())
}
