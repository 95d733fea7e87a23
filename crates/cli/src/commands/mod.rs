pub mod announce;
pub mod ask;
pub mod chat;
pub mod doctor;
pub mod init;
pub mod listen;
pub mod predict;
pub mod serve;
pub mod speak;
pub mod upload;

use std::sync::Arc;
use zonewatch_agent::{InitReport, Services};
use zonewatch_config::AppConfig;
use zonewatch_core::event::EventBus;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Check credentials, build providers and run the full build pipeline.
pub async fn start_services(config: &AppConfig) -> Result<Services, Box<dyn std::error::Error>> {
    if let Err(e) = config.check_build_credentials() {
        eprintln!();
        eprintln!("  ERROR: {e}");
        eprintln!();
        eprintln!("  Set the variable above, or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(e.into());
    }

    let provider = zonewatch_providers::build_provider(config)?;
    let reranker = zonewatch_providers::build_reranker(config)?;
    let event_bus = Arc::new(EventBus::default());
    zonewatch_gateway::spawn_event_logger(&event_bus);

    eprint!("  Building zone indexes...");
    let services = zonewatch_agent::initialize(config, provider, reranker, Some(event_bus)).await;
    eprint!("\r                          \r");
    Ok(services?)
}

pub fn print_report(report: &InitReport) {
    if report.zones.is_empty() && report.failures.is_empty() {
        println!("  No zone reports found. Run `zonewatch upload <zone>.txt` first.");
        return;
    }
    for zone in &report.zones {
        println!(
            "  ✅ {:<16} {:>4} chunks   vector={} summary_index={} summary={}",
            zone.zone_id, zone.chunks, zone.cache[0], zone.cache[1], zone.cache[2]
        );
        println!("     {}", first_line(&zone.summary));
    }
    for failure in &report.failures {
        println!("  ❌ {:<16} {}", failure.zone_id, failure.error);
    }
}

fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}
