//! `zonewatch predict` — Predict incidents from zone densities.

use super::{CmdResult, load_config};
use zonewatch_agent::{IncidentPredictionRequest, OperationsFlows, ZoneDensity};
use zonewatch_index::EngineSettings;

pub async fn run(densities: &[String], history: String) -> CmdResult {
    let zone_densities = densities
        .iter()
        .map(|d| parse_density(d))
        .collect::<Result<Vec<_>, _>>()?;

    let config = load_config()?;
    let provider = zonewatch_providers::build_provider(&config)?;
    let flows = OperationsFlows::new(EngineSettings::from_config(provider, &config));

    let request = IncidentPredictionRequest {
        zone_densities,
        historical_data: history,
    };
    let prediction = flows.predict_incidents(&request).await?;
    println!("{}", serde_json::to_string_pretty(&prediction)?);

    Ok(())
}

/// Parse `ZONE=VALUE`.
fn parse_density(arg: &str) -> Result<ZoneDensity, String> {
    let (zone, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("Expected ZONE=VALUE, got '{arg}'"))?;
    let density: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("Density for '{zone}' is not a number: '{value}'"))?;
    Ok(ZoneDensity {
        zone_id: zone.trim().to_string(),
        density,
    })
}
