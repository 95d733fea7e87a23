//! Single-shot operations flows: targeted announcements and incident prediction.
//!
//! Each flow renders one prompt, makes one LLM call and validates the reply.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zonewatch_core::error::FlowError;
use zonewatch_index::EngineSettings;
use crate::parse::first_json_value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementRequest {
    pub zone: String,
    #[serde(alias = "userGroup")]
    pub user_group: String,
    #[serde(alias = "realTimeNeeds")]
    pub real_time_needs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub announcement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDensity {
    #[serde(alias = "zoneId")]
    pub zone_id: String,
    /// Crowd density between 0 and 1
    pub density: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentPredictionRequest {
    #[serde(alias = "zoneDensities")]
    pub zone_densities: Vec<ZoneDensity>,
    #[serde(default, alias = "historicalData")]
    pub historical_data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedIncident {
    #[serde(alias = "zoneId")]
    pub zone_id: String,
    #[serde(alias = "incidentType")]
    pub incident_type: String,
    pub severity: Severity,
    pub probability: f64,
    #[serde(default)]
    pub recommendations: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentPrediction {
    pub predicted_incidents: Vec<PredictedIncident>,
}

/// The announcement and prediction flows over one chat model.
#[derive(Clone)]
pub struct OperationsFlows {
    settings: EngineSettings,
}

impl OperationsFlows {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub async fn targeted_announcement(
        &self,
        request: &AnnouncementRequest,
    ) -> zonewatch_core::Result<Announcement> {
        for (field, value) in [
            ("zone", &request.zone),
            ("user_group", &request.user_group),
            ("real_time_needs", &request.real_time_needs),
        ] {
            if value.trim().is_empty() {
                return Err(FlowError::InvalidInput(format!("'{field}' must not be empty")).into());
            }
        }

        let reply = self.settings.complete_text(announcement_prompt(request)).await?;
        let announcement = parse_announcement(&reply)?;
        info!(zone = %request.zone, chars = announcement.announcement.len(), "Announcement generated");
        Ok(announcement)
    }

    pub async fn predict_incidents(
        &self,
        request: &IncidentPredictionRequest,
    ) -> zonewatch_core::Result<IncidentPrediction> {
        if request.zone_densities.is_empty() {
            return Err(FlowError::InvalidInput("'zone_densities' must not be empty".into()).into());
        }
        for zone in &request.zone_densities {
            if zone.zone_id.trim().is_empty() {
                return Err(FlowError::InvalidInput("zone_id must not be empty".into()).into());
            }
            if !(0.0..=1.0).contains(&zone.density) {
                return Err(FlowError::InvalidInput(format!(
                    "density for '{}' must be between 0 and 1, got {}",
                    zone.zone_id, zone.density
                ))
                .into());
            }
        }

        let reply = self.settings.complete_text(prediction_prompt(request)).await?;
        debug!(reply = %reply, "Prediction reply");
        let prediction = parse_prediction(&reply)?;
        info!(incidents = prediction.predicted_incidents.len(), "Incidents predicted");
        Ok(prediction)
    }
}

fn announcement_prompt(request: &AnnouncementRequest) -> String {
    format!(
        "You are an expert in crafting targeted announcements for events.\n\n\
         Generate one announcement that is relevant to the group below and clearly \
         communicates what they need to know right now.\n\n\
         Zone: {}\n\
         User Group: {}\n\
         Real-time Needs: {}\n\n\
         Reply with a JSON object: {{\"announcement\": \"...\"}}",
        request.zone, request.user_group, request.real_time_needs
    )
}

fn prediction_prompt(request: &IncidentPredictionRequest) -> String {
    let densities: Vec<String> = request
        .zone_densities
        .iter()
        .map(|z| format!("- Zone ID: {}, Density: {}", z.zone_id, z.density))
        .collect();
    format!(
        "You are an AI assistant that predicts potential incidents at events from crowd \
         density and historical data.\n\n\
         Current Zone Densities:\n{}\n\n\
         Historical Data:\n{}\n\n\
         Predict any potential incidents. Reply with a JSON object of the form \
         {{\"predicted_incidents\": [{{\"zone_id\": \"...\", \"incident_type\": \"...\", \
         \"severity\": \"low|medium|high\", \"probability\": 0.0, \"recommendations\": \"...\"}}]}}. \
         Probability is between 0 and 1.",
        densities.join("\n"),
        request.historical_data
    )
}

fn parse_announcement(reply: &str) -> Result<Announcement, FlowError> {
    let text = match first_json_value(reply) {
        Some(value) => value
            .get("announcement")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| FlowError::InvalidOutput("missing 'announcement' field".into()))?,
        // Plain prose is accepted as the announcement itself
        None => reply.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(FlowError::InvalidOutput("empty announcement".into()));
    }
    Ok(Announcement {
        announcement: text.to_string(),
    })
}

fn parse_prediction(reply: &str) -> Result<IncidentPrediction, FlowError> {
    let value = first_json_value(reply)
        .ok_or_else(|| FlowError::InvalidOutput("no JSON found in model reply".into()))?;

    let incidents = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map
            .remove("predicted_incidents")
            .or_else(|| map.remove("predictedIncidents"))
            .ok_or_else(|| FlowError::InvalidOutput("missing 'predicted_incidents'".into()))?,
        _ => return Err(FlowError::InvalidOutput("expected a JSON object or array".into())),
    };

    let predicted_incidents: Vec<PredictedIncident> =
        serde_json::from_value(incidents).map_err(|e| FlowError::InvalidOutput(e.to_string()))?;

    for incident in &predicted_incidents {
        if !(0.0..=1.0).contains(&incident.probability) {
            return Err(FlowError::InvalidOutput(format!(
                "probability for '{}' must be between 0 and 1, got {}",
                incident.zone_id, incident.probability
            )));
        }
    }

    Ok(IncidentPrediction { predicted_incidents })
}
