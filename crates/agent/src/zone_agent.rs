//! Per-zone agents: a function-calling loop over one zone's two query tools.

use std::sync::Arc;
use std::time::Duration;
use zonewatch_core::engine::QueryEngine;
use zonewatch_core::tool::ToolRegistry;
use zonewatch_core::zone::ZoneId;
use zonewatch_index::EngineSettings;
use zonewatch_tools::{summary_tool, vector_tool};
use crate::loop_runner::AgentLoop;

pub fn zone_agent_prompt(zone: &ZoneId) -> String {
    format!("You are specialized for {zone} Zone Analysis. Use only tools.")
}

/// Build the agent for one zone with exactly `vector_<zone>` and `summary_<zone>`.
pub fn make_zone_agent(
    vector_engine: Arc<dyn QueryEngine>,
    summary_engine: Arc<dyn QueryEngine>,
    zone: &ZoneId,
    settings: &EngineSettings,
    max_iterations: u32,
    tool_timeout: Duration,
) -> AgentLoop {
    let tools = ToolRegistry::from_tools([
        vector_tool(zone, vector_engine, tool_timeout),
        summary_tool(zone, summary_engine, tool_timeout),
    ]);
    AgentLoop::from_settings(
        format!("zone:{zone}"),
        settings,
        zone_agent_prompt(zone),
        Arc::new(tools),
    )
    .with_max_iterations(max_iterations)
}
