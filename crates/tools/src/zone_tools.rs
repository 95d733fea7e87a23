//! Naming and descriptions for zone tools.

use std::sync::Arc;
use std::time::Duration;
use zonewatch_core::engine::QueryEngine;
use zonewatch_core::tool::Tool;
use zonewatch_core::zone::ZoneId;
use crate::query_engine_tool::QueryEngineTool;

pub const VECTOR_TOOL_DESCRIPTION: &str = "semantic search in this Zone information";
pub const SUMMARY_TOOL_DESCRIPTION: &str = "summarize this Zone information";
pub const COMPARE_TOOL_NAME: &str = "compare_tool";
pub const COMPARE_TOOL_DESCRIPTION: &str = "Compare Zone information";

pub fn vector_tool_name(zone: &ZoneId) -> String {
    format!("vector_{zone}")
}

pub fn summary_tool_name(zone: &ZoneId) -> String {
    format!("summary_{zone}")
}

pub fn zone_tool_name(zone: &ZoneId) -> String {
    format!("tool_{zone}")
}

/// `vector_<zone>`: semantic search over the zone's chunks.
pub fn vector_tool(zone: &ZoneId, engine: Arc<dyn QueryEngine>, timeout: Duration) -> Arc<dyn Tool> {
    Arc::new(QueryEngineTool::new(vector_tool_name(zone), VECTOR_TOOL_DESCRIPTION, engine, timeout))
}

/// `summary_<zone>`: tree-summarize the zone's chunks.
pub fn summary_tool(zone: &ZoneId, engine: Arc<dyn QueryEngine>, timeout: Duration) -> Arc<dyn Tool> {
    Arc::new(QueryEngineTool::new(summary_tool_name(zone), SUMMARY_TOOL_DESCRIPTION, engine, timeout))
}

/// `tool_<zone>`: the whole zone agent, described by the zone's summary.
pub fn zone_tool(
    zone: &ZoneId,
    summary: &str,
    agent: Arc<dyn QueryEngine>,
    timeout: Duration,
) -> Arc<dyn Tool> {
    Arc::new(QueryEngineTool::new(zone_tool_name(zone), summary, agent, timeout))
}

pub fn compare_tool(agent: Arc<dyn QueryEngine>, timeout: Duration) -> Arc<dyn Tool> {
    Arc::new(QueryEngineTool::new(COMPARE_TOOL_NAME, COMPARE_TOOL_DESCRIPTION, agent, timeout))
}
