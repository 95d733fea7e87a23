//! Tool implementations for ZoneWatch.
//!
//! Every tool the agents can call wraps a `QueryEngine`: per-zone semantic
//! search and summarization, whole zone agents, and the compare sub-agent.

pub mod query_engine_tool;
pub mod zone_tools;

pub use query_engine_tool::QueryEngineTool;
pub use zone_tools::{
    compare_tool, summary_tool, summary_tool_name, vector_tool, vector_tool_name, zone_tool,
    zone_tool_name, COMPARE_TOOL_NAME,
};
