//! Agents for ZoneWatch.
//!
//! Two kinds of reasoning loop live here:
//!
//! 1. **Zone agents** (and the compare sub-agent): native function-calling
//!    loops over a fixed tool set, see [`AgentLoop`].
//! 2. **The dispatch agent**: a text ReAct loop whose tools are selected per
//!    query by embedding retrieval plus reranking, see [`DispatchAgent`].
//!
//! [`initialize`] wires the whole pipeline from zone documents on disk.

pub mod flows;
pub mod loop_runner;
pub mod parse;
pub mod react;
pub mod selector;
pub mod services;
pub mod tool_index;
pub mod zone_agent;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use flows::{
    Announcement, AnnouncementRequest, IncidentPrediction, IncidentPredictionRequest,
    OperationsFlows, PredictedIncident, Severity, ZoneDensity,
};
pub use loop_runner::{AgentLoop, AgentOutcome};
pub use react::{DispatchAgent, DispatchOutcome, TraceKind, TraceStep, DISPATCH_PROMPT, NO_ZONES_ANSWER};
pub use selector::{RetrievalToolSelector, ToolProvider, COMPARE_AGENT_PROMPT};
pub use services::{initialize, InitReport, Services, ZoneFailure, ZoneReport};
pub use tool_index::ZoneToolIndex;
pub use zone_agent::{make_zone_agent, zone_agent_prompt};
