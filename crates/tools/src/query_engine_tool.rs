//! Query engine tool: exposes any `QueryEngine` as a callable tool.
//!
//! Every ZoneWatch tool is one of these: a zone's semantic search, a zone's
//! summarizer, a whole zone agent, or the compare sub-agent. The tool takes a
//! single `input` string and returns the engine's answer.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use zonewatch_core::engine::QueryEngine;
use zonewatch_core::error::ToolError;
use zonewatch_core::tool::{Tool, ToolResult};

pub struct QueryEngineTool {
    name: String,
    description: String,
    engine: Arc<dyn QueryEngine>,
    timeout: Duration,
}

impl QueryEngineTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        engine: Arc<dyn QueryEngine>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            engine,
            timeout,
        }
    }

    /// Pull the query text out of the arguments.
    ///
    /// Accepts `{"input": "..."}`, the `query` alias, or a bare JSON string.
    fn input(arguments: &serde_json::Value) -> Result<&str, ToolError> {
        let text = match arguments {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(map) => map
                .get("input")
                .or_else(|| map.get("query"))
                .and_then(|v| v.as_str()),
            _ => None,
        };
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(ToolError::InvalidArguments("Missing 'input' argument".into())),
        }
    }
}

#[async_trait]
impl Tool for QueryEngineTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "The question to answer"
                }
            },
            "required": ["input"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let input = Self::input(&arguments)?;
        debug!(tool = %self.name, input, "Querying engine");

        let answer = tokio::time::timeout(self.timeout, self.engine.query(input))
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: self.name.clone(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: answer,
        })
    }
}
