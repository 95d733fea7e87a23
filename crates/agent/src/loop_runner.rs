//! The function-calling agent loop used by zone agents and the compare sub-agent.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use zonewatch_core::engine::QueryEngine;
use zonewatch_core::error::AgentError;
use zonewatch_core::event::{DomainEvent, EventBus};
use zonewatch_core::message::{Conversation, Message};
use zonewatch_core::provider::{Provider, ProviderRequest};
use zonewatch_core::tool::{ToolCall, ToolRegistry};
use zonewatch_index::EngineSettings;

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// The result of one agent run.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    /// LLM calls made
    pub iterations: u32,
    /// Names of the tools invoked, in call order
    pub tool_calls: Vec<String>,
}

/// Orchestrates LLM calls and tool execution over a fixed tool set.
///
/// Every run starts from a fresh conversation: the system prompt and the
/// query. The loop ends when the model answers without tool calls.
pub struct AgentLoop {
    name: String,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
    tools: Arc<ToolRegistry>,
    max_iterations: u32,
    event_bus: Option<Arc<EventBus>>,
}

impl AgentLoop {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        system_prompt: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            system_prompt: system_prompt.into(),
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            event_bus: None,
        }
    }

    /// Take provider, model, temperature and max tokens from engine settings.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &EngineSettings,
        system_prompt: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let agent = Self::new(
            name,
            settings.provider.clone(),
            settings.chat_model.clone(),
            settings.temperature,
            system_prompt,
            tools,
        );
        match settings.max_tokens {
            Some(max) => agent.with_max_tokens(max),
            None => agent,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    /// Answer `query`, calling tools until the model replies with text only.
    pub async fn run(&self, query: &str) -> zonewatch_core::Result<AgentOutcome> {
        let mut conversation = Conversation::seeded(&self.system_prompt, query);
        let tool_definitions = self.tools.definitions();
        let mut tool_calls_made = Vec::new();

        for iteration in 1..=self.max_iterations {
            debug!(agent = %self.name, iteration, "Agent loop iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
                stop: vec![],
            };
            let response = self.provider.complete(request).await?;

            if response.message.tool_calls.is_empty() {
                let answer = response.message.content.trim().to_string();
                info!(
                    agent = %self.name,
                    iterations = iteration,
                    tool_calls = tool_calls_made.len(),
                    "Agent answered"
                );
                return Ok(AgentOutcome {
                    answer,
                    iterations: iteration,
                    tool_calls: tool_calls_made,
                });
            }

            let tool_calls = response.message.tool_calls.clone();
            conversation.push(response.message);

            for tc in &tool_calls {
                tool_calls_made.push(tc.name.clone());
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    // A non-JSON argument string is passed through as the input text
                    arguments: serde_json::from_str(&tc.arguments)
                        .unwrap_or_else(|_| serde_json::Value::String(tc.arguments.clone())),
                };

                let start = Instant::now();
                let result = self.tools.execute(&call).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                let (success, output) = match result {
                    Ok(tool_result) => (tool_result.success, tool_result.output),
                    Err(e) => {
                        warn!(agent = %self.name, tool = %tc.name, error = %e, "Tool execution failed");
                        (false, format!("Error: {e}"))
                    }
                };
                self.publish(DomainEvent::ToolExecuted {
                    tool_name: tc.name.clone(),
                    success,
                    duration_ms,
                    timestamp: chrono::Utc::now(),
                });
                conversation.push(Message::tool_result(&tc.id, output));
            }
        }

        warn!(agent = %self.name, limit = self.max_iterations, "Max iterations reached");
        Err(AgentError::MaxIterations {
            agent: self.name.clone(),
            limit: self.max_iterations,
        }
        .into())
    }
}

#[async_trait]
impl QueryEngine for AgentLoop {
    async fn query(&self, query: &str) -> zonewatch_core::Result<String> {
        Ok(self.run(query).await?.answer)
    }
}
