//! The top-level dispatch agent: a text ReAct loop over per-query tools.
//!
//! The model sees the tools the selector picked for this query and replies
//! with either an action or an answer:
//!
//! ```text
//! Thought: I need the north gate report.
//! Action: tool_north
//! Action Input: {"input": "How crowded is the north gate?"}
//! ```
//!
//! Tool output comes back as `Observation: ...` and the loop continues until
//! the model writes `Answer: ...` or the iteration cap is reached.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use zonewatch_core::error::AgentError;
use zonewatch_core::event::{DomainEvent, EventBus};
use zonewatch_core::message::Message;
use zonewatch_core::provider::ProviderRequest;
use zonewatch_core::tool::{ToolCall, ToolRegistry};
use zonewatch_index::EngineSettings;
use crate::loop_runner::DEFAULT_MAX_ITERATIONS;
use crate::parse::first_json_value;
use crate::selector::ToolProvider;

pub const DISPATCH_PROMPT: &str = "You are a zone safety expert. Use tools only.";

pub const NO_ZONES_ANSWER: &str =
    "No zones are available. Upload zone reports and initialize services first.";

const OBSERVATION_STOP: &str = "Observation:";

const FORMAT_REMINDER: &str = "Invalid format. Reply with 'Thought:', 'Action:' and 'Action Input:' \
     to use a tool, or with 'Thought:' and 'Answer:' to finish.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Thought,
    Action,
    Observation,
}

/// One line of the reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub kind: TraceKind,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub answer: String,
    /// Tools invoked, in call order
    pub tools: Vec<String>,
    /// Tools the selector offered for this query
    pub selected: Vec<String>,
    pub trace: Vec<TraceStep>,
    /// LLM calls made
    pub iterations: u32,
}

/// A parsed model reply.
#[derive(Debug, Clone, PartialEq)]
enum ReactStep {
    Action {
        thought: String,
        tool: String,
        input: serde_json::Value,
    },
    Answer {
        thought: String,
        answer: String,
    },
    Invalid,
}

pub struct DispatchAgent {
    settings: EngineSettings,
    tools: Arc<dyn ToolProvider>,
    max_iterations: u32,
    event_bus: Option<Arc<EventBus>>,
}

impl DispatchAgent {
    pub fn new(settings: EngineSettings, tools: Arc<dyn ToolProvider>) -> Self {
        Self {
            settings,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            event_bus: None,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Answer one user query.
    pub async fn run(&self, query: &str) -> zonewatch_core::Result<DispatchOutcome> {
        let selected = self.tools.tools_for(query).await?;
        if selected.is_empty() {
            info!("No zone tools available, answering without the model");
            return Ok(DispatchOutcome {
                answer: NO_ZONES_ANSWER.to_string(),
                tools: Vec::new(),
                selected: Vec::new(),
                trace: Vec::new(),
                iterations: 0,
            });
        }

        let registry = ToolRegistry::from_tools(selected);
        let selected_names: Vec<String> = registry.names().iter().map(|n| n.to_string()).collect();
        let mut messages = vec![
            Message::system(system_prompt(&registry)),
            Message::user(query),
        ];
        let mut trace = Vec::new();
        let mut tools_used = Vec::new();

        for iteration in 1..=self.max_iterations {
            let mut request = ProviderRequest::prompt(
                &self.settings.chat_model,
                self.settings.temperature,
                messages.clone(),
            );
            request.max_tokens = self.settings.max_tokens;
            request.stop = vec![OBSERVATION_STOP.to_string()];

            let response = self.settings.provider.complete(request).await?;
            let reply = strip_observation(&response.message.content);
            debug!(iteration, reply = %reply, "Dispatch step");

            let observation = match parse_reply(&reply) {
                ReactStep::Answer { thought, answer } => {
                    push_thought(&mut trace, thought);
                    info!(iterations = iteration, tool_calls = tools_used.len(), "Dispatch answered");
                    return Ok(DispatchOutcome {
                        answer,
                        tools: tools_used,
                        selected: selected_names,
                        trace,
                        iterations: iteration,
                    });
                }
                ReactStep::Action { thought, tool, input } => {
                    push_thought(&mut trace, thought);
                    trace.push(TraceStep {
                        kind: TraceKind::Action,
                        content: format!("{tool}({input})"),
                    });
                    tools_used.push(tool.clone());
                    self.execute(&registry, iteration, tool, input).await
                }
                ReactStep::Invalid => {
                    warn!(iteration, "Unparseable dispatch reply");
                    FORMAT_REMINDER.to_string()
                }
            };

            trace.push(TraceStep {
                kind: TraceKind::Observation,
                content: observation.clone(),
            });
            messages.push(Message::assistant(reply));
            messages.push(Message::user(format!("{OBSERVATION_STOP} {observation}")));
        }

        warn!(limit = self.max_iterations, "Dispatch reached max iterations");
        Err(AgentError::MaxIterations {
            agent: "dispatch".into(),
            limit: self.max_iterations,
        }
        .into())
    }

    async fn execute(
        &self,
        registry: &ToolRegistry,
        iteration: u32,
        tool: String,
        input: serde_json::Value,
    ) -> String {
        let call = ToolCall {
            id: format!("react_{iteration}"),
            name: tool,
            arguments: input,
        };
        let start = Instant::now();
        let result = registry.execute(&call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (success, output) = match result {
            Ok(r) => (r.success, r.output),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                (false, format!("Error: {e}"))
            }
        };
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ToolExecuted {
                tool_name: call.name,
                success,
                duration_ms,
                timestamp: chrono::Utc::now(),
            });
        }
        output
    }
}

fn system_prompt(registry: &ToolRegistry) -> String {
    let tool_lines: Vec<String> = registry
        .definitions()
        .iter()
        .map(|d| format!("> {}: {}", d.name, d.description))
        .collect();
    let names = registry.names().join(", ");
    format!(
        "{DISPATCH_PROMPT}\n\n\
         You have access to the following tools:\n\
         {tools}\n\n\
         To use a tool, reply in exactly this format:\n\
         Thought: what you need to find out next\n\
         Action: the tool name, one of [{names}]\n\
         Action Input: a JSON object such as {{\"input\": \"your question\"}}\n\n\
         You will then receive:\n\
         Observation: the tool output\n\n\
         Repeat as needed. When you can answer, reply in exactly this format:\n\
         Thought: I can answer without using any more tools.\n\
         Answer: your final answer",
        tools = tool_lines.join("\n"),
    )
}

fn push_thought(trace: &mut Vec<TraceStep>, thought: String) {
    if !thought.is_empty() {
        trace.push(TraceStep {
            kind: TraceKind::Thought,
            content: thought,
        });
    }
}

/// Drop anything from a hallucinated `Observation:` onward.
fn strip_observation(reply: &str) -> String {
    match marker_pos(reply, OBSERVATION_STOP) {
        Some(pos) => reply[..pos].trim().to_string(),
        None => reply.trim().to_string(),
    }
}

/// Byte offset of the first line that starts with `marker`.
fn marker_pos(text: &str, marker: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with(marker) {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

fn section<'a>(text: &'a str, marker: &str, end: Option<usize>) -> Option<&'a str> {
    let start = marker_pos(text, marker)? + marker.len();
    let end = end.filter(|e| *e >= start).unwrap_or(text.len());
    Some(text[start..end].trim())
}

fn parse_reply(reply: &str) -> ReactStep {
    let action = marker_pos(reply, "Action:");
    let answer = marker_pos(reply, "Answer:");
    let first_marker = [action, answer].into_iter().flatten().min();

    let thought = match marker_pos(reply, "Thought:") {
        Some(_) => section(reply, "Thought:", first_marker).unwrap_or_default(),
        None => first_marker.map(|p| reply[..p].trim()).unwrap_or_default(),
    }
    .to_string();

    match (action, answer) {
        (Some(a), b) if b.is_none_or(|b| a < b) => {
            let input_pos = marker_pos(reply, "Action Input:");
            let tool = section(reply, "Action:", input_pos)
                .and_then(|s| s.lines().next())
                .unwrap_or_default()
                .trim_matches(|c: char| c == '`' || c.is_whitespace())
                .to_string();
            if tool.is_empty() {
                return ReactStep::Invalid;
            }
            let input = section(reply, "Action Input:", None)
                .map(|raw| {
                    first_json_value(raw).unwrap_or_else(|| serde_json::Value::String(raw.to_string()))
                })
                .unwrap_or(serde_json::Value::Null);
            ReactStep::Action { thought, tool, input }
        }
        (_, Some(_)) => match section(reply, "Answer:", None) {
            Some(answer) if !answer.is_empty() => ReactStep::Answer {
                thought,
                answer: answer.to_string(),
            },
            _ => ReactStep::Invalid,
        },
        _ => ReactStep::Invalid,
    }
}
