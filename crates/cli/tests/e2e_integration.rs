//! End-to-end tests for the ZoneWatch pipeline.
//!
//! Zone reports on disk → indexes and summaries → zone agents → tool
//! selection → dispatch agent → chat session and HTTP API, all against a
//! mock provider that answers by reading the prompts it receives.

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use zonewatch_agent::{initialize, COMPARE_AGENT_PROMPT, DISPATCH_PROMPT, NO_ZONES_ANSWER};
use zonewatch_config::AppConfig;
use zonewatch_core::error::ProviderError;
use zonewatch_core::event::EventBus;
use zonewatch_core::history::Sender;
use zonewatch_core::message::{Message, MessageToolCall, Role};
use zonewatch_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};
use zonewatch_gateway::{ApiV1State, ChatSession, build_router};
use zonewatch_index::SUMMARY_PROMPT;
use zonewatch_providers::PassthroughReranker;
use zonewatch_tools::COMPARE_TOOL_NAME;

const NORTH_REPORT: &str = "North gate report. The north gate has heavy crowd density near the food court. \
About 1200 people are queuing at the turnstiles. Movement is slow and stop-and-go.";

const SOUTH_REPORT: &str = "South stage report. The south stage has light crowd density. \
About 150 people are watching the sound check. Movement is smooth.";

const CALM_NORTH: &str = "Zone North: low density, calm crowd, ~50 people.";

const AGITATED_SOUTH: &str = "Zone South: high density, agitated movement, ~400 people.";

const VOCABULARY: [&str; 6] = ["north", "south", "gate", "stage", "crowd", "compare"];

// ── Mock Provider ────────────────────────────────────────────────────────

/// A provider that plays every role in the pipeline by inspecting prompts:
/// summarizer, retrieval QA, zone agent, compare agent and dispatcher.
#[derive(Default)]
struct ZoneWorld {
    completions: Mutex<usize>,
    embedded: Mutex<Vec<String>>,
}

impl ZoneWorld {
    fn completions(&self) -> usize {
        *self.completions.lock().unwrap()
    }

    fn embedded(&self) -> usize {
        self.embedded.lock().unwrap().len()
    }

    fn reply(&self, request: &ProviderRequest) -> Message {
        let system = request
            .messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let query = request
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        if system.starts_with(DISPATCH_PROMPT) {
            return Message::assistant(dispatch_step(&request.messages, &query));
        }
        if system.starts_with(COMPARE_AGENT_PROMPT) {
            return agent_step(&request.messages, "Comparison", &["tool_north", "tool_south"], &query);
        }
        if let Some(zone) = system
            .strip_prefix("You are specialized for ")
            .and_then(|rest| rest.split_whitespace().next())
        {
            let vector = format!("vector_{zone}");
            return agent_step(&request.messages, &format!("Zone {zone}"), &[&vector], &query);
        }
        Message::assistant(answer_prompt(&query))
    }
}

#[async_trait::async_trait]
impl Provider for ZoneWorld {
    fn name(&self) -> &str {
        "zone_world"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.completions.lock().unwrap() += 1;
        Ok(ProviderResponse {
            message: self.reply(&request),
            usage: None,
            model: request.model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.embedded.lock().unwrap().extend(request.inputs.iter().cloned());
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| keywords(t)).collect(),
            model: request.model,
            usage: None,
        })
    }
}

fn keywords(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).collect();
    VOCABULARY
        .iter()
        .map(|v| words.iter().filter(|w| *w == v).count() as f32 + 0.01)
        .collect()
}

/// The context block of a summary or retrieval prompt.
fn context_of(prompt: &str) -> Option<&str> {
    let (_, rest) = prompt.split_once("---------------------\n")?;
    let (context, _) = rest.split_once("\n---------------------")?;
    Some(context.trim())
}

/// Summaries and retrieval answers, chosen by which report is in context.
/// Only the north report and its summary mention the food court. One-line
/// `Zone X:` reports are echoed back as-is.
fn answer_prompt(prompt: &str) -> String {
    if let Some(context) = context_of(prompt).filter(|c| c.starts_with("Zone ")) {
        return context.to_string();
    }
    let north = prompt.contains("food court");
    if prompt.contains(SUMMARY_PROMPT) {
        if north {
            "North gate: heavy crowd near the food court, about 1200 people.".into()
        } else {
            "South stage: light crowd, about 150 people, smooth movement.".into()
        }
    } else if north {
        "About 1200 people at the north gate; movement is slow.".into()
    } else {
        "About 150 people at the south stage; movement is smooth.".into()
    }
}

/// Function-calling agents: call `tools` once, then answer from the results.
fn agent_step(messages: &[Message], label: &str, tools: &[&str], query: &str) -> Message {
    let results: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect();
    if !results.is_empty() {
        return Message::assistant(format!("{label}: {}", results.join(" | ")));
    }
    let mut message = Message::assistant("");
    message.tool_calls = tools
        .iter()
        .map(|name| MessageToolCall {
            id: format!("call_{name}"),
            name: name.to_string(),
            arguments: serde_json::json!({ "input": query }).to_string(),
        })
        .collect();
    message
}

/// Text ReAct: one action chosen from the question, then answer with the observation.
fn dispatch_step(messages: &[Message], query: &str) -> String {
    if let Some(observation) = messages
        .iter()
        .rev()
        .find_map(|m| m.content.strip_prefix("Observation:"))
    {
        let observation = observation.trim();
        if query.contains("dangerous") {
            let riskier = ["North", "South"]
                .into_iter()
                .find(|zone| observation.contains(&format!("Zone {zone}: high density")))
                .unwrap_or("Neither");
            return format!("Thought: I can answer now.\nAnswer: {riskier} is the higher-risk zone. {observation}");
        }
        return format!("Thought: I can answer now.\nAnswer: {observation}");
    }
    let lower = query.to_lowercase();
    let tool = if lower.contains("compare") || lower.contains("which zone") {
        COMPARE_TOOL_NAME
    } else if lower.contains("north") {
        "tool_north"
    } else {
        "tool_south"
    };
    format!("Thought: I should ask {tool}.\nAction: {tool}\nAction Input: {{\"input\": \"{query}\"}}")
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn config_in(root: &Path, top_k: usize, top_n: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.data_dir = root.join("DATAN");
    config.paths.storage_dir = root.join("storage");
    config.paths.summary_dir = root.join("summaries");
    config.rerank.provider = "none".into();
    config.retrieval.top_k = top_k;
    config.retrieval.top_n = top_n;
    config
}

fn write_reports(config: &AppConfig) {
    std::fs::create_dir_all(&config.paths.data_dir).unwrap();
    std::fs::write(config.paths.data_dir.join("north.txt"), NORTH_REPORT).unwrap();
    std::fs::write(config.paths.data_dir.join("south.txt"), SOUTH_REPORT).unwrap();
}

// ── E2E: Build + Dispatch ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_north_question_routes_to_north_zone() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 2);
    write_reports(&config);
    let provider = Arc::new(ZoneWorld::default());

    let services = initialize(&config, provider.clone(), Arc::new(PassthroughReranker), None)
        .await
        .unwrap();
    let zones: Vec<&str> = services.report.zones.iter().map(|z| z.zone_id.as_str()).collect();
    assert_eq!(zones, vec!["north", "south"]);
    assert!(services.report.failures.is_empty());
    assert!(services.report.zones[0].summary.contains("1200"));

    let outcome = services.dispatcher.run("How crowded is the north gate?").await.unwrap();
    assert!(outcome.answer.contains("1200"), "answer: {}", outcome.answer);
    assert!(outcome.answer.starts_with("Zone north:"));
    assert_eq!(outcome.tools, vec!["tool_north"]);

    // Best match first, compare tool appended exactly once at the end
    assert_eq!(outcome.selected.first().map(String::as_str), Some("tool_north"));
    assert_eq!(outcome.selected.last().map(String::as_str), Some(COMPARE_TOOL_NAME));
    assert_eq!(outcome.selected.iter().filter(|t| *t == COMPARE_TOOL_NAME).count(), 1);
    assert_eq!(outcome.iterations, 2);
}

#[tokio::test]
async fn e2e_compare_question_consults_both_zones() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 2);
    write_reports(&config);
    let provider = Arc::new(ZoneWorld::default());

    let services = initialize(&config, provider, Arc::new(PassthroughReranker), None)
        .await
        .unwrap();
    let outcome = services
        .dispatcher
        .run("Compare the north gate and the south stage")
        .await
        .unwrap();

    assert_eq!(outcome.tools, vec![COMPARE_TOOL_NAME]);
    assert!(outcome.answer.starts_with("Comparison:"), "answer: {}", outcome.answer);
    assert!(outcome.answer.contains("1200"));
    assert!(outcome.answer.contains("150"));
}

#[tokio::test]
async fn e2e_selection_is_bounded_by_top_n() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 1);
    write_reports(&config);
    let provider = Arc::new(ZoneWorld::default());

    let services = initialize(&config, provider, Arc::new(PassthroughReranker), None)
        .await
        .unwrap();
    let outcome = services.dispatcher.run("Is the south stage calm?").await.unwrap();

    // A single survivor gets no compare tool
    assert_eq!(outcome.selected, vec!["tool_south"]);
    assert!(outcome.answer.contains("150"));
}

#[tokio::test]
async fn e2e_second_initialize_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 2);
    write_reports(&config);
    let provider = Arc::new(ZoneWorld::default());

    let first = initialize(&config, provider.clone(), Arc::new(PassthroughReranker), None)
        .await
        .unwrap();
    assert!(first.report.zones.iter().all(|z| z.cache == ["miss", "miss", "miss"]));
    assert!(dir.path().join("storage/north/vector_index/docstore.json").exists());
    assert!(dir.path().join("summaries/north.json").exists());

    let completions = provider.completions();
    let embedded = provider.embedded();

    let second = initialize(&config, provider.clone(), Arc::new(PassthroughReranker), None)
        .await
        .unwrap();
    assert!(second.report.zones.iter().all(|z| z.cache == ["hit", "hit", "hit"]));
    assert_eq!(provider.completions(), completions, "no LLM calls on a cache hit");
    // Only the two zone tool descriptions are embedded again
    assert_eq!(provider.embedded(), embedded + 2);

    let first_summaries: Vec<&str> = first.report.zones.iter().map(|z| z.summary.as_str()).collect();
    let second_summaries: Vec<&str> = second.report.zones.iter().map(|z| z.summary.as_str()).collect();
    assert_eq!(first_summaries, second_summaries);
}

#[tokio::test]
async fn e2e_changed_report_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 2);
    write_reports(&config);
    let provider = Arc::new(ZoneWorld::default());

    initialize(&config, provider.clone(), Arc::new(PassthroughReranker), None)
        .await
        .unwrap();
    std::fs::write(
        config.paths.data_dir.join("south.txt"),
        format!("{SOUTH_REPORT} A second band starts at nine."),
    )
    .unwrap();

    let services = initialize(&config, provider, Arc::new(PassthroughReranker), None)
        .await
        .unwrap();
    let cache: Vec<[String; 3]> = services.report.zones.iter().map(|z| z.cache.clone()).collect();
    assert_eq!(cache[0], ["hit", "hit", "hit"]);
    assert_eq!(cache[1], ["stale", "stale", "stale"]);
}

#[tokio::test]
async fn e2e_zero_documents_answers_without_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 2);
    let provider = Arc::new(ZoneWorld::default());

    let services = initialize(&config, provider.clone(), Arc::new(PassthroughReranker), None)
        .await
        .unwrap();
    assert!(services.report.zones.is_empty());
    assert!(config.paths.storage_dir.is_dir());
    assert!(config.paths.summary_dir.is_dir());

    let outcome = services.dispatcher.run("Anything happening?").await.unwrap();
    assert_eq!(outcome.answer, NO_ZONES_ANSWER);
    assert_eq!(outcome.iterations, 0);
    assert_eq!(provider.completions(), 0);
    assert_eq!(provider.embedded(), 0);
}

// ── E2E: Chat Shell ──────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_session_history_is_append_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 2);
    write_reports(&config);
    let services = initialize(&config, Arc::new(ZoneWorld::default()), Arc::new(PassthroughReranker), None)
        .await
        .unwrap();

    let mut session = ChatSession::new("e2e");
    session.ask(&services.dispatcher, "How crowded is the north gate?").await.unwrap();
    let after_first = session.history().entries().to_vec();
    session.ask(&services.dispatcher, "And the south stage?").await.unwrap();

    let entries = session.history().entries();
    let senders: Vec<Sender> = entries.iter().map(|e| e.sender).collect();
    assert_eq!(
        senders,
        vec![Sender::User, Sender::DispatchAgent, Sender::User, Sender::DispatchAgent]
    );
    for (before, now) in after_first.iter().zip(entries) {
        assert_eq!(before.message, now.message);
        assert_eq!(before.timestamp, now.timestamp);
    }
    assert!(entries[3].message.contains("150"));
    assert!(entries.iter().all(|e| !e.is_error));
}

#[tokio::test]
async fn e2e_http_initialize_then_chat() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 2);
    write_reports(&config);
    let state = Arc::new(ApiV1State::new(
        config,
        Arc::new(ZoneWorld::default()),
        Arc::new(PassthroughReranker),
        Arc::new(EventBus::default()),
    ));

    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/initialize")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["zones"].as_array().unwrap().len(), 2);

    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat")
                .header("content-type", "application/json")
                .header("x-session-id", "gate-team")
                .body(Body::from(r#"{"message": "How crowded is the north gate?"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let chat: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(chat["answer"].as_str().unwrap().contains("1200"));
    assert_eq!(chat["tools"][0], "tool_north");

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .uri("/v1/history")
                .header("x-session-id", "gate-team")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let history: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(history["session_id"], "gate-team");
    assert_eq!(history["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn e2e_uploaded_zones_name_the_riskier_one() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), 2, 2);
    let provider = Arc::new(ZoneWorld::default());
    let state = Arc::new(ApiV1State::new(
        config,
        provider,
        Arc::new(PassthroughReranker),
        Arc::new(EventBus::default()),
    ));

    let boundary = "zonewatch-e2e";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"north.txt\"\r\n\r\n{CALM_NORTH}\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"south.txt\"\r\n\r\n{AGITATED_SOUTH}\r\n\
         --{boundary}--\r\n"
    );
    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/upload")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/initialize")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let services = state.services.read().await.clone().unwrap();
    let summaries: Vec<&str> = services.report.zones.iter().map(|z| z.summary.as_str()).collect();
    assert_eq!(summaries, vec![CALM_NORTH, AGITATED_SOUTH]);

    let outcome = services.dispatcher.run("Which zone is more dangerous?").await.unwrap();
    assert_eq!(outcome.selected.len(), 3);
    assert!(outcome.selected.contains(&"tool_north".to_string()));
    assert!(outcome.selected.contains(&"tool_south".to_string()));
    assert_eq!(outcome.selected[2], COMPARE_TOOL_NAME);
    assert_eq!(outcome.tools, vec![COMPARE_TOOL_NAME]);
    assert!(outcome.answer.starts_with("South is the higher-risk zone."), "answer: {}", outcome.answer);
    assert!(outcome.answer.contains("~400 people"));
    assert!(outcome.answer.contains("~50 people"));
}
