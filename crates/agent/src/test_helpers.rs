//! Shared test helpers for agent tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use zonewatch_core::engine::QueryEngine;
use zonewatch_core::error::ProviderError;
use zonewatch_core::message::{Message, MessageToolCall};
use zonewatch_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};
use zonewatch_index::EngineSettings;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses provided.
/// Embeddings are keyword counts over `vocabulary`.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
    embed_inputs: Mutex<Vec<String>>,
    vocabulary: Vec<String>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            embed_inputs: Mutex::new(Vec::new()),
            vocabulary: Vec::new(),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    pub fn with_vocabulary(mut self, words: &[&str]) -> Self {
        self.vocabulary = words.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn embed_count(&self) -> usize {
        self.embed_inputs.lock().unwrap().len()
    }
}

pub fn keyword_embedding(vocabulary: &[String], text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut v: Vec<f32> = vocabulary
        .iter()
        .map(|w| lower.matches(w.as_str()).count() as f32)
        .collect();
    // Keeps the vector non-zero so cosine stays defined.
    v.push(0.01);
    v
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let n = requests.len();
        if n >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                n,
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[n].clone())
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.embed_inputs.lock().unwrap().extend(request.inputs.iter().cloned());
        Ok(EmbeddingResponse {
            embeddings: request
                .inputs
                .iter()
                .map(|t| keyword_embedding(&self.vocabulary, t))
                .collect(),
            model: request.model,
            usage: None,
        })
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: None,
        model: "mock-model".into(),
    }
}

pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut msg = Message::assistant(thought);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: None,
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

pub fn settings(provider: Arc<dyn Provider>) -> EngineSettings {
    EngineSettings {
        provider,
        chat_model: "mock-model".into(),
        embed_model: "mock-embed".into(),
        temperature: 0.0,
        max_tokens: None,
        similarity_top_k: 2,
        summary_fanout: 4,
    }
}

/// A query engine that answers with a fixed prefix and remembers its inputs.
pub struct RecordingEngine {
    prefix: String,
    pub queries: Mutex<Vec<String>>,
}

impl RecordingEngine {
    pub fn new(prefix: &str) -> Arc<Self> {
        Arc::new(Self {
            prefix: prefix.to_string(),
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl QueryEngine for RecordingEngine {
    async fn query(&self, query: &str) -> zonewatch_core::Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(format!("{}: {}", self.prefix, query))
    }
}
