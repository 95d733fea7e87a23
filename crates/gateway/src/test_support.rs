//! Shared fixtures for gateway tests.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use zonewatch_config::AppConfig;
use zonewatch_core::error::ProviderError;
use zonewatch_core::event::EventBus;
use zonewatch_core::message::Message;
use zonewatch_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};
use zonewatch_providers::PassthroughReranker;
use crate::api_v1::{ApiV1State, SharedApiState};

/// Answers completions from a script, in order. Embeds by text length.
pub struct ScriptedProvider {
    replies: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Arc<Self> {
        let mut replies: Vec<String> = replies.into_iter().map(String::from).collect();
        replies.reverse();
        Arc::new(Self {
            replies: Mutex::new(replies),
        })
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedProvider: no more replies");
        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: None,
            model: request.model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| vec![t.len() as f32, 1.0]).collect(),
            model: request.model,
            usage: None,
        })
    }
}

pub fn test_state(root: &Path, provider: Arc<ScriptedProvider>) -> SharedApiState {
    let mut config = AppConfig::default();
    config.paths.data_dir = root.join("DATAN");
    config.paths.storage_dir = root.join("storage");
    config.paths.summary_dir = root.join("summaries");
    Arc::new(ApiV1State::new(
        config,
        provider,
        Arc::new(PassthroughReranker),
        Arc::new(EventBus::default()),
    ))
}
