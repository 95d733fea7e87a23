//! Shared test helpers for index tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use zonewatch_core::error::ProviderError;
use zonewatch_core::message::Message;
use zonewatch_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};

/// Answers every completion with the same text and embeds by letter counts.
/// Counts calls so tests can assert on cache behavior.
pub struct CountingProvider {
    answer: String,
    embeds: AtomicUsize,
    completes: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl CountingProvider {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            embeds: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn embed_calls(&self) -> usize {
        self.embeds.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.completes.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

fn letter_histogram(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; 26];
    for c in text.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
        v[(c - b'a') as usize] += 1.0;
    }
    v
}

#[async_trait::async_trait]
impl Provider for CountingProvider {
    fn name(&self) -> &str {
        "counting_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.completes.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = request.messages.last().map(|m| m.content.clone());
        Ok(ProviderResponse {
            message: Message::assistant(&self.answer),
            usage: None,
            model: request.model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.embeds.fetch_add(1, Ordering::SeqCst);
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| letter_histogram(t)).collect(),
            model: request.model,
            usage: None,
        })
    }
}
