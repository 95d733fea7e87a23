//! Shared settings and prompt plumbing for the zone query engines.

use std::sync::Arc;
use zonewatch_config::AppConfig;
use zonewatch_core::error::ProviderError;
use zonewatch_core::message::Message;
use zonewatch_core::provider::{Provider, ProviderRequest};

/// Model settings every query engine needs.
#[derive(Clone)]
pub struct EngineSettings {
    pub provider: Arc<dyn Provider>,
    pub chat_model: String,
    pub embed_model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub similarity_top_k: usize,
    pub summary_fanout: usize,
}

impl EngineSettings {
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self {
            provider,
            chat_model: config.default_model.clone(),
            embed_model: config.embedding_model.clone(),
            temperature: config.default_temperature,
            max_tokens: Some(config.default_max_tokens),
            similarity_top_k: config.index.similarity_top_k,
            summary_fanout: config.index.summary_fanout,
        }
    }

    /// One prompt in, one text answer out.
    pub async fn complete_text(&self, prompt: String) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::prompt(&self.chat_model, self.temperature, vec![Message::user(prompt)]);
        request.max_tokens = self.max_tokens;
        let response = self.provider.complete(request).await?;
        Ok(response.message.content.trim().to_string())
    }
}

pub(crate) fn qa_prompt(context: &str, query: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Using only the context above, answer the query.\n\
         Query: {query}\n\
         Answer: "
    )
}

pub(crate) fn combine_prompt(parts: &[String], query: &str) -> String {
    let context = parts.join("\n\n");
    format!(
        "Context information from multiple sources is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Using only the information from these sources, answer the query.\n\
         Query: {query}\n\
         Answer: "
    )
}
