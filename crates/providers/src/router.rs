//! Provider construction from configuration.
//!
//! Picks the LLM/embedding provider and the reranker the config asks for,
//! checking credentials before anything is built.

use std::sync::Arc;
use std::time::Duration;
use zonewatch_config::{known_provider_url, AppConfig, ConfigError};
use zonewatch_core::provider::Provider;
use zonewatch_core::rerank::Reranker;
use crate::openai_compat::OpenAiCompatProvider;
use crate::rerank::{CohereReranker, PassthroughReranker};

/// Build the chat/embedding provider.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let api_key = config.require_api_key()?;
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let base_url = match &config.api_url {
        Some(url) => url.clone(),
        None => known_provider_url(&config.default_provider)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "unknown default_provider '{}' and no api_url set",
                    config.default_provider
                ))
            })?
            .to_string(),
    };

    let provider = OpenAiCompatProvider::new(&config.default_provider, base_url, api_key, timeout)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    tracing::debug!(
        provider = %config.default_provider,
        base_url = %provider.base_url(),
        "Built provider"
    );
    Ok(Arc::new(provider))
}

/// Build the reranker: Cohere, or a passthrough when `rerank.provider = "none"`.
pub fn build_reranker(config: &AppConfig) -> Result<Arc<dyn Reranker>, ConfigError> {
    let Some(api_key) = config.require_rerank_key()? else {
        return Ok(Arc::new(PassthroughReranker));
    };

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut reranker = CohereReranker::new(api_key, &config.rerank.model, timeout)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    if let Some(url) = &config.rerank.api_url {
        reranker = reranker.with_base_url(url);
    }
    Ok(Arc::new(reranker))
}
