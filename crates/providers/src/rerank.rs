//! Rerank clients.
//!
//! `CohereReranker` calls Cohere's `v2/rerank` endpoint. `PassthroughReranker`
//! keeps the candidates in their incoming (similarity) order and is used when
//! reranking is disabled.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use zonewatch_core::error::ProviderError;
use zonewatch_core::rerank::{RerankHit, Reranker};
use crate::openai_compat::{check_status, map_send_error};

pub const COHERE_API_URL: &str = "https://api.cohere.com/v2";

pub struct CohereReranker {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl CohereReranker {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: COHERE_API_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Reranker for CohereReranker {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, ProviderError> {
        if documents.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "query": query,
            "documents": documents,
            "top_n": top_n.min(documents.len()),
        });

        debug!(model = %self.model, candidates = documents.len(), top_n, "Sending rerank request");

        let response = self
            .client
            .post(format!("{}/rerank", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response).await?;

        let parsed: RerankApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse rerank response: {e}")))?;

        validate_hits(parsed.results, documents.len(), top_n)
    }
}

/// Drop nothing silently: an out-of-range index means the response is unusable.
fn validate_hits(
    results: Vec<RerankApiResult>,
    candidates: usize,
    top_n: usize,
) -> Result<Vec<RerankHit>, ProviderError> {
    let mut hits = Vec::with_capacity(results.len());
    for r in results {
        if r.index >= candidates {
            return Err(ProviderError::MalformedResponse(format!(
                "rerank index {} out of range for {candidates} documents",
                r.index
            )));
        }
        if hits.iter().any(|h: &RerankHit| h.index == r.index) {
            continue;
        }
        hits.push(RerankHit {
            index: r.index,
            relevance_score: r.relevance_score,
        });
    }
    hits.truncate(top_n);
    Ok(hits)
}

#[derive(Debug, Deserialize)]
struct RerankApiResponse {
    results: Vec<RerankApiResult>,
}

#[derive(Debug, Deserialize)]
struct RerankApiResult {
    index: usize,
    relevance_score: f32,
}

/// Keeps the first `top_n` candidates in order.
pub struct PassthroughReranker;

#[async_trait]
impl Reranker for PassthroughReranker {
    fn name(&self) -> &str {
        "none"
    }

    async fn rerank(
        &self,
        _query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, ProviderError> {
        Ok((0..documents.len().min(top_n))
            .map(|index| RerankHit {
                index,
                relevance_score: 1.0 / (index as f32 + 1.0),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cohere_response() {
        let data = r#"{
            "id": "abc",
            "results": [
                {"index": 2, "relevance_score": 0.91},
                {"index": 0, "relevance_score": 0.42}
            ],
            "meta": {"api_version": {"version": "2"}}
        }"#;
        let parsed: RerankApiResponse = serde_json::from_str(data).unwrap();
        let hits = validate_hits(parsed.results, 3, 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 2);
        assert!(hits[0].relevance_score > hits[1].relevance_score);
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let results = vec![RerankApiResult { index: 7, relevance_score: 0.5 }];
        assert!(matches!(
            validate_hits(results, 3, 2),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn hits_are_truncated_and_deduplicated() {
        let results = vec![
            RerankApiResult { index: 1, relevance_score: 0.9 },
            RerankApiResult { index: 1, relevance_score: 0.8 },
            RerankApiResult { index: 0, relevance_score: 0.7 },
            RerankApiResult { index: 2, relevance_score: 0.6 },
        ];
        let hits = validate_hits(results, 3, 2).unwrap();
        assert_eq!(hits.iter().map(|h| h.index).collect::<Vec<_>>(), vec![1, 0]);
    }

    #[tokio::test]
    async fn passthrough_keeps_order() {
        let docs: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let hits = PassthroughReranker.rerank("q", &docs, 2).await.unwrap();
        assert_eq!(hits.iter().map(|h| h.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[tokio::test]
    async fn cohere_with_no_documents_skips_network() {
        let reranker = CohereReranker::new("k", "rerank-v3.5", Duration::from_millis(50))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let hits = reranker.rerank("q", &[], 5).await.unwrap();
        assert!(hits.is_empty());
    }
}
