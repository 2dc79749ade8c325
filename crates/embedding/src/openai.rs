use crate::{EmbeddingError, EmbeddingProvider};
use async_trait::async_trait;
use core_types::Vector;
use core_types::config::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_BATCH_SIZE: usize = 512;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for an OpenAI-compatible `POST {base_url}/embeddings` endpoint.
///
/// Large batches are split into `batch_size` requests sent one after
/// another; the first failing request fails the whole batch.
#[derive(Clone)]
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    batch_size: usize,
}

impl std::fmt::Debug for OpenAiEmbeddings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: impl Into<String>) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn from_config(cfg: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = cfg.api_key.clone().ok_or(EmbeddingError::NotConfigured)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key,
            batch_size: cfg.batch_size.max(1),
        })
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vector>, EmbeddingError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let message = api_error_message(&text);
            warn!(status = status.as_u16(), %message, "embedding request rejected");
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbeddingResponse =
            serde_json::from_str(&text).map_err(|e| EmbeddingError::Decode(e.to_string()))?;
        order_embeddings(parsed, inputs.len())
    }
}

/// Prefer the structured `error.message`; fall back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Put response rows back into input order and check that every input got
/// exactly one vector.
fn order_embeddings(
    resp: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vector>, EmbeddingError> {
    let mut data = resp.data;
    if data.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            got: data.len(),
        });
    }
    data.sort_by_key(|d| d.index);
    if let Some((pos, bad)) = data.iter().enumerate().find(|(pos, d)| d.index != *pos) {
        return Err(EmbeddingError::Decode(format!(
            "response index {} where {pos} was expected",
            bad.index
        )));
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, text: &str) -> Result<Vector, EmbeddingError> {
        let mut out = self.request(&[text.to_string()]).await?;
        out.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            debug!(model = %self.model, inputs = chunk.len(), "requesting embeddings");
            out.extend(self.request(chunk).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datum(index: usize, v: f32) -> EmbeddingDatum {
        EmbeddingDatum {
            index,
            embedding: vec![v],
        }
    }

    #[test]
    fn rows_are_reordered_by_index() {
        let resp = EmbeddingResponse {
            data: vec![datum(2, 2.0), datum(0, 0.0), datum(1, 1.0)],
        };
        let out = order_embeddings(resp, 3).unwrap();
        assert_eq!(out, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn short_response_is_count_mismatch() {
        let resp = EmbeddingResponse {
            data: vec![datum(0, 0.0)],
        };
        assert!(matches!(
            order_embeddings(resp, 2),
            Err(EmbeddingError::CountMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn duplicate_index_is_decode_error() {
        let resp = EmbeddingResponse {
            data: vec![datum(0, 0.0), datum(0, 1.0)],
        };
        assert!(matches!(
            order_embeddings(resp, 2),
            Err(EmbeddingError::Decode(_))
        ));
    }

    #[test]
    fn response_json_parses() {
        let raw = r#"{
            "object": "list",
            "data": [
                {"object": "embedding", "index": 1, "embedding": [0.5, -0.5]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
            ],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        }"#;
        let parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        let out = order_embeddings(parsed, 2).unwrap();
        assert_eq!(out[0], vec![1.0, 0.0]);
        assert_eq!(out[1], vec![0.5, -0.5]);
    }

    #[test]
    fn request_body_shape() {
        let input = vec!["hello".to_string(), "world".to_string()];
        let body = EmbeddingRequest {
            model: "m",
            input: &input,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"model":"m","input":["hello","world"]}"#
        );
    }

    #[test]
    fn api_error_message_prefers_structured_body() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Incorrect API key provided");
        assert_eq!(api_error_message(" upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAiEmbeddings::new("sk-test")
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/embeddings");
    }

    #[test]
    fn from_config_copies_settings() {
        let cfg = EmbeddingConfig {
            api_key: Some("sk-test".into()),
            model: "text-embedding-3-large".into(),
            batch_size: 0,
            ..EmbeddingConfig::default()
        };
        let client = OpenAiEmbeddings::from_config(&cfg).unwrap();
        assert_eq!(client.model(), "text-embedding-3-large");
        assert_eq!(client.batch_size, 1);
    }

    #[test]
    fn builders_override_defaults() {
        let client = OpenAiEmbeddings::new("sk-test")
            .unwrap()
            .with_model("text-embedding-ada-002")
            .with_batch_size(0);
        assert_eq!(client.model(), "text-embedding-ada-002");
        assert_eq!(client.batch_size, 1);

        let client = client.with_batch_size(16);
        assert_eq!(client.batch_size, 16);
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        // Unroutable base URL: any request would fail.
        let client = OpenAiEmbeddings::new("sk-test")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(client.embed_batch(&[]).await.unwrap().is_empty());
    }
}
