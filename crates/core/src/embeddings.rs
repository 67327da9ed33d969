use crate::error::BackendError;
use crate::traits::{EmbedInputType, TextEmbedder};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1_024;

/// Embedding client for a Pinecone-style inference endpoint
/// (`POST {base}/embed`).
pub struct PineconeEmbedder {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl PineconeEmbedder {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, BackendError> {
        let endpoint = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };

        Ok(Self {
            client: Client::new(),
            endpoint: Url::parse(&endpoint)?,
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        })
    }
}

#[async_trait]
impl TextEmbedder for PineconeEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(
        &self,
        inputs: &[String],
        input_type: EmbedInputType,
    ) -> Result<Vec<Vec<f32>>, BackendError> {
        let url = self.endpoint.join("embed")?;
        let body = json!({
            "model": self.model,
            "parameters": {
                "input_type": input_type.as_str(),
                "truncate": "END",
            },
            "inputs": inputs
                .iter()
                .map(|text| json!({ "text": text }))
                .collect::<Vec<_>>(),
        });

        let response = self
            .client
            .post(url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "pinecone-inference".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        let data = parsed
            .pointer("/data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if data.len() != inputs.len() {
            return Err(BackendError::BackendResponse {
                backend: "pinecone-inference".to_string(),
                details: format!("expected {} embeddings, got {}", inputs.len(), data.len()),
            });
        }

        let mut vectors = Vec::with_capacity(data.len());
        for item in data {
            let values = item
                .pointer("/values")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(Value::as_f64)
                        .map(|value| value as f32)
                        .collect::<Vec<f32>>()
                })
                .unwrap_or_default();

            if values.len() != self.dimensions {
                return Err(BackendError::BackendResponse {
                    backend: "pinecone-inference".to_string(),
                    details: format!("embedding dimension {} != {}", values.len(), self.dimensions),
                });
            }

            vectors.push(values);
        }

        Ok(vectors)
    }
}

/// Deterministic local embedder: FNV-hashed character trigrams bucketed into
/// a fixed-length, L2-normalized vector. Not a semantic model; used by tests
/// and offline runs where the inference endpoint is unavailable.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    pub dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

impl HashEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl TextEmbedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(
        &self,
        inputs: &[String],
        _input_type: EmbedInputType,
    ) -> Result<Vec<Vec<f32>>, BackendError> {
        Ok(inputs.iter().map(|text| self.embed_one(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{HashEmbedder, TextEmbedder};
    use crate::traits::EmbedInputType;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::default();
        let inputs = vec!["Quarterly revenue and churn".to_string()];
        let first = embedder.embed(&inputs, EmbedInputType::Passage).await.unwrap();
        let second = embedder.embed(&inputs, EmbedInputType::Passage).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn hash_embedder_preserves_order_and_length() {
        let embedder = HashEmbedder { dimensions: 32 };
        let inputs = vec!["abc".to_string(), "def".to_string(), "".to_string()];
        let vectors = embedder.embed(&inputs, EmbedInputType::Query).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|vector| vector.len() == 32));
    }
}
