use crate::error::BackendError;
use crate::models::{ChunkMatch, VectorRecord};
use crate::traits::VectorStore;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use url::Url;

const SERVERLESS_CLOUD: &str = "aws";
const SERVERLESS_REGION: &str = "us-east-1";

/// Pinecone-backed vector index. Index management goes through the control
/// plane; upserts and queries go to the per-index data host, which is
/// discovered from the index description and cached for the lifetime of the
/// store.
pub struct PineconeStore {
    client: Client,
    control_url: Url,
    api_key: String,
    index_name: String,
    dimension: usize,
    data_url: OnceCell<Url>,
}

impl PineconeStore {
    pub fn new(
        control_url: &str,
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        dimension: usize,
    ) -> Result<Self, BackendError> {
        let control_url = if control_url.ends_with('/') {
            control_url.to_string()
        } else {
            format!("{control_url}/")
        };

        Ok(Self {
            client: Client::new(),
            control_url: Url::parse(&control_url)?,
            api_key: api_key.into(),
            index_name: index_name.into(),
            dimension,
            data_url: OnceCell::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn index_url(&self) -> Result<Url, BackendError> {
        Ok(self.control_url.join(&format!("indexes/{}", self.index_name))?)
    }

    async fn describe(&self) -> Result<Value, BackendError> {
        let response = self
            .client
            .get(self.index_url()?)
            .header("Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(response.json().await?)
    }

    async fn data_url(&self) -> Result<&Url, BackendError> {
        self.data_url
            .get_or_try_init(|| async {
                let description = self.describe().await?;
                let host = description
                    .pointer("/host")
                    .and_then(Value::as_str)
                    .filter(|host| !host.is_empty())
                    .ok_or_else(|| {
                        BackendError::NotReady(format!(
                            "index {} has no data host yet",
                            self.index_name
                        ))
                    })?;

                Ok(Url::parse(&format!("https://{host}/"))?)
            })
            .await
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn index_exists(&self) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(self.index_url()?)
            .header("Api-Key", &self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: status.to_string(),
            }),
        }
    }

    async fn create_index(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.control_url.join("indexes")?)
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "name": self.index_name,
                "dimension": self.dimension,
                "metric": "cosine",
                "spec": {
                    "serverless": {
                        "cloud": SERVERLESS_CLOUD,
                        "region": SERVERLESS_REGION,
                    }
                }
            }))
            .send()
            .await?;

        // A concurrent creator winning the race is not a failure.
        if response.status() == StatusCode::CONFLICT || response.status().is_success() {
            return Ok(());
        }

        Err(BackendError::BackendResponse {
            backend: "pinecone".to_string(),
            details: response.status().to_string(),
        })
    }

    async fn index_ready(&self) -> Result<bool, BackendError> {
        let description = self.describe().await?;
        Ok(description
            .pointer("/status/ready")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<(), BackendError> {
        if records.is_empty() {
            return Ok(());
        }

        let vectors = records
            .iter()
            .map(|record| {
                if record.values.len() != self.dimension {
                    return Err(BackendError::BackendResponse {
                        backend: "pinecone".to_string(),
                        details: format!(
                            "embedding dimension {} != {}",
                            record.values.len(),
                            self.dimension
                        ),
                    });
                }

                Ok(json!({
                    "id": record.id,
                    "values": record.values,
                    "metadata": serde_json::to_value(&record.metadata)?,
                }))
            })
            .collect::<Result<Vec<_>, BackendError>>()?;

        let url = self.data_url().await?.join("vectors/upsert")?;
        let response = self
            .client
            .post(url)
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "vectors": vectors,
                "namespace": namespace,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ChunkMatch>, BackendError> {
        if vector.len() != self.dimension {
            return Err(BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: format!("query vector dim {} is not {}", vector.len(), self.dimension),
            });
        }

        let url = self.data_url().await?.join("query")?;
        let response = self
            .client
            .post(url)
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "namespace": namespace,
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        let hits = parsed
            .pointer("/matches")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::new();
        for hit in hits {
            let id = hit
                .pointer("/id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);
            let metadata = hit
                .pointer("/metadata")
                .cloned()
                .and_then(|value| serde_json::from_value(value).ok());

            result.push(ChunkMatch {
                id,
                score,
                metadata,
            });
        }

        Ok(result)
    }
}
