use crate::error::BackendError;
use crate::models::{ChunkMatch, VectorRecord};
use crate::traits::VectorStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-process vector index with the same namespace-partitioned contract as
/// the hosted store. Scoring is cosine similarity.
pub struct MemoryVectorStore {
    dimension: usize,
    inner: Mutex<State>,
}

#[derive(Default)]
struct State {
    created: bool,
    namespaces: HashMap<String, Vec<VectorRecord>>,
}

impl MemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            inner: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_count(&self, namespace: &str) -> usize {
        self.state()
            .namespaces
            .get(namespace)
            .map_or(0, Vec::len)
    }
}

fn cosine(left: &[f32], right: &[f32]) -> f64 {
    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm: f32 = left.iter().map(|v| v * v).sum::<f32>().sqrt();
    let right_norm: f32 = right.iter().map(|v| v * v).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        0.0
    } else {
        f64::from(dot / (left_norm * right_norm))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn index_exists(&self) -> Result<bool, BackendError> {
        Ok(self.state().created)
    }

    async fn create_index(&self) -> Result<(), BackendError> {
        self.state().created = true;
        Ok(())
    }

    async fn index_ready(&self) -> Result<bool, BackendError> {
        Ok(self.state().created)
    }

    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<(), BackendError> {
        for record in records {
            if record.values.len() != self.dimension {
                return Err(BackendError::BackendResponse {
                    backend: "memory".to_string(),
                    details: format!(
                        "embedding dimension {} != {}",
                        record.values.len(),
                        self.dimension
                    ),
                });
            }
        }

        self.state()
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .extend(records.iter().cloned());

        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ChunkMatch>, BackendError> {
        let state = self.state();
        let records = state.namespaces.get(namespace);

        let mut scored: Vec<ChunkMatch> = records
            .into_iter()
            .flatten()
            .map(|record| ChunkMatch {
                id: record.id.clone(),
                score: cosine(&record.values, vector),
                metadata: Some(record.metadata.clone()),
            })
            .collect();

        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}
