use crate::error::BackendError;
use crate::models::{ChunkMatch, VectorRecord};
use async_trait::async_trait;

/// Hint telling the embedding model which side of the retrieval it is
/// encoding. Ingestion embeds with `Passage`, answering with `Query`; the
/// two must address the same embedding space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedInputType {
    Passage,
    Query,
}

impl EmbedInputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passage => "passage",
            Self::Query => "query",
        }
    }
}

/// A namespace-partitioned vector index. Entries in one namespace never
/// surface in queries against another.
#[async_trait]
pub trait VectorStore {
    async fn index_exists(&self) -> Result<bool, BackendError>;

    async fn create_index(&self) -> Result<(), BackendError>;

    async fn index_ready(&self) -> Result<bool, BackendError>;

    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<(), BackendError>;

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ChunkMatch>, BackendError>;
}

/// Batched, order-preserving text embedding: one vector per input, all of
/// `dimensions` length.
#[async_trait]
pub trait TextEmbedder {
    fn dimensions(&self) -> usize;

    async fn embed(
        &self,
        inputs: &[String],
        input_type: EmbedInputType,
    ) -> Result<Vec<Vec<f32>>, BackendError>;
}

/// Single-turn text completion.
#[async_trait]
pub trait CompletionModel {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Best-effort progress reporting. Implementations must swallow their own
/// failures; processing never aborts because a notification was lost.
#[async_trait]
pub trait ProgressSink {
    async fn report_progress(&self, fraction: f32, message: &str);

    async fn info(&self, message: &str);

    async fn resource_list_changed(&self);
}
