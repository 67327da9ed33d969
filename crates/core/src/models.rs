use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Durable record of how a PDF was processed. Created once by
/// [`crate::PdfProcessor::process`], read-only afterward; answering
/// dispatches on `strategy` without re-opening the source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfDescriptor {
    pub pdf_path: String,
    pub page_count: usize,
    pub checksum: String,
    pub processed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub strategy: ProcessingStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "processing_type", rename_all = "snake_case")]
pub enum ProcessingStrategy {
    /// Short document: answered from the full extracted text, either the
    /// cached `.txt` file next to the source or an inline blob.
    Simple {
        txt_path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    /// Long document: answered by retrieval from the vector index partition
    /// named `namespace`.
    Vector { namespace: String, chunk_count: usize },
}

/// Metadata stored with every index entry so answers never need a second
/// read of the source PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub pdf_name: String,
    pub chunk_index: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub id: String,
    pub score: f64,
    pub metadata: Option<ChunkMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIngestion {
    pub namespace: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone)]
pub struct ProcessingOptions {
    /// Words per chunk window.
    pub chunk_size_words: usize,
    /// Words shared between adjacent windows. Must stay below
    /// `chunk_size_words`; the ingestion pipeline rejects anything else.
    pub overlap_words: usize,
    /// Chunks embedded and upserted per batch.
    pub batch_size: usize,
    /// Page count at or below which a PDF is answered from full text.
    pub simple_page_limit: usize,
    /// Nearest neighbors fetched per question.
    pub top_k: usize,
    /// Embedding model requested from the inference endpoint.
    pub embed_model: String,
    /// Hard character budget for raw-text prompts.
    pub raw_prompt_char_limit: usize,
    pub readiness_poll_attempts: u32,
    pub readiness_poll_initial: Duration,
    pub readiness_poll_cap: Duration,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            chunk_size_words: 2_000,
            overlap_words: 200,
            batch_size: 96,
            simple_page_limit: 2,
            top_k: 2,
            embed_model: "llama-text-embed-v2".to_string(),
            raw_prompt_char_limit: 7_500,
            readiness_poll_attempts: 8,
            readiness_poll_initial: Duration::from_secs(1),
            readiness_poll_cap: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_round_trips_with_processing_type_tag() {
        let descriptor = PdfDescriptor {
            pdf_path: "/tmp/report.pdf".to_string(),
            page_count: 5,
            checksum: "abc".to_string(),
            processed_at: Utc::now(),
            strategy: ProcessingStrategy::Vector {
                namespace: "report".to_string(),
                chunk_count: 3,
            },
        };

        let value = serde_json::to_value(&descriptor).expect("descriptor should serialize");
        assert_eq!(value["processing_type"], "vector");
        assert_eq!(value["namespace"], "report");

        let parsed: PdfDescriptor =
            serde_json::from_value(value).expect("descriptor should deserialize");
        assert!(matches!(parsed.strategy, ProcessingStrategy::Vector { .. }));
    }

    #[test]
    fn descriptor_with_unknown_processing_type_is_rejected() {
        let raw = serde_json::json!({
            "pdf_path": "/tmp/report.pdf",
            "page_count": 1,
            "checksum": "abc",
            "processed_at": "2026-01-01T00:00:00Z",
            "processing_type": "graph"
        });

        assert!(serde_json::from_value::<PdfDescriptor>(raw).is_err());
    }
}
