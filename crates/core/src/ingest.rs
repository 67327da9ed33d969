use crate::chunking::{chunk_words, ChunkingConfig};
use crate::error::{BackendError, IngestError};
use crate::extractor::{extract_text, page_count, PageSelection};
use crate::models::{
    ChunkMetadata, PdfDescriptor, ProcessingOptions, ProcessingStrategy, VectorIngestion,
    VectorRecord,
};
use crate::traits::{EmbedInputType, ProgressSink, TextEmbedder, VectorStore};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Index partition key for a document: the file stem with whitespace
/// collapsed to underscores. Two documents with the same stem share a
/// namespace, so re-ingesting appends rather than replaces.
pub fn derive_namespace(path: &Path) -> Result<String, IngestError> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(stem.split_whitespace().collect::<Vec<_>>().join("_"))
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

struct PendingChunk {
    id: String,
    index: usize,
    text: String,
}

/// Decides per document how questions will later be answered: short PDFs get
/// their full text cached next to the source, long ones get chunked,
/// embedded, and upserted into the vector index.
pub struct PdfProcessor<V, E, P> {
    store: V,
    embedder: E,
    progress: P,
    options: ProcessingOptions,
}

impl<V, E, P> PdfProcessor<V, E, P>
where
    V: VectorStore + Send + Sync,
    E: TextEmbedder + Send + Sync,
    P: ProgressSink + Send + Sync,
{
    pub fn new(store: V, embedder: E, progress: P, options: ProcessingOptions) -> Self {
        Self {
            store,
            embedder,
            progress,
            options,
        }
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Inspects the page count and processes the document with the matching
    /// strategy. The returned descriptor is all a later question needs; the
    /// source PDF is never re-inspected.
    pub async fn process(&self, pdf_path: &Path) -> Result<PdfDescriptor, IngestError> {
        let pages = page_count(pdf_path)?;
        let checksum = digest_file(pdf_path)?;

        let strategy = if pages <= self.options.simple_page_limit {
            self.progress
                .report_progress(0.5, "extracting full text")
                .await;
            let content = extract_text(pdf_path, &PageSelection::All)?;
            let txt_path = pdf_path.with_extension("txt");
            fs::write(&txt_path, &content)?;
            self.progress
                .info(&format!("created text file: {}", txt_path.display()))
                .await;

            ProcessingStrategy::Simple {
                txt_path: Some(txt_path),
                content: None,
            }
        } else {
            self.progress
                .report_progress(0.3, "starting vector ingestion")
                .await;
            self.progress
                .info(&format!("{pages} pages, switching to vector strategy"))
                .await;
            let ingestion = self.ingest_vector(pdf_path).await?;

            ProcessingStrategy::Vector {
                namespace: ingestion.namespace,
                chunk_count: ingestion.chunk_count,
            }
        };

        self.progress.resource_list_changed().await;

        Ok(PdfDescriptor {
            pdf_path: pdf_path.to_string_lossy().to_string(),
            page_count: pages,
            checksum,
            processed_at: Utc::now(),
            strategy,
        })
    }

    /// Chunks, embeds, and upserts the whole document under its derived
    /// namespace. Batches are committed one at a time; a failure partway
    /// leaves earlier batches in the index (at-least-once, no rollback).
    /// `chunk_count` counts every chunk the chunker produced, including any
    /// skipped as whitespace-only.
    pub async fn ingest_vector(&self, pdf_path: &Path) -> Result<VectorIngestion, IngestError> {
        if !pdf_path.exists() {
            return Err(IngestError::NotFound(pdf_path.display().to_string()));
        }

        let chunking = ChunkingConfig::from(&self.options);
        chunking.validate()?;

        self.ensure_index_ready().await?;

        let namespace = derive_namespace(pdf_path)?;
        let pdf_name = pdf_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                IngestError::MissingFileName(format!("path missing filename: {}", pdf_path.display()))
            })?;

        let text = extract_text(pdf_path, &PageSelection::All)?;
        let chunks = chunk_words(&text, chunking);
        let chunk_count = chunks.len();

        let mut batch: Vec<PendingChunk> = Vec::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            if chunk.trim().is_empty() {
                continue;
            }

            batch.push(PendingChunk {
                id: format!("{}_{}", namespace, Uuid::new_v4()),
                index,
                text: chunk,
            });

            if batch.len() >= self.options.batch_size {
                self.embed_and_upsert(&namespace, pdf_name, &batch).await?;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.embed_and_upsert(&namespace, pdf_name, &batch).await?;
        }

        info!(namespace = %namespace, chunk_count = %chunk_count, "vector ingestion complete");
        Ok(VectorIngestion {
            namespace,
            chunk_count,
        })
    }

    async fn ensure_index_ready(&self) -> Result<(), IngestError> {
        if !self.store.index_exists().await.map_err(IngestError::Index)? {
            self.progress.info("creating vector index").await;
            self.store.create_index().await.map_err(IngestError::Index)?;
        }

        let mut delay = self.options.readiness_poll_initial;
        for _ in 0..self.options.readiness_poll_attempts {
            if self.store.index_ready().await.map_err(IngestError::Index)? {
                return Ok(());
            }

            debug!(?delay, "index not ready yet");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(self.options.readiness_poll_cap);
        }

        Err(IngestError::IndexUnavailable(format!(
            "gave up after {} readiness checks",
            self.options.readiness_poll_attempts
        )))
    }

    async fn embed_and_upsert(
        &self,
        namespace: &str,
        pdf_name: &str,
        batch: &[PendingChunk],
    ) -> Result<(), IngestError> {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed(&texts, EmbedInputType::Passage)
            .await
            .map_err(IngestError::Embedding)?;

        if embeddings.len() != batch.len() {
            return Err(IngestError::Embedding(BackendError::BackendResponse {
                backend: "embedder".to_string(),
                details: format!(
                    "embedding count {} doesn't match chunk count {}",
                    embeddings.len(),
                    batch.len()
                ),
            }));
        }

        let records: Vec<VectorRecord> = batch
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| VectorRecord {
                id: chunk.id.clone(),
                values,
                metadata: ChunkMetadata {
                    pdf_name: pdf_name.to_string(),
                    chunk_index: chunk.index,
                    text: chunk.text.clone(),
                },
            })
            .collect();

        self.store
            .upsert(namespace, &records)
            .await
            .map_err(IngestError::Upsert)?;

        debug!(batch_len = %records.len(), "batch upserted");
        Ok(())
    }
}
