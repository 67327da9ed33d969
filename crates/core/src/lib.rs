pub mod chunking;
pub mod completion;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod progress;
pub mod qa;
pub mod stores;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use chunking::{chunk_words, ChunkingConfig};
pub use completion::ChatCompletionClient;
pub use embeddings::{HashEmbedder, PineconeEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{BackendError, IngestError, QaError};
pub use extractor::{extract_text, page_count, PageSelection, NO_TEXT_EXTRACTED};
pub use ingest::{derive_namespace, digest_file, PdfProcessor};
pub use models::{
    ChunkMatch, ChunkMetadata, PdfDescriptor, ProcessingOptions, ProcessingStrategy,
    VectorIngestion, VectorRecord,
};
pub use progress::{NoopProgressSink, TracingProgressSink};
pub use qa::{
    build_qa_prompt, PdfAnswerer, EMPTY_CHUNKS, NO_CONTENT_AVAILABLE, NO_RELEVANT_INFORMATION,
};
pub use stores::{MemoryVectorStore, PineconeStore};
pub use traits::{CompletionModel, EmbedInputType, ProgressSink, TextEmbedder, VectorStore};
