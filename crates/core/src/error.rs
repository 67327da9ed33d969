use thiserror::Error;

/// Transport-level failure raised by the HTTP-backed capabilities
/// (vector store, embedder, completion model).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend not available yet: {0}")]
    NotReady(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf not found at {0}")]
    NotFound(String),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("vector index never became ready: {0}")]
    IndexUnavailable(String),

    #[error("embedding request failed: {0}")]
    Embedding(#[source] BackendError),

    #[error("vector upsert failed: {0}")]
    Upsert(#[source] BackendError),

    #[error("index operation failed: {0}")]
    Index(#[source] BackendError),
}

#[derive(Debug, Error)]
pub enum QaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("question embedding failed: {0}")]
    Embedding(#[source] BackendError),

    #[error("vector query failed: {0}")]
    Query(#[source] BackendError),

    #[error("completion request failed: {0}")]
    Completion(#[source] BackendError),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
