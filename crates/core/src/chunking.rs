use crate::error::IngestError;
use crate::models::ProcessingOptions;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size_words: usize,
    pub overlap_words: usize,
}

impl From<&ProcessingOptions> for ChunkingConfig {
    fn from(value: &ProcessingOptions) -> Self {
        Self {
            chunk_size_words: value.chunk_size_words,
            overlap_words: value.overlap_words,
        }
    }
}

impl ChunkingConfig {
    /// Callers must reject `overlap >= chunk_size` before chunking; the
    /// chunker itself does not check and such windows never terminate
    /// usefully.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size_words == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size_words must be positive".to_string(),
            ));
        }
        if self.overlap_words >= self.chunk_size_words {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_words {} must be smaller than chunk_size_words {}",
                self.overlap_words, self.chunk_size_words
            )));
        }
        Ok(())
    }
}

/// Splits `text` into overlapping word windows. Each window holds
/// `chunk_size_words` consecutive whitespace-separated words rejoined with
/// single spaces; the next window starts `overlap_words` words before the
/// previous one ended. Stops once a window reaches the final word, so only
/// the last chunk may be short. Empty input yields no chunks.
pub fn chunk_words(text: &str, config: ChunkingConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + config.chunk_size_words).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start = end - config.overlap_words;
    }

    chunks
}
