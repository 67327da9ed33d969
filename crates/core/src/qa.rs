use crate::error::{BackendError, QaError};
use crate::models::{PdfDescriptor, ProcessingOptions, ProcessingStrategy};
use crate::traits::{CompletionModel, EmbedInputType, TextEmbedder, VectorStore};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found in the document.";
pub const EMPTY_CHUNKS: &str = "Retrieved chunks were empty.";
pub const NO_CONTENT_AVAILABLE: &str = "No content available for this PDF.";

pub fn build_qa_prompt(content: &str, question: &str) -> String {
    format!(
        "Based on the following PDF content, please answer the question accurately and concisely.\n\
        PDF Content:\n\
        {content}\n\
        \n\
        Question: {question}\n\
        \n\
        Answer:"
    )
}

/// Answers questions about a processed PDF, picking the strategy recorded in
/// its descriptor: retrieval over the vector index for long documents, the
/// full cached text for short ones.
pub struct PdfAnswerer<V, E, C> {
    store: V,
    embedder: E,
    completion: C,
    options: ProcessingOptions,
}

impl<V, E, C> PdfAnswerer<V, E, C>
where
    V: VectorStore + Send + Sync,
    E: TextEmbedder + Send + Sync,
    C: CompletionModel + Send + Sync,
{
    pub fn new(store: V, embedder: E, completion: C, options: ProcessingOptions) -> Self {
        Self {
            store,
            embedder,
            completion,
            options,
        }
    }

    pub async fn answer(
        &self,
        question: &str,
        descriptor: &PdfDescriptor,
    ) -> Result<String, QaError> {
        debug!(question, pdf = %descriptor.pdf_path, "qa request");

        match &descriptor.strategy {
            ProcessingStrategy::Simple { txt_path, content } => {
                self.answer_simple(question, txt_path.as_deref(), content.as_deref())
                    .await
            }
            ProcessingStrategy::Vector { namespace, .. } => {
                self.answer_vector(question, namespace).await
            }
        }
    }

    /// Retrieval path: embed the question, fetch the nearest chunks from the
    /// document's namespace, and answer from their concatenated text. Both
    /// no-match outcomes return fixed sentinels without invoking the
    /// completion model.
    pub async fn answer_vector(&self, question: &str, namespace: &str) -> Result<String, QaError> {
        let query_embeddings = self
            .embedder
            .embed(&[question.to_string()], EmbedInputType::Query)
            .await
            .map_err(QaError::Embedding)?;

        let query_vector = query_embeddings.first().ok_or_else(|| {
            QaError::Embedding(BackendError::BackendResponse {
                backend: "embedder".to_string(),
                details: "no embedding returned for the question".to_string(),
            })
        })?;

        let matches = self
            .store
            .query(namespace, query_vector, self.options.top_k)
            .await
            .map_err(QaError::Query)?;

        if matches.is_empty() {
            return Ok(NO_RELEVANT_INFORMATION.to_string());
        }

        let chunks: Vec<&str> = matches
            .iter()
            .filter_map(|hit| hit.metadata.as_ref())
            .map(|metadata| metadata.text.as_str())
            .filter(|text| !text.is_empty())
            .collect();

        if chunks.is_empty() {
            return Ok(EMPTY_CHUNKS.to_string());
        }

        let prompt = build_qa_prompt(&chunks.join("  "), question);
        self.completion
            .complete(&prompt)
            .await
            .map_err(QaError::Completion)
    }

    /// Full-text path: the cached `.txt` file wins if it exists, then any
    /// inline content, then the no-content sentinel.
    pub async fn answer_simple(
        &self,
        question: &str,
        txt_path: Option<&Path>,
        inline: Option<&str>,
    ) -> Result<String, QaError> {
        let content = match txt_path {
            Some(path) if path.exists() => fs::read_to_string(path)?,
            _ => inline.unwrap_or_default().to_string(),
        };

        if content.trim().is_empty() {
            return Ok(NO_CONTENT_AVAILABLE.to_string());
        }

        let prompt = build_qa_prompt(&content, question);
        self.completion
            .complete(&prompt)
            .await
            .map_err(QaError::Completion)
    }

    /// Degenerate path for content with no descriptor (scraped pages, saved
    /// transcripts). The combined prompt is hard-truncated to the configured
    /// character budget; trailing content is dropped silently.
    pub async fn answer_raw_text(&self, question: &str, content: &str) -> Result<String, QaError> {
        let prompt: String = build_qa_prompt(content, question)
            .chars()
            .take(self.options.raw_prompt_char_limit)
            .collect();

        self.completion
            .complete(&prompt)
            .await
            .map_err(QaError::Completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use crate::models::{ChunkMetadata, VectorRecord};
    use crate::stores::MemoryVectorStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    struct ScriptedCompletion {
        reply: String,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl CompletionModel for ScriptedCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct HintRecordingEmbedder {
        inner: HashEmbedder,
        hints: Arc<Mutex<Vec<EmbedInputType>>>,
    }

    #[async_trait]
    impl TextEmbedder for HintRecordingEmbedder {
        fn dimensions(&self) -> usize {
            self.inner.dimensions
        }

        async fn embed(
            &self,
            inputs: &[String],
            input_type: EmbedInputType,
        ) -> Result<Vec<Vec<f32>>, BackendError> {
            self.hints.lock().unwrap().push(input_type);
            self.inner.embed(inputs, input_type).await
        }
    }

    fn answerer_with_store(
        store: MemoryVectorStore,
        reply: &str,
    ) -> (
        PdfAnswerer<MemoryVectorStore, HashEmbedder, ScriptedCompletion>,
        Arc<Mutex<Vec<String>>>,
    ) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let completion = ScriptedCompletion {
            reply: reply.to_string(),
            prompts: Arc::clone(&prompts),
        };
        let answerer = PdfAnswerer::new(
            store,
            HashEmbedder::default(),
            completion,
            ProcessingOptions::default(),
        );
        (answerer, prompts)
    }

    async fn store_with_chunk(text: &str) -> MemoryVectorStore {
        let embedder = HashEmbedder::default();
        let store = MemoryVectorStore::new(embedder.dimensions);
        let values = embedder
            .embed(&[text.to_string()], EmbedInputType::Passage)
            .await
            .unwrap()
            .remove(0);

        store
            .upsert(
                "Report_Q1",
                &[VectorRecord {
                    id: "Report_Q1_0".to_string(),
                    values,
                    metadata: ChunkMetadata {
                        pdf_name: "Report Q1.pdf".to_string(),
                        chunk_index: 0,
                        text: text.to_string(),
                    },
                }],
            )
            .await
            .unwrap();

        store
    }

    #[tokio::test]
    async fn zero_matches_returns_the_sentinel_without_completing() {
        let store = MemoryVectorStore::new(HashEmbedder::default().dimensions);
        let (answerer, prompts) = answerer_with_store(store, "unused");

        let answer = answerer
            .answer_vector("What grew?", "empty-namespace")
            .await
            .unwrap();

        assert_eq!(answer, NO_RELEVANT_INFORMATION);
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_chunk_text_returns_the_empty_chunks_sentinel() {
        let store = store_with_chunk("").await;
        let (answerer, prompts) = answerer_with_store(store, "unused");

        let answer = answerer
            .answer_vector("What grew?", "Report_Q1")
            .await
            .unwrap();

        assert_eq!(answer, EMPTY_CHUNKS);
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn retrieved_chunk_and_question_reach_the_completion_prompt() {
        let store = store_with_chunk("Revenue grew 12%.").await;
        let (answerer, prompts) = answerer_with_store(store, "Revenue grew twelve percent.");

        let answer = answerer
            .answer_vector("How much did revenue grow?", "Report_Q1")
            .await
            .unwrap();

        assert_eq!(answer, "Revenue grew twelve percent.");
        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1, "completion model invoked exactly once");
        assert!(prompts[0].contains("Revenue grew 12%."));
        assert!(prompts[0].contains("How much did revenue grow?"));
    }

    #[tokio::test]
    async fn question_is_embedded_with_the_query_hint() {
        let store = store_with_chunk("Revenue grew 12%.").await;
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let hints = Arc::new(Mutex::new(Vec::new()));
        let answerer = PdfAnswerer::new(
            store,
            HintRecordingEmbedder {
                inner: HashEmbedder::default(),
                hints: Arc::clone(&hints),
            },
            ScriptedCompletion {
                reply: "ok".to_string(),
                prompts: Arc::clone(&prompts),
            },
            ProcessingOptions::default(),
        );

        answerer
            .answer_vector("How much?", "Report_Q1")
            .await
            .unwrap();

        assert_eq!(*hints.lock().unwrap(), vec![EmbedInputType::Query]);
    }

    #[tokio::test]
    async fn answer_dispatches_on_the_descriptor_strategy() {
        let store = store_with_chunk("Revenue grew 12%.").await;
        let (answerer, prompts) = answerer_with_store(store, "from the index");

        let descriptor = PdfDescriptor {
            pdf_path: "/tmp/Report Q1.pdf".to_string(),
            page_count: 5,
            checksum: "abc".to_string(),
            processed_at: Utc::now(),
            strategy: ProcessingStrategy::Vector {
                namespace: "Report_Q1".to_string(),
                chunk_count: 1,
            },
        };

        let answer = answerer.answer("How much?", &descriptor).await.unwrap();
        assert_eq!(answer, "from the index");
        assert_eq!(prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn simple_answer_prefers_the_cached_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let txt_path = dir.path().join("notes.txt");
        fs::write(&txt_path, "--- Page 1 ---\nHello world")?;

        let store = MemoryVectorStore::new(HashEmbedder::default().dimensions);
        let (answerer, prompts) = answerer_with_store(store, "hello back");

        let answer = answerer
            .answer_simple("What does it say?", Some(&txt_path), Some("inline ignored"))
            .await?;

        assert_eq!(answer, "hello back");
        assert!(prompts.lock().unwrap()[0].contains("Hello world"));
        assert!(!prompts.lock().unwrap()[0].contains("inline ignored"));
        Ok(())
    }

    #[tokio::test]
    async fn simple_answer_falls_back_to_inline_content() {
        let store = MemoryVectorStore::new(HashEmbedder::default().dimensions);
        let (answerer, prompts) = answerer_with_store(store, "ok");

        let answer = answerer
            .answer_simple(
                "What does it say?",
                Some(Path::new("/nonexistent/cache.txt")),
                Some("inline content"),
            )
            .await
            .unwrap();

        assert_eq!(answer, "ok");
        assert!(prompts.lock().unwrap()[0].contains("inline content"));
    }

    #[tokio::test]
    async fn simple_answer_without_content_returns_the_sentinel() {
        let store = MemoryVectorStore::new(HashEmbedder::default().dimensions);
        let (answerer, prompts) = answerer_with_store(store, "unused");

        let answer = answerer
            .answer_simple("Anything?", None, Some("   \n"))
            .await
            .unwrap();

        assert_eq!(answer, NO_CONTENT_AVAILABLE);
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn raw_text_prompt_is_truncated_to_the_character_budget() {
        let store = MemoryVectorStore::new(HashEmbedder::default().dimensions);
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let answerer = PdfAnswerer::new(
            store,
            HashEmbedder::default(),
            ScriptedCompletion {
                reply: "ok".to_string(),
                prompts: Arc::clone(&prompts),
            },
            ProcessingOptions {
                raw_prompt_char_limit: 120,
                ..ProcessingOptions::default()
            },
        );

        let long_content = "word ".repeat(200);
        answerer
            .answer_raw_text("What is this?", &long_content)
            .await
            .unwrap();

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts[0].chars().count(), 120);
    }
}
