//! The RAG pipeline: build-once ingestion and per-query answering

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::{DocumentSource, RecursiveChunker};
use crate::providers::{ChatProvider, EmbeddingProvider};
use crate::retrieval::VectorIndex;
use crate::types::{
    response::{QueryResponse, SourceRef},
    Chunk, Document,
};

/// Composed retrieval + generation pipeline.
///
/// Built exactly once per process: construction fetches, chunks, and embeds
/// every configured topic, which is the expensive network-bound path. After
/// that the pipeline is immutable and answers queries read-only.
pub struct RagPipeline {
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
    top_k: usize,
    fetch_k: usize,
    diversity: f32,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("top_k", &self.top_k)
            .field("fetch_k", &self.fetch_k)
            .field("diversity", &self.diversity)
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    /// Build the pipeline: fetch documents for every topic, chunk, embed,
    /// and index them.
    ///
    /// A single topic failing is a warning; all topics failing (zero
    /// documents) is fatal. When a persist directory is configured, a
    /// matching index snapshot short-circuits the whole ingestion.
    pub async fn build(
        config: &RagConfig,
        source: &dyn DocumentSource,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let snapshot_path = config
            .index
            .persist_dir
            .as_ref()
            .map(|dir| dir.join("index.json"));

        if let Some(path) = &snapshot_path {
            if let Some(index) = VectorIndex::load(path, embedder.model())? {
                tracing::info!(
                    "Loaded index snapshot from {} ({} chunks)",
                    path.display(),
                    index.len()
                );
                return Ok(Self::assemble(index, embedder, chat, config));
            }
        }

        let documents = Self::fetch_documents(config, source).await?;
        tracing::info!("Loaded {} documents from {}", documents.len(), source.name());

        let chunker = RecursiveChunker::new(&config.chunking)?;
        let chunks = chunker.split_documents(&documents);
        tracing::info!("Split documents into {} chunks", chunks.len());

        let index = Self::embed_and_index(config, &*embedder, chunks).await?;

        if let Some(path) = &snapshot_path {
            index.save(path, embedder.model())?;
            tracing::info!("Saved index snapshot to {}", path.display());
        }

        Ok(Self::assemble(index, embedder, chat, config))
    }

    fn assemble(
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
        config: &RagConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            chat,
            top_k: config.retrieval.top_k,
            fetch_k: config.retrieval.fetch_k,
            diversity: config.retrieval.diversity,
        }
    }

    /// Fetch documents for every configured topic, tolerating per-topic
    /// failures
    async fn fetch_documents(
        config: &RagConfig,
        source: &dyn DocumentSource,
    ) -> Result<Vec<Document>> {
        let ingestion = &config.ingestion;
        let mut documents = Vec::new();

        for topic in &ingestion.topics {
            match source
                .fetch(topic, ingestion.max_docs_per_topic, ingestion.max_chars_per_doc)
                .await
            {
                Ok(docs) => {
                    tracing::debug!("Topic '{}' yielded {} documents", topic, docs.len());
                    documents.extend(docs);
                }
                Err(e) => {
                    tracing::warn!("Failed to load topic '{}': {}", topic, e);
                }
            }
        }

        if documents.is_empty() {
            return Err(Error::ingestion(
                "no documents could be loaded for any configured topic",
            ));
        }
        Ok(documents)
    }

    /// Embed chunks in batches and insert them into a fresh index
    async fn embed_and_index(
        config: &RagConfig,
        embedder: &dyn EmbeddingProvider,
        chunks: Vec<Chunk>,
    ) -> Result<VectorIndex> {
        let mut index = VectorIndex::new();
        let batch_size = config.models.embed_batch_size.max(1);

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await?;

            for (chunk, embedding) in batch.iter().cloned().zip(embeddings) {
                index.insert(chunk, embedding)?;
            }
        }

        Ok(index)
    }

    /// Number of chunks in the vector index
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Answer a question: retrieve diverse chunks, compose the prompt, and
    /// run the chat completion.
    ///
    /// Empty or whitespace-only input is rejected before any provider call.
    pub async fn answer(&self, question: &str) -> Result<QueryResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let start = Instant::now();

        let query_embedding = self.embedder.embed(question).await?;
        let results = self
            .index
            .search(&query_embedding, self.top_k, self.fetch_k, self.diversity);

        if results.is_empty() {
            return Err(Error::index("retrieval returned no chunks"));
        }

        let context = PromptBuilder::build_context(&results);
        let prompt = PromptBuilder::build_qa_prompt(question, &context);
        let answer = self.chat.complete(&prompt).await?;

        let mut sources: Vec<SourceRef> = Vec::new();
        for result in &results {
            let source = SourceRef {
                title: result.chunk.source.title.clone(),
                topic: result.chunk.source.topic.clone(),
            };
            if !sources.contains(&source) {
                sources.push(source);
            }
        }

        Ok(QueryResponse {
            answer,
            sources,
            chunks_retrieved: results.len(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic toy embedding: hash words into a small vector so texts
    /// sharing words land near each other
    fn embed_text(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 16];
        for word in text.to_lowercase().split_whitespace() {
            let h = word
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            v[h % 16] += 1.0;
        }
        v
    }

    #[derive(Default)]
    struct MockSource {
        /// Topics that fail instead of returning documents
        failing_topics: Vec<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentSource for MockSource {
        async fn fetch(
            &self,
            topic: &str,
            _max_docs: usize,
            max_chars: usize,
        ) -> crate::error::Result<Vec<Document>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_topics.iter().any(|t| t == topic) {
                return Err(Error::ingestion(format!("no results for '{topic}'")));
            }
            let content = "Liverpool Football Club was founded in 1892. \
                           The club has played at Anfield since formation. \
                           The stadium holds a large crowd on match days.";
            Ok(vec![Document::new(
                format!("{topic} article"),
                topic,
                &content[..content.len().min(max_chars)],
            )])
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[derive(Default)]
    struct MockEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::embedding("401: Incorrect API key provided"));
            }
            Ok(texts.iter().map(|t| embed_text(t)).collect())
        }

        fn model(&self) -> &str {
            "mock-embed"
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    /// Echoes the prompt back so assertions can check what reached the model
    #[derive(Default)]
    struct EchoChat {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatProvider for EchoChat {
        async fn complete(&self, prompt: &str) -> crate::error::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(prompt.to_string())
        }

        fn model(&self) -> &str {
            "mock-chat"
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn test_config() -> RagConfig {
        let mut config = RagConfig::default();
        config.chunking.chunk_size = 120;
        config.chunking.chunk_overlap = 20;
        config
    }

    async fn build_pipeline(
        config: &RagConfig,
        source: &MockSource,
    ) -> (RagPipeline, Arc<MockEmbedder>, Arc<EchoChat>) {
        let embedder = Arc::new(MockEmbedder::default());
        let chat = Arc::new(EchoChat::default());
        let pipeline = RagPipeline::build(config, source, embedder.clone(), chat.clone())
            .await
            .unwrap();
        (pipeline, embedder, chat)
    }

    #[tokio::test]
    async fn builds_despite_partial_topic_failures() {
        let config = test_config();
        let source = MockSource {
            failing_topics: vec!["Liverpool F.C. players".to_string()],
            ..MockSource::default()
        };

        let (pipeline, _, _) = build_pipeline(&config, &source).await;
        assert!(pipeline.chunk_count() > 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fails_when_every_topic_is_empty() {
        let config = test_config();
        let source = MockSource {
            failing_topics: config.ingestion.topics.clone(),
            ..MockSource::default()
        };

        let embedder = Arc::new(MockEmbedder::default());
        let chat = Arc::new(EchoChat::default());
        let err = RagPipeline::build(&config, &source, embedder.clone(), chat)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Ingestion(_)));
        // Nothing was embedded for the failed build
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn embedding_auth_failure_fails_the_build() {
        let config = test_config();
        let source = MockSource::default();
        let embedder = Arc::new(MockEmbedder {
            fail: true,
            ..MockEmbedder::default()
        });
        let chat = Arc::new(EchoChat::default());

        let err = RagPipeline::build(&config, &source, embedder, chat)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn empty_query_touches_no_provider() {
        let config = test_config();
        let source = MockSource::default();
        let (pipeline, embedder, chat) = build_pipeline(&config, &source).await;
        let embed_calls_after_build = embedder.calls.load(Ordering::SeqCst);

        let err = pipeline.answer("   \n  ").await.unwrap_err();
        assert!(matches!(err, Error::EmptyQuery));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), embed_calls_after_build);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn answer_surfaces_the_founding_year() {
        let config = test_config();
        let source = MockSource::default();
        let (pipeline, _, _) = build_pipeline(&config, &source).await;

        let response = pipeline
            .answer("What year was the club founded?")
            .await
            .unwrap();

        // The echo chat returns the composed prompt, so the retrieved chunk
        // with the founding year must be inside it
        assert!(response.answer.contains("1892"));
        assert!(response.chunks_retrieved > 0);
        assert!(!response.sources.is_empty());
        assert!(response.sources[0].title.contains("article"));
    }

    #[tokio::test]
    async fn ingestion_runs_once_across_many_queries() {
        let config = test_config();
        let source = MockSource::default();
        let (pipeline, _, chat) = build_pipeline(&config, &source).await;
        let fetches_after_build = source.calls.load(Ordering::SeqCst);

        for _ in 0..5 {
            pipeline.answer("Where does the club play?").await.unwrap();
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), fetches_after_build);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn snapshot_skips_refetching_on_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.index.persist_dir = Some(dir.path().to_path_buf());

        let source = MockSource::default();
        let (first, _, _) = build_pipeline(&config, &source).await;
        let chunk_count = first.chunk_count();
        drop(first);

        // Second build: every topic would fail, but the snapshot makes
        // ingestion unnecessary
        let failing = MockSource {
            failing_topics: config.ingestion.topics.clone(),
            ..MockSource::default()
        };
        let embedder = Arc::new(MockEmbedder::default());
        let chat = Arc::new(EchoChat::default());
        let second = RagPipeline::build(&config, &failing, embedder, chat)
            .await
            .unwrap();

        assert_eq!(second.chunk_count(), chunk_count);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 0);
    }
}
