//! 수집 파이프라인 - PDF → 텍스트 → 청크 → 임베딩 → 벡터 인덱스
//!
//! 입력 검증 실패와 저장소 실패를 서로 다른 에러로 보고합니다.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::embedding::{EmbeddingProvider, OllamaEmbedding};
use crate::error::{RagError, RagResult};
use crate::extractor::load_pdf_text;

use super::chunker::{recursive_chunker, ChunkConfig, Chunker};
use super::lance::LanceVectorStore;
use super::vector::{VectorEntry, VectorStore};

// ============================================================================
// IngestReport
// ============================================================================

/// 수집 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// 저장된 컬렉션
    pub collection: String,
    /// 추가된 청크 수
    pub chunk_count: usize,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Embeddings successfully created and stored in collection '{}' ({} chunks)",
            self.collection, self.chunk_count
        )
    }
}

// ============================================================================
// EmbeddingsManager
// ============================================================================

/// 수집 매니저
///
/// PDF를 청크로 나누어 임베딩한 뒤 컬렉션에 추가합니다 (추가 전용).
pub struct EmbeddingsManager {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: Box<dyn Chunker>,
    collection: String,
}

impl EmbeddingsManager {
    /// 구성 요소를 직접 지정하여 생성
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        chunker: Box<dyn Chunker>,
        collection: &str,
    ) -> Self {
        Self {
            embedder,
            store,
            chunker,
            collection: collection.to_string(),
        }
    }

    /// 설정에서 생성 (Ollama 임베딩 + LanceDB)
    pub async fn from_config(config: &RagConfig) -> RagResult<Self> {
        config.validate()?;

        let embedder = OllamaEmbedding::from_config(config)
            .map_err(|e| RagError::Config(format!("{:#}", e)))?;

        let store = LanceVectorStore::open(&config.persist_directory, &config.collection_name)
            .await
            .map_err(RagError::storage)?;

        let chunker = recursive_chunker(ChunkConfig::new(config.chunk_size, config.chunk_overlap)?);

        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(store),
            chunker,
            &config.collection_name,
        ))
    }

    /// PDF 전체 텍스트 로드
    pub async fn load_pdf_text(&self, pdf_path: &Path) -> RagResult<String> {
        load_pdf_text(pdf_path)
            .await
            .map_err(|e| RagError::Extraction {
                path: pdf_path.to_path_buf(),
                message: format!("{:#}", e),
            })
    }

    /// 텍스트를 청크로 분할
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.chunker.chunk(text)
    }

    /// 텍스트들을 임베딩하여 컬렉션에 추가
    pub async fn add_texts(&self, texts: &[String]) -> RagResult<usize> {
        if texts.is_empty() {
            return Ok(0);
        }

        let embeddings = self
            .embedder
            .embed_batch(texts)
            .await
            .map_err(RagError::embedding)?;

        if embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "expected {} vectors, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<VectorEntry> = texts
            .iter()
            .zip(embeddings)
            .map(|(text, embedding)| VectorEntry::new(text.clone(), embedding))
            .collect();

        self.store.add(&entries).await.map_err(RagError::storage)
    }

    /// PDF 수집
    ///
    /// # Errors
    /// - 파일 없음: [`RagError::MissingFile`]
    /// - 추출 실패 / 빈 텍스트 / 청크 없음: 입력 검증 에러
    /// - 임베딩 실패: [`RagError::Embedding`]
    /// - 인덱스 쓰기 실패: [`RagError::Storage`]
    pub async fn create_embeddings(&self, pdf_path: &Path) -> RagResult<IngestReport> {
        if !pdf_path.exists() {
            return Err(RagError::MissingFile(pdf_path.to_path_buf()));
        }

        let text = self.load_pdf_text(pdf_path).await?;
        if text.trim().is_empty() {
            return Err(RagError::EmptyText(pdf_path.to_path_buf()));
        }

        let chunks = self.split_text(&text);
        if chunks.is_empty() {
            return Err(RagError::NoChunks);
        }

        tracing::info!(
            "Split {:?} into {} chunks ({} chars)",
            pdf_path,
            chunks.len(),
            text.chars().count()
        );

        let added = self.add_texts(&chunks).await?;

        tracing::info!(
            "Stored {} chunks in collection '{}'",
            added,
            self.collection
        );

        Ok(IngestReport {
            collection: self.collection.clone(),
            chunk_count: added,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::extractor::testing::build_pdf;
    use crate::knowledge::chunker::default_chunker;
    use crate::knowledge::testing::{FailingEmbedding, HashEmbedding};
    use crate::knowledge::vector::SearchResult;
    use tempfile::TempDir;

    /// 쓰기가 항상 실패하는 저장소
    struct BrokenStore;

    #[async_trait::async_trait]
    impl VectorStore for BrokenStore {
        async fn add(&self, _entries: &[VectorEntry]) -> anyhow::Result<usize> {
            anyhow::bail!("disk is read-only")
        }

        async fn search(&self, _q: &[f32], _limit: usize) -> anyhow::Result<Vec<SearchResult>> {
            Ok(vec![])
        }

        async fn count(&self) -> anyhow::Result<usize> {
            Ok(0)
        }
    }

    async fn lance_manager(dir: &TempDir) -> (EmbeddingsManager, Arc<LanceVectorStore>) {
        let store = Arc::new(
            LanceVectorStore::open(&dir.path().join("index"), "vector_db")
                .await
                .unwrap(),
        );
        let manager = EmbeddingsManager::new(
            Arc::new(HashEmbedding),
            store.clone(),
            default_chunker(),
            "vector_db",
        );
        (manager, store)
    }

    fn long_lines() -> Vec<String> {
        (0..40)
            .map(|i| format!("Line {} talks about the history of the river valley settlement", i))
            .collect()
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let (manager, _) = lance_manager(&dir).await;

        let err = manager
            .create_embeddings(&dir.path().join("nope.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::MissingFile(_)));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_pdf_without_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.pdf");
        std::fs::write(&path, build_pdf(&[])).unwrap();
        let (manager, store) = lance_manager(&dir).await;

        let err = manager.create_embeddings(&path).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyText(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.pdf");
        std::fs::write(&path, b"%PDF-1.4 garbage").unwrap();
        let (manager, _) = lance_manager(&dir).await;

        let err = manager.create_embeddings(&path).await.unwrap_err();
        assert!(matches!(err, RagError::Extraction { .. }));
    }

    #[tokio::test]
    async fn test_long_pdf_is_chunked_and_stored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("long.pdf");
        let lines = long_lines();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        std::fs::write(&path, build_pdf(&refs)).unwrap();
        let (manager, store) = lance_manager(&dir).await;

        let text = manager.load_pdf_text(&path).await.unwrap();
        assert!(text.chars().count() > 1000);
        let chunks = manager.split_text(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 1000));
        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let shared = (1..=250.min(next.len()))
                .rev()
                .filter(|&k| next.is_char_boundary(k))
                .find(|&k| prev.ends_with(&next[..k]))
                .unwrap_or(0);
            assert!(shared > 0 && shared <= 250, "overlap was {}", shared);
        }

        let report = manager.create_embeddings(&path).await.unwrap();
        assert_eq!(report.chunk_count, chunks.len());
        assert_eq!(report.collection, "vector_db");
        assert!(report.to_string().contains("successfully"));
        assert_eq!(store.count().await.unwrap(), chunks.len());

        // 같은 파일을 다시 수집하면 추가됨
        manager.create_embeddings(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), chunks.len() * 2);
    }

    #[tokio::test]
    async fn test_storage_failure_is_distinct() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fact.pdf");
        std::fs::write(&path, build_pdf(&["Some extractable text."])).unwrap();

        let manager = EmbeddingsManager::new(
            Arc::new(HashEmbedding),
            Arc::new(BrokenStore),
            default_chunker(),
            "vector_db",
        );

        let err = manager.create_embeddings(&path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("disk is read-only"));
    }

    #[tokio::test]
    async fn test_embedding_failure() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(LanceVectorStore::open(dir.path(), "vector_db").await.unwrap());
        let manager = EmbeddingsManager::new(
            Arc::new(FailingEmbedding),
            store.clone(),
            default_chunker(),
            "vector_db",
        );

        let err = manager
            .add_texts(&["some chunk".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_texts_empty_is_noop() {
        let dir = TempDir::new().unwrap();
        let (manager, store) = lance_manager(&dir).await;
        assert_eq!(manager.add_texts(&[]).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
