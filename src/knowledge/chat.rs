//! 질의 파이프라인 - 질문 → 임베딩 → k-NN 검색 → 프롬프트 → LLM 답변

use std::sync::Arc;

use crate::config::{RagConfig, DEFAULT_TOP_K};
use crate::embedding::{EmbeddingProvider, OllamaEmbedding};
use crate::error::{RagError, RagResult};
use crate::llm::{LanguageModel, OllamaChat};

use super::lance::LanceVectorStore;
use super::prompt::PromptTemplate;
use super::vector::{SearchResult, VectorStore};

/// 질의 실패 시 사용자에게 보여주는 고정 메시지
pub const FALLBACK_RESPONSE: &str = "⚠️ Sorry, I couldn't process your request at the moment.";

/// 챗봇 매니저
///
/// 한 번 생성해서 여러 질문에 재사용합니다.
pub struct ChatbotManager {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl ChatbotManager {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            prompt: PromptTemplate::qa(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// 설정에서 생성 (Ollama 임베딩/LLM + LanceDB)
    pub async fn from_config(config: &RagConfig) -> RagResult<Self> {
        config.validate()?;

        let embedder = OllamaEmbedding::from_config(config)
            .map_err(|e| RagError::Config(format!("{:#}", e)))?;
        let llm =
            OllamaChat::from_config(config).map_err(|e| RagError::Config(format!("{:#}", e)))?;
        let store = LanceVectorStore::open(&config.persist_directory, &config.collection_name)
            .await
            .map_err(RagError::storage)?;

        Ok(Self::new(Arc::new(embedder), Arc::new(store), Arc::new(llm)).with_top_k(config.top_k))
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// 질문과 가장 가까운 청크 `top_k`개 검색
    pub async fn retrieve(&self, query: &str) -> RagResult<Vec<SearchResult>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(RagError::generation)?;

        self.store
            .search(&query_embedding, self.top_k)
            .await
            .map_err(RagError::generation)
    }

    /// 질의 실행
    ///
    /// 실패 원인을 [`RagError::Generation`]으로 반환합니다.
    pub async fn query(&self, query: &str) -> RagResult<String> {
        let documents = self.retrieve(query).await?;
        tracing::debug!("Retrieved {} chunks for query", documents.len());

        let prompt = self.prompt.format_qa(&documents, query);

        self.llm
            .complete(&prompt)
            .await
            .map_err(RagError::generation)
    }

    /// 질의 실행 (UI용)
    ///
    /// 실패하면 에러를 로그로 남기고 [`FALLBACK_RESPONSE`]를 반환합니다.
    pub async fn get_response(&self, query: &str) -> String {
        match self.query(query).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("An error occurred while processing your request: {}", e);
                FALLBACK_RESPONSE.to_string()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
