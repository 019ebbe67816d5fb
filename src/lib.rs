//! pdfrag - PDF 기반 로컬 RAG 챗봇
//!
//! PDF 텍스트를 청크로 나누어 LanceDB에 임베딩을 저장하고,
//! 질문과 가까운 청크 3개를 근거로 Ollama LLM이 답변합니다.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod knowledge;
pub mod llm;

// Re-exports
pub use config::{get_data_dir, Device, RagConfig};
pub use embedding::{EmbeddingProvider, OllamaEmbedding};
pub use error::{ErrorKind, RagError, RagResult};
pub use knowledge::{
    ChatbotManager, ChunkConfig, Chunker, EmbeddingsManager, IngestReport, LanceVectorStore,
    PromptTemplate, RecursiveCharacterSplitter, SearchResult, VectorEntry, VectorStore,
    FALLBACK_RESPONSE,
};
pub use llm::{LanguageModel, OllamaChat};
