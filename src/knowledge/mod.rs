//! Knowledge 모듈 - PDF RAG 파이프라인
//!
//! - Chunker: 재귀 문자 분할 (1000자 / 오버랩 250자)
//! - LanceDB: 컬렉션 단위 영구 벡터 인덱스
//! - Ingest: PDF → 청크 → 임베딩 → 인덱스
//! - Chat: 질문 → k-NN 검색 → 프롬프트 → LLM 답변

mod chat;
mod chunker;
mod ingest;
mod lance;
mod prompt;
mod vector;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use chat::{ChatbotManager, FALLBACK_RESPONSE};
pub use chunker::{
    default_chunker, recursive_chunker, ChunkConfig, Chunker, RecursiveCharacterSplitter,
};
pub use ingest::{EmbeddingsManager, IngestReport};
pub use lance::LanceVectorStore;
pub use prompt::{
    stuff_documents, PromptTemplate, CLOSING_PHRASE, DEFAULT_TEMPLATE, UNKNOWN_ANSWER,
};
pub use vector::{SearchResult, VectorEntry, VectorStore};
