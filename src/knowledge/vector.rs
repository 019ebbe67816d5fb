//! Vector Store - 벡터 검색 트레이트 및 타입
//!
//! 인덱스 엔트리는 (청크 텍스트, 임베딩) 쌍이며 추가만 가능합니다.

use anyhow::Result;
use async_trait::async_trait;

// ============================================================================
// Types
// ============================================================================

/// 벡터 엔트리 (저장용)
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// 행 식별자 (UUID v4)
    pub id: String,
    /// 청크 텍스트
    pub text: String,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

impl VectorEntry {
    /// 새 식별자로 엔트리 생성
    pub fn new(text: String, embedding: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text,
            embedding,
        }
    }
}

/// 검색 결과
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    /// 청크 텍스트
    pub text: String,
    /// 코사인 유사도 (1.0 = 동일 방향)
    pub similarity: f32,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// VectorStore 트레이트 (async)
///
/// 벡터 저장소의 공통 인터페이스입니다. 단일 writer 사용을 가정합니다.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// 엔트리 추가 후 영구 저장, 추가된 개수 반환
    async fn add(&self, entries: &[VectorEntry]) -> Result<usize>;

    /// 유사도 내림차순 상위 `limit`개 검색
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// 엔트리 개수
    async fn count(&self) -> Result<usize>;
}
