//! 에러 타입
//!
//! 파이프라인 실패를 입력 검증 / 저장소 / 임베딩 / 생성 단계로 구분합니다.
//! 백엔드(임베딩, LanceDB, Ollama)는 `anyhow::Result`를 반환하고,
//! 매니저가 이를 `RagError`로 분류합니다.

use std::path::PathBuf;

use thiserror::Error;

/// 파이프라인 에러
#[derive(Debug, Error)]
pub enum RagError {
    /// 입력 파일 없음
    #[error("The file {} does not exist.", .0.display())]
    MissingFile(PathBuf),

    /// PDF에서 텍스트가 추출되지 않음 (스캔 문서 등)
    #[error("No text extracted from the PDF: {}", .0.display())]
    EmptyText(PathBuf),

    /// 분할 결과 청크가 없음
    #[error("No text chunks were created from the document.")]
    NoChunks,

    /// PDF 파싱 실패
    #[error("Failed to extract text from {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },

    /// 벡터 인덱스 열기/쓰기 실패
    #[error("Failed to add texts to the vector index: {0}")]
    Storage(String),

    /// 임베딩 서비스 실패
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// 질의 파이프라인 실패 (임베딩, 검색, LLM 호출)
    #[error("Failed to generate a response: {0}")]
    Generation(String),

    /// 잘못된 설정
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// 에러 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Storage,
    Embedding,
    Generation,
    Config,
}

impl RagError {
    /// 에러 분류 반환
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::MissingFile(_)
            | RagError::EmptyText(_)
            | RagError::NoChunks
            | RagError::Extraction { .. } => ErrorKind::Validation,
            RagError::Storage(_) => ErrorKind::Storage,
            RagError::Embedding(_) => ErrorKind::Embedding,
            RagError::Generation(_) => ErrorKind::Generation,
            RagError::Config(_) => ErrorKind::Config,
        }
    }

    /// 입력 검증 에러 여부
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub(crate) fn storage(err: anyhow::Error) -> Self {
        RagError::Storage(format!("{:#}", err))
    }

    pub(crate) fn embedding(err: anyhow::Error) -> Self {
        RagError::Embedding(format!("{:#}", err))
    }

    pub(crate) fn generation(err: anyhow::Error) -> Self {
        RagError::Generation(format!("{:#}", err))
    }
}

/// 파이프라인 결과 타입
pub type RagResult<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RagError::MissingFile(PathBuf::from("a.pdf")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(RagError::NoChunks.kind(), ErrorKind::Validation);
        assert_eq!(
            RagError::Storage("disk full".to_string()).kind(),
            ErrorKind::Storage
        );
        assert!(!RagError::Generation("timeout".to_string()).is_validation());
    }

    #[test]
    fn test_missing_file_message() {
        let err = RagError::MissingFile(PathBuf::from("/tmp/none.pdf"));
        assert_eq!(err.to_string(), "The file /tmp/none.pdf does not exist.");
    }

    #[test]
    fn test_storage_keeps_context_chain() {
        let source = anyhow::anyhow!("permission denied").context("Failed to open table");
        let err = RagError::storage(source);
        let msg = err.to_string();
        assert!(msg.contains("Failed to open table"));
        assert!(msg.contains("permission denied"));
    }
}
