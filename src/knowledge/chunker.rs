//! Text Chunking Module
//!
//! 재귀 문자 분할기: 문단 → 줄 → 단어 → 문자 순으로 구분자를 낮춰가며
//! 최대 크기 이하의 청크로 나누고, 인접 청크 사이에 오버랩을 둡니다.
//! 문서 구조(헤더, 페이지)는 고려하지 않습니다.

use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::RagError;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 최대 청크 크기 (문자 수)
    pub chunk_size: usize,
    /// 오버랩 크기 (문자 수)
    pub chunk_overlap: usize,
    /// 우선순위 순 구분자 (빈 문자열 = 문자 단위)
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChunkConfig {
    /// 크기와 오버랩을 지정하여 생성 (기본 구분자)
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk size must be positive".to_string()));
        }
        if chunk_overlap > chunk_size {
            return Err(RagError::Config(format!(
                "Got a larger chunk overlap ({}) than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        })
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// RecursiveCharacterSplitter
// ============================================================================

/// 재귀 문자 분할기
///
/// - 텍스트에 존재하는 첫 번째 구분자로 분할 (구분자는 다음 조각 앞에 유지)
/// - 여전히 큰 조각은 나머지 구분자로 재귀 분할
/// - 작은 조각은 `chunk_size` 이하로 병합, 끝부분 최대 `chunk_overlap` 문자를 다음 청크로 이월
pub struct RecursiveCharacterSplitter {
    config: ChunkConfig,
}

impl RecursiveCharacterSplitter {
    /// 설정으로 생성
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 생성 (1000자 / 오버랩 250자)
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // 텍스트에 존재하는 첫 구분자 선택
        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = String::new();
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep.clone();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keep_separator(text, &separator);

        let mut good_splits: Vec<String> = Vec::new();
        for piece in splits {
            if char_len(&piece) < self.config.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece);
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// 조각들을 최대 크기 이하 청크로 병합 (오버랩 유지)
    ///
    /// 구분자는 조각 앞에 이미 붙어 있으므로 빈 문자열로 이어 붙입니다.
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);

            if total + len > size {
                if total > size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        size
                    );
                }
                if !current.is_empty() {
                    if let Some(doc) = join_trimmed(&current) {
                        docs.push(doc);
                    }
                    // 오버랩만 남기고 앞에서부터 제거
                    while total > overlap || (total + len > size && total > 0) {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_trimmed(&current) {
            docs.push(doc);
        }

        docs
    }
}

impl Chunker for RecursiveCharacterSplitter {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        let mut chunks = self.split_recursive(text, &self.config.separators);
        chunks.retain(|c| !c.trim().is_empty());
        chunks
    }

    fn name(&self) -> &'static str {
        "RecursiveCharacterSplitter"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 문자 수 (UTF-8 바이트 수가 아님)
#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 구분자로 분할하되 구분자를 다음 조각의 앞에 유지
///
/// 빈 구분자는 문자 단위 분할입니다.
fn split_keep_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(|c| c.to_string()).collect();
    }

    let mut splits = Vec::new();
    let mut start = 0;

    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            splits.push(text[start..pos].to_string());
        }
        start = pos;
    }
    if start < text.len() {
        splits.push(text[start..].to_string());
    }

    splits.retain(|s| !s.is_empty());
    splits
}

fn join_trimmed(pieces: &std::collections::VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(RecursiveCharacterSplitter::with_defaults())
}

/// 크기/오버랩을 지정한 청커 생성
pub fn recursive_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(RecursiveCharacterSplitter::new(config))
}

// ============================================================================
// Tests
// ============================================================================
