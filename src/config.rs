//! 설정 모듈
//!
//! 모델 이름, 디바이스, 컬렉션, 저장 경로 등 파이프라인 설정입니다.
//! 우선순위: CLI 플래그 > `PDFRAG_*` 환경변수 > 기본값

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RagError;

/// 기본 임베딩 모델 (Ollama)
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
/// 기본 LLM 모델 (Ollama)
pub const DEFAULT_LLM_MODEL: &str = "llama3.2";
/// 기본 생성 온도
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// 기본 컬렉션 이름
pub const DEFAULT_COLLECTION: &str = "vector_db";
/// 기본 Ollama 서버 주소
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
/// 청크 최대 크기 (문자 수)
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// 청크 간 오버랩 (문자 수)
pub const DEFAULT_CHUNK_OVERLAP: usize = 250;
/// 검색할 최근접 청크 수
pub const DEFAULT_TOP_K: usize = 3;

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.local/share/pdfrag/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pdfrag")
}

// ============================================================================
// Device
// ============================================================================

/// 임베딩 연산 디바이스
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// CPU 전용 (GPU 오프로드 비활성화)
    Cpu,
    /// 서버가 가용 GPU를 사용
    Gpu,
}

impl FromStr for Device {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "gpu" | "cuda" | "mps" => Ok(Device::Gpu),
            other => Err(RagError::Config(format!(
                "unknown device '{}': expected cpu, gpu, cuda or mps",
                other
            ))),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu => write!(f, "gpu"),
        }
    }
}

// ============================================================================
// RagConfig
// ============================================================================

/// RAG 파이프라인 설정
#[derive(Debug, Clone, Serialize)]
pub struct RagConfig {
    /// 임베딩 모델 식별자
    pub embedding_model: String,
    /// 임베딩 디바이스
    pub device: Device,
    /// 임베딩 L2 정규화 여부
    pub normalize_embeddings: bool,
    /// LLM 모델 식별자
    pub llm_model: String,
    /// 생성 온도
    pub llm_temperature: f32,
    /// 컬렉션(테이블) 이름
    pub collection_name: String,
    /// 벡터 인덱스 저장 디렉토리
    pub persist_directory: PathBuf,
    /// Ollama 서버 주소
    pub ollama_url: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            device: Device::Cpu,
            normalize_embeddings: true,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: DEFAULT_TEMPERATURE,
            collection_name: DEFAULT_COLLECTION.to_string(),
            persist_directory: get_data_dir().join("vector_index"),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl RagConfig {
    /// 기본값에 `PDFRAG_*` 환경변수를 덮어써서 생성
    pub fn from_env() -> Result<Self, RagError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 생성 (테스트에서 환경변수 대신 사용)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PDFRAG_EMBEDDING_MODEL") {
            config.embedding_model = v;
        }
        if let Some(v) = get("PDFRAG_DEVICE") {
            config.device = v.parse()?;
        }
        if let Some(v) = get("PDFRAG_NORMALIZE_EMBEDDINGS") {
            config.normalize_embeddings = parse_bool("PDFRAG_NORMALIZE_EMBEDDINGS", &v)?;
        }
        if let Some(v) = get("PDFRAG_LLM_MODEL") {
            config.llm_model = v;
        }
        if let Some(v) = get("PDFRAG_TEMPERATURE") {
            config.llm_temperature = parse_number("PDFRAG_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("PDFRAG_COLLECTION") {
            config.collection_name = v;
        }
        if let Some(v) = get("PDFRAG_PERSIST_DIR") {
            config.persist_directory = PathBuf::from(v);
        }
        if let Some(v) = get("OLLAMA_HOST") {
            config.ollama_url = normalize_ollama_url(&v);
        }
        if let Some(v) = get("PDFRAG_OLLAMA_URL") {
            config.ollama_url = normalize_ollama_url(&v);
        }
        if let Some(v) = get("PDFRAG_CHUNK_SIZE") {
            config.chunk_size = parse_number("PDFRAG_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = get("PDFRAG_CHUNK_OVERLAP") {
            config.chunk_overlap = parse_number("PDFRAG_CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = get("PDFRAG_TOP_K") {
            config.top_k = parse_number("PDFRAG_TOP_K", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<(), RagError> {
        if self.collection_name.trim().is_empty() {
            return Err(RagError::Config("collection name is empty".to_string()));
        }
        // LanceDB 테이블 이름 규칙
        if !self
            .collection_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(RagError::Config(format!(
                "collection name '{}' may only contain letters, digits, '_', '-' and '.'",
                self.collection_name
            )));
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(RagError::Config(format!(
                "temperature {} is out of range 0.0..=2.0",
                self.llm_temperature
            )));
        }
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk size must be positive".to_string()));
        }
        if self.chunk_overlap > self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk overlap {} is larger than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be positive".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_bool(key: &str, value: &str) -> Result<bool, RagError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RagError::Config(format!("{}: '{}' is not a boolean", key, other))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, RagError> {
    value
        .trim()
        .parse()
        .map_err(|_| RagError::Config(format!("{}: '{}' is not a valid number", key, value)))
}

/// `OLLAMA_HOST` 형식(`127.0.0.1:11434`)도 허용
pub(crate) fn normalize_ollama_url(value: &str) -> String {
    let value = value.trim().trim_end_matches('/');
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("http://{}", value)
    }
}

// ============================================================================
// Tests
// ============================================================================
