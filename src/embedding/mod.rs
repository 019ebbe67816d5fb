//! 임베딩 모듈 - Ollama API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 임베딩 프로바이더입니다.
//! 시맨틱 검색을 위한 핵심 모듈입니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OllamaEmbedding::from_config(&config)?;
//! let embedding = embedder.embed("Hello, world!").await?;
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Device, RagConfig};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding service returned no vectors"))
    }

    /// 배치 임베딩 (입력 순서대로 반환)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Ollama Embedding
// ============================================================================

/// 한 번의 요청에 보낼 최대 입력 수
const MAX_BATCH_SIZE: usize = 32;

/// Ollama 임베딩 구현체
///
/// source: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-embeddings
#[derive(Debug, Clone)]
pub struct OllamaEmbedding {
    client: reqwest::Client,
    base_url: String,
    model: String,
    device: Device,
    normalize: bool,
}

/// `/api/embed` 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<EmbedOptions>,
}

#[derive(Debug, Serialize)]
struct EmbedOptions {
    num_gpu: u32,
}

/// `/api/embed` 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama 에러 응답
#[derive(Debug, Deserialize)]
pub(crate) struct OllamaError {
    pub(crate) error: String,
}

impl OllamaEmbedding {
    /// 새 Ollama 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `base_url` - Ollama 서버 주소
    /// * `model` - 임베딩 모델 이름
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            device: Device::Cpu,
            normalize: true,
        })
    }

    /// 설정에서 생성
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Ok(Self::new(&config.ollama_url, &config.embedding_model)?
            .with_device(config.device)
            .with_normalize(config.normalize_embeddings))
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    fn options(&self) -> Option<EmbedOptions> {
        match self.device {
            Device::Cpu => Some(EmbedOptions { num_gpu: 0 }),
            Device::Gpu => None,
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
            options: self.options(),
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send embedding request to {}", self.base_url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<OllamaError>(&body) {
                anyhow::bail!("Ollama embedding error ({}): {}", status, error.error);
            }
            anyhow::bail!("Ollama embedding error ({}): {}", status, body);
        }

        let parsed: EmbedResponse =
            serde_json::from_str(&body).context("Failed to parse embedding response")?;

        if parsed.embeddings.len() != texts.len() {
            anyhow::bail!(
                "Embedding count mismatch: sent {}, received {}",
                texts.len(),
                parsed.embeddings.len()
            );
        }

        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(MAX_BATCH_SIZE).enumerate() {
            tracing::debug!(
                "Embedding batch {}/{}",
                i + 1,
                texts.len().div_ceil(MAX_BATCH_SIZE)
            );
            let mut vectors = self.request(batch).await?;
            if self.normalize {
                vectors.iter_mut().for_each(|v| normalize(v));
            }
            results.extend(vectors);
        }

        Ok(results)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 벡터를 단위 길이로 정규화 (영벡터는 그대로)
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = vec![0.0; 4];
        normalize(&mut v);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_cpu_device_disables_gpu() {
        let embedder = OllamaEmbedding::new("http://localhost:11434/", "nomic-embed-text")
            .unwrap()
            .with_device(Device::Cpu);
        let request = EmbedRequest {
            model: &embedder.model,
            input: &["hi".to_string()],
            options: embedder.options(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["options"]["num_gpu"], 0);
        assert_eq!(embedder.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_gpu_device_omits_options() {
        let embedder = OllamaEmbedding::new("http://localhost:11434", "nomic-embed-text")
            .unwrap()
            .with_device(Device::Gpu);
        let request = EmbedRequest {
            model: &embedder.model,
            input: &[],
            options: embedder.options(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("options").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_returns_error() {
        // 포트 9 (discard)는 보통 닫혀 있음
        let embedder = OllamaEmbedding::new("http://127.0.0.1:9", "nomic-embed-text").unwrap();
        let result = embedder.embed("hello").await;
        assert!(result.is_err());
    }
}
