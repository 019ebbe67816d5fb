//! 테스트용 임베딩/LLM 구현
//!
//! 외부 서비스 없이 파이프라인을 검증하기 위한 결정적 구현입니다.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::{normalize, EmbeddingProvider};
use crate::llm::LanguageModel;

use super::prompt::{CLOSING_PHRASE, UNKNOWN_ANSWER};

const HASH_DIMENSION: usize = 64;

/// 단어 해시 기반 bag-of-words 임베딩
pub struct HashEmbedding;

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; HASH_DIMENSION];
                for token in tokens(text) {
                    // FNV-1a
                    let hash = token.bytes().fold(0xcbf29ce484222325u64, |h, b| {
                        (h ^ b as u64).wrapping_mul(0x100000001b3)
                    });
                    v[(hash % HASH_DIMENSION as u64) as usize] += 1.0;
                }
                normalize(&mut v);
                v
            })
            .collect())
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// 항상 실패하는 임베딩
pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingProvider for FailingEmbedding {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        anyhow::bail!("embedding service unavailable")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// 프롬프트 지시를 따르는 흉내 모델
///
/// 질문 키워드가 가장 많이 겹치는 context 문장으로 답하고 마무리 문구를 붙입니다.
/// 겹치는 문장이 없으면 "I dont know"로 답합니다.
#[derive(Default)]
pub struct ExtractiveLlm {
    pub prompts: Mutex<Vec<String>>,
}

impl ExtractiveLlm {
    fn answer(prompt: &str) -> String {
        let context = prompt
            .split_once("context:\n")
            .and_then(|(_, rest)| rest.split_once("\n\nQuestion:\n"))
            .map(|(ctx, _)| ctx)
            .unwrap_or("");
        let question = prompt
            .rsplit_once("Question:\n")
            .map(|(_, q)| q)
            .unwrap_or("");

        let keywords: Vec<String> = tokens(question).filter(|t| t.len() > 3).collect();

        let best = context
            .split(['.', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|sentence| {
                let words: Vec<String> = tokens(sentence).collect();
                let score = keywords.iter().filter(|k| words.contains(k)).count();
                (score, sentence)
            })
            .filter(|(score, _)| *score > 0)
            .max_by_key(|(score, _)| *score);

        match best {
            Some((_, sentence)) => format!("{}. {}", sentence, CLOSING_PHRASE),
            None => format!("{}. {}", UNKNOWN_ANSWER, CLOSING_PHRASE),
        }
    }
}

#[async_trait]
impl LanguageModel for ExtractiveLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(Self::answer(prompt))
    }

    fn name(&self) -> &str {
        "extractive"
    }
}
