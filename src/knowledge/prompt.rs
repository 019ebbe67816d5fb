//! 프롬프트 템플릿
//!
//! 검색된 청크(context)와 질문(question)을 고정 템플릿에 채워 넣습니다.
//! 마무리 문구와 "I dont know" 규칙은 모델 지시로만 요구되며 검증하지 않습니다.

use super::vector::SearchResult;

/// 답변 끝에 붙이도록 지시하는 문구
pub const CLOSING_PHRASE: &str = "thanks for asking! ";

/// 문맥이 부족할 때 답하도록 지시하는 문구
pub const UNKNOWN_ANSWER: &str = "I dont know";

/// 기본 QA 템플릿
pub const DEFAULT_TEMPLATE: &str = r#"Try to answer the following question by carefully checking the context. Always say "thanks for asking! " at the end of the answer. If you dont know the answer, say "I dont know".

context:
{context}

Question:
{question}
"#;

/// `{context}`, `{question}` 자리표시자를 가진 QA 프롬프트 템플릿
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// context/question QA 템플릿
    pub fn qa() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// 변수 치환
    ///
    /// 템플릿 원문에서만 자리표시자를 찾으므로 치환된 값 안의 `{...}`는 그대로 남습니다.
    fn format(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let replaced = after.find('}').and_then(|close| {
                let name = &after[..close];
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (close, *value))
            });

            match replaced {
                Some((close, value)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// 검색 결과를 context로 합쳐 QA 프롬프트 생성
    pub fn format_qa(&self, documents: &[SearchResult], question: &str) -> String {
        let context = stuff_documents(documents);
        self.format(&[("context", context.as_str()), ("question", question)])
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::qa()
    }
}

/// 청크 텍스트를 빈 줄로 이어 붙임
pub fn stuff_documents(documents: &[SearchResult]) -> String {
    documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ============================================================================
// Tests
// ============================================================================
