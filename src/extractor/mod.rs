//! 콘텐츠 추출 모듈
//!
//! PDF 파일에서 텍스트를 추출합니다.

pub mod pdf;

use std::path::Path;

use anyhow::{Context, Result};

/// PDF 파일에서 전체 텍스트 로드
///
/// PDF 파싱은 CPU 바운드이므로 `spawn_blocking`에서 실행합니다.
pub async fn load_pdf_text(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&path))
        .await
        .context("PDF extraction task failed")?
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! 테스트용 최소 PDF 생성기

    /// Helvetica 텍스트 줄들로 구성된 한 페이지 PDF 바이트 생성
    ///
    /// 줄이 없으면 콘텐츠 스트림이 빈 페이지를 만듭니다.
    pub fn build_pdf(lines: &[&str]) -> Vec<u8> {
        let mut content = String::new();
        if !lines.is_empty() {
            content.push_str("BT\n/F1 10 Tf\n12 TL\n40 800 Td\n");
            for line in lines {
                content.push_str(&format!("({}) Tj\nT*\n", escape_pdf_string(line)));
            }
            content.push_str("ET\n");
        }

        let objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 842] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                content.len(),
                content
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
             /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }

    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }
}
