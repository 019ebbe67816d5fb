//! CLI 모듈
//!
//! pdfrag CLI 명령어 정의 및 구현

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{normalize_ollama_url, Device, RagConfig};
use crate::knowledge::{ChatbotManager, EmbeddingsManager, LanceVectorStore, VectorStore};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "pdfrag")]
#[command(version, about = "PDF 기반 로컬 RAG 챗봇", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// 설정 덮어쓰기 플래그 (환경변수보다 우선)
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// 컬렉션 이름
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// 벡터 인덱스 저장 디렉토리
    #[arg(long, global = true)]
    pub persist_dir: Option<PathBuf>,

    /// 임베딩 모델
    #[arg(long, global = true)]
    pub embedding_model: Option<String>,

    /// LLM 모델
    #[arg(long, global = true)]
    pub llm_model: Option<String>,

    /// 생성 온도
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// 임베딩 디바이스 (cpu, gpu)
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Ollama 서버 주소
    #[arg(long, global = true)]
    pub ollama_url: Option<String>,
}

impl ConfigOverrides {
    /// 설정에 플래그 값 적용
    pub fn apply(&self, mut config: RagConfig) -> Result<RagConfig> {
        if let Some(ref v) = self.collection {
            config.collection_name = v.clone();
        }
        if let Some(ref v) = self.persist_dir {
            config.persist_directory = v.clone();
        }
        if let Some(ref v) = self.embedding_model {
            config.embedding_model = v.clone();
        }
        if let Some(ref v) = self.llm_model {
            config.llm_model = v.clone();
        }
        if let Some(v) = self.temperature {
            config.llm_temperature = v;
        }
        if let Some(ref v) = self.device {
            config.device = v.parse::<Device>()?;
        }
        if let Some(ref v) = self.ollama_url {
            config.ollama_url = normalize_ollama_url(v);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// PDF를 벡터 인덱스에 추가
    Ingest {
        /// PDF 파일 경로
        pdf: PathBuf,
    },

    /// 질문 하나에 답변
    Ask {
        /// 질문
        question: String,
    },

    /// 대화형 질의 (exit/quit로 종료)
    Chat,

    /// 질문과 가까운 청크만 검색
    Retrieve {
        /// 검색 쿼리
        query: String,
    },

    /// 설정 및 인덱스 상태 확인
    Status {
        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli
        .overrides
        .apply(RagConfig::from_env()?)
        .context("설정 오류")?;

    match cli.command {
        Commands::Ingest { pdf } => cmd_ingest(&config, pdf).await,
        Commands::Ask { question } => cmd_ask(&config, &question).await,
        Commands::Chat => cmd_chat(&config).await,
        Commands::Retrieve { query } => cmd_retrieve(&config, &query).await,
        Commands::Status { json } => cmd_status(&config, json).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 수집 명령어 (ingest)
async fn cmd_ingest(config: &RagConfig, pdf: PathBuf) -> Result<()> {
    println!("[*] 임베딩 생성 중: {}", pdf.display());

    let manager = EmbeddingsManager::from_config(config)
        .await
        .context("EmbeddingsManager 초기화 실패")?;

    let report = manager.create_embeddings(&pdf).await?;
    println!("[OK] {}", report);

    Ok(())
}

/// 질문 명령어 (ask)
async fn cmd_ask(config: &RagConfig, question: &str) -> Result<()> {
    let chatbot = ChatbotManager::from_config(config)
        .await
        .context("ChatbotManager 초기화 실패")?;

    println!("{}", chatbot.get_response(question).await);
    Ok(())
}

/// 대화형 명령어 (chat)
async fn cmd_chat(config: &RagConfig) -> Result<()> {
    let chatbot = ChatbotManager::from_config(config)
        .await
        .context("ChatbotManager 초기화 실패")?;

    println!(
        "[*] 컬렉션 '{}' 대화 시작 (모델: {}). 종료: exit",
        config.collection_name, config.llm_model
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().context("stdout flush 실패")?;

        let Some(line) = lines.next_line().await.context("입력 읽기 실패")? else {
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        println!("{}\n", chatbot.get_response(question).await);
    }

    Ok(())
}

/// 검색 명령어 (retrieve)
async fn cmd_retrieve(config: &RagConfig, query: &str) -> Result<()> {
    let chatbot = ChatbotManager::from_config(config)
        .await
        .context("ChatbotManager 초기화 실패")?;

    let results = chatbot.retrieve(query).await?;

    if results.is_empty() {
        println!("[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("[OK] 검색 결과 ({} 건):\n", results.len());
    for (i, result) in results.iter().enumerate() {
        println!("{}. [유사도: {:.4}]", i + 1, result.similarity);
        println!("   {}", truncate_text(&result.text, 200));
        println!();
    }

    Ok(())
}

/// 상태 출력용
#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    version: &'a str,
    config: &'a RagConfig,
    indexed_chunks: Option<usize>,
}

/// 상태 명령어 (status)
async fn cmd_status(config: &RagConfig, json: bool) -> Result<()> {
    let indexed_chunks =
        match LanceVectorStore::open(&config.persist_directory, &config.collection_name).await {
            Ok(store) => match store.count().await {
                Ok(count) => Some(count),
                Err(e) => {
                    tracing::debug!("벡터 개수 조회 실패: {:#}", e);
                    None
                }
            },
            Err(e) => {
                tracing::debug!("LanceDB 열기 실패: {:#}", e);
                None
            }
        };

    let report = StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        config,
        indexed_chunks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("pdfrag v{}", report.version);
    println!();
    println!("[*] 인덱스 디렉토리: {}", config.persist_directory.display());
    println!("[*] 컬렉션: {}", config.collection_name);
    println!(
        "[*] 임베딩: {} ({}, normalize={})",
        config.embedding_model, config.device, config.normalize_embeddings
    );
    println!(
        "[*] LLM: {} (temperature={})",
        config.llm_model, config.llm_temperature
    );
    println!("[*] Ollama: {}", config.ollama_url);

    match indexed_chunks {
        Some(count) => println!("[OK] 벡터 인덱스: {} 청크", count),
        None => println!("[!] 벡터 인덱스를 열 수 없습니다"),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================
