//! AI 代码分析客户端
//!
//! 分析服务对业务层是黑盒：`(language, code) -> text`，在限定时间内返回或失败。
//! 默认实现调用 Ollama 兼容的 `POST {base_url}/api/generate`，不做自动重试。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::errors::{AppError, Result};
use crate::models::submissions::entities::Language;

#[async_trait]
pub trait CodeAnalyzer: Send + Sync {
    /// 连接失败返回 `AnalysisUnavailable`，其余失败返回 `AnalysisFailed`
    async fn analyze(&self, language: Language, code: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct OllamaAnalyzer {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::info!("Code analyzer: {} at {}", config.model, base_url);

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
        })
    }

    fn build_prompt(language: Language, code: &str) -> String {
        format!(
            "Review the following {language} code. Point out bugs, readability issues and \
             possible improvements.\n\n```{language}\n{code}\n```"
        )
    }
}

/// 将传输层错误映射为对外错误分类
fn map_transport_error(err: reqwest::Error) -> AppError {
    if err.is_connect() {
        AppError::analysis_unavailable("AI analysis service is unavailable")
    } else if err.is_timeout() {
        AppError::analysis_failed("AI analysis timed out")
    } else {
        AppError::analysis_failed(format!("AI analysis request failed: {err}"))
    }
}

#[async_trait]
impl CodeAnalyzer for OllamaAnalyzer {
    async fn analyze(&self, language: Language, code: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt: Self::build_prompt(language, code),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("AI analysis returned HTTP {}", status);
            return Err(AppError::analysis_failed(format!(
                "AI analysis service returned HTTP {status}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(map_transport_error)?;
        let text = body.response.trim();
        if text.is_empty() {
            return Err(AppError::analysis_failed(
                "AI analysis service returned an empty result",
            ));
        }

        Ok(text.to_string())
    }
}

pub fn create_analyzer(config: &AnalyzerConfig) -> Result<Arc<dyn CodeAnalyzer>> {
    Ok(Arc::new(OllamaAnalyzer::new(config)?))
}
