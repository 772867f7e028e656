//! Ollama 生成接口：POST <base>/api/generate，读取 response 字段

use async_trait::async_trait;
use reqwest::Client;
use rsappclass_engine::TelemetryRecord;
use serde::Deserialize;
use serde_json::json;

use super::{first_line_label, LabelRefiner};
use crate::config::RefineConfig;
use crate::error::{RsAppError, RsAppResult};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

pub struct OllamaRefiner {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaRefiner {
    pub fn new(config: &RefineConfig) -> RsAppResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    async fn generate(&self, prompt: String) -> RsAppResult<String> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        log::debug!("Ollama request to {}", self.endpoint);
        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RsAppError::SourceFetchError(format!(
                "{} 返回状态码 {}",
                self.endpoint, status
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.response.unwrap_or_default())
    }
}

#[async_trait]
impl LabelRefiner for OllamaRefiner {
    async fn refine(&self, record: &TelemetryRecord, candidate_labels: &[String]) -> Option<String> {
        let prompt = match build_prompt(record, candidate_labels) {
            Ok(prompt) => prompt,
            Err(e) => {
                log::warn!("Failed to build refine prompt: {}", e);
                return None;
            }
        };

        match self.generate(prompt).await {
            Ok(text) => first_line_label(&text),
            Err(e) => {
                log::warn!("Label refinement failed: {}", e);
                None
            }
        }
    }
}

pub(crate) fn build_prompt(record: &TelemetryRecord, candidate_labels: &[String]) -> RsAppResult<String> {
    let telemetry = serde_json::to_string_pretty(record)?;
    let labels = serde_json::to_string(candidate_labels)?;
    Ok(format!(
        "You are an application fingerprinting assistant.\n\
         Given HTTP telemetry (host, uri, headers, cookies, user-agent), pick ONE best category label.\n\
         Prefer one of these labels if appropriate: {labels}.\n\
         If none fit, reply \"Unknown\". Return ONLY the label text.\n\
         Telemetry:\n\
         {telemetry}\n"
    ))
}
