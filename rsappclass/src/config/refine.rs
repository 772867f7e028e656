//! 外部标签修正服务配置

use std::time::Duration;

use super::{env_opt, env_or, env_parse};

#[derive(Debug, Clone)]
pub struct RefineConfig {
    /// 是否启用外部修正
    pub enabled: bool,
    /// 服务根地址
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// HTTP 超时
    pub timeout: Duration,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://ollama:11434".to_string(),
            model: "qwen2.5:3b-instruct-q4_K_M".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RefineConfig {
    /// USE_LLM=1 时启用；OLLAMA_URL / OLLAMA_MODEL / OLLAMA_TIMEOUT_SECS
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_opt("USE_LLM").as_deref() == Some("1"),
            base_url: env_or("OLLAMA_URL", &defaults.base_url),
            model: env_or("OLLAMA_MODEL", &defaults.model),
            timeout: Duration::from_secs(env_parse("OLLAMA_TIMEOUT_SECS", defaults.timeout.as_secs())),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
