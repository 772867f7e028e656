//! 分类器配置

use std::path::PathBuf;
use std::time::Duration;

use rsappclass_engine::DEFAULT_TOP_N;

use super::{env_opt, env_parse};

/// 分类器运行配置
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// 采集流水线生成的规则文件
    pub rules_path: PathBuf,
    /// 生成规则不可用时的备用规则文件（仍不可用则使用内置规则）
    pub fallback_rules_path: Option<PathBuf>,
    /// 保留的候选数量
    pub top_n: usize,
    /// 外部修正调用的总超时
    pub refine_timeout: Duration,
    /// 批量分类时同时进行的外部修正调用上限
    pub refine_concurrency: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("/rules_cache/generated/combined_rules.yaml"),
            fallback_rules_path: None,
            top_n: DEFAULT_TOP_N,
            refine_timeout: Duration::from_secs(30),
            refine_concurrency: 4,
        }
    }
}

impl ClassifierConfig {
    /// RULES_PATH / RULES_FALLBACK_PATH / TOP_N / REFINE_TIMEOUT_SECS / REFINE_CONCURRENCY
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rules_path: env_opt("RULES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.rules_path),
            fallback_rules_path: env_opt("RULES_FALLBACK_PATH").map(PathBuf::from),
            top_n: env_parse("TOP_N", defaults.top_n),
            refine_timeout: Duration::from_secs(env_parse(
                "REFINE_TIMEOUT_SECS",
                defaults.refine_timeout.as_secs(),
            )),
            refine_concurrency: env_parse("REFINE_CONCURRENCY", defaults.refine_concurrency).max(1),
        }
    }

    pub fn with_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = path.into();
        self
    }

    pub fn with_fallback_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_rules_path = Some(path.into());
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_refine_timeout(mut self, timeout: Duration) -> Self {
        self.refine_timeout = timeout;
        self
    }

    pub fn with_refine_concurrency(mut self, limit: usize) -> Self {
        self.refine_concurrency = limit.max(1);
        self
    }
}
