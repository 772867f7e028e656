//! 标签修正：把遥测记录与已知标签交给外部服务，取回一个标签
//! 任何失败都折叠为"无结果"，调用方永远不会因为修正失败而报错

#[cfg(feature = "remote-loader")]
pub mod ollama;

use async_trait::async_trait;
use rsappclass_engine::TelemetryRecord;
use std::sync::Arc;

use crate::config::RefineConfig;
use crate::error::RsAppResult;

#[cfg(feature = "remote-loader")]
pub use ollama::OllamaRefiner;

/// 标签修正能力
#[async_trait]
pub trait LabelRefiner: Send + Sync {
    /// 健康检查中报告的启用状态
    fn is_enabled(&self) -> bool {
        true
    }

    /// 返回修正后的标签；None 表示无结果
    async fn refine(&self, record: &TelemetryRecord, candidate_labels: &[String]) -> Option<String>;
}

/// 未启用修正
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRefiner;

#[async_trait]
impl LabelRefiner for DisabledRefiner {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn refine(&self, _record: &TelemetryRecord, _candidate_labels: &[String]) -> Option<String> {
        None
    }
}

/// 按配置构建修正器
pub fn build_refiner(config: &RefineConfig) -> RsAppResult<Arc<dyn LabelRefiner>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledRefiner));
    }

    #[cfg(feature = "remote-loader")]
    {
        log::info!("Label refinement enabled: {} ({})", config.base_url, config.model);
        Ok(Arc::new(OllamaRefiner::new(config)?))
    }

    #[cfg(not(feature = "remote-loader"))]
    {
        Err(crate::error::RsAppError::FeatureDisabled(
            "标签修正需要启用 remote-loader 特性".to_string(),
        ))
    }
}

/// 只取回复的第一行（去空白），空回复视为无结果
pub fn first_line_label(text: &str) -> Option<String> {
    text.trim()
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}
