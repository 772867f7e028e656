//! rsappclass - 基于规则的 HTTP 遥测应用分类器
//!
//! - 采集：多个上游指纹库 -> 标准规则 -> 原子写入 YAML
//! - 分类：规则打分取前 N 个候选，可选外部服务修正最终标签

pub mod config;
pub mod detector;
pub mod error;
pub mod refine;
pub mod rule;
pub mod utils;

// 导出全局错误类型
pub use self::error::{RsAppError, RsAppResult};

// 导出配置
pub use crate::config::{
    ClassifierConfig, RefineConfig, SourceConfig, SourceOrigin, SourcesConfig, SourcesConfigBuilder,
};

// 导出分类接口
pub use crate::detector::{Classification, Classifier, ClassifyResponse, HealthStatus};

// 导出标签修正
pub use crate::refine::{build_refiner, DisabledRefiner, LabelRefiner};
#[cfg(feature = "remote-loader")]
pub use crate::refine::OllamaRefiner;

// 导出规则采集与加载
pub use crate::rule::{
    GitSourceFetcher, IngestPipeline, IngestReport, RuleAggregator, RuleCacheManager, RuleLoader,
    RuleSourceAdapter, SourceFetcher, SourceKind, StoreOrigin,
};

pub use crate::utils::HeaderConverter;

// 规则库内核
pub use rsappclass_engine::{MatchResult, Rule, RuleStore, TelemetryRecord};
