//! 规则模块：规则源适配、采集、聚合与持久化
pub mod aggregator;
pub mod cache;
pub mod loader;
pub mod source;

pub use aggregator::RuleAggregator;
pub use cache::RuleCacheManager;
pub use loader::{
    GitSourceFetcher, IngestPipeline, IngestReport, LoadedRuleStore, RuleLoader, SourceFetcher,
    SourceReport, StoreOrigin,
};
pub use source::{RuleSourceAdapter, SourceKind};
