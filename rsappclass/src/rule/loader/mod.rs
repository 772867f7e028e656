//! 规则加载模块
//! 规则源获取、采集流水线、规则库加载
pub mod archive;
pub mod ingest_pipeline;
pub mod rule_loader;
pub mod source_fetcher;

pub use archive::ArchiveFetcher;
pub use ingest_pipeline::{IngestPipeline, IngestReport, SourceReport};
pub use rule_loader::{LoadedRuleStore, RuleLoader, StoreOrigin};
pub use source_fetcher::{codeload_archive_url, GitSourceFetcher, SourceFetcher};
