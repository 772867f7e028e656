//! 规则源适配模块
//! 三类上游规则源结构互不兼容，统一转换为标准 Rule 列表

pub mod base_adapter;
pub mod plugin_name;
pub mod tech_catalog;
pub mod template_hint;

// 通用适配器导出
pub use base_adapter::{RuleSourceAdapter, SourceKind};
// 各源适配器导出
pub use plugin_name::adapter::PluginNameAdapter;
pub use tech_catalog::adapter::TechCatalogAdapter;
pub use template_hint::adapter::TemplateHintAdapter;
