//! 技术目录原始规则模型
//! 仅存放采集需要的字段，其余字段在反序列化时忽略
//! 对象一律用 serde_json::Map（preserve_order），保持文件中的书写顺序

use serde::Deserialize;
use serde_json::{Map, Value};

/// 单个技术的原始定义
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechCatalogOriginalEntry {
    /// Header 名 → 值模式（可能带 "\;version:\1" 之类的标签后缀）
    #[serde(default)]
    pub headers: Option<Map<String, Value>>,
    /// Cookie 名 → 值模式（采集只关心名称）
    #[serde(default)]
    pub cookies: Option<Map<String, Value>>,
    /// URL 模式：单字符串或字符串数组
    #[serde(default)]
    pub url: Option<Value>,
}

/// 单个技术目录文件：技术名 → 原始定义（保留 Value，逐条解析）
pub type TechCatalogOriginalFile = Map<String, Value>;
