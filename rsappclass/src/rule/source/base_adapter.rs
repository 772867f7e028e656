//! 通用规则源适配器 Trait + 规则源枚举

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use rsappclass_engine::Rule;
use serde::{Serialize, Serializer};
use walkdir::WalkDir;

use crate::error::{RsAppError, RsAppResult};
use crate::rule::source::{PluginNameAdapter, TechCatalogAdapter, TemplateHintAdapter};

/// 规则源类型（封闭集合，声明顺序即优先级顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// 技术目录（每个文件描述一组技术的 Header / Cookie / URL 特征）
    TechCatalog,
    /// 模板路径提示（深层目录下的模板文件，仅提取路径）
    TemplateHint,
    /// 插件名称（仅提供低置信度标签）
    PluginName,
}

impl SourceKind {
    /// 采集与去重的固定优先级顺序
    pub const ALL: [SourceKind; 3] = [
        SourceKind::TechCatalog,
        SourceKind::TemplateHint,
        SourceKind::PluginName,
    ];

    pub fn priority(&self) -> u8 {
        match self {
            SourceKind::TechCatalog => 1,
            SourceKind::TemplateHint => 2,
            SourceKind::PluginName => 3,
        }
    }

    /// 该源产出规则的基础权重
    pub fn weight(&self) -> i32 {
        match self {
            SourceKind::TechCatalog => 70,
            SourceKind::TemplateHint => 60,
            SourceKind::PluginName => 40,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::TechCatalog => "wappalyzer",
            SourceKind::TemplateHint => "nuclei",
            SourceKind::PluginName => "whatweb",
        }
    }

    /// 缓存目录下的本地目录名
    pub fn dir_name(&self) -> &'static str {
        match self {
            SourceKind::TechCatalog => "wappalyzer",
            SourceKind::TemplateHint => "nuclei-templates",
            SourceKind::PluginName => "whatweb",
        }
    }

    /// 覆盖规则源位置的环境变量
    pub fn env_key(&self) -> &'static str {
        match self {
            SourceKind::TechCatalog => "SOURCES_WAPPALYZER",
            SourceKind::TemplateHint => "SOURCES_NUCLEI",
            SourceKind::PluginName => "SOURCES_WHATWEB",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            SourceKind::TechCatalog => "https://github.com/AliasIO/wappalyzer.git",
            SourceKind::TemplateHint => "https://github.com/projectdiscovery/nuclei-templates.git",
            SourceKind::PluginName => "https://github.com/urbanadventurer/WhatWeb.git",
        }
    }

    /// 对应的适配器实现
    pub fn adapter(&self) -> &'static dyn RuleSourceAdapter {
        match self {
            SourceKind::TechCatalog => &TechCatalogAdapter,
            SourceKind::TemplateHint => &TemplateHintAdapter,
            SourceKind::PluginName => &PluginNameAdapter,
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

impl Serialize for SourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// 规则源适配器特质
/// 约定：
/// 1. 单项（文件 / 条目）解析失败直接跳过，不影响其余条目
/// 2. 仅当整个源目录不可用时返回错误
/// 3. 产出数量不超过 max_rules
pub trait RuleSourceAdapter: std::fmt::Debug + Send + Sync {
    fn kind(&self) -> SourceKind;

    fn build_rules(&self, root: &Path, max_rules: usize) -> RsAppResult<Vec<Rule>>;
}

/// 校验规则源根目录可用
pub(crate) fn ensure_source_root(root: &Path) -> RsAppResult<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(RsAppError::RuleLoadError(format!(
            "规则源目录不存在或不可读：{}",
            root.display()
        )))
    }
}

/// 递归查找名为 dir_name 的目录（跳过 .git），按文件名排序
pub(crate) fn find_dirs_named(root: &Path, dir_name: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir() && e.file_name() == dir_name)
        .map(|e| e.into_path())
        .collect()
}

/// 目录下（非递归）指定扩展名的文件，按文件名排序
pub(crate) fn list_files_with_ext(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        log::debug!("Skip unreadable directory: {}", dir.display());
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_ext(p, ext))
        .collect();
    files.sort();
    files
}

pub(crate) fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// 文件名去扩展名
pub(crate) fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}
