//! 配置模块：规则源 / 分类器 / 外部修正服务
//! 每类配置都提供 Default、链式构建以及 from_env

pub mod classifier;
pub mod refine;
pub mod source;

pub use classifier::ClassifierConfig;
pub use refine::RefineConfig;
pub use source::{default_branch_for, SourceConfig, SourceOrigin, SourcesConfig, SourcesConfigBuilder};

use std::env;
use std::str::FromStr;

/// 读取非空环境变量
pub(crate) fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// 解析数值型环境变量，解析失败时记录警告并使用默认值
pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env_opt(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid value for {}: {:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}
