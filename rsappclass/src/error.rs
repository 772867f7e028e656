//! 全局错误类型定义
use rsappclass_engine::CoreError;
use serde_json::Error as SerdeJsonError;
use serde_yaml::Error as SerdeYamlError;
use std::io::Error as IoError;
use thiserror::Error;
use url::ParseError as UrlParseError;
use zip::result::ZipError;

#[derive(Error, Debug)]
pub enum RsAppError {
    // 规则相关错误
    #[error("规则加载失败：{0}")]
    RuleLoadError(String),
    #[error("规则持久化失败：{0}")]
    RulePersistError(String),
    #[error("规则库内核错误：{0}")]
    CoreError(#[from] CoreError),

    // 规则源获取相关错误
    #[error("规则源获取失败：{0}")]
    SourceFetchError(String),
    #[error("外部命令执行失败：{0}")]
    CommandError(String),
    #[error("压缩包解压失败：{0}")]
    ArchiveError(#[from] ZipError),

    // 网络相关错误
    #[cfg(feature = "remote-loader")]
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("YAML解析失败：{0}")]
    YamlError(#[from] SerdeYamlError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
    #[error("特性未启用：{0}")]
    FeatureDisabled(String),

    #[error("异步任务执行失败：{0}")]
    AsyncTaskError(String),
}

// 全局Result类型
pub type RsAppResult<T> = Result<T, RsAppError>;
