//! 分类模块：规则打分 + 可选标签修正
pub mod classifier;

pub use self::classifier::{resolve_label, Classification, Classifier, ClassifyResponse, HealthStatus};
