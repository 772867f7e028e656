// 核心数据模型：规则 / 遥测记录 / 命中结果 / 编译规则
pub mod core;
// 内核错误
pub mod error;
// 四维度信号打分
pub mod matcher;
// 候选排序
pub mod ranker;
// 只读规则库
pub mod store;

// 顶层导出常用类型
pub use crate::core::{
    CompiledRule, MatchResult, PreparedRecord, Rule, TelemetryRecord, BASELINE_RULE_ID,
    DEFAULT_WEIGHT, UNKNOWN_LABEL,
};
pub use error::{CoreError, CoreResult};
pub use matcher::{Matcher, Signal};
pub use ranker::{best_label, rank_matches, DEFAULT_TOP_N};
pub use store::RuleStore;
