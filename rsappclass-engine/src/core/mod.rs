mod compiled;
mod match_result;
mod record;
mod rule;

// 导出常用项
pub use compiled::{compile_header_pattern, CompiledRule};
pub use match_result::MatchResult;
pub use record::{PreparedRecord, TelemetryRecord};
pub use rule::{Rule, BASELINE_RULE_ID, DEFAULT_WEIGHT, UNKNOWN_LABEL};
