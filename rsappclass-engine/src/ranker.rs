//! 候选排序：对规则库逐条打分，过滤零分，按得分稳定降序取前 N

use crate::core::{MatchResult, PreparedRecord, TelemetryRecord, UNKNOWN_LABEL};
use crate::matcher::Matcher;
use crate::store::RuleStore;

/// 默认保留的候选数量
pub const DEFAULT_TOP_N: usize = 3;

/// 对单条记录排序候选规则
/// 同分时保持规则库中的原始相对顺序
pub fn rank_matches(store: &RuleStore, record: &TelemetryRecord, top_n: usize) -> Vec<MatchResult> {
    let prepared = PreparedRecord::from(record);

    let mut results: Vec<MatchResult> = store
        .compiled_rules()
        .iter()
        .filter_map(|rule| {
            let score = Matcher::score(rule, &prepared);
            (score > 0).then(|| MatchResult {
                rule_id: rule.id().to_string(),
                label: rule.label().to_string(),
                score,
            })
        })
        .collect();

    // sort_by 为稳定排序
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(top_n);
    results
}

/// 首个候选的标签，无候选时返回 "Unknown"
pub fn best_label(top_matches: &[MatchResult]) -> &str {
    top_matches
        .first()
        .map(|m| m.label.as_str())
        .unwrap_or(UNKNOWN_LABEL)
}
