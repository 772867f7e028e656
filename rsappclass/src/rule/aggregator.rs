//! 规则聚合：按固定优先级拼接各源产出，按 ID 去重，空结果替换为占位规则

use rsappclass_engine::Rule;
use rustc_hash::FxHashSet;

use crate::rule::source::SourceKind;

#[derive(Debug, Default)]
pub struct RuleAggregator;

impl RuleAggregator {
    /// 聚合各源规则
    /// - 按 SourceKind 优先级拼接（传入顺序无关）
    /// - 同 ID 保留首次出现
    /// - 结果为空时返回唯一的占位规则
    pub fn aggregate<I>(batches: I) -> Vec<Rule>
    where
        I: IntoIterator<Item = (SourceKind, Vec<Rule>)>,
    {
        let mut batches: Vec<(SourceKind, Vec<Rule>)> = batches.into_iter().collect();
        batches.sort_by_key(|(kind, _)| kind.priority());

        let mut seen = FxHashSet::default();
        let mut merged = Vec::new();
        let mut duplicates = 0usize;
        for (_, rules) in batches {
            for rule in rules {
                if seen.insert(rule.id.clone()) {
                    merged.push(rule);
                } else {
                    duplicates += 1;
                }
            }
        }

        if duplicates > 0 {
            log::debug!("Aggregator dropped {} duplicate rule ids", duplicates);
        }

        if merged.is_empty() {
            log::warn!("No rules from any source, falling back to baseline placeholder");
            return vec![Rule::baseline()];
        }
        merged
    }
}
