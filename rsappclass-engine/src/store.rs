//! 规则库：加载后只读，可跨线程共享

use rustc_hash::FxHashSet;

use crate::core::{CompiledRule, Rule};
use crate::error::{CoreError, CoreResult};

/// 已编译、按 ID 去重、非空的有序规则集
#[derive(Debug, Clone)]
pub struct RuleStore {
    rules: Vec<CompiledRule>,
    labels: Vec<String>,
}

impl RuleStore {
    /// 构建规则库
    /// - 空列表返回错误
    /// - 重复 ID 保留首次出现的规则
    pub fn new(rules: Vec<Rule>) -> CoreResult<Self> {
        if rules.is_empty() {
            return Err(CoreError::EmptyRuleStore(
                "at least one rule is required".to_string(),
            ));
        }

        let total = rules.len();
        let mut seen = FxHashSet::default();
        let mut compiled = Vec::with_capacity(total);
        for rule in rules {
            if !seen.insert(rule.id.clone()) {
                log::warn!("Duplicate rule id dropped: {}", rule.id);
                continue;
            }
            compiled.push(CompiledRule::compile(rule));
        }

        let mut label_seen = FxHashSet::default();
        let labels = compiled
            .iter()
            .filter(|r| label_seen.insert(r.label()))
            .map(|r| r.label().to_string())
            .collect();

        log::debug!(
            "RuleStore built | input rules: {} | unique rules: {}",
            total,
            compiled.len()
        );

        Ok(Self {
            rules: compiled,
            labels,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 构造时已保证非空，恒为 false
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn compiled_rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(CompiledRule::rule)
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id).map(CompiledRule::rule)
    }

    /// 全部已知标签（规则库顺序，去重）
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_rejected() {
        assert!(matches!(RuleStore::new(Vec::new()), Err(CoreError::EmptyRuleStore(_))));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let store = RuleStore::new(vec![
            Rule::new("a", "First", 70),
            Rule::new("b", "Other", 60),
            Rule::new("a", "Second", 40),
        ])
        .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().label, "First");
        let ids: Vec<&str> = store.rules().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_labels_are_deduplicated_in_order() {
        let store = RuleStore::new(vec![
            Rule::new("a", "Tech: Nginx", 70),
            Rule::new("b", "Tech: PHP", 70),
            Rule::new("c", "Tech: Nginx", 60),
        ])
        .unwrap();
        assert_eq!(store.labels(), &["Tech: Nginx".to_string(), "Tech: PHP".to_string()]);
    }
}
