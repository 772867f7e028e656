use regex::{Regex, RegexBuilder};

use super::rule::Rule;
use crate::error::CoreResult;

/// 编译后的运行时规则
/// - 子串信号统一小写；空串照常参与匹配（是任意输入的子串）
/// - Header 正则以忽略大小写方式预编译，编译失败的模式直接丢弃
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    pub(crate) uri_substr: Vec<String>,
    pub(crate) header_regexes: Vec<Regex>,
    pub(crate) cookie_any: Vec<String>,
    pub(crate) ua_any: Vec<String>,
}

impl CompiledRule {
    pub fn compile(rule: Rule) -> Self {
        let header_regexes = rule
            .header_any
            .iter()
            .filter_map(|pattern| match compile_header_pattern(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!(
                        "Header regex dropped: rule={} pattern={} error={}",
                        rule.id,
                        pattern,
                        e
                    );
                    None
                }
            })
            .collect();

        Self {
            uri_substr: lower_all(&rule.uri_substr),
            cookie_any: lower_all(&rule.cookie_any),
            ua_any: lower_all(&rule.ua_any),
            header_regexes,
            rule,
        }
    }

    #[inline]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.rule.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.rule.label
    }

    #[inline]
    pub fn weight(&self) -> i32 {
        self.rule.weight
    }

    /// 实际生效的 Header 正则数量
    pub fn header_regex_count(&self) -> usize {
        self.header_regexes.len()
    }
}

/// 忽略大小写编译单条 Header 正则
pub fn compile_header_pattern(pattern: &str) -> CoreResult<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

fn lower_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_regex_is_dropped() {
        let rule = Rule::new("r", "R", 50).with_header_any(["server: (nginx", "server: .*apache"]);
        let compiled = CompiledRule::compile(rule);
        assert_eq!(compiled.header_regex_count(), 1);
    }

    #[test]
    fn test_empty_substrings_are_kept() {
        let rule = Rule::new("r", "R", 50)
            .with_uri_substr(["", "/Admin"])
            .with_ua_any([""]);
        let compiled = CompiledRule::compile(rule);
        assert_eq!(compiled.uri_substr, vec!["".to_string(), "/admin".to_string()]);
        assert_eq!(compiled.ua_any, vec!["".to_string()]);
    }
}
