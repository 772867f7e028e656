//! 模板路径提示适配器
//! 模板格式不统一，只需要路径字符串，因此用正则做轻量文本提取而不做完整结构解析

use once_cell::sync::Lazy;
use regex::Regex;
use rsappclass_engine::Rule;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::RsAppResult;
use crate::rule::source::base_adapter::{ensure_source_root, file_stem, find_dirs_named, has_ext};
use crate::rule::source::{RuleSourceAdapter, SourceKind};

/// 每条规则最多保留的路径提示
const MAX_HINTS_PER_RULE: usize = 3;

// path:
//   - "{{BaseURL}}/wp-login.php"
static PATH_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"path:\s*-\s*"([^"]{1,80})""#).expect("static regex"));
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{[^}]*\}\}").expect("static regex"));

#[derive(Debug, Clone, Default)]
pub struct TemplateHintAdapter;

impl RuleSourceAdapter for TemplateHintAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::TemplateHint
    }

    fn build_rules(&self, root: &Path, max_rules: usize) -> RsAppResult<Vec<Rule>> {
        ensure_source_root(root)?;
        let mut rules = Vec::new();
        if max_rules == 0 {
            return Ok(rules);
        }

        // 嵌套的 technologies 目录会被重复遍历，按路径去重
        let mut visited = FxHashSet::default();
        for tech_dir in find_dirs_named(root, "technologies") {
            let files = WalkDir::new(&tech_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && has_ext(e.path(), "yaml"));

            for entry in files {
                if !visited.insert(entry.path().to_path_buf()) {
                    continue;
                }
                let Some(rule) = Self::convert_file(entry.path()) else {
                    continue;
                };
                rules.push(rule);
                if rules.len() >= max_rules {
                    log::info!("[TemplateHint] rule cap reached: {}", max_rules);
                    return Ok(rules);
                }
            }
        }

        Ok(rules)
    }
}

impl TemplateHintAdapter {
    fn convert_file(path: &Path) -> Option<Rule> {
        let stem = file_stem(path)?;
        let bytes = fs::read(path)
            .map_err(|e| log::debug!("[TemplateHint] read failed {}: {}", path.display(), e))
            .ok()?;
        let text = String::from_utf8_lossy(&bytes);

        Some(
            Rule::new(
                format!("nuclei-{}", stem),
                format!("Nuclei: {}", stem),
                SourceKind::TemplateHint.weight(),
            )
            .with_uri_substr(extract_path_hints(&text)),
        )
    }
}

/// 提取路径提示：去掉 {{...}} 占位符，丢弃空路径与根路径，最多保留 3 条
pub(crate) fn extract_path_hints(text: &str) -> Vec<String> {
    PATH_HINT
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| PLACEHOLDER.replace_all(m.as_str(), "").trim().to_lowercase())
        .filter(|hint| !hint.is_empty() && hint != "/")
        .take(MAX_HINTS_PER_RULE)
        .collect()
}
