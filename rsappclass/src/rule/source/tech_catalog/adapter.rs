//! 技术目录适配器
//! 读取 <root>/src/technologies/*.json 与 <root>/*/src/technologies/*.json

use once_cell::sync::Lazy;
use regex::Regex;
use rsappclass_engine::Rule;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::original::{TechCatalogOriginalEntry, TechCatalogOriginalFile};
use crate::error::RsAppResult;
use crate::rule::source::base_adapter::{ensure_source_root, list_files_with_ext};
use crate::rule::source::{RuleSourceAdapter, SourceKind};

/// URL 提示最大长度（字符）
const MAX_URL_HINT_CHARS: usize = 120;

static NON_ID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// 技术目录适配器
#[derive(Debug, Clone, Default)]
pub struct TechCatalogAdapter;

impl RuleSourceAdapter for TechCatalogAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::TechCatalog
    }

    fn build_rules(&self, root: &Path, max_rules: usize) -> RsAppResult<Vec<Rule>> {
        ensure_source_root(root)?;
        let mut rules = Vec::new();
        if max_rules == 0 {
            return Ok(rules);
        }

        for tech_dir in Self::catalog_dirs(root) {
            for file in list_files_with_ext(&tech_dir, "json") {
                let catalog = match Self::read_catalog_file(&file) {
                    Some(catalog) => catalog,
                    None => continue,
                };

                for (name, raw) in catalog {
                    let Some(rule) = Self::convert_entry(&name, raw) else {
                        log::debug!("[TechCatalog] skip malformed entry: {}", name);
                        continue;
                    };
                    rules.push(rule);
                    if rules.len() >= max_rules {
                        log::info!("[TechCatalog] rule cap reached: {}", max_rules);
                        return Ok(rules);
                    }
                }
            }
        }

        Ok(rules)
    }
}

impl TechCatalogAdapter {
    /// 候选目录：根目录本身及其一级子目录下的 src/technologies
    fn catalog_dirs(root: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![root.to_path_buf()];
        if let Ok(entries) = fs::read_dir(root) {
            let mut children: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
            children.sort();
            candidates.extend(children);
        }
        candidates
            .into_iter()
            .map(|p| p.join("src").join("technologies"))
            .filter(|p| p.is_dir())
            .collect()
    }

    fn read_catalog_file(path: &Path) -> Option<TechCatalogOriginalFile> {
        let content = fs::read_to_string(path)
            .map_err(|e| log::debug!("[TechCatalog] read failed {}: {}", path.display(), e))
            .ok()?;
        serde_json::from_str(&content)
            .map_err(|e| log::debug!("[TechCatalog] JSON decode failed {}: {}", path.display(), e))
            .ok()
    }

    /// 单个技术定义 → 标准规则；结构不合法或名称为空时返回 None
    fn convert_entry(name: &str, raw: Value) -> Option<Rule> {
        let id = tech_id(name);
        if id.is_empty() || !raw.is_object() {
            return None;
        }
        let entry: TechCatalogOriginalEntry = serde_json::from_value(raw).ok()?;

        let header_any = entry
            .headers
            .unwrap_or_default()
            .into_iter()
            .map(|(header, value)| {
                format!(
                    "{}: .*{}",
                    header.to_lowercase(),
                    strip_tag_suffix(&value_text(&value)).to_lowercase()
                )
            });

        let cookie_any = entry
            .cookies
            .unwrap_or_default()
            .into_iter()
            .map(|(cookie, _)| cookie.to_lowercase());

        let uri_substr = url_hints(entry.url.as_ref())
            .into_iter()
            .map(|u| u.to_lowercase().chars().take(MAX_URL_HINT_CHARS).collect::<String>());

        Some(
            Rule::new(id, format!("Tech: {}", name), SourceKind::TechCatalog.weight())
                .with_header_any(header_any)
                .with_cookie_any(cookie_any)
                .with_uri_substr(uri_substr),
        )
    }
}

/// 技术名 → 规则 ID：小写后非 [a-z0-9] 连续字符替换为 "-"
pub(crate) fn tech_id(name: &str) -> String {
    NON_ID_CHARS.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// 去掉 "\;version:\1" / "\;confidence:50" 之类的标签后缀
fn strip_tag_suffix(pattern: &str) -> &str {
    pattern.split("\\;").next().unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// url 字段兼容单字符串 / 字符串数组，非字符串项忽略
fn url_hints(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::aggregator::RuleAggregator;

    fn write_catalog(root: &Path, file: &str, content: &str) {
        let dir = root.join("src/technologies");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_tech_id() {
        assert_eq!(tech_id("WordPress"), "wordpress");
        assert_eq!(tech_id("Microsoft ASP.NET"), "microsoft-asp-net");
        assert_eq!(tech_id("1C-Bitrix"), "1c-bitrix");
        assert_eq!(tech_id(""), "");
    }

    #[test]
    fn test_convert_catalog() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(
            dir.path(),
            "n.json",
            r#"{
                "Nginx": {
                    "cats": [22],
                    "headers": {"Server": "nginx(?:/([\\d.]+))?\\;version:\\1"},
                    "cookies": {"NGX_SESS": ""},
                    "url": "/NGINX_STATUS"
                },
                "Broken": "not an object",
                "Multi Url": {"url": ["/a", 42, "/B"]}
            }"#,
        );

        let rules = TechCatalogAdapter.build_rules(dir.path(), 100).unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["nginx", "multi-url"]);

        let nginx = &rules[0];
        assert_eq!(nginx.label, "Tech: Nginx");
        assert_eq!(nginx.weight, 70);
        assert_eq!(nginx.header_any, vec![r"server: .*nginx(?:/([\d.]+))?".to_string()]);
        assert_eq!(nginx.cookie_any, vec!["ngx_sess".to_string()]);
        assert_eq!(nginx.uri_substr, vec!["/nginx_status".to_string()]);
        assert!(nginx.ua_any.is_empty());

        assert_eq!(rules[1].uri_substr, vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn test_file_order_decides_duplicates_and_cap() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(
            dir.path(),
            "d.json",
            r#"{
                "nginx": {"url": "/first"},
                "Nginx": {"url": "/second"},
                "Zeta": {"headers": {"X-Zeta": "1", "Server": "zeta"}},
                "Alpha": {}
            }"#,
        );

        let rules = TechCatalogAdapter.build_rules(dir.path(), 100).unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["nginx", "nginx", "zeta", "alpha"]);
        assert_eq!(
            rules[2].header_any,
            vec!["x-zeta: .*1".to_string(), "server: .*zeta".to_string()]
        );

        let merged = RuleAggregator::aggregate(vec![(SourceKind::TechCatalog, rules)]);
        let nginx = merged.iter().find(|r| r.id == "nginx").unwrap();
        assert_eq!(nginx.uri_substr, vec!["/first".to_string()]);

        let capped = TechCatalogAdapter.build_rules(dir.path(), 3).unwrap();
        let ids: Vec<&str> = capped.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["nginx", "nginx", "zeta"]);
    }

    #[test]
    fn test_bad_file_is_skipped_and_nested_layout_found() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("wappalyzer-main");
        write_catalog(&nested, "a.json", "{ this is not json");
        write_catalog(&nested, "b.json", r#"{"PHP": {"cookies": {"PHPSESSID": ""}}}"#);

        let rules = TechCatalogAdapter.build_rules(dir.path(), 100).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "php");
    }

    #[test]
    fn test_url_hint_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let long = "x".repeat(300);
        write_catalog(dir.path(), "l.json", &format!(r#"{{"Long": {{"url": "{}"}}}}"#, long));
        let rules = TechCatalogAdapter.build_rules(dir.path(), 100).unwrap();
        assert_eq!(rules[0].uri_substr[0].chars().count(), 120);
    }

    #[test]
    fn test_cap() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "c.json", r#"{"A": {}, "B": {}, "C": {}}"#);
        let rules = TechCatalogAdapter.build_rules(dir.path(), 2).unwrap();
        assert_eq!(rules.len(), 2);
    }
}
