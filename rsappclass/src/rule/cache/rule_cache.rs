//! 规则文件读写
//! 写入先落到同目录临时文件再 rename，读方永远看不到写了一半的文件

use rsappclass_engine::Rule;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{RsAppError, RsAppResult};

/// 随程序打包的默认规则
pub(crate) const EMBEDDED_RULES_YAML: &str = include_str!("../../../data/default_rules.yaml");

/// 规则缓存管理器
pub struct RuleCacheManager;

impl RuleCacheManager {
    /// 原子写入规则列表（YAML）
    pub fn save_atomic(path: &Path, rules: &[Rule]) -> RsAppResult<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let yaml = serde_yaml::to_string(rules)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
        }

        tmp.persist(path)
            .map_err(|e| RsAppError::RulePersistError(format!("{}: {}", path.display(), e.error)))?;
        log::info!("Persisted {} rules to {}", rules.len(), path.display());
        Ok(())
    }

    /// 读取规则文件，空文件视为不可用
    pub fn load(path: &Path) -> RsAppResult<Vec<Rule>> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| RsAppError::RuleLoadError(format!("{}: {}", path.display(), e)))
    }

    /// 内置默认规则
    pub fn embedded() -> RsAppResult<Vec<Rule>> {
        Self::parse(EMBEDDED_RULES_YAML)
    }

    fn parse(content: &str) -> RsAppResult<Vec<Rule>> {
        if content.trim().is_empty() {
            return Err(RsAppError::RuleLoadError("规则文件为空".to_string()));
        }
        let rules: Vec<Rule> = serde_yaml::from_str(content)?;
        if rules.is_empty() {
            return Err(RsAppError::RuleLoadError("规则列表为空".to_string()));
        }
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated/combined_rules.yaml");
        let rules = vec![
            Rule::new("wordpress", "WordPress", 70)
                .with_uri_substr(["/wp-login.php"])
                .with_cookie_any(["wordpress_"]),
            Rule::new("whatweb-nginx", "WhatWeb: nginx", 40),
        ];

        RuleCacheManager::save_atomic(&path, &rules).unwrap();
        assert_eq!(RuleCacheManager::load(&path).unwrap(), rules);

        // 不残留临时文件
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_overwrite_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        RuleCacheManager::save_atomic(&path, &[Rule::new("a", "A", 10), Rule::new("b", "B", 10)]).unwrap();
        RuleCacheManager::save_atomic(&path, &[Rule::baseline()]).unwrap();
        assert_eq!(RuleCacheManager::load(&path).unwrap(), vec![Rule::baseline()]);
    }

    #[test]
    fn test_empty_or_invalid_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.yaml");
        fs::write(&empty, "  \n").unwrap();
        assert!(RuleCacheManager::load(&empty).is_err());

        let list = dir.path().join("list.yaml");
        fs::write(&list, "[]").unwrap();
        assert!(RuleCacheManager::load(&list).is_err());

        let garbage = dir.path().join("garbage.yaml");
        fs::write(&garbage, "id: [unterminated").unwrap();
        assert!(RuleCacheManager::load(&garbage).is_err());

        assert!(RuleCacheManager::load(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_sparse_records_get_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.yaml");
        fs::write(&path, "- id: x\n  weight: null\n- id: y\n  label: Y\n  weight: 0\n").unwrap();
        let rules = RuleCacheManager::load(&path).unwrap();
        assert_eq!(rules[0].label, "Unknown");
        assert_eq!(rules[0].weight, 50);
        assert_eq!(rules[1].weight, 50);
    }

    #[test]
    fn test_embedded_rules_parse() {
        let rules = RuleCacheManager::embedded().unwrap();
        assert!(rules.len() > 5);
        assert!(rules.iter().any(|r| r.label == "WordPress"));
    }
}
