//! 规则库加载：生成规则 -> 备用规则 -> 内置规则，逐级回退

use rsappclass_engine::RuleStore;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ClassifierConfig;
use crate::error::RsAppResult;
use crate::rule::cache::RuleCacheManager;

/// 实际加载的规则来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOrigin {
    Generated(PathBuf),
    Fallback(PathBuf),
    Embedded,
}

impl fmt::Display for StoreOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOrigin::Generated(p) => write!(f, "generated ({})", p.display()),
            StoreOrigin::Fallback(p) => write!(f, "fallback ({})", p.display()),
            StoreOrigin::Embedded => write!(f, "embedded"),
        }
    }
}

#[derive(Debug)]
pub struct LoadedRuleStore {
    pub store: RuleStore,
    pub origin: StoreOrigin,
}

pub struct RuleLoader;

impl RuleLoader {
    /// 按配置加载规则库
    pub fn load(config: &ClassifierConfig) -> RsAppResult<LoadedRuleStore> {
        Self::load_from(&config.rules_path, config.fallback_rules_path.as_deref())
    }

    pub fn load_from(generated: &Path, fallback: Option<&Path>) -> RsAppResult<LoadedRuleStore> {
        if let Some(store) = Self::try_file(generated) {
            return Ok(Self::loaded(store, StoreOrigin::Generated(generated.to_path_buf())));
        }
        if let Some(path) = fallback {
            if let Some(store) = Self::try_file(path) {
                return Ok(Self::loaded(store, StoreOrigin::Fallback(path.to_path_buf())));
            }
        }

        log::warn!("No readable rule file, using embedded default rules");
        let store = RuleStore::new(RuleCacheManager::embedded()?)?;
        Ok(Self::loaded(store, StoreOrigin::Embedded))
    }

    fn try_file(path: &Path) -> Option<RuleStore> {
        let rules = RuleCacheManager::load(path)
            .map_err(|e| log::warn!("Rule file unusable {}: {}", path.display(), e))
            .ok()?;
        RuleStore::new(rules)
            .map_err(|e| log::warn!("Rule store build failed for {}: {}", path.display(), e))
            .ok()
    }

    fn loaded(store: RuleStore, origin: StoreOrigin) -> LoadedRuleStore {
        log::info!("Loaded {} rules from {}", store.len(), origin);
        LoadedRuleStore { store, origin }
    }
}
