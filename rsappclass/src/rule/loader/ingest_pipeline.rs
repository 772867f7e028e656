//! 规则采集流水线
//! 逐个规则源获取并转换，单个源失败只记录不中断，最后聚合并原子写入

use rsappclass_engine::Rule;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::config::{SourceConfig, SourcesConfig};
use crate::error::{RsAppError, RsAppResult};
use crate::rule::aggregator::RuleAggregator;
use crate::rule::cache::RuleCacheManager;
use crate::rule::loader::source_fetcher::SourceFetcher;
use crate::rule::source::SourceKind;

/// 单个规则源的采集结果
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub kind: SourceKind,
    pub origin: String,
    pub rules: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 整次采集的结果
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub sources: Vec<SourceReport>,
    pub total_rules: usize,
    pub used_baseline: bool,
    pub output_path: PathBuf,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for source in &self.sources {
            match &source.error {
                Some(err) => writeln!(f, "{:<10} FAILED  {} ({})", source.kind, err, source.origin)?,
                None => writeln!(f, "{:<10} {:>6} rules ({})", source.kind, source.rules, source.origin)?,
            }
        }
        write!(f, "total {} rules -> {}", self.total_rules, self.output_path.display())?;
        if self.used_baseline {
            write!(f, " (baseline placeholder)")?;
        }
        Ok(())
    }
}

pub struct IngestPipeline<F> {
    config: SourcesConfig,
    fetcher: F,
}

impl<F: SourceFetcher> IngestPipeline<F> {
    pub fn new(config: SourcesConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &SourcesConfig {
        &self.config
    }

    /// 采集全部规则源并写入生成规则文件
    pub async fn run(&self) -> RsAppResult<IngestReport> {
        let (rules, sources) = self.collect().await;
        let output_path = self.config.output_path();
        RuleCacheManager::save_atomic(&output_path, &rules)?;

        let used_baseline = rules.len() == 1 && rules[0] == Rule::baseline();
        Ok(IngestReport {
            sources,
            total_rules: rules.len(),
            used_baseline,
            output_path,
        })
    }

    /// 采集并聚合，不落盘
    pub async fn collect(&self) -> (Vec<Rule>, Vec<SourceReport>) {
        let mut batches = Vec::with_capacity(self.config.sources.len());
        let mut reports = Vec::with_capacity(self.config.sources.len());

        for source in &self.config.sources {
            let origin = source.origin.describe();
            match self.collect_source(source).await {
                Ok(rules) => {
                    log::info!("[{}] {} rules", source.kind, rules.len());
                    reports.push(SourceReport {
                        kind: source.kind,
                        origin,
                        rules: rules.len(),
                        error: None,
                    });
                    batches.push((source.kind, rules));
                }
                Err(e) => {
                    log::warn!("[{}] source skipped: {}", source.kind, e);
                    reports.push(SourceReport {
                        kind: source.kind,
                        origin,
                        rules: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        (RuleAggregator::aggregate(batches), reports)
    }

    async fn collect_source(&self, source: &SourceConfig) -> RsAppResult<Vec<Rule>> {
        let dest = self.config.source_dir(source.kind);
        let root = self.fetcher.fetch(&source.origin, &dest).await?;
        log::debug!("[{}] source root {}", source.kind, root.display());

        let adapter = source.kind.adapter();
        let max_rules = self.config.max_rules;
        tokio::task::spawn_blocking(move || adapter.build_rules(&root, max_rules))
            .await
            .map_err(|e| RsAppError::AsyncTaskError(format!("规则转换任务异常退出: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceOrigin;
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;

    /// 只接受本地目录，其余来源一律失败
    struct LocalOnlyFetcher;

    #[async_trait]
    impl SourceFetcher for LocalOnlyFetcher {
        async fn fetch(&self, origin: &SourceOrigin, _dest: &Path) -> RsAppResult<PathBuf> {
            match origin {
                SourceOrigin::LocalDir(p) => Ok(p.clone()),
                other => Err(RsAppError::SourceFetchError(format!("offline: {}", other.describe()))),
            }
        }
    }

    fn write_catalog(root: &Path) {
        let dir = root.join("src/technologies");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("w.json"),
            r#"{"WordPress": {"cookies": {"wordpress_logged_in": ""}, "url": "/wp-admin"}}"#,
        )
        .unwrap();
    }

    fn write_plugins(root: &Path, names: &[&str]) {
        let dir = root.join("plugins");
        fs::create_dir_all(&dir).unwrap();
        for name in names {
            fs::write(dir.join(format!("{}.rb", name)), "").unwrap();
        }
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let cache = tempfile::tempdir().unwrap();
        let catalog = tempfile::tempdir().unwrap();
        let plugins = tempfile::tempdir().unwrap();
        write_catalog(catalog.path());
        write_plugins(plugins.path(), &["nginx", "apache"]);

        let config = SourcesConfig::builder()
            .cache_dir(cache.path())
            .origin(SourceKind::TechCatalog, SourceOrigin::LocalDir(catalog.path().to_path_buf()))
            .origin(SourceKind::TemplateHint, SourceOrigin::git("https://github.com/projectdiscovery/nuclei-templates"))
            .origin(SourceKind::PluginName, SourceOrigin::LocalDir(plugins.path().to_path_buf()))
            .build();

        let report = IngestPipeline::new(config, LocalOnlyFetcher).run().await.unwrap();
        assert_eq!(report.sources.len(), 3);
        assert!(report.sources[1].error.is_some());
        assert_eq!(report.sources[0].rules, 1);
        assert_eq!(report.sources[2].rules, 2);
        assert_eq!(report.total_rules, 3);
        assert!(!report.used_baseline);

        let persisted = RuleCacheManager::load(&report.output_path).unwrap();
        let ids: Vec<&str> = persisted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["wordpress", "whatweb-apache", "whatweb-nginx"]);
    }

    #[tokio::test]
    async fn test_all_sources_failing_persists_baseline() {
        let cache = tempfile::tempdir().unwrap();
        let config = SourcesConfig::builder().cache_dir(cache.path()).build();

        let report = IngestPipeline::new(config, LocalOnlyFetcher).run().await.unwrap();
        assert!(report.sources.iter().all(|s| s.error.is_some()));
        assert!(report.used_baseline);
        assert_eq!(
            RuleCacheManager::load(&report.output_path).unwrap(),
            vec![Rule::baseline()]
        );
        assert!(report.to_string().contains("baseline placeholder"));
    }

    #[tokio::test]
    async fn test_max_rules_applies_per_source() {
        let cache = tempfile::tempdir().unwrap();
        let plugins = tempfile::tempdir().unwrap();
        write_plugins(plugins.path(), &["a", "b", "c", "d"]);

        let config = SourcesConfig::builder()
            .cache_dir(cache.path())
            .max_rules(2)
            .origin(SourceKind::PluginName, SourceOrigin::LocalDir(plugins.path().to_path_buf()))
            .build();

        let (rules, _) = IngestPipeline::new(config, LocalOnlyFetcher).collect().await;
        assert_eq!(rules.len(), 2);
    }
}
