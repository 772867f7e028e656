//! 分类器：规则打分得到候选，可选外部修正覆盖最终标签
//! 规则库只读共享；外部修正是唯一的挂起点，带超时且失败折叠为无结果

use rsappclass_engine::{best_label, rank_matches, MatchResult, RuleStore, TelemetryRecord, UNKNOWN_LABEL};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::{ClassifierConfig, RefineConfig};
use crate::error::RsAppResult;
use crate::refine::{build_refiner, DisabledRefiner, LabelRefiner};
use crate::rule::RuleLoader;

/// 单条记录的分类结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub input: TelemetryRecord,
    pub top_matches: Vec<MatchResult>,
    pub label: String,
}

/// 批量分类响应：{ "results": [...] }
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub results: Vec<Classification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub use_llm: bool,
}

#[derive(Clone)]
pub struct Classifier {
    store: Arc<RuleStore>,
    refiner: Arc<dyn LabelRefiner>,
    config: ClassifierConfig,
}

impl Classifier {
    /// 使用已构建的规则库，不启用修正
    pub fn new(store: Arc<RuleStore>, config: ClassifierConfig) -> Self {
        Self {
            store,
            refiner: Arc::new(DisabledRefiner),
            config,
        }
    }

    pub fn with_refiner(mut self, refiner: Arc<dyn LabelRefiner>) -> Self {
        self.refiner = refiner;
        self
    }

    /// 按配置加载规则库（生成 -> 备用 -> 内置）并构建修正器
    pub fn from_config(config: ClassifierConfig, refine: &RefineConfig) -> RsAppResult<Self> {
        let loaded = RuleLoader::load(&config)?;
        let refiner = build_refiner(refine)?;
        Ok(Self::new(Arc::new(loaded.store), config).with_refiner(refiner))
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// 候选标签全集（规则库顺序，去重）
    pub fn labels(&self) -> &[String] {
        self.store.labels()
    }

    /// 仅规则打分，不调用修正
    pub fn rank(&self, record: &TelemetryRecord) -> Vec<MatchResult> {
        rank_matches(&self.store, record, self.config.top_n)
    }

    pub async fn classify(&self, record: TelemetryRecord) -> Classification {
        let top_matches = self.rank(&record);
        let refined = self.refine(&record).await;
        Self::assemble(record, top_matches, refined)
    }

    /// 批量分类：先同步打分，修正调用并发进行，结果保持输入顺序
    /// - 并发上限只约束本批次内的修正调用，不影响其他请求
    pub async fn classify_batch(&self, records: Vec<TelemetryRecord>) -> ClassifyResponse {
        let ranked: Vec<(TelemetryRecord, Vec<MatchResult>)> = records
            .into_iter()
            .map(|record| {
                let top = self.rank(&record);
                (record, top)
            })
            .collect();

        let refinements = if self.refiner.is_enabled() {
            let slots = Arc::new(Semaphore::new(self.config.refine_concurrency.max(1)));
            let handles: Vec<_> = ranked
                .iter()
                .map(|(record, _)| {
                    let this = self.clone();
                    let record = record.clone();
                    let slots = slots.clone();
                    tokio::spawn(async move {
                        let _permit = slots.acquire_owned().await.ok()?;
                        this.refine(&record).await
                    })
                })
                .collect();

            let mut refinements = Vec::with_capacity(handles.len());
            for handle in handles {
                refinements.push(handle.await.unwrap_or_else(|e| {
                    log::warn!("Refinement task aborted: {}", e);
                    None
                }));
            }
            refinements
        } else {
            vec![None; ranked.len()]
        };

        let results = ranked
            .into_iter()
            .zip(refinements)
            .map(|((record, top), refined)| Self::assemble(record, top, refined))
            .collect();
        ClassifyResponse { results }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            ok: true,
            use_llm: self.refiner.is_enabled(),
        }
    }

    async fn refine(&self, record: &TelemetryRecord) -> Option<String> {
        if !self.refiner.is_enabled() {
            return None;
        }
        match tokio::time::timeout(self.config.refine_timeout, self.refiner.refine(record, self.labels())).await {
            Ok(answer) => answer,
            Err(_) => {
                log::warn!("Label refinement timed out after {:?}", self.config.refine_timeout);
                None
            }
        }
    }

    fn assemble(input: TelemetryRecord, top_matches: Vec<MatchResult>, refined: Option<String>) -> Classification {
        let label = resolve_label(best_label(&top_matches), refined);
        Classification {
            input,
            top_matches,
            label,
        }
    }
}

/// 修正结果存在且不是 "Unknown"（不区分大小写）时覆盖规则标签
pub fn resolve_label(best: &str, refined: Option<String>) -> String {
    match refined {
        Some(label) if !label.trim().is_empty() && !label.trim().eq_ignore_ascii_case(UNKNOWN_LABEL) => {
            label.trim().to_string()
        }
        _ => best.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rsappclass_engine::Rule;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedRefiner(Option<&'static str>);

    #[async_trait]
    impl LabelRefiner for FixedRefiner {
        async fn refine(&self, _record: &TelemetryRecord, _labels: &[String]) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    struct HangingRefiner;

    #[async_trait]
    impl LabelRefiner for HangingRefiner {
        async fn refine(&self, _record: &TelemetryRecord, _labels: &[String]) -> Option<String> {
            std::future::pending::<Option<String>>().await
        }
    }

    /// 记录收到的候选标签，并回显 URI
    #[derive(Default)]
    struct RecordingRefiner {
        labels: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LabelRefiner for RecordingRefiner {
        async fn refine(&self, record: &TelemetryRecord, labels: &[String]) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.labels.lock().unwrap() = labels.to_vec();
            Some(format!("echo {}", record.uri))
        }
    }

    fn store() -> Arc<RuleStore> {
        Arc::new(
            RuleStore::new(vec![
                Rule::new("wp", "WordPress", 70)
                    .with_uri_substr(["/wp-login.php"])
                    .with_header_any(["x-powered-by: .*php"])
                    .with_cookie_any(["wordpress_"]),
                Rule::new("php", "PHP", 60).with_header_any(["x-powered-by: .*php"]),
                Rule::new("nginx", "Nginx", 50).with_header_any(["server: nginx"]),
                Rule::new("wp-dup-label", "WordPress", 10).with_ua_any(["wp-cli"]),
                Rule::new("whatweb-wordpress", "WhatWeb: wordpress", 40),
            ])
            .unwrap(),
        )
    }

    fn wordpress_record() -> TelemetryRecord {
        TelemetryRecord::new("/wp-login.php")
            .with_header("X-Powered-By", "PHP/8.1")
            .with_header("Server", "nginx")
            .with_cookie("wordpress_logged_in_abc", "1")
    }

    #[tokio::test]
    async fn test_rule_only_classification() {
        let classifier = Classifier::new(store(), ClassifierConfig::default());
        let result = classifier.classify(wordpress_record()).await;

        let ids: Vec<&str> = result.top_matches.iter().map(|m| m.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["wp", "php", "nginx"]);
        assert_eq!(result.top_matches[0].score, 70 + 40 + 30 + 20);
        assert_eq!(result.label, "WordPress");
    }

    #[tokio::test]
    async fn test_no_match_is_unknown() {
        let classifier = Classifier::new(store(), ClassifierConfig::default());
        let result = classifier.classify(TelemetryRecord::new("/healthz")).await;
        assert!(result.top_matches.is_empty());
        assert_eq!(result.label, "Unknown");
    }

    #[tokio::test]
    async fn test_refiner_overrides_label() {
        let classifier = Classifier::new(store(), ClassifierConfig::default())
            .with_refiner(Arc::new(FixedRefiner(Some("Laravel"))));
        let result = classifier.classify(wordpress_record()).await;
        assert_eq!(result.label, "Laravel");
        assert_eq!(result.top_matches[0].label, "WordPress");
    }

    #[tokio::test]
    async fn test_unknown_or_missing_answer_keeps_best() {
        for answer in [Some("unknown"), Some("UNKNOWN"), Some("   "), None] {
            let classifier = Classifier::new(store(), ClassifierConfig::default())
                .with_refiner(Arc::new(FixedRefiner(answer)));
            assert_eq!(classifier.classify(wordpress_record()).await.label, "WordPress");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refine_timeout_falls_back() {
        let classifier = Classifier::new(store(), ClassifierConfig::default())
            .with_refiner(Arc::new(HangingRefiner));
        let result = classifier.classify(wordpress_record()).await;
        assert_eq!(result.label, "WordPress");
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_request_not_blocked_by_busy_refiner() {
        let config = ClassifierConfig::default().with_refine_concurrency(1);
        let timeout = config.refine_timeout;
        let classifier = Classifier::new(store(), config).with_refiner(Arc::new(HangingRefiner));

        let busy: Vec<_> = (0..3)
            .map(|_| {
                let c = classifier.clone();
                tokio::spawn(async move { c.classify(wordpress_record()).await })
            })
            .collect();
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        let result = classifier.classify(wordpress_record()).await;
        assert!(started.elapsed() <= timeout + std::time::Duration::from_secs(1));
        assert_eq!(result.label, "WordPress");

        for handle in busy {
            assert_eq!(handle.await.unwrap().label, "WordPress");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_concurrency_is_per_batch() {
        let config = ClassifierConfig::default().with_refine_concurrency(1);
        let timeout = config.refine_timeout;
        let classifier = Classifier::new(store(), config).with_refiner(Arc::new(HangingRefiner));

        let other = classifier.clone();
        let busy = tokio::spawn(async move { other.classify_batch(vec![wordpress_record(); 3]).await });
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        let response = classifier.classify_batch(vec![TelemetryRecord::new("/x")]).await;
        assert!(started.elapsed() <= timeout + std::time::Duration::from_secs(1));
        assert_eq!(response.results[0].label, "Unknown");

        let busy = busy.await.unwrap();
        assert!(busy.results.iter().all(|r| r.label == "WordPress"));
    }

    #[tokio::test]
    async fn test_independent_classifiers_coexist() {
        let other_store = Arc::new(
            RuleStore::new(vec![Rule::new("iis", "IIS", 50).with_header_any(["server: microsoft-iis"])]).unwrap(),
        );
        let wp = Classifier::new(store(), ClassifierConfig::default());
        let iis = Classifier::new(other_store, ClassifierConfig::default())
            .with_refiner(Arc::new(FixedRefiner(Some("Windows"))));

        let record = TelemetryRecord::new("/").with_header("Server", "Microsoft-IIS/10.0");
        assert_eq!(wp.classify(record.clone()).await.label, "Unknown");
        assert_eq!(iis.classify(record).await.label, "Windows");
        assert_eq!(wp.labels().len(), 4);
        assert_eq!(iis.labels(), ["IIS".to_string()]);
        assert!(!wp.health().use_llm);
    }

    #[tokio::test]
    async fn test_refiner_receives_deduplicated_labels() {
        let refiner = Arc::new(RecordingRefiner::default());
        let classifier = Classifier::new(store(), ClassifierConfig::default()).with_refiner(refiner.clone());
        classifier.classify(TelemetryRecord::new("/")).await;
        assert_eq!(
            *refiner.labels.lock().unwrap(),
            vec!["WordPress", "PHP", "Nginx", "WhatWeb: wordpress"]
        );
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let refiner = Arc::new(RecordingRefiner::default());
        let classifier = Classifier::new(store(), ClassifierConfig::default().with_refine_concurrency(2))
            .with_refiner(refiner.clone());
        let records: Vec<TelemetryRecord> = (0..6).map(|i| TelemetryRecord::new(format!("/r{}", i))).collect();

        let response = classifier.classify_batch(records).await;
        assert_eq!(response.results.len(), 6);
        for (i, result) in response.results.iter().enumerate() {
            assert_eq!(result.input.uri, format!("/r{}", i));
            assert_eq!(result.label, format!("echo /r{}", i));
        }
        assert_eq!(refiner.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_batch_without_refiner() {
        let classifier = Classifier::new(store(), ClassifierConfig::default());
        let response = classifier
            .classify_batch(vec![wordpress_record(), TelemetryRecord::new("/x")])
            .await;
        let labels: Vec<&str> = response.results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["WordPress", "Unknown"]);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["results"][0]["top_matches"][0]["id"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let plain = Classifier::new(store(), ClassifierConfig::default());
        assert_eq!(plain.health(), HealthStatus { ok: true, use_llm: false });

        let refined = plain.with_refiner(Arc::new(FixedRefiner(None)));
        let json = serde_json::to_string(&refined.health()).unwrap();
        assert_eq!(json, r#"{"ok":true,"use_llm":true}"#);
    }

    #[tokio::test]
    async fn test_top_n_configurable() {
        let classifier = Classifier::new(store(), ClassifierConfig::default().with_top_n(1));
        assert_eq!(classifier.classify(wordpress_record()).await.top_matches.len(), 1);
    }

    #[test]
    fn test_resolve_label() {
        assert_eq!(resolve_label("Nginx", Some(" Apache ".to_string())), "Apache");
        assert_eq!(resolve_label("Nginx", Some("Unknown".to_string())), "Nginx");
        assert_eq!(resolve_label("Unknown", None), "Unknown");
    }
}
