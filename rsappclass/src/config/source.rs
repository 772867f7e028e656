//! 规则源配置

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{env_opt, env_or, env_parse};
use crate::rule::source::SourceKind;

/// 生成规则文件名
pub const COMBINED_RULES_FILE: &str = "combined_rules.yaml";
/// 单个规则源默认产出上限
pub const DEFAULT_MAX_RULES: usize = 5000;

/// 规则源位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Git 仓库，reference 为空时按仓库使用默认分支
    Git { url: String, reference: Option<String> },
    /// 直接下载的压缩包（如 codeload.github.com）
    Archive(String),
    /// 已存在的本地目录，原样使用
    LocalDir(PathBuf),
}

impl SourceOrigin {
    /// 从配置字符串推断来源类型
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains("codeload.github.com") {
            SourceOrigin::Archive(raw.to_string())
        } else if raw.starts_with("http://")
            || raw.starts_with("https://")
            || raw.starts_with("git@")
            || raw.ends_with(".git")
        {
            SourceOrigin::Git {
                url: raw.to_string(),
                reference: None,
            }
        } else {
            SourceOrigin::LocalDir(PathBuf::from(raw))
        }
    }

    pub fn git(url: impl Into<String>) -> Self {
        SourceOrigin::Git {
            url: url.into(),
            reference: None,
        }
    }

    /// Git 来源的实际分支：显式配置优先，否则按仓库默认分支
    pub fn effective_reference(&self) -> Option<String> {
        match self {
            SourceOrigin::Git { url, reference } => Some(
                reference
                    .clone()
                    .unwrap_or_else(|| default_branch_for(&owner_repo_of(url).unwrap_or_default()).to_string()),
            ),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceOrigin::Git { url, .. } => url.clone(),
            SourceOrigin::Archive(url) => url.clone(),
            SourceOrigin::LocalDir(path) => path.display().to_string(),
        }
    }
}

/// 已知上游仓库的默认分支
pub fn default_branch_for(owner_repo: &str) -> &'static str {
    match owner_repo.to_ascii_lowercase().as_str() {
        "aliasio/wappalyzer" => "main",
        "urbanadventurer/whatweb" => "master",
        "projectdiscovery/nuclei-templates" => "main",
        _ => "main",
    }
}

/// 从 GitHub 地址提取 "owner/repo"
pub(crate) fn owner_repo_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    Some(format!("{}/{}", owner, repo))
}

/// 单个规则源配置
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub origin: SourceOrigin,
}

/// 规则采集流水线配置
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    /// 缓存根目录：sources/ 存放规则源，generated/ 存放生成规则
    pub cache_dir: PathBuf,
    /// 按优先级排列的规则源
    pub sources: Vec<SourceConfig>,
    /// 每个规则源的最大规则数
    pub max_rules: usize,
    /// git 可执行文件
    pub git_bin: String,
    /// 压缩包下载超时
    pub http_timeout: Duration,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("/rules_cache"),
            sources: SourceKind::ALL
                .iter()
                .map(|kind| SourceConfig {
                    kind: *kind,
                    origin: SourceOrigin::git(kind.default_url()),
                })
                .collect(),
            max_rules: DEFAULT_MAX_RULES,
            git_bin: "git".to_string(),
            http_timeout: Duration::from_secs(120),
        }
    }
}

impl SourcesConfig {
    /// 从环境变量构建
    /// RULES_CACHE_DIR / SOURCES_WAPPALYZER / SOURCES_NUCLEI / SOURCES_WHATWEB / MAX_RULES / GIT_BIN
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let sources = SourceKind::ALL
            .iter()
            .map(|kind| SourceConfig {
                kind: *kind,
                origin: SourceOrigin::parse(&env_or(kind.env_key(), kind.default_url())),
            })
            .collect();

        Self {
            cache_dir: env_opt("RULES_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            sources,
            max_rules: env_parse("MAX_RULES", defaults.max_rules),
            git_bin: env_or("GIT_BIN", &defaults.git_bin),
            http_timeout: Duration::from_secs(env_parse("SOURCES_HTTP_TIMEOUT", 120u64)),
        }
    }

    pub fn builder() -> SourcesConfigBuilder {
        SourcesConfigBuilder::new()
    }

    /// 规则源本地目录：<cache>/sources/<name>
    pub fn source_dir(&self, kind: SourceKind) -> PathBuf {
        self.cache_dir.join("sources").join(kind.dir_name())
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.cache_dir.join("generated")
    }

    /// 生成规则文件：<cache>/generated/combined_rules.yaml
    pub fn output_path(&self) -> PathBuf {
        self.generated_dir().join(COMBINED_RULES_FILE)
    }

    pub fn origin_of(&self, kind: SourceKind) -> Option<&SourceOrigin> {
        self.sources.iter().find(|s| s.kind == kind).map(|s| &s.origin)
    }
}

/// 配置构建器（链式 API）
#[derive(Debug, Clone)]
pub struct SourcesConfigBuilder {
    config: SourcesConfig,
}

impl Default for SourcesConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SourcesConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SourcesConfig::default(),
        }
    }

    pub fn cache_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.cache_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn max_rules(mut self, max_rules: usize) -> Self {
        self.config.max_rules = max_rules;
        self
    }

    pub fn git_bin(mut self, git_bin: impl Into<String>) -> Self {
        self.config.git_bin = git_bin.into();
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    /// 替换指定规则源的位置
    pub fn origin(mut self, kind: SourceKind, origin: SourceOrigin) -> Self {
        match self.config.sources.iter_mut().find(|s| s.kind == kind) {
            Some(source) => source.origin = origin,
            None => self.config.sources.push(SourceConfig { kind, origin }),
        }
        self
    }

    pub fn build(mut self) -> SourcesConfig {
        // 无论配置顺序如何，采集顺序固定为优先级顺序
        self.config.sources.sort_by_key(|s| s.kind.priority());
        self.config
    }
}
