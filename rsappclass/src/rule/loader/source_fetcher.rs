//! 规则源获取
//! 优先增量更新已有副本，失败则浅克隆固定分支，再失败则下载分支快照压缩包
//! 任何失败路径都不会在目标位置留下半成品目录

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::config::source::owner_repo_of;
use crate::config::{SourceOrigin, SourcesConfig};
use crate::error::{RsAppError, RsAppResult};
use crate::rule::loader::archive::ArchiveFetcher;

/// 规则源获取能力：把 origin 同步到本地目录，返回可供适配器读取的根目录
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, origin: &SourceOrigin, dest: &Path) -> RsAppResult<PathBuf>;
}

/// 基于 git 命令行的获取器，带压缩包兜底
#[derive(Debug, Clone)]
pub struct GitSourceFetcher {
    git_bin: String,
    archive: ArchiveFetcher,
}

impl Default for GitSourceFetcher {
    fn default() -> Self {
        Self::new("git", Duration::from_secs(120))
    }
}

impl GitSourceFetcher {
    pub fn new(git_bin: impl Into<String>, http_timeout: Duration) -> Self {
        Self {
            git_bin: git_bin.into(),
            archive: ArchiveFetcher::new(http_timeout),
        }
    }

    pub fn from_config(config: &SourcesConfig) -> Self {
        Self::new(config.git_bin.clone(), config.http_timeout)
    }

    async fn fetch_git(&self, url: &str, reference: &str, dest: &Path) -> RsAppResult<PathBuf> {
        // 非仓库目录直接丢弃，避免 git -C 向上找到外层仓库
        if dest.exists() && !dest.join(".git").exists() {
            log::warn!("{} is not a git checkout, re-cloning", dest.display());
            remove_dir_quietly(dest).await;
        }

        if dest.exists() {
            let pull = self
                .run_git(vec![
                    "-C".into(),
                    dest.as_os_str().to_os_string(),
                    "pull".into(),
                    "--ff-only".into(),
                ])
                .await;
            match pull {
                Ok(()) => {
                    log::info!("Updated {} in place", dest.display());
                    return Ok(dest.to_path_buf());
                }
                Err(e) => {
                    log::warn!("git pull failed for {}: {}, re-cloning", dest.display(), e);
                    remove_dir_quietly(dest).await;
                }
            }
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let clone = self
            .run_git(vec![
                "clone".into(),
                "--depth".into(),
                "1".into(),
                "--branch".into(),
                reference.into(),
                url.into(),
                dest.as_os_str().to_os_string(),
            ])
            .await;
        match clone {
            Ok(()) => {
                log::info!("Cloned {}@{} -> {}", url, reference, dest.display());
                return Ok(dest.to_path_buf());
            }
            Err(e) => {
                log::warn!("git clone failed for {}: {}, trying archive", url, e);
                remove_dir_quietly(dest).await;
            }
        }

        let archive_url = codeload_archive_url(url, reference)?;
        self.archive.fetch_into(&archive_url, dest).await?;
        Ok(dest.to_path_buf())
    }

    async fn run_git(&self, args: Vec<OsString>) -> RsAppResult<()> {
        log::debug!("+ {} {:?}", self.git_bin, args);
        let output = Command::new(&self.git_bin)
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| RsAppError::CommandError(format!("无法执行 {}: {}", self.git_bin, e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RsAppError::CommandError(format!(
                "{} 退出码 {:?}: {}",
                self.git_bin,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

#[async_trait]
impl SourceFetcher for GitSourceFetcher {
    async fn fetch(&self, origin: &SourceOrigin, dest: &Path) -> RsAppResult<PathBuf> {
        match origin {
            SourceOrigin::LocalDir(path) => {
                if path.is_dir() {
                    Ok(path.clone())
                } else {
                    Err(RsAppError::SourceFetchError(format!(
                        "本地规则源目录不存在: {}",
                        path.display()
                    )))
                }
            }
            SourceOrigin::Archive(url) => {
                self.archive.fetch_into(url, dest).await?;
                Ok(dest.to_path_buf())
            }
            SourceOrigin::Git { url, .. } => {
                let reference = origin.effective_reference().unwrap_or_else(|| "main".to_string());
                self.fetch_git(url, &reference, dest).await
            }
        }
    }
}

/// GitHub 仓库地址 -> 分支快照下载地址
pub fn codeload_archive_url(url: &str, reference: &str) -> RsAppResult<String> {
    let parsed = url::Url::parse(url)?;
    if parsed.host_str() != Some("github.com") {
        return Err(RsAppError::InvalidInput(format!(
            "无法从非 GitHub 地址推导压缩包: {}",
            url
        )));
    }
    let owner_repo = owner_repo_of(url)
        .ok_or_else(|| RsAppError::InvalidInput(format!("无法解析 GitHub 仓库地址: {}", url)))?;
    Ok(format!(
        "https://codeload.github.com/{}/zip/refs/heads/{}",
        owner_repo, reference
    ))
}

async fn remove_dir_quietly(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = tokio::fs::remove_dir_all(path).await {
        log::warn!("Failed to remove {}: {}", path.display(), e);
    }
}
