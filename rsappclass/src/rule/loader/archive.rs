//! 压缩包获取：下载 zip 到内存，解压到同级暂存目录，再把唯一的顶层目录移动到目标位置
//! 暂存目录 `<dest>_dl` 无论成功失败都会被清理

#[cfg(feature = "remote-loader")]
use reqwest::Client;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zip::ZipArchive;

use crate::error::{RsAppError, RsAppResult};

#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    timeout: Duration,
}

impl Default for ArchiveFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl ArchiveFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 下载并展开压缩包到 dest
    pub async fn fetch_into(&self, url: &str, dest: &Path) -> RsAppResult<()> {
        log::info!("Downloading archive {} -> {}", url, dest.display());
        let bytes = self.download(url).await?;
        log::debug!("Archive downloaded: {} bytes", bytes.len());

        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || extract_single_folder(&bytes, &dest))
            .await
            .map_err(|e| RsAppError::AsyncTaskError(format!("解压任务异常退出: {}", e)))?
    }

    #[cfg(feature = "remote-loader")]
    async fn download(&self, url: &str) -> RsAppResult<Vec<u8>> {
        let client = Client::builder().timeout(self.timeout).build()?;
        let response = client
            .get(url)
            .header("User-Agent", concat!("rsappclass/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RsAppError::SourceFetchError(format!(
                "下载 {} 返回状态码 {}",
                url,
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    #[cfg(not(feature = "remote-loader"))]
    async fn download(&self, url: &str) -> RsAppResult<Vec<u8>> {
        let _ = self.timeout;
        Err(RsAppError::FeatureDisabled(format!(
            "下载压缩包 {} 需要启用 remote-loader 特性",
            url
        )))
    }
}

/// 同级暂存目录：`<dest>_dl`
pub(crate) fn staging_dir_for(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push("_dl");
    dest.with_file_name(name)
}

/// 解压 zip，把第一个顶层目录原子地放到 dest
pub fn extract_single_folder(bytes: &[u8], dest: &Path) -> RsAppResult<()> {
    let staging = staging_dir_for(dest);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let result = unpack_and_move(bytes, &staging, dest);

    if let Err(e) = fs::remove_dir_all(&staging) {
        log::debug!("Failed to clean staging dir {}: {}", staging.display(), e);
    }
    result
}

fn unpack_and_move(bytes: &[u8], staging: &Path, dest: &Path) -> RsAppResult<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    archive.extract(staging)?;

    let mut folders: Vec<PathBuf> = fs::read_dir(staging)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    folders.sort();

    let folder = folders.into_iter().next().ok_or_else(|| {
        RsAppError::SourceFetchError("压缩包中没有顶层目录".to_string())
    })?;

    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&folder, dest)?;
    Ok(())
}
