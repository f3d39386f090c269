//! Download and unpack Google's platform-tools zip for the host OS.

use crate::adb::{AdbError, AdbResult};
use crate::config::AppConfig;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use zip::ZipArchive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPlatform {
    Linux,
    Windows,
    Mac,
    Other(String),
}

impl HostPlatform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => HostPlatform::Linux,
            "windows" => HostPlatform::Windows,
            "macos" => HostPlatform::Mac,
            other => HostPlatform::Other(other.to_string()),
        }
    }

    /// Platform suffix used in the download file name.
    fn archive_suffix(&self) -> AdbResult<&'static str> {
        match self {
            HostPlatform::Linux => Ok("linux"),
            HostPlatform::Windows => Ok("windows"),
            HostPlatform::Mac => Ok("darwin"),
            HostPlatform::Other(os) => Err(AdbError::UnsupportedPlatform {
                platform: os.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SdkRelease {
    #[default]
    Latest,
    Pinned(String),
}

impl SdkRelease {
    fn url_token(&self) -> String {
        match self {
            SdkRelease::Latest => "latest".to_string(),
            SdkRelease::Pinned(v) if v.starts_with("latest") => v.clone(),
            SdkRelease::Pinned(v) => format!("r{}", v.trim_start_matches('r')),
        }
    }
}

impl FromStr for SdkRelease {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(if s.is_empty() || s == "latest" {
            SdkRelease::Latest
        } else {
            SdkRelease::Pinned(s.to_string())
        })
    }
}

impl fmt::Display for SdkRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkRelease::Latest => f.write_str("latest"),
            SdkRelease::Pinned(v) => f.write_str(v),
        }
    }
}

pub fn download_url(base: &str, platform: &HostPlatform, release: &SdkRelease) -> AdbResult<String> {
    Ok(format!(
        "{}/platform-tools-{}-{}.zip",
        base.trim_end_matches('/'),
        release.url_token(),
        platform.archive_suffix()?
    ))
}

pub struct PlatformTools {
    work_dir: PathBuf,
    sdk_dir: PathBuf,
    lang: String,
    download_base: String,
    release: SdkRelease,
    platform: HostPlatform,
    timeout: Duration,
    use_proxy: bool,
}

impl PlatformTools {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            sdk_dir: config.sdk_dir.clone(),
            lang: config.lang.clone(),
            download_base: config.download_base.clone(),
            release: config.sdk_release.clone(),
            platform: HostPlatform::current(),
            timeout: config.download_timeout,
            use_proxy: config.download_proxy,
        }
    }

    pub fn sdk_dir(&self) -> &Path {
        &self.sdk_dir
    }

    /// Make sure `platform-tools/` exists; returns true when it was (re)downloaded.
    pub async fn ensure(&self, refresh: bool) -> AdbResult<bool> {
        if refresh && self.sdk_dir.exists() {
            log::info!("removing {} for refresh", self.sdk_dir.display());
            tokio::fs::remove_dir_all(&self.sdk_dir)
                .await
                .map_err(|e| AdbError::io(&self.sdk_dir, e))?;
        }
        if self.sdk_dir.exists() {
            log::debug!("platform-tools present at {}", self.sdk_dir.display());
            return Ok(false);
        }

        let url = download_url(&self.download_base, &self.platform, &self.release)?;
        let archive = self.fetch(&url).await?;
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| AdbError::io(&self.work_dir, e))?;

        let dest = self.work_dir.clone();
        let extracted = tokio::task::spawn_blocking(move || extract_archive(&archive, &dest)).await??;
        log::info!("extracted {extracted} entries into {}", self.work_dir.display());
        if !self.sdk_dir.is_dir() {
            log::warn!(
                "archive did not contain {}; adb will be looked up on PATH",
                self.sdk_dir.display()
            );
        }
        Ok(true)
    }

    async fn fetch(&self, url: &str) -> AdbResult<Vec<u8>> {
        log::info!("downloading {url}");
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if !self.use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        let response = client
            .get(url)
            .query(&[("hl", self.lang.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdbError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        let bytes = response.bytes().await?;
        log::debug!("downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Unpack a zip held in memory below `dest`, keeping unix permission bits.
pub fn extract_archive(bytes: &[u8], dest: &Path) -> AdbResult<usize> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| AdbError::UnsafeArchiveEntry {
                name: entry.name().to_string(),
            })?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| AdbError::io(&out_path, e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AdbError::io(parent, e))?;
        }
        let mut file = std::fs::File::create(&out_path).map_err(|e| AdbError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut file).map_err(|e| AdbError::io(&out_path, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| AdbError::io(&out_path, e))?;
        }
    }
    Ok(archive.len())
}
