//! Runtime configuration, built from CLI flags and a couple of environment variables.

use crate::platform_tools::SdkRelease;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LANG: &str = "zh-cn";
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://dl.google.com/android/repository";
pub const LANG_ENV: &str = "ADB_MIRROR_LANG";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub work_dir: PathBuf,
    /// `<work_dir>/platform-tools`
    pub sdk_dir: PathBuf,
    /// `<work_dir>/android_device`
    pub mapping_dir: PathBuf,
    /// `hl` query parameter sent with the download
    pub lang: String,
    /// Where `platform-tools-<release>-<os>.zip` is fetched from
    pub download_base: String,
    /// Honour HTTP(S)_PROXY for the download
    pub download_proxy: bool,
    pub sdk_release: SdkRelease,
    pub refresh: bool,
    pub download_timeout: Duration,
    pub remote_root: String,
    pub mirror_depth: usize,
    pub watch: bool,
    /// Stop watching after this long; None waits for Ctrl-C
    pub watch_timeout: Option<Duration>,
    pub debug: bool,
}

impl AppConfig {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            sdk_dir: work_dir.join("platform-tools"),
            mapping_dir: work_dir.join("android_device"),
            work_dir,
            lang: DEFAULT_LANG.to_string(),
            download_base: DEFAULT_DOWNLOAD_BASE.to_string(),
            download_proxy: true,
            sdk_release: SdkRelease::Latest,
            refresh: false,
            download_timeout: Duration::from_secs(300),
            remote_root: "/".to_string(),
            mirror_depth: 1,
            watch: true,
            watch_timeout: None,
            debug: false,
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(lang) = lookup(LANG_ENV).filter(|l| !l.trim().is_empty()) {
            self.lang = lang.trim().to_string();
        }
        self
    }
}
