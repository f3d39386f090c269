//! Mirror a device's file tree as empty placeholders on local disk.

use crate::adb::{AdbClient, AdbError, AdbResult, shell_quote};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Parse `ls -p` output; directories carry a trailing `/`.
pub fn parse_listing(output: &str) -> Vec<RemoteEntry> {
    output
        .split('\n')
        .map(|line| line.trim_end_matches('\r').trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('.') && !line.ends_with('.'))
        .filter(|line| !line.starts_with("ls:"))
        .filter_map(|line| {
            let (name, is_dir) = match line.strip_suffix('/') {
                Some(name) => (name, true),
                None => (line, false),
            };
            if name.is_empty() || name.contains('/') || name.contains('\0') {
                log::debug!("ignoring listing entry {line:?}");
                return None;
            }
            Some(RemoteEntry {
                name: name.to_string(),
                is_dir,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Local directory holding one sub-directory per device
    pub root: PathBuf,
    pub remote_root: String,
    /// How many directory levels below `remote_root` to list
    pub max_depth: usize,
}

impl MirrorConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            remote_root: "/".to_string(),
            max_depth: 1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MirrorStats {
    pub dirs_created: usize,
    pub files_created: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Directory name used for a device serial (`host:port` serials contain `:`).
pub fn device_dir_name(serial: &str) -> String {
    serial
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

fn join_remote(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

async fn create_placeholder(path: &Path, is_dir: bool) -> AdbResult<bool> {
    if tokio::fs::symlink_metadata(path).await.is_ok() {
        return Ok(false);
    }
    let created = if is_dir {
        tokio::fs::create_dir(path).await
    } else {
        tokio::fs::write(path, b"").await
    };
    created.map_err(|e| AdbError::io(path, e))?;
    Ok(true)
}

/// Walk the device breadth-first and create placeholders under `<root>/<serial>/`.
pub async fn mirror_device<C: AdbClient>(client: &C, config: &MirrorConfig) -> AdbResult<MirrorStats> {
    let local_root = config.root.join(device_dir_name(client.serial()));
    tokio::fs::create_dir_all(&local_root)
        .await
        .map_err(|e| AdbError::io(&local_root, e))?;

    let mut stats = MirrorStats::default();
    let mut queue = VecDeque::from([(config.remote_root.clone(), local_root, 0usize)]);

    while let Some((remote, local, depth)) = queue.pop_front() {
        let listing = match client.shell(&format!("ls -p {}", shell_quote(&remote))).await {
            Ok(listing) => listing,
            Err(e) if depth == 0 => return Err(e),
            Err(e) => {
                log::warn!("{}: listing {remote} failed: {e}", client.serial());
                stats.errors += 1;
                continue;
            }
        };

        for entry in parse_listing(&listing) {
            let local_path = local.join(&entry.name);
            match create_placeholder(&local_path, entry.is_dir).await {
                Ok(true) if entry.is_dir => stats.dirs_created += 1,
                Ok(true) => stats.files_created += 1,
                Ok(false) => stats.skipped += 1,
                Err(e) => {
                    log::warn!("{e}");
                    stats.errors += 1;
                    continue;
                }
            }
            if entry.is_dir && depth + 1 < config.max_depth && local_path.is_dir() {
                queue.push_back((join_remote(&remote, &entry.name), local_path, depth + 1));
            }
        }
    }

    log::info!(
        "{}: mirrored {} dirs, {} files ({} already present, {} errors)",
        client.serial(),
        stats.dirs_created,
        stats.files_created,
        stats.skipped,
        stats.errors
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeDevice {
        serial: String,
        listings: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeDevice {
        fn new(serial: &str, listings: &[(&str, &str)]) -> Self {
            Self {
                serial: serial.to_string(),
                listings: listings
                    .iter()
                    .map(|(path, out)| (format!("ls -p {}", shell_quote(path)), out.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl AdbClient for FakeDevice {
        async fn shell(&self, command: &str) -> AdbResult<String> {
            self.calls.lock().unwrap().push(command.to_string());
            self.listings
                .get(command)
                .cloned()
                .ok_or_else(|| AdbError::CommandFailed {
                    command: command.to_string(),
                    stderr: "ls: Permission denied".to_string(),
                })
        }

        fn serial(&self) -> &str {
            &self.serial
        }
    }

    #[test]
    fn parse_listing_handles_crlf_and_dots() {
        let out = "./\r\n../\r\nacct/\r\nbugreports\r\ncache/\r\n.hidden\r\nweird.\r\n\r\n";
        let entries = parse_listing(out);
        assert_eq!(
            entries,
            vec![
                RemoteEntry { name: "acct".into(), is_dir: true },
                RemoteEntry { name: "bugreports".into(), is_dir: false },
                RemoteEntry { name: "cache".into(), is_dir: true },
            ]
        );
    }

    #[test]
    fn parse_listing_rejects_errors_and_nested_paths() {
        let out = "ls: /data: Permission denied\nsdcard/\na/b\n/\n";
        assert_eq!(
            parse_listing(out),
            vec![RemoteEntry { name: "sdcard".into(), is_dir: true }]
        );
    }

    #[test]
    fn device_dir_name_replaces_separators() {
        assert_eq!(device_dir_name("192.168.1.5:5555"), "192.168.1.5_5555");
        assert_eq!(device_dir_name("1d36d8f1"), "1d36d8f1");
    }

    #[tokio::test]
    async fn mirrors_top_level_only_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let device = FakeDevice::new(
            "emulator-5554",
            &[("/", "acct/\nsdcard/\ninit.rc\n"), ("/sdcard", "DCIM/\n")],
        );
        let stats = mirror_device(&device, &MirrorConfig::new(tmp.path())).await.unwrap();

        let base = tmp.path().join("emulator-5554");
        assert!(base.join("acct").is_dir());
        assert!(base.join("sdcard").is_dir());
        assert!(base.join("init.rc").is_file());
        assert_eq!(std::fs::metadata(base.join("init.rc")).unwrap().len(), 0);
        assert!(!base.join("sdcard/DCIM").exists());
        assert_eq!(
            stats,
            MirrorStats { dirs_created: 2, files_created: 1, skipped: 0, errors: 0 }
        );
        assert_eq!(device.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn descends_to_max_depth_and_counts_denied_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let device = FakeDevice::new(
            "oneplus6:5555",
            &[
                ("/", "data/\nsdcard/\n"),
                ("/sdcard", "DCIM/\nnotes.txt\n"),
                ("/sdcard/DCIM", "Camera/\n"),
            ],
        );
        let config = MirrorConfig { max_depth: 2, ..MirrorConfig::new(tmp.path()) };
        let stats = mirror_device(&device, &config).await.unwrap();

        let base = tmp.path().join("oneplus6_5555");
        assert!(base.join("sdcard/DCIM").is_dir());
        assert!(base.join("sdcard/notes.txt").is_file());
        assert!(!base.join("sdcard/DCIM/Camera").exists());
        // /data is not listable on the fake device
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.dirs_created, 3);
        assert_eq!(stats.files_created, 1);
    }

    #[tokio::test]
    async fn existing_entries_are_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("abc");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("init.rc"), b"keep me").unwrap();

        let device = FakeDevice::new("abc", &[("/", "init.rc\nvendor/\n")]);
        let stats = mirror_device(&device, &MirrorConfig::new(tmp.path())).await.unwrap();

        assert_eq!(std::fs::read(base.join("init.rc")).unwrap(), b"keep me");
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.dirs_created, 1);
    }

    #[tokio::test]
    async fn unreadable_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let device = FakeDevice::new("abc", &[]);
        let err = mirror_device(&device, &MirrorConfig::new(tmp.path())).await.unwrap_err();
        assert!(err.is_permission_denied());
    }
}
