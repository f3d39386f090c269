use super::error::{AdbError, AdbResult};
use super::types::{AdbClient, AdbVersion, Device, DeviceState};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::process::Command;

#[cfg(windows)]
const ADB_BINARY: &str = "adb.exe";
#[cfg(not(windows))]
const ADB_BINARY: &str = "adb";

/// Runs the external `adb` binary, preferring the copy inside the downloaded platform-tools.
#[derive(Debug, Clone)]
pub struct AdbShell {
    program: PathBuf,
    sdk_dir: PathBuf,
}

impl AdbShell {
    pub fn new(sdk_dir: &Path) -> Self {
        // the child runs with cwd = sdk_dir, so a relative program path would resolve twice
        let sdk_dir = std::path::absolute(sdk_dir).unwrap_or_else(|_| sdk_dir.to_path_buf());
        let bundled = sdk_dir.join(ADB_BINARY);
        let program = if bundled.is_file() {
            bundled
        } else {
            PathBuf::from(ADB_BINARY)
        };
        Self { program, sdk_dir }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if self.sdk_dir.is_dir() {
            cmd.current_dir(&self.sdk_dir);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    /// Run `adb <args..>` and return its trimmed stdout.
    ///
    /// A missing binary surfaces as `AdbError::AdbNotFound`, so `check_version`
    /// doubles as the availability check.
    pub async fn run(&self, args: &[&str]) -> AdbResult<String> {
        let command = format!("adb {}", args.join(" "));
        log::debug!("running: {command}");
        let output = self.command().args(args).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdbError::AdbNotFound {
                    sdk_dir: self.sdk_dir.clone(),
                }
            } else {
                AdbError::SpawnFailed { source: e }
            }
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // `adb shell` without the v2 protocol reports remote errors on stdout
            let stderr = if stderr.is_empty() { stdout } else { stderr };
            return Err(AdbError::CommandFailed { command, stderr });
        }
        Ok(stdout)
    }

    pub async fn check_version(&self) -> AdbResult<AdbVersion> {
        let output = self.run(&["version"]).await?;
        Ok(Self::parse_version(&output))
    }

    pub fn parse_version(output: &str) -> AdbVersion {
        static VERSION_RE: OnceLock<Regex> = OnceLock::new();
        let re = VERSION_RE.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").expect("static regex"));
        let mut lines = output.lines();
        let first_match =
            |line: Option<&str>| line.and_then(|l| re.find(l)).map(|m| m.as_str().to_string());
        let bridge = first_match(lines.next());
        let release = first_match(lines.next());
        AdbVersion { bridge, release }
    }

    pub fn parse_devices(output: &str) -> Vec<Device> {
        output
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() || line.starts_with('*') || line.starts_with("List of devices") {
                    return None;
                }
                let mut parts = line.split_whitespace();
                let name = parts.next()?.to_string();
                // server chatter such as "adb server version (41) doesn't match this client"
                if name == "adb" {
                    return None;
                }
                let Some(state) = DeviceState::parse(parts.next()?) else {
                    log::debug!("ignoring devices line {line:?}");
                    return None;
                };
                let mut transport_id = None;
                let mut model = None;
                for part in parts {
                    if let Some(tid) = part.strip_prefix("transport_id:") {
                        transport_id = Some(tid.to_string());
                    } else if let Some(m) = part.strip_prefix("model:") {
                        model = Some(m.to_string());
                    }
                }
                Some(Device {
                    name,
                    state,
                    transport_id,
                    model,
                })
            })
            .collect()
    }

    pub async fn list_devices(&self) -> AdbResult<Vec<Device>> {
        let output = self.run(&["devices", "-l"]).await?;
        Ok(Self::parse_devices(&output))
    }

    /// Bind this adb to one device serial.
    pub fn device(&self, serial: &str) -> DeviceHandle {
        DeviceHandle {
            adb: self.clone(),
            serial: serial.to_string(),
        }
    }
}

/// An `AdbShell` targeting a single device via `-s <serial>`.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    adb: AdbShell,
    serial: String,
}

impl AdbClient for DeviceHandle {
    async fn shell(&self, command: &str) -> AdbResult<String> {
        self.adb.run(&["-s", self.serial.as_str(), "shell", command]).await
    }

    fn serial(&self) -> &str {
        &self.serial
    }
}

/// Quote a path for the device's `sh`.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_devices_basic() {
        let adb_output = "List of devices attached\nabc123 device transport_id:5\n";
        let devs = AdbShell::parse_devices(adb_output);
        assert_eq!(devs.len(), 1);
        assert_eq!(devs[0].name, "abc123");
        assert_eq!(devs[0].state, DeviceState::Device);
        assert_eq!(devs[0].transport_id, Some("5".to_string()));
        assert_eq!(devs[0].model, None);
    }

    #[test]
    fn test_parse_devices_multiple() {
        let adb_output = "List of devices attached\n1d36d8f1               device usb:1-4 product:OnePlus6 model:ONEPLUS_A6000 device:OnePlus6 transport_id:2\noneplus6:5555          device product:OnePlus6 model:ONEPLUS_A6000 device:OnePlus6 transport_id:3\n";
        let devices = AdbShell::parse_devices(adb_output);
        assert_eq!(
            devices,
            vec![
                Device {
                    name: "1d36d8f1".to_string(),
                    state: DeviceState::Device,
                    transport_id: Some("2".to_string()),
                    model: Some("ONEPLUS_A6000".to_string()),
                },
                Device {
                    name: "oneplus6:5555".to_string(),
                    state: DeviceState::Device,
                    transport_id: Some("3".to_string()),
                    model: Some("ONEPLUS_A6000".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_parse_devices_keeps_unauthorized_and_skips_daemon_chatter() {
        let adb_output = "* daemon not running; starting now at tcp:5037\n* daemon started successfully\nList of devices attached\nR58M123 unauthorized usb:1-1 transport_id:7\nemulator-5554 offline\n\n";
        let devices = AdbShell::parse_devices(adb_output);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].state, DeviceState::Unauthorized);
        assert!(!devices[0].is_ready());
        assert_eq!(devices[1].name, "emulator-5554");
        assert_eq!(devices[1].state, DeviceState::Offline);
    }

    #[test]
    fn test_parse_devices_skips_server_restart_chatter() {
        let adb_output = "adb server version (41) doesn't match this client (39); killing...\n* daemon started successfully\nList of devices attached\n1d36d8f1 device transport_id:2\nR58M123 recovery\nweird line here\n";
        let devices = AdbShell::parse_devices(adb_output);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "1d36d8f1");
        assert_eq!(devices[1].state, DeviceState::Other("recovery".to_string()));
    }

    #[test]
    fn test_parse_devices_empty() {
        assert!(AdbShell::parse_devices("List of devices attached\n").is_empty());
        assert!(AdbShell::parse_devices("").is_empty());
    }

    #[test]
    fn test_parse_version() {
        let out = "Android Debug Bridge version 1.0.41\nVersion 34.0.5-10900879\nInstalled as /opt/platform-tools/adb\nRunning on Linux 6.1.0 (x86_64)";
        let v = AdbShell::parse_version(out);
        assert_eq!(v.bridge.as_deref(), Some("1.0.41"));
        assert_eq!(v.release.as_deref(), Some("34.0.5"));
    }

    #[test]
    fn test_parse_version_partial() {
        let v = AdbShell::parse_version("Android Debug Bridge version 1.0.39");
        assert_eq!(v.bridge.as_deref(), Some("1.0.39"));
        assert_eq!(v.release, None);
        assert_eq!(AdbShell::parse_version(""), AdbVersion::default());
    }

    #[test]
    fn test_new_falls_back_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let adb = AdbShell::new(dir.path());
        assert_eq!(adb.program(), Path::new(ADB_BINARY));

        std::fs::write(dir.path().join(ADB_BINARY), b"").unwrap();
        let adb = AdbShell::new(dir.path());
        assert_eq!(adb.program(), dir.path().join(ADB_BINARY));
    }

    #[test]
    fn test_new_with_relative_sdk_dir_resolves_bundled_adb() {
        // tempdir_in(".") hands back a path relative to the test's cwd
        let dir = tempfile::tempdir_in(".").unwrap();
        assert!(dir.path().is_relative());
        std::fs::write(dir.path().join(ADB_BINARY), b"").unwrap();

        let adb = AdbShell::new(dir.path());
        assert!(adb.program().is_absolute());
        assert!(adb.program().is_file());
        assert_eq!(adb.program().file_name(), Some(std::ffi::OsStr::new(ADB_BINARY)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_version_runs_bundled_adb_from_relative_sdk_dir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir_in(".").unwrap();
        let sdk_dir = dir.path().join("platform-tools");
        std::fs::create_dir(&sdk_dir).unwrap();
        let fake_adb = sdk_dir.join(ADB_BINARY);
        std::fs::write(
            &fake_adb,
            "#!/bin/sh\necho 'Android Debug Bridge version 1.0.41'\necho 'Version 34.0.5-10900879'\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake_adb, std::fs::Permissions::from_mode(0o755)).unwrap();

        let version = AdbShell::new(&sdk_dir).check_version().await.unwrap();
        assert_eq!(version.bridge.as_deref(), Some("1.0.41"));
        assert_eq!(version.release.as_deref(), Some("34.0.5"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/sdcard"), "'/sdcard'");
        assert_eq!(shell_quote("/sdcard/it's here"), r"'/sdcard/it'\''s here'");
    }
}
