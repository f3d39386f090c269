// Core ADB types and traits
use super::error::AdbResult;
use serde::Serialize;

// Shell access to one device; the mirror and property reader only need this
#[allow(async_fn_in_trait)]
pub trait AdbClient {
    /// Run `command` in the device shell and return trimmed stdout.
    async fn shell(&self, command: &str) -> AdbResult<String>;
    fn serial(&self) -> &str;
}

#[derive(Debug, PartialEq, Eq, Serialize, Clone)]
pub enum DeviceState {
    Device,
    Offline,
    Unauthorized,
    Other(String),
}

impl DeviceState {
    /// Map the state column of `adb devices`; None for tokens adb never prints there.
    pub fn parse(raw: &str) -> Option<Self> {
        let state = match raw {
            "device" => DeviceState::Device,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            "bootloader" | "recovery" | "rescue" | "sideload" | "host" | "connecting"
            | "authorizing" | "unknown" => DeviceState::Other(raw.to_string()),
            // "no permissions (...)"
            "no" => DeviceState::Other("no permissions".to_string()),
            _ => return None,
        };
        Some(state)
    }
}

#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct Device {
    pub name: String,
    pub state: DeviceState,
    pub transport_id: Option<String>,
    pub model: Option<String>,
}

impl Device {
    pub fn is_ready(&self) -> bool {
        self.state == DeviceState::Device
    }
}

/// Versions reported by `adb version`.
#[derive(Debug, Default, PartialEq, Serialize, Clone)]
pub struct AdbVersion {
    /// Android Debug Bridge protocol version, e.g. `1.0.41`
    pub bridge: Option<String>,
    /// platform-tools release, e.g. `34.0.5`
    pub release: Option<String>,
}
