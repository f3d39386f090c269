// ADB module - thin wrapper around the external `adb` binary
// Every device interaction goes through `AdbClient::shell`, so the mirror and
// property reader can run against a fake device in tests.

pub mod error;
pub mod shell;
pub mod types;


// Re-export the main types and functions for easy access
pub use error::{AdbError, AdbResult};
pub use shell::{AdbShell, DeviceHandle, shell_quote};
pub use types::{AdbClient, AdbVersion, Device, DeviceState};
