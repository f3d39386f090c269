pub mod adb;
pub mod app;
pub mod args;
pub mod build_prop;
pub mod config;
pub mod mirror;
pub mod platform_tools;
pub mod watch;

pub use adb::{AdbClient, AdbError, AdbResult, AdbShell};
pub use app::App;
pub use config::AppConfig;

/// Version string stamped by build.rs (`-dev` suffix off a release tag).
pub const VERSION_DISPLAY: &str = env!("APP_VERSION_DISPLAY");
pub const BUILD_DATE: &str = env!("APP_BUILD_DATE");
