use crate::config::AppConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum Invocation {
    Run(Box<AppConfig>),
    Help,
    Version,
}

#[derive(Debug, Default)]
pub struct Args {
    pub work_dir: Option<PathBuf>,
    pub sdk_version: Option<String>,
    pub lang: Option<String>,
    pub refresh: bool,
    pub depth: Option<usize>,
    pub remote_root: Option<String>,
    pub no_watch: bool,
    pub no_proxy: bool,
    pub timeout_secs: Option<u64>,
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Result<Invocation, String> {
        Self::parse_from(env::args().skip(1))
    }

    pub fn parse_from<I>(args: I) -> Result<Invocation, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();

        for arg in args {
            if arg == "--help" || arg == "-h" {
                return Ok(Invocation::Help);
            } else if arg == "--version" || arg == "-v" {
                return Ok(Invocation::Version);
            } else if arg == "--debug" {
                parsed.debug = true;
            } else if arg == "--refresh" {
                parsed.refresh = true;
            } else if arg == "--no-watch" {
                parsed.no_watch = true;
            } else if arg == "--no-proxy" {
                parsed.no_proxy = true;
            } else if let Some(val) = arg.strip_prefix("--work-dir=") {
                parsed.work_dir = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--sdk-version=") {
                parsed.sdk_version = Some(val.to_string());
            } else if let Some(val) = arg.strip_prefix("--lang=") {
                parsed.lang = Some(val.to_string());
            } else if let Some(val) = arg.strip_prefix("--remote-root=") {
                if !val.starts_with('/') {
                    return Err(format!("Remote root must be absolute: {val}"));
                }
                parsed.remote_root = Some(val.to_string());
            } else if let Some(val) = arg.strip_prefix("--depth=") {
                match val.parse::<usize>() {
                    Ok(depth) if depth >= 1 => parsed.depth = Some(depth),
                    _ => return Err(format!("Invalid depth value: {val}")),
                }
            } else if let Some(val) = arg.strip_prefix("--timeout=") {
                match val.parse::<u64>() {
                    Ok(secs) => parsed.timeout_secs = Some(secs),
                    Err(_) => return Err(format!("Invalid timeout value: {val}")),
                }
            } else {
                return Err(format!("Unknown argument: {arg}"));
            }
        }

        Ok(Invocation::Run(Box::new(parsed.into_config()?)))
    }

    fn into_config(self) -> Result<AppConfig, String> {
        let work_dir = match self.work_dir {
            Some(dir) => std::path::absolute(&dir)
                .map_err(|e| format!("Cannot resolve work dir {}: {e}", dir.display()))?,
            None => env::current_dir().map_err(|e| format!("Cannot read current directory: {e}"))?,
        };
        let mut config = AppConfig::new(work_dir).apply_env(|key| env::var(key).ok());
        if let Some(version) = self.sdk_version {
            config.sdk_release = version.parse().unwrap_or_default();
        }
        if let Some(lang) = self.lang {
            config.lang = lang;
        }
        if let Some(depth) = self.depth {
            config.mirror_depth = depth;
        }
        if let Some(root) = self.remote_root {
            config.remote_root = root;
        }
        config.refresh = self.refresh;
        config.watch = !self.no_watch;
        config.download_proxy = !self.no_proxy;
        config.watch_timeout = self.timeout_secs.map(Duration::from_secs);
        config.debug = self.debug;
        Ok(config)
    }
}

pub fn print_help() {
    println!("🤖 Android ADB Mirror");
    println!();
    println!("USAGE:");
    println!("    android-adb-mirror [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --work-dir=PATH       Directory holding platform-tools/ and android_device/ (default: cwd)");
    println!("    --sdk-version=VER     platform-tools release to download, e.g. 34.0.5 (default: latest)");
    println!("    --lang=CODE           Language parameter for the download (default: zh-cn, env ADB_MIRROR_LANG)");
    println!("    --refresh             Delete and re-download platform-tools");
    println!("    --no-proxy            Ignore HTTP(S)_PROXY for the download");
    println!("    --remote-root=PATH    Device directory to mirror (default: /)");
    println!("    --depth=N             Directory levels to mirror (default: 1)");
    println!("    --no-watch            Exit after mirroring instead of watching");
    println!("    --timeout=N           Stop watching after N seconds");
    println!("    --debug               Enable debug logging");
    println!("    --help, -h            Show this help message");
    println!("    --version, -v         Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    android-adb-mirror");
    println!("    android-adb-mirror --depth=2 --remote-root=/sdcard");
    println!("    android-adb-mirror --sdk-version=34.0.5 --refresh --no-watch");
}
