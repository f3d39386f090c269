use android_adb_mirror::args::{Args, Invocation, print_help};
use android_adb_mirror::{App, AppConfig, BUILD_DATE, VERSION_DISPLAY};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match Args::parse() {
        Ok(Invocation::Run(config)) => *config,
        Ok(Invocation::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Version) => {
            println!("Android ADB Mirror v{VERSION_DISPLAY} (built {BUILD_DATE})");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("❌ {e}");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    let default_level = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    rt.block_on(run(config))
}

async fn run(config: AppConfig) -> ExitCode {
    println!("🚀 Android ADB Mirror in {}", config.work_dir.display());
    let watch = config.watch;
    let watch_timeout = config.watch_timeout;
    let app = App::new(config);

    match app.sync().await {
        Ok(report) => {
            for device in &report.devices {
                println!(
                    "✅ {}: {} dirs, {} files mirrored",
                    device.serial, device.stats.dirs_created, device.stats.files_created
                );
            }
            for serial in &report.skipped_devices {
                println!("⚠️ {serial}: skipped");
            }
            if report.devices.is_empty() && report.skipped_devices.is_empty() {
                println!("❌ No devices found");
            }
        }
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    }

    if !watch {
        return ExitCode::SUCCESS;
    }

    println!(
        "👀 Watching {} (Ctrl-C to stop)",
        app.config().mapping_dir.display()
    );
    let stop = async move {
        let deadline = async {
            match watch_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::info!("interrupted"),
            _ = deadline => log::info!("watch timeout reached"),
        }
    };
    match app.watch(stop).await {
        Ok(count) => {
            println!("🛑 Stopped after {count} events");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Watch failed: {e}");
            ExitCode::FAILURE
        }
    }
}
