use crate::adb::{AdbClient, AdbError, AdbResult, AdbShell, AdbVersion};
use crate::build_prop::{DeviceSummary, read_device_props};
use crate::config::AppConfig;
use crate::mirror::{MirrorConfig, MirrorStats, mirror_device};
use crate::platform_tools::PlatformTools;
use crate::watch::MirrorWatcher;
use serde::Serialize;
use std::future::Future;

#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub serial: String,
    pub summary: Option<DeviceSummary>,
    pub stats: MirrorStats,
}

#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub downloaded: bool,
    pub version: AdbVersion,
    pub devices: Vec<DeviceReport>,
    pub skipped_devices: Vec<String>,
}

/// Read the properties of one device and mirror its tree.
pub async fn sync_device<C: AdbClient>(client: &C, mirror: &MirrorConfig) -> AdbResult<DeviceReport> {
    let summary = match read_device_props(client).await {
        Ok(props) => {
            let summary = DeviceSummary::from_props(&props);
            log::info!("{}: {summary}", client.serial());
            Some(summary)
        }
        Err(e) => {
            log::warn!("{}: could not read build.prop: {e}", client.serial());
            None
        }
    };
    let stats = mirror_device(client, mirror).await?;
    Ok(DeviceReport {
        serial: client.serial().to_string(),
        summary,
        stats,
    })
}

pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn mirror_config(&self) -> MirrorConfig {
        MirrorConfig {
            root: self.config.mapping_dir.clone(),
            remote_root: self.config.remote_root.clone(),
            max_depth: self.config.mirror_depth,
        }
    }

    /// Download tools if needed, then mirror every ready device.
    pub async fn sync(&self) -> AdbResult<RunReport> {
        let mut report = RunReport {
            downloaded: PlatformTools::from_config(&self.config)
                .ensure(self.config.refresh)
                .await?,
            ..RunReport::default()
        };

        let adb = AdbShell::new(&self.config.sdk_dir);
        report.version = adb.check_version().await?;
        log::info!(
            "using {} (bridge {}, platform-tools {})",
            adb.program().display(),
            report.version.bridge.as_deref().unwrap_or("?"),
            report.version.release.as_deref().unwrap_or("?")
        );

        let mapping_dir = &self.config.mapping_dir;
        tokio::fs::create_dir_all(mapping_dir)
            .await
            .map_err(|e| AdbError::io(mapping_dir, e))?;

        let devices = adb.list_devices().await?;
        if devices.is_empty() {
            log::warn!("no devices attached");
        }
        let mirror = self.mirror_config();
        for device in devices {
            if !device.is_ready() {
                log::warn!("{}: skipped, state is {:?}", device.name, device.state);
                report.skipped_devices.push(device.name);
                continue;
            }
            log::info!(
                "android device: {} {}",
                device.name,
                device.model.as_deref().unwrap_or("")
            );
            match sync_device(&adb.device(&device.name), &mirror).await {
                Ok(device_report) => report.devices.push(device_report),
                Err(e) => {
                    log::error!("{}: mirror failed: {e}", device.name);
                    report.skipped_devices.push(device.name);
                }
            }
        }
        Ok(report)
    }

    /// Watch the mapping directory until `stop` resolves.
    pub async fn watch<F>(&self, stop: F) -> AdbResult<usize>
    where
        F: Future<Output = ()>,
    {
        let mapping_dir = &self.config.mapping_dir;
        tokio::fs::create_dir_all(mapping_dir)
            .await
            .map_err(|e| AdbError::io(mapping_dir, e))?;
        MirrorWatcher::new(mapping_dir)?.run(stop).await
    }
}
