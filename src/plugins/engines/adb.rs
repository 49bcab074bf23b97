use async_trait::async_trait;
use tokio::process::Command;

use crate::config::DeviceConfig;
use crate::plugins::traits::DeviceProbe;

/// Probes `adb devices` for an attached, authorized device.
pub struct AdbDeviceProbe {
    config: DeviceConfig,
}

impl AdbDeviceProbe {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// True when the listing has at least one entry in the `device` state.
    pub fn has_ready_device(listing: &str) -> bool {
        listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("List of devices"))
            .any(|line| {
                let mut columns = line.split_whitespace();
                matches!((columns.next(), columns.next()), (Some(_), Some("device")))
            })
    }
}

#[async_trait]
impl DeviceProbe for AdbDeviceProbe {
    async fn is_connected(&self) -> bool {
        match Command::new(&self.config.adb_path).arg("devices").output().await {
            Ok(output) => Self::has_ready_device(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                tracing::warn!("Device probe failed ({}): {}", self.config.adb_path, e);
                false
            }
        }
    }
}
