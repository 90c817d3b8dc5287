//! The telemetry provider boundary.
//!
//! A provider opens a session; every sub-query of one live read goes through
//! that session and the session is dropped when the read is done. Each method
//! fails on its own so one broken query never spoils the others.

use serde::{Deserialize, Serialize};
use speccheck_model::BatteryStatus;

use crate::error::TelemetryError;

/// Manufacturer, model and family as reported by the firmware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputerSystem {
    pub manufacturer: String,
    pub model: String,
    pub family: String,
}

/// One physical disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    pub size_bytes: u64,
    /// Caption or model string.
    pub descriptor: String,
    pub media_type: String,
}

/// Current mode of one display adapter; either dimension may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A mounted removable storage device, as listed by the USB check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RemovableDevice {
    pub id: String,
    pub description: String,
}

impl std::fmt::Display for RemovableDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.description.is_empty() {
            f.write_str(&self.id)
        } else {
            write!(f, "{} - {}", self.id, self.description)
        }
    }
}

/// Source of hardware sessions.
pub trait TelemetryProvider {
    fn name(&self) -> &'static str;

    fn open(&self) -> Result<Box<dyn TelemetrySession + '_>, TelemetryError>;
}

/// Queries available while a session is open.
pub trait TelemetrySession {
    fn processor_name(&self) -> Result<String, TelemetryError>;

    fn bios_serial(&self) -> Result<String, TelemetryError>;

    /// Current modes in adapter order.
    fn display_modes(&self) -> Result<Vec<DisplayMode>, TelemetryError>;

    fn os_build_number(&self) -> Result<u32, TelemetryError>;

    fn computer_system(&self) -> Result<ComputerSystem, TelemetryError>;

    fn total_memory_bytes(&self) -> Result<u64, TelemetryError>;

    /// Fixed disks only.
    fn disks(&self) -> Result<Vec<DiskInfo>, TelemetryError>;

    fn battery_status(&self) -> Result<BatteryStatus, TelemetryError>;

    fn removable_devices(&self) -> Result<Vec<RemovableDevice>, TelemetryError>;
}
