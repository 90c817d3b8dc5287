//! Linux provider reading procfs and sysfs.
//!
//! All paths hang off a configurable root so fixtures can stand in for a
//! real machine. There is no Windows build number here; the OS edition is
//! always reported as unsupported.

use std::fs;
use std::path::{Path, PathBuf};

use speccheck_model::{BatteryStatus, ChargingState};

use crate::error::TelemetryError;
use crate::provider::{
    ComputerSystem, DiskInfo, DisplayMode, RemovableDevice, TelemetryProvider, TelemetrySession,
};

const SECTOR_BYTES: u64 = 512;

/// Block devices that are never physical disks.
const VIRTUAL_BLOCK_PREFIXES: [&str; 5] = ["loop", "ram", "zram", "dm-", "sr"];

#[derive(Debug, Clone)]
pub struct SysfsProvider {
    root: PathBuf,
}

impl Default for SysfsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsProvider {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

impl TelemetryProvider for SysfsProvider {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn open(&self) -> Result<Box<dyn TelemetrySession + '_>, TelemetryError> {
        let proc = self.path("proc");
        if !proc.is_dir() {
            return Err(TelemetryError::io(
                proc,
                std::io::Error::new(std::io::ErrorKind::NotFound, "procfs not mounted"),
            ));
        }
        Ok(Box::new(SysfsSession { provider: self }))
    }
}

struct SysfsSession<'a> {
    provider: &'a SysfsProvider,
}

pub(crate) fn read_trimmed(path: &Path) -> Result<String, TelemetryError> {
    fs::read_to_string(path)
        .map(|text| text.trim().to_string())
        .map_err(|source| TelemetryError::io(path, source))
}

fn read_number(path: &Path, attribute: &'static str) -> Result<u64, TelemetryError> {
    let raw = read_trimmed(path)?;
    raw.parse().map_err(|_| TelemetryError::Parse {
        attribute,
        value: raw,
    })
}

/// Directory entries sorted by name, so adapter and disk order is stable.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, TelemetryError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|source| TelemetryError::io(dir, source))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Value of the first `key : value` line in a procfs table.
fn proc_field<'t>(text: &'t str, key: &str) -> Option<&'t str> {
    text.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        (name.trim() == key).then(|| value.trim())
    })
}

/// Battery directories under `power_supply`, in name order.
pub(crate) fn battery_dirs(root: &Path) -> Result<Vec<PathBuf>, TelemetryError> {
    let supplies = sorted_entries(&root.join("sys/class/power_supply"))?;
    Ok(supplies
        .into_iter()
        .filter(|dir| {
            read_trimmed(&dir.join("type")).is_ok_and(|kind| kind == "Battery")
                || file_name(dir).starts_with("BAT")
        })
        .collect())
}

impl SysfsSession<'_> {
    fn block_devices(&self) -> Result<Vec<PathBuf>, TelemetryError> {
        let devices = sorted_entries(&self.provider.path("sys/block"))?;
        Ok(devices
            .into_iter()
            .filter(|dir| {
                let name = file_name(dir);
                !VIRTUAL_BLOCK_PREFIXES
                    .iter()
                    .any(|prefix| name.starts_with(prefix))
            })
            .collect())
    }

    fn is_removable(dir: &Path) -> bool {
        read_trimmed(&dir.join("removable")).is_ok_and(|flag| flag == "1")
    }

    fn device_model(dir: &Path) -> String {
        read_trimmed(&dir.join("device/model")).unwrap_or_default()
    }
}

impl TelemetrySession for SysfsSession<'_> {
    fn processor_name(&self) -> Result<String, TelemetryError> {
        let path = self.provider.path("proc/cpuinfo");
        let text = read_trimmed(&path)?;
        proc_field(&text, "model name")
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or(TelemetryError::Missing {
                attribute: "processor name",
            })
    }

    fn bios_serial(&self) -> Result<String, TelemetryError> {
        let serial = read_trimmed(&self.provider.path("sys/class/dmi/id/product_serial"))?;
        if serial.is_empty() {
            return Err(TelemetryError::Missing {
                attribute: "serial number",
            });
        }
        Ok(serial)
    }

    fn display_modes(&self) -> Result<Vec<DisplayMode>, TelemetryError> {
        let connectors = sorted_entries(&self.provider.path("sys/class/drm"))?;
        let mut modes = Vec::new();
        for connector in connectors {
            let Ok(status) = read_trimmed(&connector.join("status")) else {
                continue;
            };
            if status != "connected" {
                continue;
            }
            let first_mode = read_trimmed(&connector.join("modes"))
                .ok()
                .and_then(|text| text.lines().next().map(str::to_string))
                .unwrap_or_default();
            let (width, height) = first_mode.split_once('x').unwrap_or_default();
            modes.push(DisplayMode {
                width: width.trim().parse().ok(),
                height: height.trim().parse().ok(),
            });
        }
        Ok(modes)
    }

    fn os_build_number(&self) -> Result<u32, TelemetryError> {
        Err(TelemetryError::Unsupported {
            attribute: "Windows build number",
        })
    }

    fn computer_system(&self) -> Result<ComputerSystem, TelemetryError> {
        let dmi = |name: &str| read_trimmed(&self.provider.path(&format!("sys/class/dmi/id/{name}")));
        Ok(ComputerSystem {
            manufacturer: dmi("sys_vendor")?,
            model: dmi("product_name")?,
            family: dmi("product_family").unwrap_or_default(),
        })
    }

    fn total_memory_bytes(&self) -> Result<u64, TelemetryError> {
        let text = read_trimmed(&self.provider.path("proc/meminfo"))?;
        let raw = proc_field(&text, "MemTotal").ok_or(TelemetryError::Missing {
            attribute: "total memory",
        })?;
        let kib: u64 = raw
            .trim_end_matches("kB")
            .trim()
            .parse()
            .map_err(|_| TelemetryError::Parse {
                attribute: "total memory",
                value: raw.to_string(),
            })?;
        Ok(kib * 1024)
    }

    fn disks(&self) -> Result<Vec<DiskInfo>, TelemetryError> {
        let mut disks = Vec::new();
        for dir in self.block_devices()? {
            if Self::is_removable(&dir) {
                continue;
            }
            let sectors = read_number(&dir.join("size"), "disk size")?;
            if sectors == 0 {
                continue;
            }
            let rotational = read_trimmed(&dir.join("queue/rotational")).is_ok_and(|flag| flag == "1");
            let model = Self::device_model(&dir);
            disks.push(DiskInfo {
                size_bytes: sectors * SECTOR_BYTES,
                descriptor: format!("{} {model}", file_name(&dir)).trim().to_string(),
                media_type: if rotational { "HDD" } else { "SSD" }.to_string(),
            });
        }
        Ok(disks)
    }

    fn battery_status(&self) -> Result<BatteryStatus, TelemetryError> {
        let battery = battery_dirs(self.provider.root())?
            .into_iter()
            .next()
            .ok_or(TelemetryError::Missing {
                attribute: "battery",
            })?;
        let charge_percent = read_number(&battery.join("capacity"), "battery charge")
            .ok()
            .map(|value| value.min(100) as u8);
        let charging = match read_trimmed(&battery.join("status")).as_deref() {
            Ok("Charging" | "Full") => ChargingState::Charging,
            Ok("Discharging" | "Not charging") => ChargingState::Discharging,
            _ => ChargingState::Unknown,
        };
        Ok(BatteryStatus {
            charge_percent,
            charging,
        })
    }

    fn removable_devices(&self) -> Result<Vec<RemovableDevice>, TelemetryError> {
        let mut devices = Vec::new();
        for dir in self.block_devices()? {
            if !Self::is_removable(&dir) {
                continue;
            }
            // Empty card readers report removable with zero size.
            if read_number(&dir.join("size"), "disk size").unwrap_or(0) == 0 {
                continue;
            }
            devices.push(RemovableDevice {
                id: file_name(&dir),
                description: Self::device_model(&dir),
            });
        }
        Ok(devices)
    }
}
