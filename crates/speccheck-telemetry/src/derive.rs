//! Turning raw telemetry into spec values.

use std::sync::LazyLock;

use regex::Regex;
use speccheck_model::DriveType;

use crate::provider::{ComputerSystem, DiskInfo, DisplayMode};

/// First Windows build number that is Windows 11.
pub const WINDOWS_11_FIRST_BUILD: u32 = 22000;

/// Storage labels with their inclusive lower bounds in decimal GB, largest
/// first.
pub const STORAGE_LADDER: [(&str, f64); 6] = [
    ("4TB", 3900.0),
    ("2TB", 1800.0),
    ("1TB", 900.0),
    ("512GB", 450.0),
    ("256GB", 220.0),
    ("128GB", 110.0),
];

const DRIVE_MARKERS: [&str; 3] = ["ssd", "nvme", "m.2"];

const CPU_ANNOTATION: &str = "w/";

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1_000_000_000.0;

static THINKPAD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)thinkpad\s*").expect("valid regex"));

/// Processor name without the trailing "w/ ..." annotation.
///
/// `"AMD Ryzen 5 PRO 4650U w/ Radeon Graphics"` becomes
/// `"AMD Ryzen 5 PRO 4650U"`.
pub fn strip_cpu_annotation(name: &str) -> &str {
    name.split_once(CPU_ANNOTATION)
        .map_or(name, |(head, _)| head)
        .trim()
}

pub fn edition_from_build(build: u32) -> &'static str {
    if build >= WINDOWS_11_FIRST_BUILD {
        "Windows 11"
    } else {
        "Windows 10"
    }
}

/// "WIDTHxHEIGHT" of the first adapter reporting both dimensions.
pub fn primary_resolution(modes: &[DisplayMode]) -> Option<String> {
    modes.iter().find_map(|mode| match (mode.width, mode.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Some(format!("{width}x{height}"))
        }
        _ => None,
    })
}

/// Model name as printed on the SKU.
///
/// Lenovo puts the marketing name in the system family ("ThinkPad T480")
/// and a machine type in the model ("20L5CTO1WW").
pub fn chassis_model(system: &ComputerSystem) -> String {
    if system.manufacturer.to_lowercase().contains("lenovo") {
        let family = THINKPAD_PREFIX.replace_all(system.family.trim(), "");
        let family = family.trim();
        if !family.is_empty() {
            return family.to_string();
        }
    }
    system.model.trim().to_string()
}

/// Total memory rounded to the nearest GiB.
pub fn memory_label(total_bytes: u64) -> String {
    let gib = (total_bytes as f64 / BYTES_PER_GIB).round();
    format!("{gib}GB")
}

/// Sum of disk sizes in decimal GB.
pub fn total_storage_gb(disks: &[DiskInfo]) -> f64 {
    disks
        .iter()
        .map(|disk| disk.size_bytes as f64 / BYTES_PER_GB)
        .sum()
}

/// Nominal capacity label for a measured size.
pub fn bucket_storage(total_gb: f64) -> String {
    STORAGE_LADDER
        .iter()
        .find(|(_, floor)| total_gb >= *floor)
        .map_or_else(
            || format!("{}GB", total_gb.round()),
            |(label, _)| (*label).to_string(),
        )
}

/// SSD if any disk advertises itself as solid state, else HDD.
pub fn classify_drives(disks: &[DiskInfo]) -> DriveType {
    if disks.is_empty() {
        return DriveType::Unknown;
    }
    let solid_state = disks.iter().any(|disk| {
        let descriptor = disk.descriptor.to_lowercase();
        let media = disk.media_type.to_lowercase();
        DRIVE_MARKERS.iter().any(|marker| descriptor.contains(marker)) || media.contains("ssd")
    });
    if solid_state {
        DriveType::Ssd
    } else {
        DriveType::Hdd
    }
}
