//! Windows provider backed by CIM queries.
//!
//! Each query runs `Get-CimInstance` through PowerShell and asks for compact
//! JSON. PowerShell prints a bare object for a single instance and an array
//! for several, so decoding goes through [`OneOrMany`].

use std::process::Command;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use speccheck_model::{BatteryStatus, ChargingState};

use crate::error::TelemetryError;
use crate::provider::{
    ComputerSystem, DiskInfo, DisplayMode, RemovableDevice, TelemetryProvider, TelemetrySession,
};

const POWERSHELL: &str = "powershell";

/// `Win32_LogicalDisk.DriveType` for removable media.
const DRIVE_TYPE_REMOVABLE: u32 = 2;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Decode `ConvertTo-Json` output. No output means no instances.
pub(crate) fn parse_cim_json<T: DeserializeOwned>(
    query: &str,
    text: &str,
) -> Result<Vec<T>, TelemetryError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<OneOrMany<T>>(text)
        .map(Vec::from)
        .map_err(|source| TelemetryError::Json {
            query: query.to_string(),
            source,
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Processor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Bios {
    serial_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VideoController {
    current_horizontal_resolution: Option<u32>,
    current_vertical_resolution: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OperatingSystem {
    build_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ComputerSystemRow {
    manufacturer: Option<String>,
    model: Option<String>,
    system_family: Option<String>,
    total_physical_memory: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DiskDrive {
    size: Option<u64>,
    caption: Option<String>,
    media_type: Option<String>,
    interface_type: Option<String>,
}

impl DiskDrive {
    /// USB sticks and card media report as disk drives too.
    fn is_removable(&self) -> bool {
        let usb = self
            .interface_type
            .as_deref()
            .is_some_and(|interface| interface.eq_ignore_ascii_case("usb"));
        let removable = self
            .media_type
            .as_deref()
            .is_some_and(|media| media.to_ascii_lowercase().contains("removable"));
        usb || removable
    }
}

/// Fixed disks among the `Win32_DiskDrive` rows.
fn fixed_disks(rows: Vec<DiskDrive>) -> Vec<DiskInfo> {
    rows.into_iter()
        .filter(|row| !row.is_removable())
        .map(|row| DiskInfo {
            size_bytes: row.size.unwrap_or(0),
            descriptor: row.caption.unwrap_or_default(),
            media_type: row.media_type.unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Battery {
    estimated_charge_remaining: Option<u16>,
    battery_status: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LogicalDisk {
    #[serde(rename = "DeviceID")]
    device_id: String,
    volume_name: Option<String>,
}

/// `Win32_Battery.BatteryStatus` to charging state.
fn charging_state(code: Option<u16>) -> ChargingState {
    match code {
        Some(1) => ChargingState::Discharging,
        Some(2 | 6..=9) => ChargingState::Charging,
        _ => ChargingState::Unknown,
    }
}

/// Runs CIM queries through PowerShell.
#[derive(Debug, Clone, Default)]
pub struct CimProvider;

impl CimProvider {
    pub fn new() -> Self {
        Self
    }

    fn query<T: DeserializeOwned>(
        &self,
        class: &str,
        properties: &[&str],
        filter: Option<&str>,
    ) -> Result<Vec<T>, TelemetryError> {
        let mut script = format!("Get-CimInstance -ClassName {class}");
        if let Some(filter) = filter {
            script.push_str(&format!(" -Filter '{filter}'"));
        }
        script.push_str(&format!(
            " | Select-Object {} | ConvertTo-Json -Compress",
            properties.join(",")
        ));

        tracing::trace!(class, "running CIM query");
        let output = Command::new(POWERSHELL)
            .args(["-NoProfile", "-NonInteractive", "-Command", script.as_str()])
            .output()
            .map_err(|source| TelemetryError::Spawn {
                program: POWERSHELL,
                source,
            })?;
        if !output.status.success() {
            return Err(TelemetryError::CommandFailed {
                program: POWERSHELL,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_cim_json(class, &String::from_utf8_lossy(&output.stdout))
    }

    fn first<T: DeserializeOwned>(
        &self,
        class: &str,
        properties: &[&str],
        attribute: &'static str,
    ) -> Result<T, TelemetryError> {
        self.query(class, properties, None)?
            .into_iter()
            .next()
            .ok_or(TelemetryError::Missing { attribute })
    }
}

impl TelemetryProvider for CimProvider {
    fn name(&self) -> &'static str {
        "cim"
    }

    fn open(&self) -> Result<Box<dyn TelemetrySession + '_>, TelemetryError> {
        tracing::debug!("opening CIM session");
        Ok(Box::new(CimSession { provider: self }))
    }
}

struct CimSession<'a> {
    provider: &'a CimProvider,
}

impl Drop for CimSession<'_> {
    fn drop(&mut self) {
        tracing::debug!("closing CIM session");
    }
}

fn required(value: Option<String>, attribute: &'static str) -> Result<String, TelemetryError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(TelemetryError::Missing { attribute })
}

impl TelemetrySession for CimSession<'_> {
    fn processor_name(&self) -> Result<String, TelemetryError> {
        let row: Processor = self
            .provider
            .first("Win32_Processor", &["Name"], "processor name")?;
        required(row.name, "processor name")
    }

    fn bios_serial(&self) -> Result<String, TelemetryError> {
        let row: Bios = self
            .provider
            .first("Win32_BIOS", &["SerialNumber"], "serial number")?;
        required(row.serial_number, "serial number")
    }

    fn display_modes(&self) -> Result<Vec<DisplayMode>, TelemetryError> {
        let rows: Vec<VideoController> = self.provider.query(
            "Win32_VideoController",
            &["CurrentHorizontalResolution", "CurrentVerticalResolution"],
            None,
        )?;
        Ok(rows
            .into_iter()
            .map(|row| DisplayMode {
                width: row.current_horizontal_resolution,
                height: row.current_vertical_resolution,
            })
            .collect())
    }

    fn os_build_number(&self) -> Result<u32, TelemetryError> {
        let row: OperatingSystem =
            self.provider
                .first("Win32_OperatingSystem", &["BuildNumber"], "build number")?;
        let raw = required(row.build_number, "build number")?;
        raw.parse().map_err(|_| TelemetryError::Parse {
            attribute: "build number",
            value: raw,
        })
    }

    fn computer_system(&self) -> Result<ComputerSystem, TelemetryError> {
        let row: ComputerSystemRow = self.provider.first(
            "Win32_ComputerSystem",
            &["Manufacturer", "Model", "SystemFamily"],
            "computer system",
        )?;
        Ok(ComputerSystem {
            manufacturer: row.manufacturer.unwrap_or_default(),
            model: row.model.unwrap_or_default(),
            family: row.system_family.unwrap_or_default(),
        })
    }

    fn total_memory_bytes(&self) -> Result<u64, TelemetryError> {
        let row: ComputerSystemRow = self.provider.first(
            "Win32_ComputerSystem",
            &["TotalPhysicalMemory"],
            "total memory",
        )?;
        row.total_physical_memory.ok_or(TelemetryError::Missing {
            attribute: "total memory",
        })
    }

    fn disks(&self) -> Result<Vec<DiskInfo>, TelemetryError> {
        let rows: Vec<DiskDrive> = self.provider.query(
            "Win32_DiskDrive",
            &["Size", "Caption", "MediaType", "InterfaceType"],
            None,
        )?;
        Ok(fixed_disks(rows))
    }

    fn battery_status(&self) -> Result<BatteryStatus, TelemetryError> {
        let rows: Vec<Battery> = self.provider.query(
            "Win32_Battery",
            &["EstimatedChargeRemaining", "BatteryStatus"],
            None,
        )?;
        let row = rows.into_iter().next().ok_or(TelemetryError::Missing {
            attribute: "battery",
        })?;
        Ok(BatteryStatus {
            charge_percent: row
                .estimated_charge_remaining
                .map(|value| value.min(100) as u8),
            charging: charging_state(row.battery_status),
        })
    }

    fn removable_devices(&self) -> Result<Vec<RemovableDevice>, TelemetryError> {
        let filter = format!("DriveType={DRIVE_TYPE_REMOVABLE}");
        let rows: Vec<LogicalDisk> = self.provider.query(
            "Win32_LogicalDisk",
            &["DeviceID", "VolumeName"],
            Some(&filter),
        )?;
        Ok(rows
            .into_iter()
            .map(|row| RemovableDevice {
                id: row.device_id,
                description: row.volume_name.unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_instance_is_a_bare_object() {
        let rows: Vec<Processor> = parse_cim_json(
            "Win32_Processor",
            r#"{"Name":"Intel(R) Core(TM) i5-8350U CPU @ 1.70GHz"}"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].name.as_deref(),
            Some("Intel(R) Core(TM) i5-8350U CPU @ 1.70GHz")
        );
    }

    #[test]
    fn several_instances_are_an_array() {
        let rows: Vec<DiskDrive> = parse_cim_json(
            "Win32_DiskDrive",
            r#"[{"Size":256052966400,"Caption":"SAMSUNG MZVLB256HAHQ","MediaType":"Fixed hard disk media"},
                {"Size":null,"Caption":"Card reader","MediaType":null}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].size, Some(256_052_966_400));
        assert_eq!(rows[1].media_type, None);
    }

    #[test]
    fn usb_and_removable_drives_are_not_fixed_disks() {
        let rows: Vec<DiskDrive> = parse_cim_json(
            "Win32_DiskDrive",
            r#"[{"Size":128035676160,"Caption":"SK hynix BC501 NVMe 128GB","MediaType":"Fixed hard disk media","InterfaceType":"SCSI"},
                {"Size":128043171840,"Caption":"SanDisk Ultra USB Device","MediaType":"Removable Media","InterfaceType":"USB"},
                {"Size":64023257088,"Caption":"Generic Flash Disk","MediaType":"External hard disk media","InterfaceType":"USB"}]"#,
        )
        .unwrap();

        let disks = fixed_disks(rows);

        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].descriptor, "SK hynix BC501 NVMe 128GB");
        assert_eq!(disks[0].size_bytes, 128_035_676_160);
    }

    #[test]
    fn empty_output_is_no_instances() {
        let rows: Vec<Battery> = parse_cim_json("Win32_Battery", "\r\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let error = parse_cim_json::<Bios>("Win32_BIOS", "Get-CimInstance : Access denied")
            .unwrap_err();
        assert!(matches!(error, TelemetryError::Json { .. }));
    }

    #[test]
    fn logical_disk_device_id_is_mapped() {
        let rows: Vec<LogicalDisk> =
            parse_cim_json("Win32_LogicalDisk", r#"{"DeviceID":"E:","VolumeName":"KINGSTON"}"#)
                .unwrap();
        assert_eq!(rows[0].device_id, "E:");
    }

    #[test]
    fn battery_status_codes() {
        assert_eq!(charging_state(Some(1)), ChargingState::Discharging);
        assert_eq!(charging_state(Some(2)), ChargingState::Charging);
        assert_eq!(charging_state(Some(7)), ChargingState::Charging);
        assert_eq!(charging_state(Some(3)), ChargingState::Unknown);
        assert_eq!(charging_state(None), ChargingState::Unknown);
    }
}
