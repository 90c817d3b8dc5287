//! The live spec reader.

use speccheck_model::{
    ActualSpec, BatteryStatus, DriveType, HealthReading, SpecField, SpecSheet, UNKNOWN,
};

use crate::battery::{BatteryReportReader, HealthSource, SysfsBatteryHealth};
use crate::cim::CimProvider;
use crate::derive::{
    bucket_storage, chassis_model, classify_drives, edition_from_build, memory_label,
    primary_resolution, strip_cpu_annotation, total_storage_gb,
};
use crate::error::TelemetryError;
use crate::provider::{RemovableDevice, TelemetryProvider, TelemetrySession};
use crate::sysfs::SysfsProvider;

type Provider = Box<dyn TelemetryProvider + Send + Sync>;
type Health = Box<dyn HealthSource + Send + Sync>;

/// Reads the running machine into an [`ActualSpec`].
///
/// Every call queries the host again. A failing sub-query leaves its field
/// "Unknown" and is logged; it never fails the read.
pub struct LiveSpecReader {
    provider: Provider,
    health: Health,
}

impl std::fmt::Debug for LiveSpecReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSpecReader")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

/// Log a failed sub-read and drop it.
fn logged<T>(field: &'static str, result: Result<T, TelemetryError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(field, %error, "telemetry read failed");
            None
        }
    }
}

fn known(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value != UNKNOWN).then(|| value.to_string())
}

impl LiveSpecReader {
    pub fn new(
        provider: impl TelemetryProvider + Send + Sync + 'static,
        health: impl HealthSource + Send + Sync + 'static,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            health: Box::new(health),
        }
    }

    /// Providers for the host platform.
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::new(CimProvider::new(), BatteryReportReader::powercfg())
        } else {
            Self::new(SysfsProvider::new(), SysfsBatteryHealth::new())
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn read(&self) -> ActualSpec {
        let session = match self.provider.open() {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    %error,
                    "could not open telemetry session"
                );
                return ActualSpec::new(UNKNOWN, DriveType::Unknown, SpecSheet::new());
            }
        };
        let spec = self.read_session(session.as_ref());
        drop(session);

        tracing::info!(
            serial_number = spec.serial_number(),
            drive_type = %spec.drive_type(),
            cpu = spec.get(SpecField::Cpu),
            memory = spec.get(SpecField::Memory),
            storage = spec.get(SpecField::Storage),
            battery = spec.get(SpecField::Battery),
            "read live spec"
        );
        spec
    }

    fn read_session(&self, session: &dyn TelemetrySession) -> ActualSpec {
        let mut sheet = SpecSheet::new();

        let serial = logged("serial number", session.bios_serial())
            .and_then(|serial| known(&serial))
            .unwrap_or_else(|| UNKNOWN.to_string());

        if let Some(cpu) = logged("cpu", session.processor_name())
            .and_then(|name| known(strip_cpu_annotation(&name)))
        {
            sheet.set(SpecField::Cpu, cpu);
        }

        if let Some(resolution) =
            logged("resolution", session.display_modes()).and_then(|modes| primary_resolution(&modes))
        {
            sheet.set(SpecField::Resolution, resolution);
        }

        if let Some(build) = logged("os edition", session.os_build_number()) {
            sheet.set(SpecField::OsEdition, edition_from_build(build));
        }

        if let Some(model) = logged("model", session.computer_system())
            .and_then(|system| known(&chassis_model(&system)))
        {
            sheet.set(SpecField::Model, model);
        }

        if let Some(bytes) = logged("memory", session.total_memory_bytes()) {
            sheet.set(SpecField::Memory, memory_label(bytes));
        }

        let mut drive_type = DriveType::Unknown;
        if let Some(disks) = logged("storage", session.disks()) {
            drive_type = classify_drives(&disks);
            if !disks.is_empty() {
                sheet.set(SpecField::Storage, bucket_storage(total_storage_gb(&disks)));
            }
        }

        let health = self.health.read_health();
        let battery_fields = [SpecField::Battery, SpecField::SecondaryBattery];
        for (field, reading) in battery_fields.into_iter().zip(health) {
            if let HealthReading::Percent(_) = reading {
                sheet.set(field, reading.to_string());
            }
        }

        ActualSpec::new(serial, drive_type, sheet)
    }

    /// Instantaneous charge; unknown on any failure.
    pub fn battery_status(&self) -> BatteryStatus {
        let status = self
            .provider
            .open()
            .and_then(|session| session.battery_status());
        match status {
            Ok(status) => status,
            Err(error) => {
                tracing::debug!(%error, "battery status unavailable");
                BatteryStatus::default()
            }
        }
    }

    pub fn removable_devices(&self) -> Result<Vec<RemovableDevice>, TelemetryError> {
        let session = self.provider.open()?;
        let mut devices = session.removable_devices()?;
        devices.sort();
        Ok(devices)
    }
}
