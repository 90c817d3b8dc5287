//! Live spec reading against a scripted provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use speccheck_model::{
    BatteryStatus, ChargingState, DriveType, HealthReading, SpecField, UNKNOWN,
};
use speccheck_telemetry::{
    ComputerSystem, DiskInfo, DisplayMode, HealthSource, LiveSpecReader, RemovableDevice,
    TelemetryError, TelemetryProvider, TelemetrySession,
};

// ============================================================================
// Scripted provider
// ============================================================================

#[derive(Clone, Default)]
struct Machine {
    cpu: Option<String>,
    serial: Option<String>,
    modes: Option<Vec<DisplayMode>>,
    build: Option<u32>,
    system: Option<ComputerSystem>,
    memory: Option<u64>,
    disks: Option<Vec<DiskInfo>>,
    battery: Option<BatteryStatus>,
    removable: Option<Vec<RemovableDevice>>,
}

fn missing<T>(value: Option<T>, attribute: &'static str) -> Result<T, TelemetryError> {
    value.ok_or(TelemetryError::Missing { attribute })
}

struct FakeProvider {
    machine: Machine,
    fail_open: bool,
    opens: Arc<AtomicUsize>,
}

impl FakeProvider {
    fn new(machine: Machine) -> Self {
        Self {
            machine,
            fail_open: false,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TelemetryProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn open(&self) -> Result<Box<dyn TelemetrySession + '_>, TelemetryError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(TelemetryError::Unsupported {
                attribute: "session",
            });
        }
        Ok(Box::new(FakeSession(&self.machine)))
    }
}

struct FakeSession<'a>(&'a Machine);

impl TelemetrySession for FakeSession<'_> {
    fn processor_name(&self) -> Result<String, TelemetryError> {
        missing(self.0.cpu.clone(), "processor name")
    }

    fn bios_serial(&self) -> Result<String, TelemetryError> {
        missing(self.0.serial.clone(), "serial number")
    }

    fn display_modes(&self) -> Result<Vec<DisplayMode>, TelemetryError> {
        missing(self.0.modes.clone(), "display")
    }

    fn os_build_number(&self) -> Result<u32, TelemetryError> {
        missing(self.0.build, "build number")
    }

    fn computer_system(&self) -> Result<ComputerSystem, TelemetryError> {
        missing(self.0.system.clone(), "computer system")
    }

    fn total_memory_bytes(&self) -> Result<u64, TelemetryError> {
        missing(self.0.memory, "total memory")
    }

    fn disks(&self) -> Result<Vec<DiskInfo>, TelemetryError> {
        missing(self.0.disks.clone(), "disks")
    }

    fn battery_status(&self) -> Result<BatteryStatus, TelemetryError> {
        missing(self.0.battery, "battery")
    }

    fn removable_devices(&self) -> Result<Vec<RemovableDevice>, TelemetryError> {
        missing(self.0.removable.clone(), "removable devices")
    }
}

struct FixedHealth(Vec<HealthReading>);

impl HealthSource for FixedHealth {
    fn read_health(&self) -> Vec<HealthReading> {
        self.0.clone()
    }
}

fn thinkpad() -> Machine {
    Machine {
        cpu: Some("Intel(R) Core(TM) i5-8350U CPU @ 1.70GHz".to_string()),
        serial: Some("  PF1ABCDE \n".to_string()),
        modes: Some(vec![DisplayMode {
            width: Some(1920),
            height: Some(1080),
        }]),
        build: Some(22631),
        system: Some(ComputerSystem {
            manufacturer: "LENOVO".to_string(),
            model: "20L5CTO1WW".to_string(),
            family: "ThinkPad T480".to_string(),
        }),
        memory: Some(8 * 1024 * 1024 * 1024),
        disks: Some(vec![DiskInfo {
            size_bytes: 256_060_514_304,
            descriptor: "SAMSUNG MZVLB256HAHQ-000L7 NVMe".to_string(),
            media_type: "Fixed hard disk media".to_string(),
        }]),
        battery: Some(BatteryStatus {
            charge_percent: Some(64),
            charging: ChargingState::Charging,
        }),
        removable: Some(vec![
            RemovableDevice {
                id: "F:".to_string(),
                description: "BACKUP".to_string(),
            },
            RemovableDevice {
                id: "E:".to_string(),
                description: "KINGSTON".to_string(),
            },
        ]),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn reads_every_field() {
    let reader = LiveSpecReader::new(
        FakeProvider::new(thinkpad()),
        FixedHealth(vec![HealthReading::Percent(82)]),
    );
    let spec = reader.read();

    assert_eq!(spec.serial_number(), "PF1ABCDE");
    assert_eq!(spec.drive_type(), DriveType::Ssd);
    assert_eq!(
        spec.get(SpecField::Cpu),
        "Intel(R) Core(TM) i5-8350U CPU @ 1.70GHz"
    );
    assert_eq!(spec.get(SpecField::Model), "T480");
    assert_eq!(spec.get(SpecField::Storage), "256GB");
    assert_eq!(spec.get(SpecField::Memory), "8GB");
    assert_eq!(spec.get(SpecField::Resolution), "1920x1080");
    assert_eq!(spec.get(SpecField::OsEdition), "Windows 11");
    assert_eq!(spec.get(SpecField::Battery), "82%");
    assert_eq!(spec.get(SpecField::SecondaryBattery), UNKNOWN);
}

#[test]
fn failed_sub_reads_only_blank_their_own_field() {
    let machine = Machine {
        cpu: None,
        build: None,
        disks: None,
        ..thinkpad()
    };
    let reader = LiveSpecReader::new(
        FakeProvider::new(machine),
        FixedHealth(vec![HealthReading::Unknown]),
    );
    let spec = reader.read();

    assert_eq!(spec.get(SpecField::Cpu), UNKNOWN);
    assert_eq!(spec.get(SpecField::OsEdition), UNKNOWN);
    assert_eq!(spec.get(SpecField::Storage), UNKNOWN);
    assert_eq!(spec.drive_type(), DriveType::Unknown);
    assert_eq!(spec.get(SpecField::Battery), UNKNOWN);

    assert_eq!(spec.serial_number(), "PF1ABCDE");
    assert_eq!(spec.get(SpecField::Memory), "8GB");
    assert_eq!(spec.get(SpecField::Model), "T480");
}

#[test]
fn session_failure_leaves_everything_unknown() {
    let mut provider = FakeProvider::new(thinkpad());
    provider.fail_open = true;
    let reader = LiveSpecReader::new(provider, FixedHealth(vec![HealthReading::Percent(90)]));
    let spec = reader.read();

    assert!(!spec.has_serial_number());
    for field in SpecField::ALL {
        assert_eq!(spec.get(field), UNKNOWN, "{field}");
    }
}

#[test]
fn second_battery_fills_secondary_field() {
    let reader = LiveSpecReader::new(
        FakeProvider::new(thinkpad()),
        FixedHealth(vec![HealthReading::Percent(91), HealthReading::Percent(47)]),
    );
    let spec = reader.read();
    assert_eq!(spec.get(SpecField::Battery), "91%");
    assert_eq!(spec.get(SpecField::SecondaryBattery), "47%");
}

#[test]
fn every_read_queries_the_host_again() {
    let provider = FakeProvider::new(thinkpad());
    let opens = Arc::clone(&provider.opens);
    let reader = LiveSpecReader::new(provider, FixedHealth(vec![]));

    let first = reader.read();
    let second = reader.read();
    assert_eq!(first, second);
    assert_eq!(opens.load(Ordering::SeqCst), 2);
}

#[test]
fn blank_serial_is_unknown() {
    let machine = Machine {
        serial: Some("   ".to_string()),
        ..thinkpad()
    };
    let reader = LiveSpecReader::new(FakeProvider::new(machine), FixedHealth(vec![]));
    assert_eq!(reader.read().serial_number(), UNKNOWN);
}

#[test]
fn battery_status_defaults_when_unavailable() {
    let reader = LiveSpecReader::new(FakeProvider::new(thinkpad()), FixedHealth(vec![]));
    let status = reader.battery_status();
    assert_eq!(status.charge_percent, Some(64));
    assert_eq!(status.charging, ChargingState::Charging);

    let machine = Machine {
        battery: None,
        ..thinkpad()
    };
    let reader = LiveSpecReader::new(FakeProvider::new(machine), FixedHealth(vec![]));
    assert_eq!(reader.battery_status(), BatteryStatus::default());
}

#[test]
fn removable_devices_are_sorted() {
    let reader = LiveSpecReader::new(FakeProvider::new(thinkpad()), FixedHealth(vec![]));
    let devices = reader.removable_devices().unwrap();
    let ids: Vec<&str> = devices.iter().map(|device| device.id.as_str()).collect();
    assert_eq!(ids, ["E:", "F:"]);
    assert_eq!(devices[0].to_string(), "E: - KINGSTON");
}
