pub mod assignment;
pub mod battery;
pub mod checks;
pub mod report;
pub mod spec;

pub use assignment::{AssignmentSummary, SerialAssignmentRecord, SpecSnapshot};
pub use battery::{BatteryStatus, ChargingState, GaugeBand, HealthReading};
pub use checks::{HardwareTest, TestOutcome, TestResultSet};
pub use report::{Mismatch, MismatchReport};
pub use spec::{
    ActualSpec, ComparePolicy, DriveType, ExpectedSpec, SpecField, SpecSheet, UNKNOWN,
    is_known_value,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes() {
        let report = MismatchReport::from_mismatches(vec![Mismatch {
            field: SpecField::Memory,
            expected: "8GB".to_string(),
            actual: "16GB".to_string(),
            reason: "Expected 8GB, Found 16GB".to_string(),
        }]);
        let json = serde_json::to_string(&report).expect("serialize report");
        assert!(json.contains("\"field\":\"memory\""));
        let round: MismatchReport = serde_json::from_str(&json).expect("deserialize report");
        assert_eq!(round, report);
    }

    #[test]
    fn actual_spec_serializes_with_field_keys() {
        let spec = ActualSpec::new(
            "SN1",
            DriveType::Ssd,
            SpecSheet::new().with(SpecField::OsEdition, "Windows 11"),
        );
        let json = serde_json::to_value(&spec).expect("serialize spec");
        assert_eq!(json["sheet"]["os_edition"], "Windows 11");
        assert_eq!(json["serial_number"], "SN1");
    }
}
