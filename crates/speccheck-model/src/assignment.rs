use std::fmt;

use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::checks::TestResultSet;
use crate::spec::{ActualSpec, SpecField, UNKNOWN};

/// The spec columns persisted with a serial assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSnapshot {
    pub cpu: String,
    pub ram: String,
    pub ssd: String,
    pub model: String,
    pub resolution: String,
    pub windows: String,
    pub battery: String,
}

impl SpecSnapshot {
    /// Labelled values in viewer order.
    pub fn rows(&self) -> [(&'static str, &str); 7] {
        [
            ("CPU", self.cpu.as_str()),
            ("RAM", self.ram.as_str()),
            ("SSD", self.ssd.as_str()),
            ("Model", self.model.as_str()),
            ("Resolution", self.resolution.as_str()),
            ("Windows", self.windows.as_str()),
            ("Battery", self.battery.as_str()),
        ]
    }
}

impl From<&ActualSpec> for SpecSnapshot {
    fn from(spec: &ActualSpec) -> Self {
        let value = |field: SpecField| spec.get(field).to_string();
        Self {
            cpu: value(SpecField::Cpu),
            ram: value(SpecField::Memory),
            ssd: value(SpecField::Storage),
            model: value(SpecField::Model),
            resolution: value(SpecField::Resolution),
            windows: value(SpecField::OsEdition),
            battery: value(SpecField::Battery),
        }
    }
}

/// Binding of one physical unit to an order.
///
/// `assigned_at` is set by storage on every insert or update, in UTC, and is
/// `None` only for records that have not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialAssignmentRecord {
    pub order_number: String,
    pub serial_number: String,
    pub spec: SpecSnapshot,
    pub results: TestResultSet,
    pub assigned_at: Option<NaiveDateTime>,
}

impl SerialAssignmentRecord {
    /// A record ready to be written for the unit described by `spec`.
    pub fn new(order_number: &str, spec: &ActualSpec, results: &TestResultSet) -> Self {
        Self {
            order_number: order_number.to_string(),
            serial_number: spec.serial_number().to_string(),
            spec: SpecSnapshot::from(spec),
            results: results.clone(),
            assigned_at: None,
        }
    }
}

/// Row shown by the serial viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub serial_number: String,
    /// UTC, as stored.
    pub assigned_at: Option<NaiveDateTime>,
}

impl AssignmentSummary {
    /// Local `dd/mm/YYYY HH:MM`, or "Unknown" when storage had no timestamp.
    pub fn display_time(&self) -> String {
        self.display_time_in(&Local)
    }

    pub fn display_time_in<Tz>(&self, zone: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.assigned_at.map_or_else(
            || UNKNOWN.to_string(),
            |at| {
                zone.from_utc_datetime(&at)
                    .format("%d/%m/%Y %H:%M")
                    .to_string()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, Utc};

    use super::*;
    use crate::spec::{DriveType, SpecSheet};

    #[test]
    fn snapshot_takes_spec_columns() {
        let spec = ActualSpec::new(
            "PF1ABCDE",
            DriveType::Ssd,
            SpecSheet::new()
                .with(SpecField::Cpu, "i5")
                .with(SpecField::Memory, "8GB")
                .with(SpecField::Battery, "81%"),
        );
        let snapshot = SpecSnapshot::from(&spec);
        assert_eq!(snapshot.cpu, "i5");
        assert_eq!(snapshot.ram, "8GB");
        assert_eq!(snapshot.battery, "81%");
        assert_eq!(snapshot.model, UNKNOWN);
    }

    #[test]
    fn summary_formats_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(9, 5, 0))
            .unwrap();
        let summary = AssignmentSummary {
            serial_number: "SN1".to_string(),
            assigned_at: Some(at),
        };
        assert_eq!(summary.display_time_in(&Utc), "07/03/2024 09:05");

        let missing = AssignmentSummary {
            serial_number: "SN2".to_string(),
            assigned_at: None,
        };
        assert_eq!(missing.display_time(), "Unknown");
    }

    #[test]
    fn stored_utc_is_shown_in_the_viewer_zone() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(23, 30, 0))
            .unwrap();
        let summary = AssignmentSummary {
            serial_number: "SN1".to_string(),
            assigned_at: Some(at),
        };
        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(summary.display_time_in(&cet), "08/03/2024 00:30");
        assert_eq!(
            summary.display_time(),
            Local.from_utc_datetime(&at).format("%d/%m/%Y %H:%M").to_string()
        );
    }
}
