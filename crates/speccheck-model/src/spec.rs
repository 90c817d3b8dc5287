//! Spec fields and the expected/actual spec records compared by the reconciler.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel stored for any field whose value could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// How a field's expected and actual values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparePolicy {
    /// Case and whitespace-insensitive equality.
    Exact,
    /// Actual percentage must be at least the expected percentage.
    MinimumPercent,
}

/// A semantic hardware attribute tracked on both sides of a comparison.
///
/// Declaration order is the display and report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    Model,
    Cpu,
    Storage,
    Memory,
    Resolution,
    OsEdition,
    Battery,
    SecondaryBattery,
}

impl SpecField {
    /// Every field in report order.
    pub const ALL: [SpecField; 8] = [
        Self::Model,
        Self::Cpu,
        Self::Storage,
        Self::Memory,
        Self::Resolution,
        Self::OsEdition,
        Self::Battery,
        Self::SecondaryBattery,
    ];

    /// Label shown to technicians.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Model => "Model",
            Self::Cpu => "CPU",
            Self::Storage => "SSD",
            Self::Memory => "RAM",
            Self::Resolution => "Resolution",
            Self::OsEdition => "Windows",
            Self::Battery => "Battery",
            Self::SecondaryBattery => "Battery 2",
        }
    }

    pub const fn policy(&self) -> ComparePolicy {
        match self {
            Self::Battery | Self::SecondaryBattery => ComparePolicy::MinimumPercent,
            _ => ComparePolicy::Exact,
        }
    }

    /// Whether the field is only shown when one side reports a value.
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::SecondaryBattery)
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Field values keyed by [`SpecField`]. Absent fields read as [`UNKNOWN`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecSheet {
    values: BTreeMap<SpecField, String>,
}

impl SpecSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the updated sheet.
    #[must_use]
    pub fn with(mut self, field: SpecField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: SpecField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// Value for `field`, or [`UNKNOWN`] when it was never set.
    pub fn get(&self, field: SpecField) -> &str {
        self.values.get(&field).map_or(UNKNOWN, String::as_str)
    }

    /// True when the field holds something other than the sentinel.
    pub fn is_known(&self, field: SpecField) -> bool {
        is_known_value(self.get(field))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpecField, &str)> {
        self.values.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

impl FromIterator<(SpecField, String)> for SpecSheet {
    fn from_iter<I: IntoIterator<Item = (SpecField, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// True for any value other than the empty string or [`UNKNOWN`].
pub fn is_known_value(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(UNKNOWN)
}

/// Configuration a SKU promises, derived once per SKU string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedSpec {
    sku: String,
    sheet: SpecSheet,
}

impl ExpectedSpec {
    pub fn new(sku: impl Into<String>, sheet: SpecSheet) -> Self {
        Self {
            sku: sku.into(),
            sheet,
        }
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn get(&self, field: SpecField) -> &str {
        self.sheet.get(field)
    }

    pub fn sheet(&self) -> &SpecSheet {
        &self.sheet
    }
}

/// Disk technology reported alongside the storage size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveType {
    Ssd,
    Hdd,
    #[default]
    Unknown,
}

impl DriveType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ssd => "SSD",
            Self::Hdd => "HDD",
            Self::Unknown => UNKNOWN,
        }
    }
}

impl fmt::Display for DriveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware configuration read off the running machine.
///
/// Produced fresh by every live read; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualSpec {
    serial_number: String,
    drive_type: DriveType,
    sheet: SpecSheet,
}

impl ActualSpec {
    pub fn new(serial_number: impl Into<String>, drive_type: DriveType, sheet: SpecSheet) -> Self {
        Self {
            serial_number: serial_number.into(),
            drive_type,
            sheet,
        }
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn has_serial_number(&self) -> bool {
        is_known_value(&self.serial_number)
    }

    pub fn drive_type(&self) -> DriveType {
        self.drive_type
    }

    pub fn get(&self, field: SpecField) -> &str {
        self.sheet.get(field)
    }

    pub fn sheet(&self) -> &SpecSheet {
        &self.sheet
    }
}
