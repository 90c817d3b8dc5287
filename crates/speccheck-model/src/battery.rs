//! Battery readings.
//!
//! Health (full-charge capacity over design capacity) and live charge are
//! separate types so the two are never mixed up.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spec::UNKNOWN;

/// Health of one installed battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthReading {
    Percent(u32),
    Unknown,
}

impl HealthReading {
    pub fn percent(&self) -> Option<u32> {
        match self {
            Self::Percent(value) => Some(*value),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for HealthReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(value) => write!(f, "{value}%"),
            Self::Unknown => f.write_str(UNKNOWN),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargingState {
    Charging,
    Discharging,
    #[default]
    Unknown,
}

/// Instantaneous charge reading, refreshed on every poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Charge remaining, 0-100.
    pub charge_percent: Option<u8>,
    pub charging: ChargingState,
}

impl BatteryStatus {
    /// Change in charge since `initial`, when both readings are known.
    pub fn delta_since(&self, initial: &BatteryStatus) -> Option<i16> {
        match (self.charge_percent, initial.charge_percent) {
            (Some(now), Some(then)) => Some(i16::from(now) - i16::from(then)),
            _ => None,
        }
    }

    pub fn band(&self) -> GaugeBand {
        GaugeBand::for_percent(self.charge_percent.unwrap_or(0))
    }
}

/// Color band of the battery gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeBand {
    Good,
    Fair,
    Low,
}

impl GaugeBand {
    pub fn for_percent(percent: u8) -> Self {
        if percent >= 70 {
            Self::Good
        } else if percent >= 45 {
            Self::Fair
        } else {
            Self::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_displays_as_percent() {
        assert_eq!(HealthReading::Percent(82).to_string(), "82%");
        assert_eq!(HealthReading::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn delta_requires_both_readings() {
        let start = BatteryStatus {
            charge_percent: Some(40),
            charging: ChargingState::Charging,
        };
        let now = BatteryStatus {
            charge_percent: Some(47),
            charging: ChargingState::Charging,
        };
        assert_eq!(now.delta_since(&start), Some(7));
        assert_eq!(BatteryStatus::default().delta_since(&start), None);
    }

    #[test]
    fn gauge_bands() {
        assert_eq!(GaugeBand::for_percent(70), GaugeBand::Good);
        assert_eq!(GaugeBand::for_percent(69), GaugeBand::Fair);
        assert_eq!(GaugeBand::for_percent(45), GaugeBand::Fair);
        assert_eq!(GaugeBand::for_percent(44), GaugeBand::Low);
    }
}
