//! Manual hardware test identifiers and their recorded outcomes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A manual hardware check the technician runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareTest {
    Keyboard,
    Speaker,
    Display,
    Webcam,
    Usb,
}

impl HardwareTest {
    pub const ALL: [HardwareTest; 5] = [
        Self::Keyboard,
        Self::Speaker,
        Self::Display,
        Self::Webcam,
        Self::Usb,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Speaker => "speaker",
            Self::Display => "display",
            Self::Webcam => "webcam",
            Self::Usb => "usb",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Keyboard => "Keyboard Test",
            Self::Speaker => "Speaker Test",
            Self::Display => "Display Test",
            Self::Webcam => "Webcam Test",
            Self::Usb => "USB Test",
        }
    }
}

impl fmt::Display for HardwareTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HardwareTest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|test| test.as_str() == wanted)
            .ok_or_else(|| format!("unknown hardware test: {s}"))
    }
}

/// Recorded result of a hardware test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Pass,
    Fail,
    #[default]
    Unknown,
}

impl TestOutcome {
    /// Value written to storage; unknown outcomes are stored as NULL.
    pub const fn as_stored(&self) -> Option<&'static str> {
        match self {
            Self::Pass => Some("pass"),
            Self::Fail => Some("fail"),
            Self::Unknown => None,
        }
    }

    /// Read a stored value. Anything other than `pass`/`fail` is unknown.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("pass") => Self::Pass,
            Some("fail") => Self::Fail,
            _ => Self::Unknown,
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Pass => "✅",
            Self::Fail => "❌",
            Self::Unknown => "",
        }
    }
}

impl FromStr for TestOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" | "yes" | "y" => Ok(Self::Pass),
            "fail" | "no" | "n" => Ok(Self::Fail),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("invalid test outcome: {other}")),
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored().unwrap_or("unknown"))
    }
}

/// Outcomes for the manual hardware tests of one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestResultSet {
    outcomes: BTreeMap<HardwareTest, TestOutcome>,
}

impl TestResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, test: HardwareTest) -> TestOutcome {
        self.outcomes.get(&test).copied().unwrap_or_default()
    }

    /// Record an outcome. Recording `Unknown` clears a previous result.
    pub fn record(&mut self, test: HardwareTest, outcome: TestOutcome) {
        if outcome == TestOutcome::Unknown {
            self.outcomes.remove(&test);
        } else {
            self.outcomes.insert(test, outcome);
        }
    }

    /// Overlay every known outcome from `other`.
    pub fn merge(&mut self, other: &TestResultSet) {
        for (test, outcome) in other.iter() {
            self.record(test, outcome);
        }
    }

    /// Known outcomes in test order.
    pub fn iter(&self) -> impl Iterator<Item = (HardwareTest, TestOutcome)> + '_ {
        self.outcomes.iter().map(|(test, outcome)| (*test, *outcome))
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
