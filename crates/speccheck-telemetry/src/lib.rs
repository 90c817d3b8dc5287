//! Host hardware telemetry for speccheck.
//!
//! [`LiveSpecReader`] opens a session on a [`TelemetryProvider`], runs every
//! sub-query through it and derives the spec values (storage bucket, memory
//! size, OS edition, chassis model). Battery health comes from a separate
//! [`HealthSource`]. Two providers ship: [`CimProvider`] for Windows and
//! [`SysfsProvider`] for Linux.

#![deny(unsafe_code)]

pub mod battery;
pub mod cim;
pub mod derive;
pub mod error;
pub mod provider;
pub mod reader;
pub mod sysfs;

pub use battery::{
    BatteryReportReader, HealthSource, PowercfgReport, ReportGenerator, SysfsBatteryHealth,
    parse_battery_report,
};
pub use cim::CimProvider;
pub use error::TelemetryError;
pub use provider::{
    ComputerSystem, DiskInfo, DisplayMode, RemovableDevice, TelemetryProvider, TelemetrySession,
};
pub use reader::LiveSpecReader;
pub use sysfs::SysfsProvider;
