//! Battery health.
//!
//! On Windows health comes from the HTML report written by
//! `powercfg /batteryreport`. The report is generated into the temp
//! directory, parsed for design and full-charge capacities, and deleted.
//! On Linux the same numbers are read straight from `power_supply`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use directories::UserDirs;
use regex::Regex;
use speccheck_model::HealthReading;

use crate::error::TelemetryError;
use crate::sysfs::{battery_dirs, read_trimmed};

/// File name `powercfg` writes.
pub const REPORT_FILENAME: &str = "battery-report.html";

const POWERCFG: &str = "powercfg";

static CAPACITY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(DESIGN|FULL CHARGE) CAPACITY").expect("valid regex")
});

static CAPACITY_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<td[^>]*>\s*([\d,.]+)\s*mWh").expect("valid regex")
});

static ROW_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</tr>").expect("valid regex"));

static INSTALLED_BATTERIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)installed batteries").expect("valid regex"));

static SECTION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<h2[\s>]").expect("valid regex"));

/// Anything that reports per-battery health.
pub trait HealthSource {
    /// One entry per installed battery; a single `Unknown` when nothing
    /// could be read.
    fn read_health(&self) -> Vec<HealthReading>;
}

/// Writes a battery report to a path.
pub trait ReportGenerator {
    fn generate(&self, output: &Path) -> Result<(), TelemetryError>;
}

/// `powercfg /batteryreport /output <path>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowercfgReport;

impl ReportGenerator for PowercfgReport {
    fn generate(&self, output: &Path) -> Result<(), TelemetryError> {
        let result = Command::new(POWERCFG)
            .args(["/batteryreport", "/output"])
            .arg(output)
            .output()
            .map_err(|source| TelemetryError::Spawn {
                program: POWERCFG,
                source,
            })?;
        if !result.status.success() {
            return Err(TelemetryError::CommandFailed {
                program: POWERCFG,
                status: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// `round(full / design * 100)`; a zero design capacity gives 0.
pub fn health_percent(full: u64, design: u64) -> u32 {
    if design == 0 {
        return 0;
    }
    (full as f64 / design as f64 * 100.0).round() as u32
}

fn parse_capacity(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// The installed-batteries section of a report, or the whole report when it
/// has no such heading.
fn installed_section(html: &str) -> &str {
    let Some(heading) = INSTALLED_BATTERIES.find(html) else {
        return html;
    };
    let rest = &html[heading.end()..];
    match SECTION_HEADING.find(rest) {
        Some(next) => &rest[..next.start()],
        None => rest,
    }
}

/// Capacity cells following each design and full-charge label.
///
/// A label's cells run to the end of its table row or the next label,
/// whichever comes first. Batteries listed side by side give several cells
/// per row; a report that repeats the rows per battery gives one cell each.
fn capacity_columns(section: &str) -> (Vec<Option<u64>>, Vec<Option<u64>>) {
    let labels: Vec<_> = CAPACITY_LABEL.captures_iter(section).collect();
    let mut designs = Vec::new();
    let mut fulls = Vec::new();
    for (index, caps) in labels.iter().enumerate() {
        let (Some(label), Some(kind)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let mut end = labels
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(section.len(), |next| next.start());
        if let Some(row_end) = ROW_END.find(&section[label.end()..end]) {
            end = label.end() + row_end.start();
        }
        let cells = CAPACITY_CELL
            .captures_iter(&section[label.end()..end])
            .map(|cell| parse_capacity(&cell[1]));
        if kind.as_str().eq_ignore_ascii_case("design") {
            designs.extend(cells);
        } else {
            fulls.extend(cells);
        }
    }
    (designs, fulls)
}

/// Health of every battery listed in a report, paired by column.
pub fn parse_battery_report(html: &str) -> Vec<HealthReading> {
    let (designs, fulls) = capacity_columns(installed_section(html));
    designs
        .into_iter()
        .zip(fulls)
        .filter_map(|pair| match pair {
            (Some(design), Some(full)) => Some(HealthReading::Percent(health_percent(full, design))),
            _ => None,
        })
        .collect()
}

fn unknown() -> Vec<HealthReading> {
    vec![HealthReading::Unknown]
}

/// Health read from a generated battery report.
#[derive(Debug, Clone)]
pub struct BatteryReportReader<G> {
    generator: G,
    primary: PathBuf,
    fallback: Option<PathBuf>,
}

impl BatteryReportReader<PowercfgReport> {
    /// Report in the temp directory, falling back to the home directory.
    pub fn powercfg() -> Self {
        let fallback = UserDirs::new().map(|dirs| dirs.home_dir().join(REPORT_FILENAME));
        Self::with_paths(
            PowercfgReport,
            std::env::temp_dir().join(REPORT_FILENAME),
            fallback,
        )
    }
}

impl<G: ReportGenerator> BatteryReportReader<G> {
    pub fn with_paths(generator: G, primary: PathBuf, fallback: Option<PathBuf>) -> Self {
        Self {
            generator,
            primary,
            fallback,
        }
    }

    fn locate(&self) -> Option<&Path> {
        if self.primary.is_file() {
            return Some(&self.primary);
        }
        let fallback = self.fallback.as_deref().filter(|path| path.is_file())?;
        tracing::info!(
            path = %fallback.display(),
            "battery report not in temp directory, using fallback"
        );
        Some(fallback)
    }
}

impl<G: ReportGenerator> HealthSource for BatteryReportReader<G> {
    fn read_health(&self) -> Vec<HealthReading> {
        if let Err(error) = self.generator.generate(&self.primary) {
            tracing::warn!(%error, "battery report generation failed");
            return unknown();
        }
        let Some(path) = self.locate() else {
            tracing::warn!(
                path = %self.primary.display(),
                "battery report not found"
            );
            return unknown();
        };

        let content = fs::read_to_string(path);
        if let Err(error) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), %error, "could not delete battery report");
        }
        let html = match content {
            Ok(html) => html,
            Err(source) => {
                let error = TelemetryError::io(path, source);
                tracing::warn!(%error, "could not read battery report");
                return unknown();
            }
        };

        let readings = parse_battery_report(&html);
        if readings.is_empty() {
            tracing::warn!("no battery capacities found in report");
            return unknown();
        }
        tracing::debug!(batteries = readings.len(), "parsed battery report");
        readings
    }
}

/// Health from `energy_full`/`energy_full_design` (or the `charge_*` pair).
#[derive(Debug, Clone)]
pub struct SysfsBatteryHealth {
    root: PathBuf,
}

impl SysfsBatteryHealth {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn capacity_pair(dir: &Path) -> Option<(u64, u64)> {
        let read = |name: &str| {
            read_trimmed(&dir.join(name))
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
        };
        let energy = read("energy_full").zip(read("energy_full_design"));
        energy.or_else(|| read("charge_full").zip(read("charge_full_design")))
    }
}

impl Default for SysfsBatteryHealth {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthSource for SysfsBatteryHealth {
    fn read_health(&self) -> Vec<HealthReading> {
        let batteries = match battery_dirs(&self.root) {
            Ok(batteries) => batteries,
            Err(error) => {
                tracing::warn!(%error, "could not list batteries");
                return unknown();
            }
        };
        let readings: Vec<HealthReading> = batteries
            .iter()
            .filter_map(|dir| Self::capacity_pair(dir))
            .map(|(full, design)| HealthReading::Percent(health_percent(full, design)))
            .collect();
        if readings.is_empty() {
            tracing::warn!("no battery capacities found");
            return unknown();
        }
        readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_rounds_to_nearest_percent() {
        assert_eq!(health_percent(45_020, 57_000), 79);
        assert_eq!(health_percent(50_000, 57_000), 88);
        assert_eq!(health_percent(100, 0), 0);
    }

    #[test]
    fn capacities_accept_thousands_separators() {
        assert_eq!(parse_capacity("57,000"), Some(57_000));
        assert_eq!(parse_capacity("57.000"), Some(57_000));
        assert_eq!(parse_capacity(","), None);
    }

    #[test]
    fn section_stops_at_next_heading() {
        let html = "<h2>Installed batteries</h2><table>a</table><h2>Recent usage</h2>b";
        assert_eq!(installed_section(html), "</h2><table>a</table>");
        assert_eq!(installed_section("<p>x</p>"), "<p>x</p>");
    }
}
