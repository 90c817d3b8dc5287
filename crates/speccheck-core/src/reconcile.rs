//! Field-by-field comparison of expected and actual specs.

use std::sync::LazyLock;

use regex::Regex;
use speccheck_model::{
    ActualSpec, ComparePolicy, ExpectedSpec, Mismatch, MismatchReport, SpecField, is_known_value,
};

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid number pattern"));

/// Compare `expected` against `actual` and report every field that fails its
/// comparison policy.
///
/// Unknown values never produce a mismatch. Battery fields are a one-sided
/// minimum: a healthier battery than required is fine.
pub fn reconcile(expected: &ExpectedSpec, actual: &ActualSpec) -> MismatchReport {
    let mismatches = SpecField::ALL
        .into_iter()
        .filter_map(|field| compare_field(field, expected.get(field), actual.get(field)))
        .collect::<Vec<_>>();

    let report = MismatchReport::from_mismatches(mismatches);
    tracing::info!(
        sku = %expected.sku(),
        serial_number = %actual.serial_number(),
        mismatches = report.mismatch_count(),
        all_match = report.all_match(),
        "reconciled specs"
    );
    report
}

/// Compare one field under its policy.
pub fn compare_field(field: SpecField, expected: &str, actual: &str) -> Option<Mismatch> {
    match field.policy() {
        ComparePolicy::MinimumPercent => {
            let wanted = parse_percent(expected)?;
            let found = parse_percent(actual)?;
            (found < wanted).then(|| Mismatch {
                field,
                expected: expected.to_string(),
                actual: actual.to_string(),
                reason: format!("Expected ≥{wanted}%, Found {found}%"),
            })
        }
        ComparePolicy::Exact => {
            if !is_known_value(expected) || !is_known_value(actual) {
                return None;
            }
            (normalize(expected) != normalize(actual)).then(|| Mismatch {
                field,
                expected: expected.to_string(),
                actual: actual.to_string(),
                reason: format!("Expected {expected}, Found {actual}"),
            })
        }
    }
}

/// Leading integer of a value such as `≥70%` or `63%`.
pub fn parse_percent(text: &str) -> Option<u32> {
    FIRST_NUMBER
        .find(text)
        .and_then(|found| found.as_str().parse().ok())
}

/// Lowercase with runs of whitespace collapsed to one space.
fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use speccheck_model::{DriveType, SpecSheet, UNKNOWN};

    fn expected(sheet: SpecSheet) -> ExpectedSpec {
        ExpectedSpec::new("TEST-SKU", sheet)
    }

    fn actual(sheet: SpecSheet) -> ActualSpec {
        ActualSpec::new("SN123", DriveType::Ssd, sheet)
    }

    #[test]
    fn battery_is_a_minimum() {
        let report = reconcile(
            &expected(SpecSheet::new().with(SpecField::Battery, "≥45%")),
            &actual(SpecSheet::new().with(SpecField::Battery, "60%")),
        );
        assert!(report.all_match());

        let report = reconcile(
            &expected(SpecSheet::new().with(SpecField::Battery, "≥70%")),
            &actual(SpecSheet::new().with(SpecField::Battery, "50%")),
        );
        assert_eq!(report.mismatch_count(), 1);
        let mismatch = report.get(SpecField::Battery).unwrap();
        assert_eq!(mismatch.reason, "Expected ≥70%, Found 50%");
    }

    #[test]
    fn equal_battery_is_not_a_mismatch() {
        assert!(compare_field(SpecField::Battery, "≥70%", "70%").is_none());
    }

    #[test]
    fn unparsable_battery_is_not_comparable() {
        assert!(compare_field(SpecField::Battery, "≥70%", UNKNOWN).is_none());
        assert!(compare_field(SpecField::Battery, "Unknown", "10%").is_none());
        assert!(compare_field(SpecField::SecondaryBattery, "≥70%", "n/a").is_none());
    }

    #[test]
    fn unknown_suppresses_exact_comparison() {
        assert!(compare_field(SpecField::Cpu, UNKNOWN, "i7").is_none());
        assert!(compare_field(SpecField::Cpu, "i5", UNKNOWN).is_none());
    }

    #[test]
    fn exact_comparison_ignores_case_and_spacing() {
        assert!(compare_field(SpecField::OsEdition, "Windows  11", "windows 11").is_none());
        assert!(compare_field(SpecField::Memory, " 8GB", "8gb ").is_none());
        let mismatch = compare_field(SpecField::Memory, "8GB", "16GB").unwrap();
        assert_eq!(mismatch.reason, "Expected 8GB, Found 16GB");
    }

    #[test]
    fn report_follows_field_order() {
        let report = reconcile(
            &expected(
                SpecSheet::new()
                    .with(SpecField::Battery, "≥70%")
                    .with(SpecField::Memory, "8GB")
                    .with(SpecField::Model, "T480"),
            ),
            &actual(
                SpecSheet::new()
                    .with(SpecField::Battery, "20%")
                    .with(SpecField::Memory, "16GB")
                    .with(SpecField::Model, "T490"),
            ),
        );
        let fields: Vec<SpecField> = report.mismatches().iter().map(|m| m.field).collect();
        assert_eq!(
            fields,
            vec![SpecField::Model, SpecField::Memory, SpecField::Battery]
        );
        assert!(!report.all_match());
    }

    #[test]
    fn parses_leading_number() {
        assert_eq!(parse_percent("≥70%"), Some(70));
        assert_eq!(parse_percent("63%"), Some(63));
        assert_eq!(parse_percent("Unknown"), None);
    }
}
