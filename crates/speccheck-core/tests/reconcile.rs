//! End-to-end reconciliation from SKU text and a live spec.

use proptest::prelude::*;
use speccheck_core::{KeywordTable, compare_field, parse_sku, reconcile};
use speccheck_model::{ActualSpec, DriveType, SpecField, SpecSheet, UNKNOWN};

fn keyword_table() -> KeywordTable {
    KeywordTable::new()
        .with_keywords(SpecField::Model, ["T480", "T490", "X1 Carbon"])
        .with_keywords(SpecField::Cpu, ["i3", "i5", "i7"])
        .with_keywords(SpecField::Storage, ["128SSD", "256SSD", "512SSD", "1TBSSD"])
        .with_keywords(SpecField::Memory, ["8GB", "16GB", "32GB"])
        .with_keywords(SpecField::Resolution, ["1920x1080", "1366x768"])
        .with_keywords(SpecField::OsEdition, ["W10", "W11"])
        .with_grades(["AGRADE", "BGRADE", "CGRADE"])
}

fn live_spec() -> ActualSpec {
    ActualSpec::new(
        "PF1ABCDE",
        DriveType::Ssd,
        SpecSheet::new()
            .with(SpecField::Cpu, "i5")
            .with(SpecField::Memory, "8GB")
            .with(SpecField::Storage, "256GB")
            .with(SpecField::Resolution, "1920x1080")
            .with(SpecField::OsEdition, "Windows 11")
            .with(SpecField::Battery, "60%"),
    )
}

#[test]
fn grade_a_sku_flags_weak_battery_only() {
    let expected = parse_sku("I5-8GB-256SSD-FHD-W11-AGRADE", &keyword_table());
    assert_eq!(expected.get(SpecField::Battery), "≥70%");

    let report = reconcile(&expected, &live_spec());

    assert_eq!(report.mismatch_count(), 1);
    assert!(!report.all_match());
    insta::assert_json_snapshot!(report, @r#"
    {
      "mismatches": [
        {
          "field": "battery",
          "expected": "≥70%",
          "actual": "60%",
          "reason": "Expected ≥70%, Found 60%"
        }
      ],
      "all_match": false
    }
    "#);
}

#[test]
fn grade_b_sku_accepts_same_machine() {
    let expected = parse_sku("I5-8GB-256SSD-W11-BGRADE", &keyword_table());
    let report = reconcile(&expected, &live_spec());
    assert!(report.all_match());
    assert!(report.mismatches().is_empty());
}

#[test]
fn wrong_memory_and_edition_are_reported_in_field_order() {
    let expected = parse_sku("T480-I5-16GB-256SSD-W10-CGRADE", &keyword_table());
    let report = reconcile(&expected, &live_spec());

    let fields: Vec<SpecField> = report.mismatches().iter().map(|m| m.field).collect();
    assert_eq!(fields, vec![SpecField::Memory, SpecField::OsEdition]);
    // Model is unknown on the live side, so it is never flagged.
    assert!(!report.is_mismatched(SpecField::Model));
}

#[test]
fn second_battery_is_held_to_the_same_grade() {
    let expected = parse_sku("I5-8GB-256SSD-W11-BGRADE", &keyword_table());
    let actual = ActualSpec::new(
        "PF1ABCDE",
        DriveType::Ssd,
        SpecSheet::new()
            .with(SpecField::Battery, "90%")
            .with(SpecField::SecondaryBattery, "30%"),
    );
    let report = reconcile(&expected, &actual);
    assert_eq!(report.mismatch_count(), 1);
    assert!(report.is_mismatched(SpecField::SecondaryBattery));
}

proptest! {
    #[test]
    fn unknown_on_either_side_never_mismatches(
        field in prop::sample::select(SpecField::ALL.to_vec()),
        value in "[A-Za-z0-9% ]{0,12}",
        unknown_expected in any::<bool>(),
    ) {
        let mismatch = if unknown_expected {
            compare_field(field, UNKNOWN, &value)
        } else {
            compare_field(field, &value, UNKNOWN)
        };
        prop_assert!(mismatch.is_none());
    }

    #[test]
    fn battery_mismatch_iff_below_minimum(expected in 0u32..=100, actual in 0u32..=100) {
        let mismatch = compare_field(
            SpecField::Battery,
            &format!("≥{expected}%"),
            &format!("{actual}%"),
        );
        prop_assert_eq!(mismatch.is_some(), actual < expected);
    }
}
