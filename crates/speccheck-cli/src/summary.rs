//! Terminal tables for checks, test results and the serial viewer.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use speccheck_model::{
    ActualSpec, AssignmentSummary, BatteryStatus, ChargingState, HardwareTest, MismatchReport,
    SpecField, SpecSnapshot, TestOutcome, TestResultSet, is_known_value,
};
use speccheck_store::AssignOutcome;

use crate::workflow::OrderCheck;

const MATCH: &str = "✅";
const MISMATCH: &str = "❌";

pub fn print_check(check: &OrderCheck) {
    print!("{}", render_check(check));
}

/// Header lines, comparison table, verdict and any previous results.
pub fn render_check(check: &OrderCheck) -> String {
    let mut out = format!(
        "Order: {}\nSKU: {}\nSerial: {}  Drive: {}\n{}\n{}\n",
        check.order_number,
        check.sku(),
        check.actual.serial_number(),
        check.actual.drive_type(),
        check_table(check),
        verdict(&check.report)
    );
    if !check.previous.is_empty() {
        out.push_str(&format!(
            "Previous test results:\n{}\n",
            results_table(&check.previous)
        ));
    }
    out
}

/// Expected and actual values side by side, one row per field.
///
/// The second battery row only appears when either side has a value.
pub fn check_table(check: &OrderCheck) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Expected"),
        header_cell("Actual"),
        header_cell("Match"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);

    for field in SpecField::ALL {
        let expected = check.expected.get(field);
        let actual = check.actual.get(field);
        if field.is_optional() && !is_known_value(expected) && !is_known_value(actual) {
            continue;
        }
        let mismatched = check.report.is_mismatched(field);
        let actual_cell = if mismatched {
            Cell::new(actual).fg(Color::Red)
        } else {
            value_cell(actual)
        };
        let match_cell = if mismatched {
            Cell::new(MISMATCH).fg(Color::Red)
        } else if is_known_value(expected) && is_known_value(actual) {
            Cell::new(MATCH).fg(Color::Green)
        } else {
            dim_cell("-")
        };
        table.add_row(vec![
            Cell::new(field.label()).add_attribute(Attribute::Bold),
            value_cell(expected),
            actual_cell,
            match_cell,
        ]);
    }
    table
}

/// The live spec on its own.
pub fn live_table(spec: &ActualSpec) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new("Serial").add_attribute(Attribute::Bold),
        value_cell(spec.serial_number()),
    ]);
    table.add_row(vec![
        Cell::new("Drive").add_attribute(Attribute::Bold),
        value_cell(spec.drive_type().as_str()),
    ]);
    for field in SpecField::ALL {
        let value = spec.get(field);
        if field.is_optional() && !is_known_value(value) {
            continue;
        }
        table.add_row(vec![
            Cell::new(field.label()).add_attribute(Attribute::Bold),
            value_cell(value),
        ]);
    }
    table
}

/// One line summing up a comparison.
pub fn verdict(report: &MismatchReport) -> String {
    if report.all_match() {
        return format!("{MATCH} All specs match");
    }
    let details: Vec<String> = report
        .mismatches()
        .iter()
        .map(|mismatch| format!("{}: {}", mismatch.field.label(), mismatch.reason))
        .collect();
    let noun = if report.mismatch_count() == 1 {
        "mismatch"
    } else {
        "mismatches"
    };
    format!(
        "{MISMATCH} {} {noun}: {}",
        report.mismatch_count(),
        details.join("; ")
    )
}

/// Every hardware test with its outcome, blank when not run.
pub fn results_table(results: &TestResultSet) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Test"), header_cell("Result")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for test in HardwareTest::ALL {
        let outcome = results.get(test);
        let cell = match outcome {
            TestOutcome::Pass => Cell::new(outcome.symbol()).fg(Color::Green),
            TestOutcome::Fail => Cell::new(outcome.symbol()).fg(Color::Red),
            TestOutcome::Unknown => dim_cell("-"),
        };
        table.add_row(vec![Cell::new(test.label()), cell]);
    }
    table
}

/// Serial numbers assigned to an order, in assignment order.
pub fn serials_table(rows: &[AssignmentSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Serial Number"), header_cell("Assigned")]);
    apply_table_style(&mut table);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.serial_number),
            value_cell(&row.display_time()),
        ]);
    }
    table
}

/// The spec stored with one assignment.
pub fn snapshot_table(snapshot: &SpecSnapshot) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_table_style(&mut table);
    for (label, value) in snapshot.rows() {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            value_cell(value),
        ]);
    }
    table
}

/// What an assignment did, for the technician.
pub fn assign_message(serial_number: &str, order_number: &str, outcome: &AssignOutcome) -> String {
    match outcome {
        AssignOutcome::Assigned { reassigned_from } if reassigned_from.is_empty() => {
            format!("Serial {serial_number} assigned to order {order_number}.")
        }
        AssignOutcome::Assigned { reassigned_from } => format!(
            "Serial {serial_number} moved from order {} to order {order_number}.",
            reassigned_from.join(", ")
        ),
        AssignOutcome::Declined { existing } => format!(
            "Assignment cancelled; serial {serial_number} stays with order {}.",
            existing.join(", ")
        ),
    }
}

/// Charge, charging state and the change since the session started.
pub fn gauge_message(initial: &BatteryStatus, current: &BatteryStatus) -> String {
    let Some(percent) = current.charge_percent else {
        return "charge unavailable".to_string();
    };
    let state = match current.charging {
        ChargingState::Charging => "charging",
        ChargingState::Discharging => "discharging",
        ChargingState::Unknown => "state unknown",
    };
    match current.delta_since(initial) {
        Some(delta) => format!("{percent}% {state} ({delta:+}% since start)"),
        None => format!("{percent}% {state}"),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: &str) -> Cell {
    if is_known_value(value) {
        Cell::new(value)
    } else {
        dim_cell(value)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use speccheck_model::{DriveType, ExpectedSpec, Mismatch, SpecSheet};

    use super::*;

    fn cells(table: &Table) -> Vec<Vec<String>> {
        table
            .row_iter()
            .map(|row| row.cell_iter().map(Cell::content).collect())
            .collect()
    }

    fn check(report: MismatchReport) -> OrderCheck {
        OrderCheck {
            order_number: "1001".to_string(),
            expected: ExpectedSpec::new(
                "I5-8GB-AGRADE",
                SpecSheet::new()
                    .with(SpecField::Cpu, "i5")
                    .with(SpecField::Memory, "8GB")
                    .with(SpecField::Battery, "≥70%")
                    .with(SpecField::SecondaryBattery, "≥70%"),
            ),
            actual: ActualSpec::new(
                "PF1",
                DriveType::Ssd,
                SpecSheet::new()
                    .with(SpecField::Cpu, "i5")
                    .with(SpecField::Memory, "8GB")
                    .with(SpecField::Model, "T480")
                    .with(SpecField::Battery, "60%"),
            ),
            report,
            previous: TestResultSet::new(),
        }
    }

    fn battery_mismatch() -> Mismatch {
        Mismatch {
            field: SpecField::Battery,
            expected: "≥70%".to_string(),
            actual: "60%".to_string(),
            reason: "Expected ≥70%, Found 60%".to_string(),
        }
    }

    #[test]
    fn check_table_marks_each_field() {
        let report = MismatchReport::from_mismatches(vec![battery_mismatch()]);
        let rows = cells(&check_table(&check(report)));

        let row = |label: &str| {
            rows.iter()
                .find(|row| row[0] == label)
                .cloned()
                .unwrap_or_default()
        };
        assert_eq!(row("CPU"), ["CPU", "i5", "i5", MATCH]);
        assert_eq!(row("Model"), ["Model", "Unknown", "T480", "-"]);
        assert_eq!(row("Battery"), ["Battery", "≥70%", "60%", MISMATCH]);
        assert_eq!(row("Battery 2"), ["Battery 2", "≥70%", "Unknown", "-"]);
        assert_eq!(rows.len(), 8);
    }

    #[test]
    fn verdict_lists_reasons() {
        assert_eq!(
            verdict(&MismatchReport::from_mismatches(vec![])),
            "✅ All specs match"
        );
        assert_eq!(
            verdict(&MismatchReport::from_mismatches(vec![battery_mismatch()])),
            "❌ 1 mismatch: Battery: Expected ≥70%, Found 60%"
        );
    }

    #[test]
    fn results_table_lists_every_test() {
        let mut results = TestResultSet::new();
        results.record(HardwareTest::Usb, TestOutcome::Fail);
        let rows = cells(&results_table(&results));
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], ["Keyboard Test", "-"]);
        assert_eq!(rows[4], ["USB Test", "❌"]);
    }

    #[test]
    fn gauge_shows_delta_since_start() {
        let start = BatteryStatus {
            charge_percent: Some(50),
            charging: ChargingState::Charging,
        };
        let now = BatteryStatus {
            charge_percent: Some(53),
            charging: ChargingState::Charging,
        };
        assert_eq!(gauge_message(&start, &now), "53% charging (+3% since start)");
        assert_eq!(
            gauge_message(&BatteryStatus::default(), &now),
            "53% charging"
        );
        assert_eq!(
            gauge_message(&start, &BatteryStatus::default()),
            "charge unavailable"
        );
    }

    #[test]
    fn assign_messages_name_the_orders() {
        let moved = AssignOutcome::Assigned {
            reassigned_from: vec!["2002".to_string()],
        };
        let declined = AssignOutcome::Declined {
            existing: vec!["2002".to_string()],
        };
        insta::assert_snapshot!(
            assign_message("PF1", "1001", &moved),
            @"Serial PF1 moved from order 2002 to order 1001."
        );
        insta::assert_snapshot!(
            assign_message("PF1", "1001", &declined),
            @"Assignment cancelled; serial PF1 stays with order 2002."
        );
    }
}
