//! The order database.
//!
//! Two tables are read: `orders` (order number to SKU) and `order_serials`
//! (one row per serial bound to an order, with the spec snapshot and test
//! results at assignment time). Every call opens its own connection and
//! closes it before returning; nothing is held between operations.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use speccheck_model::{
    AssignmentSummary, HardwareTest, SerialAssignmentRecord, SpecSnapshot, TestOutcome,
    TestResultSet,
};

use crate::error::StoreError;

/// Format of SQLite's `CURRENT_TIMESTAMP`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS orders (
    order_number TEXT NOT NULL,
    sku TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_orders_order_number ON orders (order_number);

CREATE TABLE IF NOT EXISTS order_serials (
    order_number TEXT NOT NULL,
    serial_number TEXT NOT NULL,
    cpu TEXT,
    ram TEXT,
    ssd TEXT,
    model TEXT,
    resolution TEXT,
    windows TEXT,
    battery TEXT,
    test_keyboard TEXT,
    test_speaker TEXT,
    test_display TEXT,
    test_webcam TEXT,
    test_usb TEXT,
    assigned_at TEXT DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (order_number, serial_number)
);
CREATE INDEX IF NOT EXISTS idx_order_serials_serial ON order_serials (serial_number);
";

const UPSERT_ASSIGNMENT: &str = "
INSERT INTO order_serials (
    order_number, serial_number, cpu, ram, ssd, model, resolution, windows, battery,
    test_keyboard, test_speaker, test_display, test_webcam, test_usb, assigned_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, CURRENT_TIMESTAMP)
ON CONFLICT (order_number, serial_number) DO UPDATE SET
    cpu = excluded.cpu,
    ram = excluded.ram,
    ssd = excluded.ssd,
    model = excluded.model,
    resolution = excluded.resolution,
    windows = excluded.windows,
    battery = excluded.battery,
    test_keyboard = excluded.test_keyboard,
    test_speaker = excluded.test_speaker,
    test_display = excluded.test_display,
    test_webcam = excluded.test_webcam,
    test_usb = excluded.test_usb,
    assigned_at = CURRENT_TIMESTAMP
";

/// Narrow interface to the order database.
pub trait OrderStore {
    /// Create the tables if they do not exist.
    fn init_schema(&self) -> Result<(), StoreError>;

    /// SKU of an order. When several rows match, the first one wins.
    fn sku_for_order(&self, order_number: &str) -> Result<Option<String>, StoreError>;

    /// Stored test outcomes for a unit; empty when none were stored.
    fn previous_results(
        &self,
        order_number: &str,
        serial_number: &str,
    ) -> Result<TestResultSet, StoreError>;

    /// Orders a serial is currently bound to.
    fn orders_for_serial(&self, serial_number: &str) -> Result<Vec<String>, StoreError>;

    /// Drop every binding of the record's serial, then insert or update the
    /// record, as one transaction.
    fn replace_assignment(&self, record: &SerialAssignmentRecord) -> Result<(), StoreError>;

    /// Serials bound to an order, oldest first.
    fn assignments_for_order(&self, order_number: &str)
    -> Result<Vec<AssignmentSummary>, StoreError>;

    fn assignment_spec(
        &self,
        order_number: &str,
        serial_number: &str,
    ) -> Result<Option<SpecSnapshot>, StoreError>;

    /// Returns whether a row was deleted.
    fn remove_assignment(&self, order_number: &str, serial_number: &str)
    -> Result<bool, StoreError>;
}

/// Parse a stored `assigned_at`; unparsable values read as missing.
pub fn parse_timestamp(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn stored_outcome(results: &TestResultSet, test: HardwareTest) -> Option<&'static str> {
    results.get(test).as_stored()
}

/// SQLite-backed store; the configured database name is the file path.
#[derive(Debug, Clone)]
pub struct SqliteOrderStore {
    path: PathBuf,
}

impl SqliteOrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        tracing::trace!(path = %self.path.display(), "opening database");
        Connection::open(&self.path).map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })
    }

    /// Add an order row. Orders normally come from the shop system; this is
    /// for seeding a local database.
    pub fn add_order(&self, order_number: &str, sku: &str) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO orders (order_number, sku) VALUES (?1, ?2)",
            params![order_number, sku],
        )
        .map_err(StoreError::query("add order"))?;
        Ok(())
    }
}

impl OrderStore for SqliteOrderStore {
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)
            .map_err(StoreError::query("create schema"))?;
        tracing::info!(path = %self.path.display(), "database schema ready");
        Ok(())
    }

    fn sku_for_order(&self, order_number: &str) -> Result<Option<String>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT sku FROM orders WHERE order_number = ?1 ORDER BY rowid")
            .map_err(StoreError::query("look up order"))?;
        let skus = stmt
            .query_map(params![order_number], |row| row.get::<_, String>(0))
            .and_then(Iterator::collect::<Result<Vec<_>, _>>)
            .map_err(StoreError::query("look up order"))?;
        if skus.len() > 1 {
            tracing::warn!(
                order_number,
                rows = skus.len(),
                "order has several SKU rows, using the first"
            );
        }
        Ok(skus.into_iter().next())
    }

    fn previous_results(
        &self,
        order_number: &str,
        serial_number: &str,
    ) -> Result<TestResultSet, StoreError> {
        let conn = self.connect()?;
        let stored = conn
            .query_row(
                "SELECT test_keyboard, test_speaker, test_display, test_webcam, test_usb \
                 FROM order_serials WHERE order_number = ?1 AND serial_number = ?2",
                params![order_number, serial_number],
                |row| {
                    let mut values = Vec::with_capacity(HardwareTest::ALL.len());
                    for index in 0..HardwareTest::ALL.len() {
                        values.push(row.get::<_, Option<String>>(index)?);
                    }
                    Ok(values)
                },
            )
            .optional()
            .map_err(StoreError::query("load previous test results"))?;

        let mut results = TestResultSet::new();
        for (test, value) in HardwareTest::ALL.into_iter().zip(stored.unwrap_or_default()) {
            results.record(test, TestOutcome::from_stored(value.as_deref()));
        }
        Ok(results)
    }

    fn orders_for_serial(&self, serial_number: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT order_number FROM order_serials WHERE serial_number = ?1 ORDER BY rowid")
            .map_err(StoreError::query("check existing assignments"))?;
        stmt.query_map(params![serial_number], |row| row.get::<_, String>(0))
            .and_then(Iterator::collect)
            .map_err(StoreError::query("check existing assignments"))
    }

    fn replace_assignment(&self, record: &SerialAssignmentRecord) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(StoreError::query("assign serial"))?;

        let removed = tx
            .execute(
                "DELETE FROM order_serials WHERE serial_number = ?1",
                params![record.serial_number],
            )
            .map_err(StoreError::query("assign serial"))?;

        let spec = &record.spec;
        let results = &record.results;
        tx.execute(
            UPSERT_ASSIGNMENT,
            params![
                record.order_number,
                record.serial_number,
                spec.cpu,
                spec.ram,
                spec.ssd,
                spec.model,
                spec.resolution,
                spec.windows,
                spec.battery,
                stored_outcome(results, HardwareTest::Keyboard),
                stored_outcome(results, HardwareTest::Speaker),
                stored_outcome(results, HardwareTest::Display),
                stored_outcome(results, HardwareTest::Webcam),
                stored_outcome(results, HardwareTest::Usb),
            ],
        )
        .map_err(StoreError::query("assign serial"))?;

        tx.commit().map_err(StoreError::query("assign serial"))?;
        tracing::debug!(
            order_number = %record.order_number,
            serial_number = %record.serial_number,
            replaced_rows = removed,
            "assignment written"
        );
        Ok(())
    }

    fn assignments_for_order(
        &self,
        order_number: &str,
    ) -> Result<Vec<AssignmentSummary>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT serial_number, assigned_at FROM order_serials \
                 WHERE order_number = ?1 ORDER BY rowid",
            )
            .map_err(StoreError::query("list serials"))?;
        stmt.query_map(params![order_number], |row| {
            let assigned_at: Option<String> = row.get(1)?;
            Ok(AssignmentSummary {
                serial_number: row.get(0)?,
                assigned_at: parse_timestamp(assigned_at.as_deref()),
            })
        })
        .and_then(Iterator::collect)
        .map_err(StoreError::query("list serials"))
    }

    fn assignment_spec(
        &self,
        order_number: &str,
        serial_number: &str,
    ) -> Result<Option<SpecSnapshot>, StoreError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT cpu, ram, ssd, model, resolution, windows, battery FROM order_serials \
             WHERE order_number = ?1 AND serial_number = ?2",
            params![order_number, serial_number],
            |row| {
                let text = |index: usize| -> rusqlite::Result<String> {
                    Ok(row
                        .get::<_, Option<String>>(index)?
                        .unwrap_or_else(|| speccheck_model::UNKNOWN.to_string()))
                };
                Ok(SpecSnapshot {
                    cpu: text(0)?,
                    ram: text(1)?,
                    ssd: text(2)?,
                    model: text(3)?,
                    resolution: text(4)?,
                    windows: text(5)?,
                    battery: text(6)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::query("load serial spec"))
    }

    fn remove_assignment(
        &self,
        order_number: &str,
        serial_number: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let removed = conn
            .execute(
                "DELETE FROM order_serials WHERE order_number = ?1 AND serial_number = ?2",
                params![order_number, serial_number],
            )
            .map_err(StoreError::query("remove serial"))?;
        Ok(removed > 0)
    }
}
