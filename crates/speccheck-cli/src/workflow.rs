//! Order search and assignment over the configured store and host reader.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::{info, info_span};

use speccheck_core::{AppConfig, ConfigError, KeywordTable, parse_sku, reconcile};
use speccheck_model::{ActualSpec, ExpectedSpec, MismatchReport, TestResultSet};
use speccheck_store::{
    AssignError, AssignOutcome, OrderStore, ReassignPrompt, SerialAssignmentManager,
    SqliteOrderStore, StoreError,
};
use speccheck_telemetry::{LiveSpecReader, TelemetryError};

use crate::progress::wait_with_spinner;
use crate::scheduler::spawn_job;

/// Everything a search produced for one order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCheck {
    pub order_number: String,
    pub expected: ExpectedSpec,
    pub actual: ActualSpec,
    pub report: MismatchReport,
    /// Stored outcomes for this order and the live serial number.
    pub previous: TestResultSet,
}

impl OrderCheck {
    pub fn sku(&self) -> &str {
        self.expected.sku()
    }
}

/// Keyword tables, host reader and order store for one run.
#[derive(Debug)]
pub struct Workbench<S> {
    keywords: KeywordTable,
    reader: LiveSpecReader,
    manager: SerialAssignmentManager<S>,
}

impl Workbench<SqliteOrderStore> {
    /// Workbench for the host machine and the configured database.
    ///
    /// A relative database path is resolved against the directory holding
    /// the configuration file.
    pub fn from_config(config: &AppConfig, config_path: &Path) -> Self {
        let store = SqliteOrderStore::new(database_path(config, config_path));
        Self::new(config.keyword_table(), LiveSpecReader::for_host(), store)
    }
}

/// Location of the SQLite database named in `config`.
pub fn database_path(config: &AppConfig, config_path: &Path) -> PathBuf {
    let database = Path::new(&config.database.database);
    match config_path.parent() {
        Some(dir) if database.is_relative() => dir.join(database),
        _ => database.to_path_buf(),
    }
}

impl<S: OrderStore> Workbench<S> {
    pub fn new(keywords: KeywordTable, reader: LiveSpecReader, store: S) -> Self {
        Self {
            keywords,
            reader,
            manager: SerialAssignmentManager::new(store),
        }
    }

    pub fn reader(&self) -> &LiveSpecReader {
        &self.reader
    }

    pub fn manager(&self) -> &SerialAssignmentManager<S> {
        &self.manager
    }

    /// Look up the order, read the machine and compare the two.
    ///
    /// Returns `None` when the order has no SKU. The SKU lookup and the live
    /// read run side by side; the store is not touched again until both are
    /// done.
    pub fn search(&self, order_number: &str) -> Result<Option<OrderCheck>>
    where
        S: Sync,
    {
        let span = info_span!("search", order_number);
        let _guard = span.enter();

        let (sku, actual) = std::thread::scope(|scope| {
            let live = scope.spawn(|| self.reader.read());
            let sku = self.manager.store().sku_for_order(order_number);
            let actual = live
                .join()
                .map_err(|_| anyhow!("live spec read panicked"));
            (sku, actual)
        });
        let sku = sku.with_context(|| format!("look up order {order_number}"))?;
        let actual = actual?;

        let Some(sku) = sku else {
            info!("order not found");
            return Ok(None);
        };

        let expected = parse_sku(&sku, &self.keywords);
        let report = reconcile(&expected, &actual);
        let previous = self
            .manager
            .previous_results(order_number, actual.serial_number())
            .context("load previous test results")?;

        info!(
            sku = %sku,
            serial_number = actual.serial_number(),
            mismatches = report.mismatch_count(),
            all_match = report.all_match(),
            "order reconciled"
        );
        Ok(Some(OrderCheck {
            order_number: order_number.to_string(),
            expected,
            actual,
            report,
            previous,
        }))
    }

    /// Assign the unit to `order_number`, asking `prompt` before moving a
    /// serial that is already bound.
    pub fn assign(
        &self,
        order_number: &str,
        actual: &ActualSpec,
        results: &TestResultSet,
        prompt: &dyn ReassignPrompt,
    ) -> Result<AssignOutcome> {
        let span = info_span!("assign", order_number);
        let _guard = span.enter();
        self.manager
            .assign(order_number, actual, results, prompt)
            .with_context(|| format!("assign serial to order {order_number}"))
    }
}

/// Run [`Workbench::search`] on a worker thread behind a spinner.
pub fn search_in_background<S>(
    workbench: &Arc<Workbench<S>>,
    order_number: &str,
) -> Result<Option<OrderCheck>>
where
    S: OrderStore + Send + Sync + 'static,
{
    let job = {
        let workbench = Arc::clone(workbench);
        let order_number = order_number.to_string();
        spawn_job("search", move || workbench.search(&order_number))
    };
    wait_with_spinner(&job, "Searching order...")
        .ok_or_else(|| anyhow!("the search stopped unexpectedly"))?
}

/// Message for the technician: the library's own wording when the failure
/// came from one of our crates, the error chain otherwise.
pub fn user_message(error: &anyhow::Error) -> String {
    for cause in error.chain() {
        if let Some(error) = cause.downcast_ref::<ConfigError>() {
            return error.user_message();
        }
        if let Some(error) = cause.downcast_ref::<AssignError>() {
            return error.user_message();
        }
        if let Some(error) = cause.downcast_ref::<StoreError>() {
            return error.user_message();
        }
        if let Some(error) = cause.downcast_ref::<TelemetryError>() {
            return error.user_message().to_string();
        }
    }
    format!("{error:#}")
}

/// Log a failed operation and build the notice shown for it.
pub fn failure_notice(operation: &str, error: &anyhow::Error) -> String {
    let chain = format!("{error:#}");
    tracing::error!(operation, error = %chain, "operation failed");
    format!("{operation} failed: {}", user_message(error))
}
