//! Serial assignment and the serial viewer.

use speccheck_model::{
    ActualSpec, AssignmentSummary, SerialAssignmentRecord, SpecSnapshot, TestResultSet,
    is_known_value,
};

use crate::error::{AssignError, StoreError};
use crate::store::OrderStore;

/// Asks the technician whether a serial may move to another order.
pub trait ReassignPrompt {
    /// `existing` is every order the serial is currently bound to.
    fn confirm_reassign(&self, serial_number: &str, existing: &[String], target: &str) -> bool;
}

impl<F> ReassignPrompt for F
where
    F: Fn(&str, &[String], &str) -> bool,
{
    fn confirm_reassign(&self, serial_number: &str, existing: &[String], target: &str) -> bool {
        self(serial_number, existing, target)
    }
}

/// What an assignment attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// The record was written. `reassigned_from` lists the bindings that
    /// were replaced; empty for a first assignment.
    Assigned { reassigned_from: Vec<String> },
    /// The technician kept the existing binding; nothing was written.
    Declined { existing: Vec<String> },
}

/// What a viewer removal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
    Declined,
}

/// Binds serial numbers to orders.
#[derive(Debug, Clone)]
pub struct SerialAssignmentManager<S> {
    store: S,
}

impl<S: OrderStore> SerialAssignmentManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bind the unit described by `spec` to `order_number`.
    ///
    /// If the serial is already bound anywhere, `prompt` decides whether to
    /// move it. Declining leaves storage untouched. On acceptance the old
    /// bindings are deleted and the new record upserted in one transaction,
    /// refreshing `assigned_at` even when the order is unchanged.
    pub fn assign(
        &self,
        order_number: &str,
        spec: &ActualSpec,
        results: &TestResultSet,
        prompt: &dyn ReassignPrompt,
    ) -> Result<AssignOutcome, AssignError> {
        let serial_number = spec.serial_number().trim();
        if !is_known_value(serial_number) {
            return Err(AssignError::InvalidSerial {
                serial: serial_number.to_string(),
            });
        }

        let existing = self.store.orders_for_serial(serial_number)?;
        if !existing.is_empty() && !prompt.confirm_reassign(serial_number, &existing, order_number)
        {
            tracing::info!(
                serial_number,
                order_number,
                existing = ?existing,
                "reassignment declined"
            );
            return Ok(AssignOutcome::Declined { existing });
        }

        let mut record = SerialAssignmentRecord::new(order_number, spec, results);
        record.serial_number = serial_number.to_string();
        self.store.replace_assignment(&record)?;

        tracing::info!(
            serial_number,
            order_number,
            reassigned_from = ?existing,
            "serial assigned"
        );
        Ok(AssignOutcome::Assigned {
            reassigned_from: existing,
        })
    }

    /// Stored outcomes for a unit, or an empty set when its serial is unknown.
    pub fn previous_results(
        &self,
        order_number: &str,
        serial_number: &str,
    ) -> Result<TestResultSet, StoreError> {
        if !is_known_value(serial_number) {
            return Ok(TestResultSet::new());
        }
        self.store.previous_results(order_number, serial_number)
    }

    pub fn list(&self, order_number: &str) -> Result<Vec<AssignmentSummary>, StoreError> {
        self.store.assignments_for_order(order_number)
    }

    pub fn view_spec(
        &self,
        order_number: &str,
        serial_number: &str,
    ) -> Result<Option<SpecSnapshot>, StoreError> {
        self.store.assignment_spec(order_number, serial_number)
    }

    /// Delete one binding after `confirm` agrees.
    pub fn remove(
        &self,
        order_number: &str,
        serial_number: &str,
        confirm: impl FnOnce() -> bool,
    ) -> Result<RemoveOutcome, StoreError> {
        if !confirm() {
            tracing::info!(serial_number, order_number, "removal declined");
            return Ok(RemoveOutcome::Declined);
        }
        if self.store.remove_assignment(order_number, serial_number)? {
            tracing::info!(serial_number, order_number, "serial removed from order");
            Ok(RemoveOutcome::Removed)
        } else {
            Ok(RemoveOutcome::NotFound)
        }
    }
}
