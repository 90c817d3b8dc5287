//! Order storage and serial assignment for speccheck.
//!
//! [`OrderStore`] is the query interface to the order database and
//! [`SqliteOrderStore`] its bundled implementation.
//! [`SerialAssignmentManager`] binds serial numbers to orders with
//! reassignment confirmation and backs the serial viewer.

#![deny(unsafe_code)]

pub mod assignment;
pub mod error;
pub mod store;

pub use assignment::{AssignOutcome, ReassignPrompt, RemoveOutcome, SerialAssignmentManager};
pub use error::{AssignError, StoreError};
pub use store::{OrderStore, SqliteOrderStore, parse_timestamp};
