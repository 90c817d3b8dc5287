//! Storage and assignment errors.

use std::path::PathBuf;

use thiserror::Error;

/// A storage operation failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened.
    #[error("failed to open database {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed; `operation` names what was being done.
    #[error("failed to {operation}")]
    Query {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    pub(crate) fn query(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Query { operation, source }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Open { path, .. } => format!(
                "Could not connect to the order database at {}.",
                path.display()
            ),
            Self::Query { operation, .. } => {
                format!("The order database could not {operation}.")
            }
        }
    }
}

/// Failure of a serial assignment.
#[derive(Debug, Error)]
pub enum AssignError {
    /// The live read produced no usable serial number.
    #[error("serial number {serial:?} cannot be assigned")]
    InvalidSerial { serial: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AssignError {
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidSerial { .. } => {
                "No serial number could be read from this machine, so it cannot be assigned."
                    .to_string()
            }
            Self::Store(error) => error.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_names_operation() {
        let error = StoreError::query("look up order")(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(error.to_string(), "failed to look up order");
        assert_eq!(
            error.user_message(),
            "The order database could not look up order."
        );
    }

    #[test]
    fn assign_error_wraps_store_message() {
        let error = AssignError::from(StoreError::query("assign serial")(
            rusqlite::Error::InvalidQuery,
        ));
        assert_eq!(error.to_string(), "failed to assign serial");
        assert!(
            AssignError::InvalidSerial {
                serial: "Unknown".to_string()
            }
            .user_message()
            .contains("No serial number")
        );
    }
}
