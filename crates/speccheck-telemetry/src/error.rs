//! Error types for host telemetry.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single telemetry query.
///
/// The live spec reader turns these into "Unknown" field values, so they are
/// only ever seen in logs and in the removable-device listing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TelemetryError {
    /// A helper program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A helper program ran but reported failure.
    #[error("{program} exited with status {}: {stderr}", display_status(.status))]
    CommandFailed {
        program: &'static str,
        status: Option<i32>,
        stderr: String,
    },

    /// Query output was not the JSON we asked for.
    #[error("failed to decode {query} output: {source}")]
    Json {
        query: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The query succeeded but returned nothing usable.
    #[error("no value reported for {attribute}")]
    Missing { attribute: &'static str },

    #[error("could not parse {attribute} from {value:?}")]
    Parse {
        attribute: &'static str,
        value: String,
    },

    /// The provider has no source for this attribute on this platform.
    #[error("{attribute} is not available on this platform")]
    Unsupported { attribute: &'static str },
}

fn display_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "unknown".to_string(), |code| code.to_string())
}

impl TelemetryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short message for the technician.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Spawn { .. } | Self::CommandFailed { .. } => {
                "A system query could not be run on this machine."
            }
            Self::Unsupported { .. } => "This reading is not available on this platform.",
            Self::Missing { .. } => "The system did not report a value.",
            Self::Json { .. } | Self::Io { .. } | Self::Parse { .. } => {
                "The system reported a value that could not be read."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_message_includes_status() {
        let error = TelemetryError::CommandFailed {
            program: "powercfg",
            status: Some(1),
            stderr: "access denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "powercfg exited with status 1: access denied"
        );

        let killed = TelemetryError::CommandFailed {
            program: "powershell",
            status: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("status unknown"));
    }
}
