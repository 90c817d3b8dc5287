//! Library components of the speccheck command line.

pub mod logging;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod summary;
pub mod workflow;
