//! Firebase Test Lab game-loop runner
//!
//! This library drives Android game-loop tests on Firebase Test Lab for CI:
//! it discovers locally built APKs, submits one remote run per APK, streams
//! the launcher output, and validates the artifacts each run leaves in the
//! results bucket (logcat scan, timeline presence).

pub mod checks;
pub mod common;
pub mod runner;
pub mod tools;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result};
pub use tools::{RunHandle, TestLabTools};
