//! Error types for the test lab runner
//!
//! Every failure here is terminal: the orchestration is fail-fast and
//! nothing is retried. `Error::exit_code` decides the process exit status.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the test lab runner
#[derive(Error, Debug)]
pub enum Error {
    // === Discovery Errors ===
    #[error("No APKs found at {dir}")]
    NoArtifactsFound { dir: String },

    // === Remote Run Errors ===
    #[error("Firebase test failed {code}")]
    RemoteRunFailed { code: i32 },

    #[error("Failed to launch {tool}: {reason}")]
    LaunchFailed { tool: String, reason: String },

    // === Artifact Check Errors ===
    #[error("Logcat for {location} is empty")]
    EmptyLog { location: String },

    #[error("Logcat for {location} contains {} flutter error line(s)", .matches.len())]
    ErrorSignatureFound {
        location: String,
        matches: Vec<String>,
    },

    #[error("Failed to produce a timeline.")]
    TimelineNotProduced { location: String },

    // === External Tool Errors ===
    #[error("Required tool '{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("Command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Failed to resolve git revision: {0}")]
    RevisionLookup(String),

    // === Configuration Errors ===
    #[error("Failed to read config file '{path}': {error}")]
    ConfigRead { path: String, error: String },

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a command-failed error from a command line and a reason
    pub fn command_failed(command: impl Into<String>, reason: impl ToString) -> Self {
        Self::CommandFailed {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Exit status for the whole process.
    ///
    /// A remote run failure propagates the launcher's own exit code; every
    /// other condition exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::RemoteRunFailed { code } => *code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_run_failure_propagates_code() {
        assert_eq!(Error::RemoteRunFailed { code: 20 }.exit_code(), 20);
    }

    #[test]
    fn other_errors_exit_one() {
        let errors = [
            Error::NoArtifactsFound {
                dir: "out/none".into(),
            },
            Error::EmptyLog {
                location: "a/b/c".into(),
            },
            Error::TimelineNotProduced {
                location: "a/b/c".into(),
            },
            Error::ToolNotFound("gcloud".into()),
        ];
        for e in errors {
            assert_eq!(e.exit_code(), 1);
        }
    }

    #[test]
    fn timeline_message_is_fixed() {
        let e = Error::TimelineNotProduced {
            location: "x/y/z".into(),
        };
        assert_eq!(e.to_string(), "Failed to produce a timeline.");
    }

    #[test]
    fn error_signature_counts_matches() {
        let e = Error::ErrorSignatureFound {
            location: "x/y/z".into(),
            matches: vec!["E/flutter: crash".into(), "F/flutter: abort".into()],
        };
        assert!(e.to_string().contains("2 flutter error line(s)"));
    }
}
