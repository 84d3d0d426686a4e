//! Pass/fail classification of run artifacts
//!
//! These checks are pure functions over the bytes fetched from the results
//! bucket, so the orchestrator stays trivially testable without the bucket.

use regex::Regex;
use std::sync::OnceLock;

/// Lines the Flutter engine emits at error or fatal severity
fn error_signature() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[EF]/flutter.+").expect("static regex"))
}

/// Outcome of scanning a logcat capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogVerdict {
    /// The log object was empty (or absent, the accessor cannot tell)
    Empty,
    /// One or more error-severity flutter lines, in order of appearance
    Errors(Vec<String>),
    /// Non-empty and free of error signatures
    Clean,
}

/// Scan a logcat capture for flutter error signatures.
///
/// Emptiness is checked before the pattern scan: an empty log means the run
/// produced nothing at all, which is its own failure mode.
pub fn scan_logcat(logcat: &str) -> LogVerdict {
    if logcat.is_empty() {
        return LogVerdict::Empty;
    }

    let matches: Vec<String> = error_signature()
        .find_iter(logcat)
        .map(|m| m.as_str().to_string())
        .collect();

    if matches.is_empty() {
        LogVerdict::Clean
    } else {
        LogVerdict::Errors(matches)
    }
}

/// Whether the timeline artifact was actually written.
///
/// The size query reports `"0"` both for a missing object and for a
/// present-but-empty one; either way the run failed to produce a timeline.
pub fn timeline_produced(size: &str) -> bool {
    size.trim() != "0"
}

/// Whether a test package is expected to produce a timeline.
///
/// scenario_app writes a timeline through the game-loop file handle; the
/// android image tests do not.
pub fn is_scenario_package(apk_path: &str) -> bool {
    apk_path.contains("scenario")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_is_reported_before_any_scan() {
        assert_eq!(scan_logcat(""), LogVerdict::Empty);
    }

    #[test]
    fn clean_log_passes() {
        assert_eq!(scan_logcat("I/flutter: ok"), LogVerdict::Clean);
        assert_eq!(
            scan_logcat("I/flutter: frame 1\nD/flutter: detail\nW/flutter: warn"),
            LogVerdict::Clean
        );
    }

    #[test]
    fn error_lines_are_reported_exactly() {
        let verdict = scan_logcat("E/flutter: crash\nI/flutter: ok");
        assert_eq!(verdict, LogVerdict::Errors(vec!["E/flutter: crash".into()]));
    }

    #[test]
    fn fatal_lines_match_too() {
        let verdict = scan_logcat("I/flutter: ok\nF/flutter: aborting\nE/flutter: stack frame");
        assert_eq!(
            verdict,
            LogVerdict::Errors(vec!["F/flutter: aborting".into(), "E/flutter: stack frame".into()])
        );
    }

    #[test]
    fn bare_severity_marker_without_rest_does_not_match() {
        // The signature requires at least one character after "flutter"
        assert_eq!(scan_logcat("E/flutter"), LogVerdict::Clean);
    }

    #[test]
    fn other_tags_do_not_match() {
        assert_eq!(
            scan_logcat("E/AndroidRuntime: FATAL EXCEPTION\nI/flutter: ok"),
            LogVerdict::Clean
        );
    }

    #[test]
    fn timeline_size_zero_means_not_produced() {
        assert!(!timeline_produced("0"));
        assert!(!timeline_produced(" 0\n"));
    }

    #[test]
    fn timeline_size_nonzero_means_produced() {
        assert!(timeline_produced("1024"));
        assert!(timeline_produced("1"));
    }

    #[test]
    fn scenario_packages_detected_by_substring() {
        assert!(is_scenario_package("out/android_profile_arm64/firebase_apks/scenario_app.apk"));
        assert!(!is_scenario_package("out/android_profile_arm64/firebase_apks/app-debug.apk"));
    }
}
