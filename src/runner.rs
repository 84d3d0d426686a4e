//! Test-Run Orchestrator
//!
//! Discovers built APKs, submits one remote game-loop run per APK, then
//! awaits each run in submission order: stream its output, verify its exit
//! status, and validate the artifacts it left in the results bucket. The
//! reduction is strictly fail-fast; the first failing package aborts the
//! whole invocation.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::checks::{self, LogVerdict};
use crate::common::{Config, Error, Result};
use crate::tools::{RunHandle, TestLabTools};

/// Composite key correlating a launched run with its remote artifacts:
/// `<apk basename>/<revision>/<build id>`. Uniqueness of the tuple is the
/// only collision avoidance in the shared bucket.
pub fn results_location(apk: &Path, revision: &str, build_id: &str) -> String {
    let base = apk
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{base}/{revision}/{build_id}")
}

/// Find the test packages built for this variant.
pub fn discover_apks(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.apk", dir.display());
    let entries = glob::glob(&pattern).map_err(|e| Error::NoArtifactsFound {
        dir: format!("{} ({e})", dir.display()),
    })?;

    let mut apks: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
    apks.sort();

    if apks.is_empty() {
        return Err(Error::NoArtifactsFound {
            dir: dir.display().to_string(),
        });
    }
    Ok(apks)
}

/// Run every discovered package to completion, or fail fast on the first
/// package that does not pass.
pub async fn run<T: TestLabTools + ?Sized>(config: &Config, tools: &T) -> Result<()> {
    let apks = discover_apks(&config.apks_dir())?;
    let revision = tools.head_revision().await?;

    tracing::info!(
        revision,
        build_id = %config.build_id,
        count = apks.len(),
        "submitting game-loop runs"
    );

    // Submit every run before awaiting any, so the remote invocations
    // overlap even though local waiting is sequential.
    let mut pending: VecDeque<(PathBuf, RunHandle)> = VecDeque::with_capacity(apks.len());
    for apk in apks {
        let location = results_location(&apk, &revision, &config.build_id);
        let handle = tools.launch_run(&apk, &location)?;
        pending.push_back((apk, handle));
    }

    while let Some((apk, handle)) = pending.pop_front() {
        if let Err(e) = await_and_check(config, tools, &apk, handle).await {
            cancel_outstanding(&mut pending);
            return Err(e);
        }
    }

    Ok(())
}

/// Drain one run's output, verify its exit status, then run the artifact
/// checks against the bucket.
async fn await_and_check<T: TestLabTools + ?Sized>(
    config: &Config,
    tools: &T,
    apk: &Path,
    mut handle: RunHandle,
) -> Result<()> {
    handle.drain_to_stdout().await?;

    let code = handle.wait().await?;
    if code != 0 {
        println!("Firebase test failed {code}");
        return Err(Error::RemoteRunFailed { code });
    }

    let location = handle.results_location();

    println!("Checking logcat for {location}");
    check_logcat(tools, &config.bucket, location).await?;

    // scenario_app produces a timeline, the android image tests do not
    if checks::is_scenario_package(&apk.to_string_lossy()) {
        println!("Checking timeline for {location}");
        check_timeline(tools, &config.bucket, location).await?;
    }

    println!("{} {}", "✓".green(), location);
    Ok(())
}

async fn check_logcat<T: TestLabTools + ?Sized>(
    tools: &T,
    bucket: &str,
    location: &str,
) -> Result<()> {
    let pattern = format!("{bucket}/{location}/*/logcat");
    let logcat = tools.read_object(&pattern).await?;

    match checks::scan_logcat(&logcat) {
        LogVerdict::Clean => Ok(()),
        LogVerdict::Empty => Err(Error::EmptyLog {
            location: location.to_string(),
        }),
        LogVerdict::Errors(matches) => {
            println!("Errors in logcat:");
            for line in &matches {
                println!("{line}");
            }
            Err(Error::ErrorSignatureFound {
                location: location.to_string(),
                matches,
            })
        }
    }
}

async fn check_timeline<T: TestLabTools + ?Sized>(
    tools: &T,
    bucket: &str,
    location: &str,
) -> Result<()> {
    let pattern = format!("{bucket}/{location}/*/game_loop_results/results_scenario_0.json");
    let size = tools.object_size(&pattern).await?;

    if checks::timeline_produced(&size) {
        Ok(())
    } else {
        println!("Failed to produce a timeline.");
        Err(Error::TimelineNotProduced {
            location: location.to_string(),
        })
    }
}

/// Kill the local launcher of every submitted-but-unawaited run. The remote
/// service offers no cancellation hook, so an already-accepted run keeps
/// executing there; this only stops us paying for the local processes.
fn cancel_outstanding(pending: &mut VecDeque<(PathBuf, RunHandle)>) {
    for (apk, handle) in pending.iter_mut() {
        tracing::warn!(
            apk = %apk.display(),
            "cancelling launcher for unawaited run; the remote run may continue"
        );
        handle.abort();
    }
    pending.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_location_joins_base_revision_and_build() {
        let apk = Path::new("/src/out/android_profile_arm64/firebase_apks/scenario_app.apk");
        assert_eq!(
            results_location(apk, "deadbeef", "8881234"),
            "scenario_app.apk/deadbeef/8881234"
        );
    }

    #[test]
    fn results_location_uses_basename_only() {
        let a = results_location(Path::new("a/app.apk"), "rev", "id");
        let b = results_location(Path::new("b/app.apk"), "rev", "id");
        // Same basename collides by design; uniqueness comes from revision
        // and build id
        assert_eq!(a, b);
    }

    #[test]
    fn discover_apks_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_apks(dir.path());
        assert!(matches!(result, Err(Error::NoArtifactsFound { .. })));
    }

    #[test]
    fn discover_apks_missing_dir_fails() {
        let result = discover_apks(Path::new("/nonexistent/firebase_apks"));
        assert!(matches!(result, Err(Error::NoArtifactsFound { .. })));
    }

    #[test]
    fn discover_apks_matches_only_apk_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scenario_app.apk"), b"apk").unwrap();
        std::fs::write(dir.path().join("app-debug.apk"), b"apk").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"txt").unwrap();

        let apks = discover_apks(dir.path()).unwrap();
        let names: Vec<_> = apks
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["app-debug.apk", "scenario_app.apk"]);
    }
}
