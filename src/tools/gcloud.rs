//! Production [`TestLabTools`] implementation over `gcloud`, `gsutil`, `git`

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::common::{Config, Error, Result};

use super::{RunHandle, TestLabTools};

/// Binaries that must resolve on PATH before anything is launched
const REQUIRED_TOOLS: [&str; 3] = ["gcloud", "gsutil", "git"];

/// Shells out to the Google Cloud CLI suite
pub struct GcloudTools {
    config: Config,
}

impl GcloudTools {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Verify the external binaries exist before submitting any work.
    pub fn preflight() -> Result<()> {
        for tool in REQUIRED_TOOLS {
            which::which(tool).map_err(|_| Error::ToolNotFound(tool.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl TestLabTools for GcloudTools {
    fn launch_run(&self, apk: &Path, results_location: &str) -> Result<RunHandle> {
        let mut cmd = Command::new("gcloud");
        cmd.args(["--project", &self.config.project])
            .args(["firebase", "test", "android", "run"])
            .args(["--type", &self.config.test_type])
            .arg("--app")
            .arg(apk)
            .args(["--timeout", &self.config.timeout])
            .args(["--results-bucket", &self.config.bucket])
            .args(["--results-dir", results_location])
            .args(["--device", &self.config.device])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Outstanding launchers are killed when the orchestrator fails
            // fast on an earlier package
            .kill_on_drop(true);

        tracing::debug!(apk = %apk.display(), results_location, "launching gcloud firebase test");

        let child = cmd.spawn().map_err(|e| Error::LaunchFailed {
            tool: "gcloud".to_string(),
            reason: e.to_string(),
        })?;

        Ok(RunHandle::new(results_location.to_string(), child))
    }

    async fn read_object(&self, pattern: &str) -> Result<String> {
        let output = Command::new("gsutil")
            .args(["cat", pattern])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::command_failed(format!("gsutil cat {pattern}"), e))?;

        if !output.status.success() {
            return Err(Error::command_failed(
                format!("gsutil cat {pattern}"),
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn object_size(&self, pattern: &str) -> Result<String> {
        let output = Command::new("gsutil")
            .args(["du", pattern])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::command_failed(format!("gsutil du {pattern}"), e))?;

        // `gsutil du` exits non-zero when the pattern matches nothing;
        // both that and an empty object report as "0".
        if !output.status.success() {
            tracing::debug!(pattern, stderr = %String::from_utf8_lossy(&output.stderr).trim(), "gsutil du matched nothing");
            return Ok("0".to_string());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let size = stdout.split_whitespace().next().unwrap_or("0");
        Ok(size.to_string())
    }

    async fn head_revision(&self) -> Result<String> {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::RevisionLookup(e.to_string()))?;

        if !output.status.success() {
            return Err(Error::RevisionLookup(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
