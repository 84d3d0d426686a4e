//! External command seam
//!
//! Every remote capability the runner consumes is an external binary
//! (`gcloud`, `gsutil`, `git`). The [`TestLabTools`] trait puts one method
//! on each capability so the orchestrator can be driven by a test double.

pub mod gcloud;

pub use gcloud::GcloudTools;

use async_trait::async_trait;
use std::path::Path;

use crate::common::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;

/// Interface over the external tooling the runner shells out to
#[async_trait]
pub trait TestLabTools: Send + Sync {
    /// Submit one remote game-loop run. Returns without waiting for
    /// completion so all runs can be submitted before any is awaited.
    fn launch_run(&self, apk: &Path, results_location: &str) -> Result<RunHandle>;

    /// Concatenated bytes of every bucket object matching the pattern.
    async fn read_object(&self, pattern: &str) -> Result<String>;

    /// Decimal byte count of the object matching the pattern; `"0"` when
    /// nothing matches (indistinguishable from a present-but-empty object).
    async fn object_size(&self, pattern: &str) -> Result<String>;

    /// Trimmed revision identifier of the checkout under test.
    async fn head_revision(&self) -> Result<String>;
}

/// An in-flight remote run: the results location it will write to, paired
/// with the live launcher process.
pub struct RunHandle {
    results_location: String,
    child: Child,
}

impl RunHandle {
    /// Wrap a freshly spawned launcher process.
    ///
    /// The child must have been spawned with piped stdout and stderr;
    /// `drain_to_stdout` consumes both.
    pub fn new(results_location: String, child: Child) -> Self {
        Self {
            results_location,
            child,
        }
    }

    /// The composite key correlating this run with its remote artifacts
    pub fn results_location(&self) -> &str {
        &self.results_location
    }

    /// Forward the launcher's combined output to stdout, line by line, as
    /// it arrives. Returns once both streams are closed.
    pub async fn drain_to_stdout(&mut self) -> Result<()> {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();

        // Pump both pipes concurrently so neither fills and stalls the
        // child; lines are printed in arrival order, like the combined
        // stream the launcher would produce on a terminal.
        let out = async {
            match stdout {
                Some(s) => forward_lines(s).await,
                None => Ok(()),
            }
        };
        let err = async {
            match stderr {
                Some(s) => forward_lines(s).await,
                None => Ok(()),
            }
        };
        let (out, err) = tokio::join!(out, err);
        out?;
        err?;
        Ok(())
    }

    /// Wait for the launcher to exit and return its status code.
    pub async fn wait(&mut self) -> Result<i32> {
        let status = self.child.wait().await?;
        // A signal-killed launcher has no code; treat it as a plain failure
        Ok(status.code().unwrap_or(1))
    }

    /// Best-effort cancellation of the local launcher process.
    ///
    /// The remote service has no cancellation hook here: a run it already
    /// accepted keeps going even after the launcher dies.
    pub fn abort(&mut self) {
        let _ = self.child.start_kill();
    }
}

async fn forward_lines<R>(stream: R) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        println!("{}", line.trim_end());
    }
    Ok(())
}
