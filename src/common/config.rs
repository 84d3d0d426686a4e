//! Configuration handling
//!
//! Resolution order: CLI flags override the optional TOML config file,
//! which overrides built-in defaults. The defaults match the Flutter
//! engine's CI setup so the binary is usable with no configuration at all.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Default search path for the config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "ci/testlab.toml";

/// File-level configuration: the bucket/project/device settings that are
/// fixed for a given CI deployment
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// GCS bucket receiving test results
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// GCP project the tests are billed to
    #[serde(default = "default_project")]
    pub project: String,

    /// Firebase device descriptor, e.g. `model=flame,version=29`
    #[serde(default = "default_device")]
    pub device: String,

    /// Per-run timeout passed to the launcher (its own enforcement, not ours)
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Firebase test type
    #[serde(default = "default_test_type")]
    pub test_type: String,

    /// Environment variable consulted for the default build id
    #[serde(default = "default_build_id_env")]
    pub build_id_env: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            project: default_project(),
            device: default_device(),
            timeout: default_timeout(),
            test_type: default_test_type(),
            build_id_env: default_build_id_env(),
        }
    }
}

fn default_bucket() -> String {
    "gs://flutter_firebase_testlab".to_string()
}
fn default_project() -> String {
    "flutter-infra".to_string()
}
fn default_device() -> String {
    // Pixel 4, a highly available device in FTL
    "model=flame,version=29".to_string()
}
fn default_timeout() -> String {
    "2m".to_string()
}
fn default_test_type() -> String {
    // game-loop tests hand the app a file handle for the timeline JSON.
    // See https://firebase.google.com/docs/test-lab/android/game-loop
    "game-loop".to_string()
}
fn default_build_id_env() -> String {
    "SWARMING_TASK_ID".to_string()
}

impl FileConfig {
    /// Load from an explicit path, or from `ci/testlab.toml` if present.
    ///
    /// Returns defaults when no file exists; an explicit path that cannot
    /// be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if required {
                return Err(Error::ConfigRead {
                    path: path.display().to_string(),
                    error: "file not found".to_string(),
                });
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::ConfigRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

/// Fully resolved runtime configuration, immutable after construction
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine build variant whose output directory is scanned for APKs
    pub variant: String,
    /// Unique build identifier used to namespace results in the bucket
    pub build_id: String,
    /// Build output root containing `<variant>/firebase_apks/`
    pub out_dir: PathBuf,
    pub bucket: String,
    pub project: String,
    pub device: String,
    pub timeout: String,
    pub test_type: String,
}

impl Config {
    /// Combine CLI arguments with file-level configuration.
    pub fn resolve(
        variant: Option<String>,
        build_id: Option<String>,
        out_dir: Option<PathBuf>,
        file: FileConfig,
    ) -> Self {
        let build_id = build_id
            .or_else(|| std::env::var(&file.build_id_env).ok())
            .unwrap_or_else(|| "local_test".to_string());

        Self {
            variant: variant.unwrap_or_else(|| "android_profile_arm64".to_string()),
            build_id,
            out_dir: out_dir.unwrap_or_else(|| PathBuf::from("out")),
            bucket: file.bucket,
            project: file.project,
            device: file.device,
            timeout: file.timeout,
            test_type: file.test_type,
        }
    }

    /// Directory scanned for test packages
    pub fn apks_dir(&self) -> PathBuf {
        self.out_dir.join(&self.variant).join("firebase_apks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_ci() {
        let file = FileConfig::default();
        assert_eq!(file.bucket, "gs://flutter_firebase_testlab");
        assert_eq!(file.project, "flutter-infra");
        assert_eq!(file.device, "model=flame,version=29");
        assert_eq!(file.timeout, "2m");
        assert_eq!(file.test_type, "game-loop");
        assert_eq!(file.build_id_env, "SWARMING_TASK_ID");
    }

    #[test]
    fn resolve_uses_cli_values_first() {
        let config = Config::resolve(
            Some("android_debug_x64".to_string()),
            Some("build-42".to_string()),
            Some(PathBuf::from("/src/out")),
            FileConfig::default(),
        );
        assert_eq!(config.variant, "android_debug_x64");
        assert_eq!(config.build_id, "build-42");
        assert_eq!(
            config.apks_dir(),
            PathBuf::from("/src/out/android_debug_x64/firebase_apks")
        );
    }

    #[test]
    fn resolve_falls_back_to_defaults() {
        // Point the env fallback at a variable that cannot exist so the
        // literal fallback is exercised regardless of the test environment.
        let file = FileConfig {
            build_id_env: "TESTLAB_RUNNER_UNSET_VAR_FOR_TEST".to_string(),
            ..FileConfig::default()
        };
        let config = Config::resolve(None, None, None, file);
        assert_eq!(config.variant, "android_profile_arm64");
        assert_eq!(config.build_id, "local_test");
        assert_eq!(
            config.apks_dir(),
            PathBuf::from("out/android_profile_arm64/firebase_apks")
        );
    }

    #[test]
    fn file_config_parses_partial_toml() {
        let file: FileConfig = toml::from_str("bucket = \"gs://other\"").unwrap();
        assert_eq!(file.bucket, "gs://other");
        assert_eq!(file.project, "flutter-infra");
    }

    #[test]
    fn file_config_rejects_unknown_keys() {
        let result: std::result::Result<FileConfig, _> = toml::from_str("buckte = \"typo\"");
        assert!(result.is_err());
    }

    #[test]
    fn load_missing_explicit_path_is_an_error() {
        let result = FileConfig::load(Some(Path::new("/nonexistent/testlab.toml")));
        assert!(matches!(result, Err(Error::ConfigRead { .. })));
    }
}
