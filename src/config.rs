//! Explicit harness configuration.
//!
//! Instead of reading environment variables at arbitrary call sites, the
//! surrounding harness builds one [`HarnessConfig`] at process start (either
//! literally or via [`HarnessConfig::from_env`]) and passes it by reference
//! to whatever needs it. The comparison engine itself only consumes the
//! diff output directory; the dashboard fields exist for the capability
//! selection done in [`crate::dashboard`].

use crate::compare::DEFAULT_THRESHOLD;
use std::env;
use std::path::PathBuf;

/// Directory diff artifacts are written into when nothing else is
/// configured, relative to the working directory.
pub const DEFAULT_DIFF_DIR: &str = "snapshots";

/// Process-wide configuration for a visual regression run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
  /// Directory to write diff artifacts into (created on demand).
  pub diff_dir: PathBuf,
  /// Threshold applied when a request does not carry its own.
  pub default_threshold: f64,
  /// API key for the visual-diff dashboard, if one is wired up.
  pub dashboard_api_key: Option<String>,
  /// Dashboard server URL override.
  pub dashboard_server_url: Option<String>,
}

impl Default for HarnessConfig {
  fn default() -> Self {
    Self {
      diff_dir: PathBuf::from(DEFAULT_DIFF_DIR),
      default_threshold: DEFAULT_THRESHOLD,
      dashboard_api_key: None,
      dashboard_server_url: None,
    }
  }
}

impl HarnessConfig {
  /// Builds the configuration from `SNAPDIFF_*` environment variables.
  ///
  /// Intended to be called exactly once at process start; components
  /// receive the resulting struct rather than probing the environment
  /// themselves. Unset variables fall back to the defaults.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    if let Ok(dir) = env::var("SNAPDIFF_DIFF_DIR") {
      if !dir.is_empty() {
        config.diff_dir = PathBuf::from(dir);
      }
    }
    if let Ok(threshold) = env::var("SNAPDIFF_THRESHOLD") {
      if let Ok(value) = threshold.parse::<f64>() {
        config.default_threshold = value;
      }
    }
    config.dashboard_api_key = env::var("SNAPDIFF_API_KEY").ok().filter(|k| !k.is_empty());
    config.dashboard_server_url = env::var("SNAPDIFF_SERVER_URL")
      .ok()
      .filter(|u| !u.is_empty());
    config
  }

  /// Sets the diff output directory.
  pub fn with_diff_dir(mut self, diff_dir: impl Into<PathBuf>) -> Self {
    self.diff_dir = diff_dir.into();
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_points_at_snapshots_dir() {
    let config = HarnessConfig::default();
    assert_eq!(config.diff_dir, PathBuf::from("snapshots"));
    assert_eq!(config.default_threshold, DEFAULT_THRESHOLD);
    assert!(config.dashboard_api_key.is_none());
  }

  #[test]
  fn from_env_reads_diff_dir() {
    env::set_var("SNAPDIFF_DIFF_DIR", "custom/diffs");
    let config = HarnessConfig::from_env();
    env::remove_var("SNAPDIFF_DIFF_DIR");
    assert_eq!(config.diff_dir, PathBuf::from("custom/diffs"));
  }

  #[test]
  fn builder_overrides_diff_dir() {
    let config = HarnessConfig::default().with_diff_dir("elsewhere");
    assert_eq!(config.diff_dir, PathBuf::from("elsewhere"));
  }
}
