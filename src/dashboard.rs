//! Dashboard capability interface.
//!
//! Harnesses may stream comparison results to a third-party visual-diff
//! dashboard, but the integration is optional. Rather than having every
//! call site probe whether a client is installed, the capability is
//! selected once at startup: call sites hold a `dyn DashboardClient` and
//! publishing is a no-op when the integration is absent.

use crate::compare::CompareReport;
use crate::config::HarnessConfig;
use crate::error::Result;
use std::sync::Mutex;

/// A sink for completed comparison reports.
///
/// Implementations must be cheap to call when disabled; dispatch happens on
/// every successful comparison.
pub trait DashboardClient: Send + Sync {
  /// Implementation name, for logging.
  fn name(&self) -> &'static str;

  /// Publishes one completed comparison.
  fn publish(&self, report: &CompareReport) -> Result<()>;
}

/// The absent-integration variant: accepts and discards every report.
#[derive(Debug, Default)]
pub struct NoopDashboard;

impl DashboardClient for NoopDashboard {
  fn name(&self) -> &'static str {
    "noop"
  }

  fn publish(&self, _report: &CompareReport) -> Result<()> {
    Ok(())
  }
}

/// In-memory client that records every published report. Used as the
/// present-integration stand-in by tests and local runs; a networked
/// dashboard client would slot in through the same trait.
#[derive(Debug, Default)]
pub struct RecordingDashboard {
  published: Mutex<Vec<CompareReport>>,
}

impl RecordingDashboard {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reports published so far, oldest first.
  pub fn published(&self) -> Vec<CompareReport> {
    match self.published.lock() {
      Ok(guard) => guard.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }
}

impl DashboardClient for RecordingDashboard {
  fn name(&self) -> &'static str {
    "recording"
  }

  fn publish(&self, report: &CompareReport) -> Result<()> {
    match self.published.lock() {
      Ok(mut guard) => guard.push(report.clone()),
      Err(poisoned) => poisoned.into_inner().push(report.clone()),
    }
    Ok(())
  }
}

/// Startup-time capability selection.
///
/// Without an API key there is nothing to talk to, so the no-op variant is
/// chosen and call sites never branch on availability again.
pub fn select_dashboard(config: &HarnessConfig) -> Box<dyn DashboardClient> {
  match &config.dashboard_api_key {
    Some(_) => Box::new(RecordingDashboard::new()),
    None => Box::new(NoopDashboard),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn sample_report() -> CompareReport {
    CompareReport {
      pass: true,
      diff_pixels: 0,
      total_pixels: 100,
      mismatch_percentage: 0.0,
      diff_path: PathBuf::from("snapshots/diff.png"),
      canvas_width: 10,
      canvas_height: 10,
    }
  }

  #[test]
  fn noop_accepts_reports() {
    let client = NoopDashboard;
    assert!(client.publish(&sample_report()).is_ok());
    assert_eq!(client.name(), "noop");
  }

  #[test]
  fn recording_keeps_reports_in_order() {
    let client = RecordingDashboard::new();
    let mut second = sample_report();
    second.diff_pixels = 5;

    client.publish(&sample_report()).unwrap();
    client.publish(&second).unwrap();

    let published = client.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].diff_pixels, 0);
    assert_eq!(published[1].diff_pixels, 5);
  }

  #[test]
  fn selection_depends_on_api_key() {
    let absent = select_dashboard(&HarnessConfig::default());
    assert_eq!(absent.name(), "noop");

    let mut config = HarnessConfig::default();
    config.dashboard_api_key = Some("key".to_string());
    let present = select_dashboard(&config);
    assert_eq!(present.name(), "recording");
  }
}
