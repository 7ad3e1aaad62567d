//! Typed task dispatch for harness integrations.
//!
//! The browser-side harness invokes node-side operations by name. Instead
//! of a free-form map of string-keyed callbacks, the operations form a
//! closed enum with typed request and response payloads, dispatched through
//! one registry value that owns the run configuration and the dashboard
//! capability.

use crate::compare::{compare_with_config, CompareReport, CompareRequest};
use crate::config::HarnessConfig;
use crate::dashboard::{select_dashboard, DashboardClient};
use crate::error::Result;
use std::path::PathBuf;

/// The closed set of operations a harness can request.
#[derive(Debug, Clone)]
pub enum TaskRequest {
  /// Compare two screenshots and write a diff artifact.
  CompareImages(CompareRequest),
  /// Check whether a path names an existing regular file.
  FileExists { path: PathBuf },
}

/// Typed responses, one variant per operation.
#[derive(Debug, Clone)]
pub enum TaskResponse {
  Compared(CompareReport),
  FileExists(bool),
}

/// Dispatches [`TaskRequest`]s against one run's configuration.
pub struct TaskRegistry {
  config: HarnessConfig,
  dashboard: Box<dyn DashboardClient>,
}

impl TaskRegistry {
  /// Builds a registry with the dashboard capability selected from the
  /// configuration.
  pub fn new(config: HarnessConfig) -> Self {
    let dashboard = select_dashboard(&config);
    Self { config, dashboard }
  }

  /// Builds a registry with an explicitly chosen dashboard client.
  pub fn with_dashboard(config: HarnessConfig, dashboard: Box<dyn DashboardClient>) -> Self {
    Self { config, dashboard }
  }

  pub fn config(&self) -> &HarnessConfig {
    &self.config
  }

  /// Runs one operation. Comparison failures (missing input, decode or
  /// write errors) propagate as [`crate::Error`]; a completed comparison
  /// with differences is a normal response.
  pub fn dispatch(&self, request: TaskRequest) -> Result<TaskResponse> {
    match request {
      TaskRequest::CompareImages(compare_request) => {
        let report = compare_with_config(&compare_request, &self.config)?;
        self.dashboard.publish(&report)?;
        Ok(TaskResponse::Compared(report))
      }
      TaskRequest::FileExists { path } => Ok(TaskResponse::FileExists(path.is_file())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_exists_reports_missing_path() {
    let registry = TaskRegistry::new(HarnessConfig::default());
    let response = registry
      .dispatch(TaskRequest::FileExists {
        path: PathBuf::from("/definitely/not/here.png"),
      })
      .unwrap();
    assert!(matches!(response, TaskResponse::FileExists(false)));
  }

  #[test]
  fn compare_errors_propagate_through_dispatch() {
    let registry = TaskRegistry::new(HarnessConfig::default());
    let request = CompareRequest::new("/nonexistent-expected.png", "/nonexistent-actual.png");
    let result = registry.dispatch(TaskRequest::CompareImages(request));
    assert!(result.is_err());
  }
}
