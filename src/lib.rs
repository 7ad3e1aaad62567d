//! snapdiff — perceptual PNG comparison for visual regression suites.
//!
//! Given two screenshots of possibly different dimensions, snapdiff
//! normalizes them onto a shared canvas, runs a perceptual pixel-level
//! diff, writes a visual diff artifact and reports mismatch statistics.
//! Browser automation and test orchestration live elsewhere; this crate
//! consumes two file paths and a threshold and returns a structured result.

pub mod compare;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod pixelmatch;
pub mod registry;

pub use compare::{compare, compare_with_config, CompareReport, CompareRequest};
pub use config::HarnessConfig;
pub use dashboard::{DashboardClient, NoopDashboard};
pub use error::{CompareError, Error, Result};
pub use pixelmatch::DiffOptions;
pub use registry::{TaskRegistry, TaskRequest, TaskResponse};
