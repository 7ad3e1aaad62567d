//! On-disk PNG comparison for visual regression runs.
//!
//! The entry point is [`compare`]: given paths to an expected (baseline) and
//! an actual (candidate) screenshot, decode both, reconcile their dimensions
//! onto a shared canvas, run the perceptual pixel diff, write the diff
//! artifact, and report the mismatch statistics.
//!
//! Images of differing dimensions are compared over their union bounding
//! box: each image is placed at the origin of a canvas sized to the
//! element-wise maximum of the two, and uncovered area is zero-filled
//! (transparent). Area present in only one image therefore counts against
//! the transparent background of the other, which inflates the mismatch
//! percentage; callers comparing mismatched sizes should expect that.

use crate::config::HarnessConfig;
use crate::error::{CompareError, Result};
use crate::pixelmatch::{diff_buffers, DiffOptions};
use image::imageops;
use image::ImageFormat;
use image::RgbaImage;
use serde::Serialize;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default per-pixel perceptual threshold, matching the engine's typical
/// screenshot-noise tolerance.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// A single comparison request.
///
/// `threshold` is the per-pixel perceptual sensitivity in [0, 1], not a
/// mismatch-percentage cutoff; out-of-range values are rejected with
/// [`CompareError::InvalidThreshold`]. When `diff_name` is unset a
/// collision-resistant name is generated so concurrent runs never overwrite
/// each other's artifacts.
#[derive(Debug, Clone)]
pub struct CompareRequest {
  /// Path to the expected (baseline) PNG.
  pub expected: PathBuf,
  /// Path to the actual (candidate) PNG.
  pub actual: PathBuf,
  /// Per-pixel perceptual threshold in [0, 1].
  pub threshold: f64,
  /// File name for the diff artifact inside the configured diff directory.
  pub diff_name: Option<String>,
}

impl CompareRequest {
  /// Creates a request with the default threshold and a generated diff name.
  pub fn new(expected: impl Into<PathBuf>, actual: impl Into<PathBuf>) -> Self {
    Self {
      expected: expected.into(),
      actual: actual.into(),
      threshold: DEFAULT_THRESHOLD,
      diff_name: None,
    }
  }

  /// Sets the perceptual threshold.
  pub fn with_threshold(mut self, threshold: f64) -> Self {
    self.threshold = threshold;
    self
  }

  /// Sets an explicit diff artifact file name.
  pub fn with_diff_name(mut self, diff_name: impl Into<String>) -> Self {
    self.diff_name = Some(diff_name.into());
    self
  }
}

/// Outcome of a completed comparison.
///
/// A completed comparison with differences is still a success; `pass` only
/// records whether the images matched exactly (zero differing pixels).
/// Callers interpret `mismatch_percentage` against their own tolerance.
#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
  /// True iff no pixel differed.
  pub pass: bool,
  /// Number of pixels that differed.
  pub diff_pixels: u64,
  /// Number of pixels compared (canvas width x canvas height).
  pub total_pixels: u64,
  /// `100 * diff_pixels / total_pixels`, unrounded.
  pub mismatch_percentage: f64,
  /// Where the diff artifact was written.
  pub diff_path: PathBuf,
  /// Union canvas width.
  pub canvas_width: u32,
  /// Union canvas height.
  pub canvas_height: u32,
}

impl CompareReport {
  /// One-line human-readable summary.
  pub fn summary(&self) -> String {
    if self.pass {
      return format!("Images match ({} pixels compared)", self.total_pixels);
    }
    format!(
      "Images differ: {} of {} pixels ({:.4}%), diff written to {}",
      self.diff_pixels,
      self.total_pixels,
      self.mismatch_percentage,
      self.diff_path.display()
    )
  }
}

/// Compares two PNG files using the default harness configuration.
pub fn compare(request: &CompareRequest) -> Result<CompareReport> {
  compare_with_config(request, &HarnessConfig::default())
}

/// Compares two PNG files, writing the diff artifact into the configured
/// diff directory (created if absent).
///
/// All failure modes surface as structured [`CompareError`]s naming the
/// offending path; the input files are never modified, and nothing is
/// written when the inputs cannot be read or decoded.
pub fn compare_with_config(
  request: &CompareRequest,
  config: &HarnessConfig,
) -> Result<CompareReport> {
  if !(0.0..=1.0).contains(&request.threshold) {
    return Err(
      CompareError::InvalidThreshold {
        value: request.threshold,
      }
      .into(),
    );
  }

  let expected_path = resolve_input(&request.expected);
  let actual_path = resolve_input(&request.actual);

  if !expected_path.is_file() {
    return Err(
      CompareError::MissingExpected {
        path: expected_path.display().to_string(),
      }
      .into(),
    );
  }
  if !actual_path.is_file() {
    return Err(
      CompareError::MissingActual {
        path: actual_path.display().to_string(),
      }
      .into(),
    );
  }

  let expected = decode_png_file(&expected_path)?;
  let actual = decode_png_file(&actual_path)?;

  let canvas_width = expected.width().max(actual.width());
  let canvas_height = expected.height().max(actual.height());
  let expected = pad_to_canvas(expected, canvas_width, canvas_height);
  let actual = pad_to_canvas(actual, canvas_width, canvas_height);

  let mut diff = RgbaImage::new(canvas_width, canvas_height);
  let options = DiffOptions::default().with_threshold(request.threshold);
  let diff_pixels = diff_buffers(
    expected.as_raw(),
    actual.as_raw(),
    &mut diff,
    canvas_width,
    canvas_height,
    &options,
  );

  let total_pixels = u64::from(canvas_width) * u64::from(canvas_height);
  let mismatch_percentage = if total_pixels > 0 {
    100.0 * diff_pixels as f64 / total_pixels as f64
  } else {
    0.0
  };

  fs::create_dir_all(&config.diff_dir).map_err(|e| CompareError::WriteFailed {
    path: config.diff_dir.display().to_string(),
    reason: e.to_string(),
  })?;

  let diff_name = request
    .diff_name
    .clone()
    .unwrap_or_else(generated_diff_name);
  let diff_path = config.diff_dir.join(diff_name);
  write_png(&diff, &diff_path)?;

  Ok(CompareReport {
    pass: diff_pixels == 0,
    diff_pixels,
    total_pixels,
    mismatch_percentage,
    diff_path,
    canvas_width,
    canvas_height,
  })
}

/// Relative input paths resolve against the working directory, mirroring how
/// the test harness hands over screenshot paths.
fn resolve_input(path: &Path) -> PathBuf {
  if path.is_absolute() {
    return path.to_path_buf();
  }
  match std::env::current_dir() {
    Ok(cwd) => cwd.join(path),
    Err(_) => path.to_path_buf(),
  }
}

fn decode_png_file(path: &Path) -> Result<RgbaImage> {
  let bytes = fs::read(path).map_err(|e| CompareError::DecodeFailed {
    path: path.display().to_string(),
    reason: e.to_string(),
  })?;
  image::load_from_memory_with_format(&bytes, ImageFormat::Png)
    .map(|img| img.to_rgba8())
    .map_err(|e| {
      CompareError::DecodeFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
      }
      .into()
    })
}

/// Places `img` at the origin of a zero-filled canvas of the given size.
/// Returns the image unchanged when it already fills the canvas.
fn pad_to_canvas(img: RgbaImage, width: u32, height: u32) -> RgbaImage {
  if img.width() == width && img.height() == height {
    return img;
  }
  let mut canvas = RgbaImage::new(width, height);
  imageops::replace(&mut canvas, &img, 0, 0);
  canvas
}

fn write_png(img: &RgbaImage, path: &Path) -> Result<()> {
  let mut buffer = Vec::new();
  img
    .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
    .map_err(|e| CompareError::WriteFailed {
      path: path.display().to_string(),
      reason: e.to_string(),
    })?;
  fs::write(path, buffer).map_err(|e| {
    CompareError::WriteFailed {
      path: path.display().to_string(),
      reason: e.to_string(),
    }
    .into()
  })
}

static DIFF_NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a diff artifact name that stays unique across concurrent runs:
/// wall-clock millis plus a salt mixing sub-second nanos, the process id and
/// a process-local counter.
fn generated_diff_name() -> String {
  let now = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default();
  let seq = DIFF_NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
  let salt = (u64::from(now.subsec_nanos()) ^ (u64::from(process::id()) << 32))
    .wrapping_add(seq.wrapping_mul(0x9E3779B97F4A7C15));
  format!("diff-{}-{:08x}.png", now.as_millis(), salt & 0xffff_ffff)
}
