use clap::Parser;
use snapdiff::{compare_with_config, CompareRequest, HarnessConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "compare_images",
  about = "Compare two PNG screenshots and write a visual diff artifact"
)]
struct Args {
  /// Path to the expected (baseline) PNG
  #[arg(long)]
  expected: PathBuf,

  /// Path to the actual (candidate) PNG
  #[arg(long)]
  actual: PathBuf,

  /// Per-pixel perceptual threshold in [0, 1]; falls back to
  /// SNAPDIFF_THRESHOLD, then 0.1
  #[arg(long)]
  threshold: Option<f64>,

  /// File name for the diff artifact (generated when omitted)
  #[arg(long)]
  diff_name: Option<String>,

  /// Directory to write diff artifacts into (overrides SNAPDIFF_DIFF_DIR)
  #[arg(long)]
  diff_dir: Option<PathBuf>,

  /// Largest mismatch percentage still treated as a passing run
  #[arg(long, default_value_t = 0.0)]
  max_mismatch_percent: f64,
}

fn main() {
  match run() {
    Ok(exit_code) => std::process::exit(exit_code),
    Err(err) => {
      eprintln!("error: {err}");
      std::process::exit(2);
    }
  }
}

fn run() -> Result<i32, String> {
  let args = Args::parse();

  let mut config = HarnessConfig::from_env();
  if let Some(diff_dir) = args.diff_dir {
    config.diff_dir = diff_dir;
  }

  let threshold = args.threshold.unwrap_or(config.default_threshold);
  let mut request = CompareRequest::new(args.expected, args.actual).with_threshold(threshold);
  if let Some(diff_name) = args.diff_name {
    request = request.with_diff_name(diff_name);
  }

  match compare_with_config(&request, &config) {
    Ok(report) => {
      let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
      println!("{json}");
      eprintln!("{}", report.summary());
      if report.mismatch_percentage <= args.max_mismatch_percent {
        Ok(0)
      } else {
        Ok(1)
      }
    }
    Err(err) => {
      // Failures keep the same JSON contract so callers can branch on the
      // presence of an `error` field before trusting numeric fields.
      let json = serde_json::json!({ "error": err.to_string() });
      println!("{}", serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?);
      Ok(2)
    }
  }
}
