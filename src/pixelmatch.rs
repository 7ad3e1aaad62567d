//! Perceptual per-pixel comparison over RGBA buffers.
//!
//! Two pixels count as different when their color distance in YIQ space
//! (computed after blending semi-transparent pixels onto white) exceeds a
//! threshold-derived budget. This tolerates anti-aliasing and compression
//! noise that exact byte equality would flag, and optionally detects
//! anti-aliased pixels from their 3x3 neighborhood so they can be excluded
//! from the mismatch count.
//!
//! The comparison also paints a visualization buffer: matching pixels as a
//! faint grayscale of the expected image, mismatches in a marker color, and
//! detected anti-aliasing in its own color.

/// Largest possible YIQ color distance between two RGBA pixels.
const MAX_YIQ_DELTA: f64 = 35215.0;

/// Options controlling the per-pixel comparison and diff visualization.
#[derive(Debug, Clone)]
pub struct DiffOptions {
  /// Color-distance threshold in [0, 1]. 0 demands exact perceptual
  /// equality; larger values tolerate bigger per-pixel shifts.
  pub threshold: f64,
  /// Count anti-aliased pixels as mismatches instead of detecting and
  /// excluding them.
  pub include_aa: bool,
  /// Dim factor applied to matching pixels in the visualization (0 = white,
  /// 1 = full grayscale of the expected image).
  pub alpha: f64,
  /// Marker color for mismatched pixels.
  pub diff_color: [u8; 3],
  /// Alternate marker for pixels that got darker; falls back to
  /// `diff_color` when unset.
  pub diff_color_alt: Option<[u8; 3]>,
  /// Marker color for detected anti-aliased pixels.
  pub aa_color: [u8; 3],
}

impl Default for DiffOptions {
  fn default() -> Self {
    Self {
      threshold: 0.1,
      include_aa: false,
      alpha: 0.1,
      diff_color: [255, 0, 0],
      diff_color_alt: None,
      aa_color: [255, 255, 0],
    }
  }
}

impl DiffOptions {
  /// Sets the color-distance threshold.
  pub fn with_threshold(mut self, threshold: f64) -> Self {
    self.threshold = threshold;
    self
  }

  /// Enables or disables counting anti-aliased pixels as mismatches.
  pub fn with_include_aa(mut self, include_aa: bool) -> Self {
    self.include_aa = include_aa;
    self
  }
}

/// Compares two RGBA buffers of identical `width`x`height` dimensions and
/// paints the visualization into `output`. Returns the number of mismatched
/// pixels.
///
/// # Panics
///
/// Panics if any buffer length differs from `width * height * 4`. Callers
/// are expected to have normalized both images onto a shared canvas first.
pub fn diff_buffers(
  expected: &[u8],
  actual: &[u8],
  output: &mut [u8],
  width: u32,
  height: u32,
  options: &DiffOptions,
) -> u64 {
  let pixel_count = width as usize * height as usize;
  assert_eq!(expected.len(), pixel_count * 4, "expected buffer size");
  assert_eq!(actual.len(), pixel_count * 4, "actual buffer size");
  assert_eq!(output.len(), pixel_count * 4, "output buffer size");

  // Byte-identical inputs short-cut to an all-dimmed visualization.
  if expected == actual {
    for i in 0..pixel_count {
      draw_gray_pixel(expected, i * 4, options.alpha, output);
    }
    return 0;
  }

  let max_delta = MAX_YIQ_DELTA * options.threshold * options.threshold;
  let mut diff_count = 0u64;

  for y in 0..height {
    for x in 0..width {
      let pos = (y as usize * width as usize + x as usize) * 4;
      let delta = color_delta(expected, actual, pos, pos, false);

      if delta.abs() > max_delta {
        let looks_antialiased = !options.include_aa
          && (antialiased(expected, x, y, width, height, actual)
            || antialiased(actual, x, y, width, height, expected));

        if looks_antialiased {
          draw_pixel(output, pos, options.aa_color);
        } else {
          let color = if delta < 0.0 {
            options.diff_color_alt.unwrap_or(options.diff_color)
          } else {
            options.diff_color
          };
          draw_pixel(output, pos, color);
          diff_count += 1;
        }
      } else {
        draw_gray_pixel(expected, pos, options.alpha, output);
      }
    }
  }

  diff_count
}

/// Color distance between pixel `k` of `img1` and pixel `m` of `img2`.
///
/// Semi-transparent pixels are blended onto white first, then the squared
/// YIQ component deltas are combined. The sign records whether the second
/// pixel is brighter (positive) or darker (negative) than the first. With
/// `only_brightness` the raw luma delta is returned instead.
fn color_delta(img1: &[u8], img2: &[u8], k: usize, m: usize, only_brightness: bool) -> f64 {
  let mut r1 = img1[k] as f64;
  let mut g1 = img1[k + 1] as f64;
  let mut b1 = img1[k + 2] as f64;
  let mut a1 = img1[k + 3] as f64;

  let mut r2 = img2[m] as f64;
  let mut g2 = img2[m + 1] as f64;
  let mut b2 = img2[m + 2] as f64;
  let mut a2 = img2[m + 3] as f64;

  if a1 == a2 && r1 == r2 && g1 == g2 && b1 == b2 {
    return 0.0;
  }

  if a1 < 255.0 {
    a1 /= 255.0;
    r1 = blend(r1, a1);
    g1 = blend(g1, a1);
    b1 = blend(b1, a1);
  }
  if a2 < 255.0 {
    a2 /= 255.0;
    r2 = blend(r2, a2);
    g2 = blend(g2, a2);
    b2 = blend(b2, a2);
  }

  let y1 = rgb2y(r1, g1, b1);
  let y2 = rgb2y(r2, g2, b2);
  let y = y1 - y2;

  if only_brightness {
    return y;
  }

  let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
  let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

  let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

  if y1 > y2 {
    -delta
  } else {
    delta
  }
}

/// Heuristic anti-aliasing check: a pixel whose darkest and brightest
/// neighbors both sit inside longer runs of identical pixels (in both
/// images) is treated as an anti-aliasing artifact rather than a real
/// difference.
fn antialiased(img: &[u8], x: u32, y: u32, width: u32, height: u32, other: &[u8]) -> bool {
  let x0 = x.saturating_sub(1);
  let y0 = y.saturating_sub(1);
  let x1 = (x + 1).min(width - 1);
  let y1 = (y + 1).min(height - 1);
  let pos = (y as usize * width as usize + x as usize) * 4;

  let mut zeroes = usize::from(x == x0 || x == x1 || y == y0 || y == y1);
  let mut min = 0.0f64;
  let mut max = 0.0f64;
  let mut min_coord = (0u32, 0u32);
  let mut max_coord = (0u32, 0u32);

  for ax in x0..=x1 {
    for ay in y0..=y1 {
      if ax == x && ay == y {
        continue;
      }

      let adjacent = (ay as usize * width as usize + ax as usize) * 4;
      let delta = color_delta(img, img, pos, adjacent, true);

      if delta == 0.0 {
        zeroes += 1;
        // A pixel with more than two identical neighbors is not AA.
        if zeroes > 2 {
          return false;
        }
      } else if delta < min {
        min = delta;
        min_coord = (ax, ay);
      } else if delta > max {
        max = delta;
        max_coord = (ax, ay);
      }
    }
  }

  // AA pixels sit between a darker and a brighter neighbor.
  if min == 0.0 || max == 0.0 {
    return false;
  }

  (has_many_siblings(img, min_coord.0, min_coord.1, width, height)
    && has_many_siblings(other, min_coord.0, min_coord.1, width, height))
    || (has_many_siblings(img, max_coord.0, max_coord.1, width, height)
      && has_many_siblings(other, max_coord.0, max_coord.1, width, height))
}

/// Whether a pixel has three or more identically-colored direct neighbors.
fn has_many_siblings(img: &[u8], x: u32, y: u32, width: u32, height: u32) -> bool {
  let x0 = x.saturating_sub(1);
  let y0 = y.saturating_sub(1);
  let x1 = (x + 1).min(width - 1);
  let y1 = (y + 1).min(height - 1);
  let pos = (y as usize * width as usize + x as usize) * 4;

  let mut zeroes = usize::from(x == x0 || x == x1 || y == y0 || y == y1);

  for ax in x0..=x1 {
    for ay in y0..=y1 {
      if ax == x && ay == y {
        continue;
      }

      let adjacent = (ay as usize * width as usize + ax as usize) * 4;
      if img[pos..pos + 4] == img[adjacent..adjacent + 4] {
        zeroes += 1;
      }
      if zeroes > 2 {
        return true;
      }
    }
  }

  false
}

fn blend(channel: f64, alpha: f64) -> f64 {
  255.0 + (channel - 255.0) * alpha
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
  r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
  r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
  r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

fn draw_pixel(output: &mut [u8], pos: usize, [r, g, b]: [u8; 3]) {
  output[pos] = r;
  output[pos + 1] = g;
  output[pos + 2] = b;
  output[pos + 3] = 255;
}

fn draw_gray_pixel(img: &[u8], pos: usize, alpha: f64, output: &mut [u8]) {
  let luma = rgb2y(img[pos] as f64, img[pos + 1] as f64, img[pos + 2] as f64);
  let value = blend(luma, alpha * img[pos + 3] as f64 / 255.0) as u8;
  draw_pixel(output, pos, [value, value, value]);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn solid(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    color.repeat(width as usize * height as usize)
  }

  #[test]
  fn identical_buffers_have_zero_diff() {
    let img = solid(4, 4, [10, 20, 30, 255]);
    let mut out = vec![0u8; img.len()];
    let count = diff_buffers(&img, &img.clone(), &mut out, 4, 4, &DiffOptions::default());
    assert_eq!(count, 0);
    // Visualization is the dimmed grayscale, not left zeroed.
    assert_eq!(out[3], 255);
    assert!(out[0] > 200);
  }

  #[test]
  fn counts_single_changed_pixel() {
    let expected = solid(4, 4, [0, 0, 0, 255]);
    let mut actual = expected.clone();
    actual[0] = 255; // top-left pixel turns red

    let mut out = vec![0u8; expected.len()];
    let count = diff_buffers(
      &expected,
      &actual,
      &mut out,
      4,
      4,
      &DiffOptions::default().with_include_aa(true),
    );
    assert_eq!(count, 1);
    assert_eq!(&out[0..4], &[255, 0, 0, 255]);
  }

  #[test]
  fn threshold_zero_flags_off_by_one_shift() {
    let expected = solid(4, 4, [100, 100, 100, 255]);
    let actual = solid(4, 4, [101, 100, 100, 255]);
    let mut out = vec![0u8; expected.len()];

    let tolerant = DiffOptions::default().with_include_aa(true);
    assert_eq!(diff_buffers(&expected, &actual, &mut out, 4, 4, &tolerant), 0);

    let exact = tolerant.with_threshold(0.0);
    assert_eq!(diff_buffers(&expected, &actual, &mut out, 4, 4, &exact), 16);
  }

  #[test]
  fn transparent_vs_black_counts_as_different() {
    // Transparent blends to white; opaque black stays black.
    let expected = solid(2, 2, [0, 0, 0, 0]);
    let actual = solid(2, 2, [0, 0, 0, 255]);
    let mut out = vec![0u8; expected.len()];
    let count = diff_buffers(
      &expected,
      &actual,
      &mut out,
      2,
      2,
      &DiffOptions::default().with_include_aa(true),
    );
    assert_eq!(count, 4);
  }

  #[test]
  fn darker_pixels_use_alternate_color_when_set() {
    let expected = solid(2, 2, [255, 255, 255, 255]);
    let actual = solid(2, 2, [0, 0, 0, 255]);
    let mut out = vec![0u8; expected.len()];

    let options = DiffOptions {
      include_aa: true,
      diff_color_alt: Some([0, 255, 0]),
      ..DiffOptions::default()
    };
    let count = diff_buffers(&expected, &actual, &mut out, 2, 2, &options);
    assert_eq!(count, 4);
    assert_eq!(&out[0..4], &[0, 255, 0, 255]);
  }

  #[test]
  fn aa_detection_never_increases_count() {
    let width = 3u32;
    let height = 3u32;
    let mut expected = Vec::new();
    for _ in 0..height {
      for x in 0..width {
        let shade = if x < 1 { 0 } else { 255 };
        expected.extend_from_slice(&[shade, shade, shade, 255]);
      }
    }
    let mut actual = expected.clone();
    // Soften the middle column in the actual image.
    for y in 0..height as usize {
      let pos = (y * width as usize + 1) * 4;
      actual[pos] = 128;
      actual[pos + 1] = 128;
      actual[pos + 2] = 128;
    }

    let mut out = vec![0u8; expected.len()];
    let detected = diff_buffers(
      &expected,
      &actual,
      &mut out,
      width,
      height,
      &DiffOptions::default(),
    );
    let counted = diff_buffers(
      &expected,
      &actual,
      &mut out,
      width,
      height,
      &DiffOptions::default().with_include_aa(true),
    );
    assert!(detected <= counted);
    assert_eq!(counted, 3);
  }

  #[test]
  #[should_panic(expected = "actual buffer size")]
  fn rejects_mismatched_buffer_lengths() {
    let expected = solid(2, 2, [0, 0, 0, 255]);
    let actual = solid(2, 1, [0, 0, 0, 255]);
    let mut out = vec![0u8; expected.len()];
    diff_buffers(&expected, &actual, &mut out, 2, 2, &DiffOptions::default());
  }
}
