/// Colour signature and spread over raw pixels.
///
/// The signature is the HSV of the mean colour of the image (inside a
/// centred circle for radial categories). The spread is the mean distance
/// between a 4×4 grid of small neighbourhood samples and that mean colour.
///
/// Everything here is a pure function of its inputs, so it is safe to run
/// on any thread.
use crate::model::{Category, ColorFeatures, Rgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of grid cells along each axis used for the spread samples.
pub const GRID_SPLIT: usize = 4;

/// Edge of the square neighbourhood averaged around each cell centre.
const NEIGHBOURHOOD: usize = 3;

/// Dispersion metric for `color_spread`. One metric is used for a whole
/// catalog because downstream sorting assumes a fixed scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadMetric {
    /// Shortest circular distance between cell hue and mean hue, in `[0, 0.5]`.
    /// Insensitive to brightness and saturation noise in preview pixels.
    #[default]
    Hue,
    /// Euclidean RGB distance, in `[0, √3]`.
    Rgb,
}

impl fmt::Display for SpreadMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hue => "hue",
            Self::Rgb => "rgb",
        })
    }
}

impl FromStr for SpreadMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hue" => Ok(Self::Hue),
            "rgb" => Ok(Self::Rgb),
            other => Err(format!("unknown spread metric '{other}' (expected hue or rgb)")),
        }
    }
}

/// Raw pixel storage as handed over by pixel acquisition.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    /// Interleaved 8-bit RGBA.
    Rgba8(Vec<u8>),
    /// Interleaved float RGBA. Channels are clamped to `[0, 1]`; NaN and
    /// infinities read as 0.
    RgbaF32(Vec<f32>),
}

/// A decoded image, row-major, top row first.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: PixelData,
}

impl PixelBuffer {
    pub fn rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: PixelData::Rgba8(data),
        }
    }

    pub fn rgba_f32(width: u32, height: u32, data: Vec<f32>) -> Self {
        Self {
            width,
            height,
            data: PixelData::RgbaF32(data),
        }
    }

    /// Normalise to `[0, 1]` RGB, dropping alpha.
    ///
    /// Returns `None` for zero-sized images and for buffers shorter than
    /// `width * height` pixels.
    fn to_rgb(&self) -> Option<Vec<Rgb>> {
        let count = (self.width as usize).checked_mul(self.height as usize)?;
        if count == 0 {
            return None;
        }
        let needed = count.checked_mul(4)?;

        match &self.data {
            PixelData::Rgba8(bytes) => {
                if bytes.len() < needed {
                    return None;
                }
                Some(
                    bytes[..needed]
                        .chunks_exact(4)
                        .map(|px| {
                            Rgb::new(
                                px[0] as f32 / 255.0,
                                px[1] as f32 / 255.0,
                                px[2] as f32 / 255.0,
                            )
                        })
                        .collect(),
                )
            }
            PixelData::RgbaF32(floats) => {
                if floats.len() < needed {
                    return None;
                }
                Some(
                    floats[..needed]
                        .chunks_exact(4)
                        .map(|px| {
                            Rgb::new(unit_channel(px[0]), unit_channel(px[1]), unit_channel(px[2]))
                        })
                        .collect(),
                )
            }
        }
    }
}

/// Clamp a float channel into `[0, 1]`. Non-finite values become 0 so they
/// never reach the catalog, whose JSON form cannot hold them.
#[inline]
fn unit_channel(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Circle centred on the image, radius half the shorter dimension.
struct CircleMask {
    cx: f32,
    cy: f32,
    radius_sq: f32,
}

impl CircleMask {
    fn centred(width: usize, height: usize) -> Self {
        let radius = width.min(height) as f32 * 0.5;
        Self {
            cx: width as f32 * 0.5,
            cy: height as f32 * 0.5,
            radius_sq: radius * radius,
        }
    }

    #[inline]
    fn contains(&self, x: usize, y: usize) -> bool {
        let dx = x as f32 - self.cx;
        let dy = y as f32 - self.cy;
        dx * dx + dy * dy <= self.radius_sq
    }
}

/// Mean colour of the pixels in `[x0, x1) × [y0, y1)` that pass `mask`.
/// Black when no pixel qualifies.
fn average(
    colors: &[Rgb],
    width: usize,
    (x0, y0, x1, y1): (usize, usize, usize, usize),
    mask: Option<&CircleMask>,
) -> Rgb {
    let (mut r, mut g, mut b) = (0.0f64, 0.0f64, 0.0f64);
    let mut count = 0u64;

    for y in y0..y1 {
        let row = y * width;
        for x in x0..x1 {
            if let Some(m) = mask {
                if !m.contains(x, y) {
                    continue;
                }
            }
            let c = colors[row + x];
            r += c.r as f64;
            g += c.g as f64;
            b += c.b as f64;
            count += 1;
        }
    }

    if count == 0 {
        return Rgb::BLACK;
    }
    let n = count as f64;
    Rgb::new((r / n) as f32, (g / n) as f32, (b / n) as f32)
}

/// Compute the colour signature and spread of `pixels`.
///
/// `category` only decides whether the circular mask applies. Zero-sized or
/// truncated buffers produce the black/zero result instead of an error.
pub fn analyze(pixels: &PixelBuffer, category: Category, metric: SpreadMetric) -> ColorFeatures {
    let Some(colors) = pixels.to_rgb() else {
        return ColorFeatures::default();
    };
    let width = pixels.width as usize;
    let height = pixels.height as usize;

    let mask = category
        .is_radial()
        .then(|| CircleMask::centred(width, height));

    let mean = average(&colors, width, (0, 0, width, height), mask.as_ref());
    let signature = mean.to_hsv();

    let cell_w = width / GRID_SPLIT;
    let cell_h = height / GRID_SPLIT;
    let mut samples = Vec::with_capacity(GRID_SPLIT * GRID_SPLIT);

    for gy in 0..GRID_SPLIT {
        for gx in 0..GRID_SPLIT {
            let cx = gx * cell_w + cell_w / 2;
            let cy = gy * cell_h + cell_h / 2;

            if let Some(m) = &mask {
                if !m.contains(cx, cy) {
                    continue;
                }
            }

            // The neighbourhood itself is never masked.
            let x0 = cx.saturating_sub(1);
            let y0 = cy.saturating_sub(1);
            let x1 = (x0 + NEIGHBOURHOOD).min(width);
            let y1 = (y0 + NEIGHBOURHOOD).min(height);
            samples.push(average(&colors, width, (x0, y0, x1, y1), None));
        }
    }

    let spread = if samples.is_empty() {
        0.0
    } else {
        let total: f32 = samples
            .iter()
            .map(|s| match metric {
                SpreadMetric::Hue => s.to_hsv().hue_distance(signature),
                SpreadMetric::Rgb => s.distance(mean),
            })
            .sum();
        total / samples.len() as f32
    };

    ColorFeatures {
        signature,
        spread,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        PixelBuffer::rgba8(width, height, data)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_zero_size_is_black() {
        let buf = PixelBuffer::rgba8(0, 16, Vec::new());
        assert_eq!(
            analyze(&buf, Category::Tiling, SpreadMetric::Hue),
            ColorFeatures::default()
        );
    }

    #[test]
    fn test_truncated_buffer_is_black() {
        let buf = PixelBuffer::rgba8(8, 8, vec![255; 10]);
        let features = analyze(&buf, Category::Mask, SpreadMetric::Rgb);
        assert_eq!(features, ColorFeatures::default());
    }

    #[test]
    fn test_solid_colour_has_no_spread() {
        let buf = solid(16, 16, [255, 0, 0, 255]);
        let features = analyze(&buf, Category::Tiling, SpreadMetric::Rgb);
        assert!(approx(features.signature.h, 0.0));
        assert!(approx(features.signature.s, 1.0));
        assert!(approx(features.signature.v, 1.0));
        assert_eq!(features.spread, 0.0);
        assert_eq!(features.samples.len(), GRID_SPLIT * GRID_SPLIT);
    }

    #[test]
    fn test_eight_bit_input_is_normalised() {
        let buf = solid(4, 4, [51, 51, 51, 255]);
        let features = analyze(&buf, Category::Normal, SpreadMetric::Hue);
        assert!(approx(features.signature.v, 0.2));
        assert!(features.samples.iter().all(|s| approx(s.r, 0.2)));
    }

    #[test]
    fn test_float_input_matches_eight_bit() {
        let bytes = solid(8, 8, [255, 128, 0, 255]);
        let floats = PixelBuffer::rgba_f32(
            8,
            8,
            [1.0, 128.0 / 255.0, 0.0, 1.0]
                .iter()
                .copied()
                .cycle()
                .take(8 * 8 * 4)
                .collect(),
        );
        let a = analyze(&bytes, Category::Tiling, SpreadMetric::Hue);
        let b = analyze(&floats, Category::Tiling, SpreadMetric::Hue);
        assert!(approx(a.signature.h, b.signature.h));
        assert!(approx(a.signature.v, b.signature.v));
    }

    /// Red disc on a blue background: the radial category only sees red.
    #[test]
    fn test_radial_mask_excludes_corners() {
        let size = 32usize;
        let mut data = Vec::with_capacity(size * size * 4);
        let centre = size as f32 * 0.5;
        let radius = size as f32 * 0.5;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - centre;
                let dy = y as f32 - centre;
                if dx * dx + dy * dy <= radius * radius {
                    data.extend_from_slice(&[255, 0, 0, 255]);
                } else {
                    data.extend_from_slice(&[0, 0, 255, 255]);
                }
            }
        }
        let buf = PixelBuffer::rgba8(size as u32, size as u32, data);

        let radial = analyze(&buf, Category::MatCap, SpreadMetric::Hue);
        assert!(approx(radial.signature.h, 0.0));
        assert!(approx(radial.signature.v, 1.0));
        // Corner cells of the 4×4 grid fall outside the circle.
        assert!(radial.samples.len() < GRID_SPLIT * GRID_SPLIT);
        assert!(approx(radial.spread, 0.0));

        let flat = analyze(&buf, Category::Tiling, SpreadMetric::Hue);
        assert_eq!(flat.samples.len(), GRID_SPLIT * GRID_SPLIT);
        assert!(flat.signature.h > 0.5, "blue corners pull the mean hue");
    }

    #[test]
    fn test_no_surviving_cells_means_zero_spread() {
        // A single pixel: the only cell centre (0, 0) lies outside the
        // half-pixel circle around (0.5, 0.5).
        let buf = solid(1, 1, [10, 200, 30, 255]);
        let features = analyze(&buf, Category::MatCap, SpreadMetric::Rgb);
        assert!(features.samples.is_empty());
        assert_eq!(features.spread, 0.0);
    }

    /// Left half bright green, right half dark green: same hue everywhere.
    #[test]
    fn test_hue_metric_ignores_brightness() {
        let (w, h) = (16usize, 16usize);
        let mut data = Vec::with_capacity(w * h * 4);
        for _y in 0..h {
            for x in 0..w {
                if x < w / 2 {
                    data.extend_from_slice(&[0, 255, 0, 255]);
                } else {
                    data.extend_from_slice(&[0, 64, 0, 255]);
                }
            }
        }
        let buf = PixelBuffer::rgba8(w as u32, h as u32, data);

        let hue = analyze(&buf, Category::Tiling, SpreadMetric::Hue);
        let rgb = analyze(&buf, Category::Tiling, SpreadMetric::Rgb);
        assert!(approx(hue.spread, 0.0));
        assert!(rgb.spread > 0.2);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let data: Vec<u8> = (0..(24 * 12 * 4)).map(|i| (i * 37 % 251) as u8).collect();
        let buf = PixelBuffer::rgba8(24, 12, data);
        for category in Category::ALL {
            let a = analyze(&buf, category, SpreadMetric::Hue);
            let b = analyze(&buf, category, SpreadMetric::Hue);
            assert_eq!(a, b);
        }
    }

    fn assert_finite(features: &ColorFeatures) {
        let hsv = features.signature;
        assert!(hsv.h.is_finite() && hsv.s.is_finite() && hsv.v.is_finite());
        assert!(features.spread.is_finite());
        for s in &features.samples {
            assert!(s.r.is_finite() && s.g.is_finite() && s.b.is_finite());
        }
    }

    #[test]
    fn test_non_finite_float_texels_read_as_black() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let mut data: Vec<f32> = [0.5, 0.5, 0.5, 1.0]
                .iter()
                .copied()
                .cycle()
                .take(8 * 8 * 4)
                .collect();
            // Centre texel, inside every grid neighbourhood that covers it.
            let centre = (4 * 8 + 4) * 4;
            data[centre..centre + 3].copy_from_slice(&[bad, bad, bad]);
            let buf = PixelBuffer::rgba_f32(8, 8, data);

            for metric in [SpreadMetric::Hue, SpreadMetric::Rgb] {
                let features = analyze(&buf, Category::Tiling, metric);
                assert_finite(&features);
                assert!(features.signature.v < 0.5);
            }
        }
    }

    #[test]
    fn test_all_nan_buffer_is_black() {
        let buf = PixelBuffer::rgba_f32(4, 4, vec![f32::NAN; 4 * 4 * 4]);
        let features = analyze(&buf, Category::MatCap, SpreadMetric::Rgb);
        assert_finite(&features);
        assert_eq!(features.signature.v, 0.0);
        assert_eq!(features.spread, 0.0);
    }

    #[test]
    fn test_out_of_range_floats_are_clamped() {
        let buf = PixelBuffer::rgba_f32(4, 4, [4.0, -2.0, 0.5, 1.0].iter().copied().cycle().take(64).collect());
        let features = analyze(&buf, Category::Tiling, SpreadMetric::Rgb);
        assert!(approx(features.signature.v, 1.0));
        assert!(features.samples.iter().all(|s| s.r == 1.0 && s.g == 0.0));
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("HUE".parse::<SpreadMetric>(), Ok(SpreadMetric::Hue));
        assert_eq!("rgb".parse::<SpreadMetric>(), Ok(SpreadMetric::Rgb));
        assert!("lab".parse::<SpreadMetric>().is_err());
    }
}
