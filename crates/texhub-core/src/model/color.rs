/// Normalised colour types.
///
/// Every channel is an `f32` in `[0, 1]` regardless of how the source pixels
/// were encoded. Hue is expressed as a fraction of a full turn, so it also
/// lives in `[0, 1)`.
use serde::{Deserialize, Serialize};

/// A linear RGB triple with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance in RGB space.
    pub fn distance(self, other: Rgb) -> f32 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Convert to hue/saturation/value.
    ///
    /// Greys (zero chroma) report a hue of 0 and black reports a saturation
    /// of 0, matching the usual editor colour-picker convention.
    pub fn to_hsv(self) -> Hsv {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let delta = max - min;

        let v = max;
        let s = if max > 0.0 { delta / max } else { 0.0 };

        let h = if delta <= 0.0 {
            0.0
        } else if max == self.r {
            let h = (self.g - self.b) / delta / 6.0;
            if h < 0.0 {
                // A tiny negative hue can round up to exactly 1.0.
                let wrapped = h + 1.0;
                if wrapped >= 1.0 {
                    0.0
                } else {
                    wrapped
                }
            } else {
                h
            }
        } else if max == self.g {
            ((self.b - self.r) / delta + 2.0) / 6.0
        } else {
            ((self.r - self.g) / delta + 4.0) / 6.0
        };

        Hsv { h, s, v }
    }
}

/// Hue, saturation and value, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    /// Shortest distance between two hues on the colour wheel, wrapping at
    /// the 0/1 boundary. Always in `[0, 0.5]`.
    pub fn hue_distance(self, other: Hsv) -> f32 {
        let d = (self.h - other.h).abs();
        d.min(1.0 - d)
    }
}
