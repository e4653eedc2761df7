//! Candle color classification.
//!
//! Counts pixels falling inside red and green HSV ranges and derives a
//! bullish/bearish label from whichever dominates. Percentages are relative
//! to the classified pixels only, so `green_pct + red_pct == 100` whenever a
//! result exists at all.

use serde::{Deserialize, Serialize};

use super::ChartImage;

/// Directional label derived from candle colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiasLabel {
    Bullish,
    Bearish,
}

impl std::fmt::Display for BiasLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BiasLabel::Bullish => write!(f, "BULLISH"),
            BiasLabel::Bearish => write!(f, "BEARISH"),
        }
    }
}

/// Inclusive HSV range on the OpenCV scale (hue 0..=179, sat/val 0..=255).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue: (u8, u8),
    pub saturation: (u8, u8),
    pub value: (u8, u8),
}

impl HsvRange {
    fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        (self.hue.0..=self.hue.1).contains(&h)
            && (self.saturation.0..=self.saturation.1).contains(&s)
            && (self.value.0..=self.value.1).contains(&v)
    }
}

/// Mask ranges plus the tie policy.
///
/// The red and green thresholds are asymmetric: green chart elements tend to
/// be more saturated than red ones in common chart themes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorBiasConfig {
    pub red: HsvRange,
    pub green: HsvRange,
    /// Label used when red and green pixel counts are exactly equal.
    pub tie_bias: BiasLabel,
}

impl Default for ColorBiasConfig {
    fn default() -> Self {
        Self {
            red: HsvRange {
                hue: (0, 10),
                saturation: (50, 255),
                value: (50, 255),
            },
            green: HsvRange {
                hue: (40, 85),
                saturation: (85, 255),
                value: (50, 255),
            },
            tie_bias: BiasLabel::Bearish,
        }
    }
}

/// Outcome of the color scan. Absent entirely when no pixel matched either
/// mask (a grayscale screenshot, for instance).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorBias {
    pub green_pct: f64,
    pub red_pct: f64,
    pub bias: BiasLabel,
}

/// Classify every pixel against the red and green masks and derive the bias.
pub fn analyze_colors(image: &ChartImage, config: &ColorBiasConfig) -> Option<ColorBias> {
    let mut red_pixels: u64 = 0;
    let mut green_pixels: u64 = 0;

    for pixel in image.rgb().pixels() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        if config.red.contains(h, s, v) {
            red_pixels += 1;
        } else if config.green.contains(h, s, v) {
            green_pixels += 1;
        }
    }

    let total = red_pixels + green_pixels;
    if total == 0 {
        return None;
    }

    let bias = if green_pixels == red_pixels {
        config.tie_bias
    } else if green_pixels > red_pixels {
        BiasLabel::Bullish
    } else {
        BiasLabel::Bearish
    };

    Some(ColorBias {
        green_pct: green_pixels as f64 / total as f64 * 100.0,
        red_pct: red_pixels as f64 / total as f64 * 100.0,
        bias,
    })
}

/// RGB to HSV on the OpenCV 8-bit scale: hue in 0..=179 (degrees halved),
/// saturation and value in 0..=255.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let value = max;
    let saturation = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

    let hue_degrees = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let hue_degrees = if hue_degrees < 0.0 {
        hue_degrees + 360.0
    } else {
        hue_degrees
    };

    (
        (hue_degrees / 2.0).round().min(179.0) as u8,
        saturation.round().min(255.0) as u8,
        value.round().min(255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::test_support::{encode, solid_image};
    use image::{Rgb, RgbImage};

    #[test]
    fn hsv_conversion_matches_opencv_scale() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255));
        assert_eq!(rgb_to_hsv(0, 255, 0), (60, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 255), (120, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 0), (0, 0, 0));
        assert_eq!(rgb_to_hsv(128, 128, 128), (0, 0, 128));
    }

    #[test]
    fn pure_green_image_is_fully_bullish() {
        let chart = solid_image(16, 16, Rgb([0, 200, 0]));
        let bias = analyze_colors(&chart, &ColorBiasConfig::default()).unwrap();
        assert_eq!(bias.bias, BiasLabel::Bullish);
        assert_eq!(bias.green_pct, 100.0);
        assert_eq!(bias.red_pct, 0.0);
    }

    #[test]
    fn pure_red_image_is_fully_bearish() {
        let chart = solid_image(16, 16, Rgb([200, 0, 0]));
        let bias = analyze_colors(&chart, &ColorBiasConfig::default()).unwrap();
        assert_eq!(bias.bias, BiasLabel::Bearish);
        assert_eq!(bias.red_pct, 100.0);
        assert_eq!(bias.green_pct, 0.0);
    }

    #[test]
    fn blue_image_has_no_bias() {
        let chart = solid_image(16, 16, Rgb([0, 0, 200]));
        assert!(analyze_colors(&chart, &ColorBiasConfig::default()).is_none());
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        for y in 0..10 {
            for x in 0..10 {
                let color = if x < 3 { Rgb([200, 0, 0]) } else { Rgb([0, 200, 0]) };
                img.put_pixel(x, y, color);
            }
        }
        let bias = analyze_colors(&encode(img), &ColorBiasConfig::default()).unwrap();
        assert!((bias.green_pct + bias.red_pct - 100.0).abs() < 1e-9);
        assert_eq!(bias.bias, BiasLabel::Bullish);
        assert!((bias.green_pct - 70.0).abs() < 1e-9);
    }

    #[test]
    fn exact_tie_falls_back_to_configured_policy() {
        // Half the pixels pure red, half pure green: the tie must resolve to
        // the named policy, not to whatever a comparison operator happens to
        // do.
        let mut img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        for y in 0..10 {
            for x in 0..10 {
                let color = if x < 5 { Rgb([200, 0, 0]) } else { Rgb([0, 200, 0]) };
                img.put_pixel(x, y, color);
            }
        }
        let chart = encode(img);

        let default_cfg = ColorBiasConfig::default();
        let bias = analyze_colors(&chart, &default_cfg).unwrap();
        assert_eq!(bias.bias, BiasLabel::Bearish);

        let flipped = ColorBiasConfig {
            tie_bias: BiasLabel::Bullish,
            ..default_cfg
        };
        let bias = analyze_colors(&chart, &flipped).unwrap();
        assert_eq!(bias.bias, BiasLabel::Bullish);
    }
}
