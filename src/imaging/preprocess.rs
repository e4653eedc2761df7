//! OCR preprocessing: grayscale, adaptive histogram equalization, denoising.
//!
//! Chart screenshots come in with dark uneven backgrounds and anti-aliased
//! text; tesseract does much better on a contrast-stretched, denoised
//! grayscale version. No resizing or rotation is done, screenshots are
//! assumed upright at native resolution.

use image::{GrayImage, Luma};

use super::ChartImage;

/// Tunable preprocessing parameters with the defaults the recognizer was
/// calibrated against.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// CLAHE contrast clip limit (relative, OpenCV convention).
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid is `clahe_tiles` x `clahe_tiles`.
    pub clahe_tiles: u32,
    /// Non-local-means filtering strength (`h`). Higher removes more noise
    /// and more texture.
    pub denoise_strength: f32,
    /// Square patch side used for patch comparison. Must be odd.
    pub denoise_patch: u32,
    /// Square search window side around each pixel. Must be odd.
    pub denoise_search: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 3.0,
            clahe_tiles: 8,
            denoise_strength: 10.0,
            denoise_patch: 7,
            denoise_search: 21,
        }
    }
}

/// Full legibility pipeline: grayscale, CLAHE, non-local-means denoise.
pub fn prepare_for_ocr(image: &ChartImage, config: &PreprocessConfig) -> GrayImage {
    let gray = image::DynamicImage::ImageRgb8(image.rgb().clone()).to_luma8();
    let equalized = clahe(&gray, config.clahe_clip_limit, config.clahe_tiles);
    nl_means_denoise(
        &equalized,
        config.denoise_strength,
        config.denoise_patch,
        config.denoise_search,
    )
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is divided into a `tiles` x `tiles` grid; each tile gets its own
/// clipped-histogram equalization mapping, and every pixel is remapped by
/// bilinear interpolation between the four surrounding tile mappings.
pub fn clahe(src: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 || tiles == 0 {
        return src.clone();
    }

    let tile_w = width.div_ceil(tiles).max(1);
    let tile_h = height.div_ceil(tiles).max(1);
    let grid_x = width.div_ceil(tile_w);
    let grid_y = height.div_ceil(tile_h);

    let mut luts = vec![[0u8; 256]; (grid_x * grid_y) as usize];
    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            let area = ((x1 - x0) * (y1 - y0)) as u32;

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[src.get_pixel(x, y)[0] as usize] += 1;
                }
            }

            // Clip the histogram and redistribute the excess across all bins.
            let limit = ((clip_limit * area as f32 / 256.0).max(1.0)) as u32;
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            let spread = excess / 256;
            let remainder = excess % 256;
            for (i, bin) in hist.iter_mut().enumerate() {
                *bin += spread + u32::from((i as u32) < remainder);
            }

            // Cumulative mapping scaled to the full output range.
            let scale = 255.0 / area as f32;
            let lut = &mut luts[(ty * grid_x + tx) as usize];
            let mut cumulative = 0u32;
            for (value, entry) in lut.iter_mut().enumerate() {
                cumulative += hist[value];
                *entry = (cumulative as f32 * scale).round().min(255.0) as u8;
            }
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        // Position in tile-center coordinates, clamped to the grid.
        let gy = ((y as f32 + 0.5) / tile_h as f32 - 0.5).clamp(0.0, (grid_y - 1) as f32);
        let ty0 = gy.floor() as u32;
        let ty1 = (ty0 + 1).min(grid_y - 1);
        let fy = gy - ty0 as f32;

        for x in 0..width {
            let gx = ((x as f32 + 0.5) / tile_w as f32 - 0.5).clamp(0.0, (grid_x - 1) as f32);
            let tx0 = gx.floor() as u32;
            let tx1 = (tx0 + 1).min(grid_x - 1);
            let fx = gx - tx0 as f32;

            let value = src.get_pixel(x, y)[0] as usize;
            let top_left = luts[(ty0 * grid_x + tx0) as usize][value] as f32;
            let top_right = luts[(ty0 * grid_x + tx1) as usize][value] as f32;
            let bottom_left = luts[(ty1 * grid_x + tx0) as usize][value] as f32;
            let bottom_right = luts[(ty1 * grid_x + tx1) as usize][value] as f32;

            let top = top_left + (top_right - top_left) * fx;
            let bottom = bottom_left + (bottom_right - bottom_left) * fx;
            let mapped = top + (bottom - top) * fy;
            out.put_pixel(x, y, Luma([mapped.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Non-local-means denoising.
///
/// Each output pixel is a weighted average of the pixels in its search
/// window, weighted by patch similarity: `w = exp(-d2 / h^2)` where `d2` is
/// the mean squared difference between the two patches. Per search
/// displacement, patch distances come from an integral image of squared
/// differences, so the cost is independent of the patch size. Coordinates
/// past the image border are clamped.
pub fn nl_means_denoise(src: &GrayImage, h: f32, patch: u32, search: u32) -> GrayImage {
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 || h <= 0.0 {
        return src.clone();
    }

    let w = width as i64;
    let rows = height as i64;
    let patch_r = (patch.max(1) / 2) as i64;
    let search_r = (search.max(1) / 2) as i64;
    let h2 = h * h;

    let pixel = |x: i64, y: i64| -> f32 {
        let cx = x.clamp(0, w - 1) as u32;
        let cy = y.clamp(0, rows - 1) as u32;
        src.get_pixel(cx, cy)[0] as f32
    };

    let len = (w * rows) as usize;
    let mut weighted = vec![0.0f32; len];
    let mut weights = vec![0.0f32; len];

    // integral[(y+1)*stride + (x+1)] = sum of squared differences over
    // [0..=x, 0..=y] for the current displacement. Row 0 and column 0 stay
    // zero across rebuilds.
    let stride = (w + 1) as usize;
    let mut integral = vec![0.0f64; stride * (rows + 1) as usize];

    for dy in -search_r..=search_r {
        for dx in -search_r..=search_r {
            for y in 0..rows {
                let mut row_sum = 0.0f64;
                for x in 0..w {
                    let diff = (pixel(x, y) - pixel(x + dx, y + dy)) as f64;
                    row_sum += diff * diff;
                    integral[(y + 1) as usize * stride + (x + 1) as usize] =
                        integral[y as usize * stride + (x + 1) as usize] + row_sum;
                }
            }

            for y in 0..rows {
                let y0 = (y - patch_r).max(0);
                let y1 = (y + patch_r).min(rows - 1);
                for x in 0..w {
                    let x0 = (x - patch_r).max(0);
                    let x1 = (x + patch_r).min(w - 1);
                    let area = ((x1 - x0 + 1) * (y1 - y0 + 1)) as f64;
                    let sum = integral[(y1 + 1) as usize * stride + (x1 + 1) as usize]
                        - integral[y0 as usize * stride + (x1 + 1) as usize]
                        - integral[(y1 + 1) as usize * stride + x0 as usize]
                        + integral[y0 as usize * stride + x0 as usize];
                    let d2 = (sum / area) as f32;
                    let weight = (-d2 / h2).exp();
                    let idx = (y * w + x) as usize;
                    weighted[idx] += weight * pixel(x + dx, y + dy);
                    weights[idx] += weight;
                }
            }
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..rows {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let value = if weights[idx] > 0.0 {
                weighted[idx] / weights[idx]
            } else {
                pixel(x, y)
            };
            out.put_pixel(
                x as u32,
                y as u32,
                Luma([value.round().clamp(0.0, 255.0) as u8]),
            );
        }
    }
    out
}
