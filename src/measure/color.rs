//! Color histogram comparison.

use image::RgbImage;

const BINS: usize = 32;
const BIN_SHIFT: u32 = 3; // 256 / 32

/// Per-channel histogram over all pixels, concatenated R|G|B and normalized
/// to a probability distribution.
fn channel_histogram(img: &RgbImage) -> Vec<f64> {
    let mut hist = vec![0.0f64; BINS * 3];
    for p in img.pixels() {
        for (c, &v) in p.0.iter().enumerate() {
            hist[c * BINS + (v >> BIN_SHIFT) as usize] += 1.0;
        }
    }
    let total: f64 = (img.width() as f64) * (img.height() as f64) * 3.0;
    if total > 0.0 {
        for h in &mut hist {
            *h /= total;
        }
    }
    hist
}

/// Pearson correlation between two equal-length vectors, in [-1, 1].
fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        cov += (x - ma) * (y - mb);
        va += (x - ma) * (x - ma);
        vb += (y - mb) * (y - mb);
    }
    if va <= 0.0 || vb <= 0.0 {
        return 0.0;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// Histogram-correlation score between the live crop and the taught
/// reference, mapped from [-1, 1] to [0, 1].
pub fn color_score(live: &RgbImage, reference: &RgbImage) -> f64 {
    if live.width() == 0 || live.height() == 0 || reference.width() == 0 || reference.height() == 0
    {
        return 0.0;
    }
    let r = correlation(&channel_histogram(live), &channel_histogram(reference));
    (r + 1.0) * 0.5
}
