//! Masked zero-mean normalized cross-correlation.
//!
//! Correlation is evaluated only over pixels marked foreground by the
//! template mask, so background around the taught shape never contributes.
//! The sweep over candidate placements is row-parallel with a deterministic
//! reduction.

use image::GrayImage;
use rayon::prelude::*;

/// Minimum number of mask pixels for a meaningful correlation.
const MIN_MASK_PIXELS: usize = 16;
const VAR_EPS: f64 = 1e-9;

/// Best correlation placement: top-left template offset inside the search
/// window plus the score in [-1, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub x: u32,
    pub y: u32,
    pub score: f64,
}

/// Template pixels gathered under the mask, zero-meaned once up front.
struct MaskedTemplate {
    /// (x, y, value − mean) triples for every mask pixel.
    samples: Vec<(u32, u32, f64)>,
    /// sqrt of the centred template energy.
    norm: f64,
    width: u32,
    height: u32,
}

fn compile(template: &GrayImage, mask: &GrayImage) -> Option<MaskedTemplate> {
    if template.dimensions() != mask.dimensions() {
        return None;
    }
    let mut coords = Vec::new();
    let mut sum = 0.0f64;
    for (x, y, p) in mask.enumerate_pixels() {
        if p.0[0] != 0 {
            let v = template.get_pixel(x, y).0[0] as f64;
            coords.push((x, y, v));
            sum += v;
        }
    }
    if coords.len() < MIN_MASK_PIXELS {
        return None;
    }
    let mean = sum / coords.len() as f64;
    let mut energy = 0.0f64;
    let samples: Vec<(u32, u32, f64)> = coords
        .into_iter()
        .map(|(x, y, v)| {
            let c = v - mean;
            energy += c * c;
            (x, y, c)
        })
        .collect();
    if energy < VAR_EPS {
        return None;
    }
    Some(MaskedTemplate {
        samples,
        norm: energy.sqrt(),
        width: template.width(),
        height: template.height(),
    })
}

#[inline]
fn score_at(search: &GrayImage, t: &MaskedTemplate, ox: u32, oy: u32) -> f64 {
    let n = t.samples.len() as f64;
    let mut sum_s = 0.0f64;
    let mut sum_ss = 0.0f64;
    let mut cov = 0.0f64;
    for &(tx, ty, tc) in &t.samples {
        let s = search.get_pixel(ox + tx, oy + ty).0[0] as f64;
        sum_s += s;
        sum_ss += s * s;
        cov += s * tc;
    }
    let var_s = sum_ss - sum_s * sum_s / n;
    if var_s < VAR_EPS {
        return -1.0;
    }
    cov / (var_s.sqrt() * t.norm)
}

/// Exhaustive masked ZNCC sweep of `template` over `search`.
///
/// `None` when the window is smaller than the template, the mask is (nearly)
/// empty, or the masked template has no variance.
pub fn masked_zncc_search(
    search: &GrayImage,
    template: &GrayImage,
    mask: &GrayImage,
) -> Option<Peak> {
    let compiled = compile(template, mask)?;
    if search.width() < compiled.width || search.height() < compiled.height {
        return None;
    }
    let max_x = search.width() - compiled.width;
    let max_y = search.height() - compiled.height;

    let row_best: Vec<Peak> = (0..=max_y)
        .into_par_iter()
        .map(|oy| {
            let mut best = Peak {
                x: 0,
                y: oy,
                score: f64::NEG_INFINITY,
            };
            for ox in 0..=max_x {
                let s = score_at(search, &compiled, ox, oy);
                if s > best.score {
                    best = Peak { x: ox, y: oy, score: s };
                }
            }
            best
        })
        .collect();

    // Sequential reduction keeps ties deterministic (first row, first column).
    row_best
        .into_iter()
        .fold(None, |acc: Option<Peak>, p| match acc {
            Some(b) if b.score >= p.score => Some(b),
            _ => Some(p),
        })
}
