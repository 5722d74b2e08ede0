//! Edge-map comparison: XOR mismatch blended with a Chamfer-distance term.

use image::GrayImage;
use imageproc::distance_transform::{distance_transform, Norm};
use imageproc::edges::canny;

const XOR_WEIGHT: f64 = 0.7;
const CHAMFER_WEIGHT: f64 = 0.3;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 100.0;

/// Mean distance-transform value of live edge pixels to the nearest
/// reference edge pixel, normalized by the image diagonal and inverted into
/// a similarity in [0, 1].
fn chamfer_similarity(live_edges: &GrayImage, ref_edges: &GrayImage, w: u32, h: u32) -> f64 {
    let ref_has_edges = ref_edges.pixels().any(|p| p.0[0] != 0);
    let dist = distance_transform(ref_edges, Norm::L1);

    let mut sum = 0.0f64;
    let mut count = 0usize;
    for y in 0..h {
        for x in 0..w {
            if live_edges.get_pixel(x, y).0[0] != 0 {
                sum += dist.get_pixel(x, y).0[0] as f64;
                count += 1;
            }
        }
    }
    if count == 0 {
        // No live edges: perfect only when the reference is edge-free too.
        return if ref_has_edges { 0.0 } else { 1.0 };
    }
    if !ref_has_edges {
        return 0.0;
    }
    let diagonal = ((w as f64).powi(2) + (h as f64).powi(2)).sqrt();
    (1.0 - (sum / count as f64) / diagonal).max(0.0)
}

/// Edge comparison score between the live crop and the taught reference.
pub fn edge_score(live: &GrayImage, reference: &GrayImage) -> f64 {
    if live.width() < 3 || live.height() < 3 || reference.width() < 3 || reference.height() < 3 {
        return 0.0;
    }
    let live_edges = canny(live, CANNY_LOW, CANNY_HIGH);
    let ref_edges = canny(reference, CANNY_LOW, CANNY_HIGH);

    let w = live_edges.width().min(ref_edges.width());
    let h = live_edges.height().min(ref_edges.height());
    let total = (w as f64) * (h as f64);
    if total == 0.0 {
        return 0.0;
    }

    let mut mismatch = 0usize;
    for y in 0..h {
        for x in 0..w {
            let l = live_edges.get_pixel(x, y).0[0] != 0;
            let r = ref_edges.get_pixel(x, y).0[0] != 0;
            if l != r {
                mismatch += 1;
            }
        }
    }
    let xor_term = 1.0 - mismatch as f64 / total;
    let chamfer_term = chamfer_similarity(&live_edges, &ref_edges, w, h);
    XOR_WEIGHT * xor_term + CHAMFER_WEIGHT * chamfer_term
}
