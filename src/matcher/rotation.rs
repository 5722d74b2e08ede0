//! Two-stage adaptive rotation search.
//!
//! Full 1°-resolution correlation over a wide angle range is expensive. The
//! search first sweeps the range at a coarse step — trying the teach angle
//! up front, since an untouched part is the statistically likely case — then
//! refines ±3° around the best coarse hit at 1°. Any candidate scoring at or
//! above the early-exit level returns immediately.

use super::zncc::{masked_zncc_search, Peak};
use crate::angle::near_any;
use crate::raster::{mask_area, padded_diagonal_canvas, rebinarize, rotate_deg};
use image::GrayImage;
use log::debug;

/// Score at which a candidate is accepted without trying the rest.
pub const EARLY_EXIT_SCORE: f64 = 0.95;
/// Fine-stage half range around the best coarse angle, degrees.
const FINE_HALF_RANGE: f32 = 3.0;
/// Fine-stage step, degrees.
const FINE_STEP: f32 = 1.0;
/// Candidates whose rotated mask shrinks below this fraction of the original
/// area are skipped; interpolation has eaten too much of the shape.
const MIN_MASK_AREA_FRACTION: f64 = 0.2;

/// Best placement found by the rotation search, in search-window pixels.
#[derive(Clone, Copy, Debug)]
pub struct RotationHit {
    /// Template centre in window coordinates.
    pub center: [f32; 2],
    /// Absolute angle of the hit, degrees.
    pub angle: f32,
    pub score: f64,
}

struct Candidate {
    angle: f32,
    peak: Peak,
}

/// Try a single rotated placement of the padded reference.
fn try_angle(
    window: &GrayImage,
    canvas: &GrayImage,
    canvas_mask: &GrayImage,
    base_area: f64,
    teach_angle: f32,
    candidate: f32,
) -> Option<Candidate> {
    let delta = candidate - teach_angle;
    let (template, mask) = if delta.abs() > f32::EPSILON {
        let rotated = rotate_deg(canvas, delta);
        let rotated_mask = rebinarize(&rotate_deg(canvas_mask, delta));
        (rotated, rotated_mask)
    } else {
        (canvas.clone(), canvas_mask.clone())
    };
    let area = mask_area(&mask) as f64;
    if area < base_area * MIN_MASK_AREA_FRACTION {
        debug!(
            "rotation search: candidate {candidate:.1}° skipped, mask area {area} below {:.0}%",
            MIN_MASK_AREA_FRACTION * 100.0
        );
        return None;
    }
    let peak = masked_zncc_search(window, &template, &mask)?;
    Some(Candidate {
        angle: candidate,
        peak,
    })
}

fn to_hit(c: &Candidate, canvas_side: u32) -> RotationHit {
    let half = canvas_side as f32 * 0.5;
    RotationHit {
        center: [c.peak.x as f32 + half, c.peak.y as f32 + half],
        angle: c.angle,
        score: c.peak.score,
    }
}

/// Search `window` for the reference over the inclusive angle range
/// `[teach_angle + min_rel, teach_angle + max_rel]`.
///
/// Always reports the best hit found, even when every candidate scored
/// poorly; `None` only when no candidate could be evaluated at all (window
/// too small, masks degenerate at every angle).
pub fn two_stage_rotation_search(
    window: &GrayImage,
    reference: &GrayImage,
    ink_mask: &GrayImage,
    teach_angle: f32,
    min_rel: f32,
    max_rel: f32,
    coarse_step: f32,
) -> Option<RotationHit> {
    let canvas = padded_diagonal_canvas(reference);
    let canvas_mask = padded_diagonal_canvas(ink_mask);
    let side = canvas.width();
    let base_area = mask_area(&canvas_mask) as f64;
    if base_area <= 0.0 {
        return None;
    }
    let step = if coarse_step > 0.0 { coarse_step } else { 5.0 };
    let skip_band = step * 0.5;

    let mut tried: Vec<f32> = Vec::new();
    let mut best: Option<Candidate> = None;

    let mut consider = |window: &GrayImage,
                        tried: &mut Vec<f32>,
                        best: &mut Option<Candidate>,
                        angle: f32|
     -> bool {
        tried.push(angle);
        if let Some(c) = try_angle(window, &canvas, &canvas_mask, base_area, teach_angle, angle) {
            let early = c.peak.score >= EARLY_EXIT_SCORE;
            let better = best
                .as_ref()
                .map(|b| c.peak.score > b.peak.score)
                .unwrap_or(true);
            if better {
                *best = Some(c);
            }
            early
        } else {
            false
        }
    };

    // Stage 1: teach angle first, then the coarse sweep.
    if consider(window, &mut tried, &mut best, teach_angle) {
        return best.as_ref().map(|c| to_hit(c, side));
    }
    let mut a = teach_angle + min_rel;
    let end = teach_angle + max_rel + 1e-3;
    while a <= end {
        if !near_any(a, &[teach_angle], skip_band) && consider(window, &mut tried, &mut best, a) {
            return best.as_ref().map(|c| to_hit(c, side));
        }
        a += step;
    }

    // Stage 2: 1° refinement around the best coarse angle.
    let coarse_best = best.as_ref().map(|c| c.angle)?;
    let mut f = coarse_best - FINE_HALF_RANGE;
    let fine_end = coarse_best + FINE_HALF_RANGE + 1e-3;
    while f <= fine_end {
        let clamped = f.clamp(teach_angle + min_rel, teach_angle + max_rel);
        if !near_any(clamped, &tried, FINE_STEP * 0.5)
            && consider(window, &mut tried, &mut best, clamped)
        {
            break;
        }
        f += FINE_STEP;
    }

    best.as_ref().map(|c| to_hit(c, side))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// L-shaped high-contrast mark on a light background.
    fn corner_mark(side: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(side, side, Luma([210u8]));
        let bar = side / 4;
        for y in 0..side {
            for x in 0..side {
                if x < bar || y >= side - bar {
                    img.put_pixel(x, y, Luma([25u8]));
                }
            }
        }
        img
    }

    fn contrast_mask(reference: &GrayImage) -> GrayImage {
        use imageproc::distance_transform::Norm;
        imageproc::morphology::dilate(&crate::raster::ink_mask(reference), Norm::LInf, 1)
    }

    #[test]
    fn recovers_known_rotation_within_one_degree() {
        let reference = corner_mark(32);
        let mask = contrast_mask(&reference);

        // Scene: the same mark rotated by 6° on a larger background.
        let canvas = padded_diagonal_canvas(&reference);
        let rotated = rotate_deg(&canvas, 6.0);
        let mut window = GrayImage::from_pixel(120, 120, Luma([210u8]));
        image::imageops::replace(&mut window, &rotated, 30, 35);

        let hit = two_stage_rotation_search(&window, &reference, &mask, 0.0, -10.0, 10.0, 5.0)
            .expect("search should produce a hit");
        assert!(
            (hit.angle - 6.0).abs() <= 1.0,
            "angle {} not within 1° of 6",
            hit.angle
        );
        assert!(hit.score > EARLY_EXIT_SCORE, "score={}", hit.score);
        let half = canvas.width() as f32 * 0.5;
        assert!((hit.center[0] - (30.0 + half)).abs() <= 2.0);
        assert!((hit.center[1] - (35.0 + half)).abs() <= 2.0);
    }

    #[test]
    fn teach_angle_early_exit_on_unrotated_scene() {
        let reference = corner_mark(24);
        let mask = contrast_mask(&reference);
        let canvas = padded_diagonal_canvas(&reference);
        let mut window = GrayImage::from_pixel(90, 90, Luma([210u8]));
        image::imageops::replace(&mut window, &canvas, 25, 20);

        let hit = two_stage_rotation_search(&window, &reference, &mask, 0.0, -20.0, 20.0, 5.0)
            .expect("hit");
        assert!((hit.angle).abs() < 1e-3, "expected teach angle, got {}", hit.angle);
        assert!(hit.score > EARLY_EXIT_SCORE);
    }
}
