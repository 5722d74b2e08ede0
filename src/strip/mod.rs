//! Strip contour analysis.
//!
//! Measures whether a strip-shaped object (stripped cable, trimmed film) was
//! cut to the expected extent: the object is binarized, its dominant contour
//! scanned in four directions, and the sharpest thickness discontinuities
//! located and measured. Two fixed-position thickness zones feed the range
//! checks of the STRIP measurement method.

mod contour;
mod scan;
mod thickness;

pub use contour::{find_strip_object, StripObject};
pub use scan::{
    find_discontinuities, max_abs_gradient, peak_gradient_biased, scan_contour,
    thickness_gradient, Direction, Edge, EdgeScan,
};
pub use thickness::{intensity_walk, measure_zone, ZoneThickness};

use crate::geom::Rect;
use crate::raster::{extract_rotated, Extraction};
use crate::recipe::StripParams;
use image::GrayImage;
use log::debug;
use serde::{Deserialize, Serialize};

/// Weight of each discontinuity point in the score.
const POINT_SCORE_WEIGHT: f64 = 0.3;
/// Gradient magnitude that alone saturates the score.
const GRADIENT_SCORE_SCALE: f64 = 100.0;
/// Minimum scan steps between two reported discontinuities.
const MIN_POINT_SEPARATION: usize = 3;

/// Peak-gradient measurement with the thickness walked on both sides.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakMeasure {
    /// Peak position in absolute frame coordinates.
    pub point: [f32; 2],
    /// Signed thickness gradient at the peak.
    pub gradient: f32,
    /// Intensity-walk thickness just before the peak along the scan.
    pub thickness_before: f32,
    /// Intensity-walk thickness just after the peak along the scan.
    pub thickness_after: f32,
}

/// Full strip diagnostics for one region, all coordinates absolute.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StripOutcome {
    pub contour_found: bool,
    /// Contour-level verdict: at least one discontinuity and score at or
    /// above the region pass threshold.
    pub analyzer_passed: bool,
    pub score: f64,
    /// Up to four contour discontinuity points (two per edge).
    pub discontinuities: Vec<[f32; 2]>,
    pub peak: Option<PeakMeasure>,
    /// Thickness at the two fixed fractional positions.
    pub zones: [Option<ZoneThickness>; 2],
}

fn select_best<'a>(
    scans: &'a [EdgeScan],
    grads: &'a [Vec<f32>],
) -> (&'a EdgeScan, &'a Vec<f32>) {
    let mut best = 0usize;
    let mut best_mag = -1.0f32;
    for (i, g) in grads.iter().enumerate() {
        let mag = max_abs_gradient(g).map(|(_, v)| v.abs()).unwrap_or(0.0);
        if mag > best_mag {
            best_mag = mag;
            best = i;
        }
    }
    (&scans[best], &grads[best])
}

fn point_at(extraction: &Extraction, scan: &EdgeScan, idx: usize) -> Option<[f32; 2]> {
    let pos = scan.positions[idx];
    if pos < 0.0 {
        return None;
    }
    Some(extraction.to_absolute([scan.xs[idx] as f32, pos]))
}

fn walk_near(
    crop: &GrayImage,
    scan: &EdgeScan,
    idx: usize,
    offset: isize,
    delta: u8,
) -> f32 {
    let i = idx.saturating_add_signed(offset).min(scan.len() - 1);
    let pos = scan.positions[i];
    if pos < 0.0 {
        return 0.0;
    }
    let seed_y = (pos + scan.thickness[i] * 0.5).round() as u32;
    intensity_walk(crop, scan.xs[i], seed_y.min(crop.height().saturating_sub(1)), delta)
}

/// Run the full strip analysis for one region.
///
/// `teach_rect` is the untransformed taught rect (its width anchors the
/// gradient-interesting range); `rect`/`angle_deg` are the working pose the
/// crop is extracted at. Degrades to an empty, failed outcome instead of
/// erroring.
pub fn analyze_strip(
    frame: &GrayImage,
    teach_rect: Rect,
    rect: Rect,
    angle_deg: f32,
    params: &StripParams,
    pass_threshold: f64,
) -> StripOutcome {
    let Some(extraction) = extract_rotated(frame, rect, angle_deg) else {
        return StripOutcome::default();
    };
    let crop = &extraction.region;
    let Some(object) = find_strip_object(crop) else {
        debug!("strip: no dominant contour in crop");
        return StripOutcome::default();
    };
    let bbox = object.bbox;

    let scans = [
        scan_contour(&object.binary, bbox, Edge::Top, Direction::Forward),
        scan_contour(&object.binary, bbox, Edge::Top, Direction::Reverse),
        scan_contour(&object.binary, bbox, Edge::Bottom, Direction::Forward),
        scan_contour(&object.binary, bbox, Edge::Bottom, Direction::Reverse),
    ];

    let x_min = params.gradient_start_percent / 100.0 * teach_rect.w;
    let x_max = params.gradient_end_percent / 100.0 * teach_rect.w;
    let grads: Vec<Vec<f32>> = scans
        .iter()
        .map(|s| thickness_gradient(s, x_min, x_max, params.gradient_threshold))
        .collect();
    let (selected, _) = select_best(&scans, &grads);
    debug!(
        "strip: selected {:?}/{:?} contour over bbox {}x{}",
        selected.edge, selected.direction, bbox.w, bbox.h
    );

    // Boundary transitions can be subtle; point finding runs at half the
    // configured threshold.
    let sensitive = params.gradient_threshold * 0.5;
    let direction = selected.direction;
    let mut discontinuities = Vec::new();
    let mut gradient_total = 0.0f64;
    for scan in scans.iter().filter(|s| s.direction == direction) {
        let g = thickness_gradient(scan, x_min, x_max, sensitive);
        for idx in find_discontinuities(&g, 2, MIN_POINT_SEPARATION) {
            if let Some(p) = point_at(&extraction, scan, idx) {
                discontinuities.push(p);
                gradient_total += g[idx].abs() as f64;
            }
        }
    }

    let selected_sensitive = thickness_gradient(selected, x_min, x_max, sensitive);
    let peak = peak_gradient_biased(&selected_sensitive).and_then(|(idx, g)| {
        let point = point_at(&extraction, selected, idx)?;
        Some(PeakMeasure {
            point,
            gradient: g,
            thickness_before: walk_near(crop, selected, idx, -2, params.intensity_delta),
            thickness_after: walk_near(crop, selected, idx, 2, params.intensity_delta),
        })
    });

    let zone_cy = bbox.y as f32 + bbox.h as f32 * 0.5;
    let fractions = [
        params.gradient_start_percent / 100.0,
        params.gradient_end_percent / 100.0,
    ];
    let mut zones: [Option<ZoneThickness>; 2] = [None, None];
    for (i, frac) in fractions.iter().enumerate() {
        let zx = bbox.x as f32 + frac * bbox.w as f32;
        let cfg = &params.zones[i];
        zones[i] = measure_zone(
            crop,
            zx,
            zone_cy,
            cfg.box_width,
            cfg.box_height,
            params.intensity_threshold,
        )
        .map(|(min, max, avg)| ZoneThickness {
            min,
            max,
            avg,
            center: extraction.to_absolute([zx, zone_cy]),
        });
    }

    let score = (discontinuities.len() as f64 * POINT_SCORE_WEIGHT
        + gradient_total / GRADIENT_SCORE_SCALE)
        .min(1.0);
    let analyzer_passed = !discontinuities.is_empty() && score >= pass_threshold;
    debug!(
        "strip: points={} peak_grad={:?} score={:.3} passed={}",
        discontinuities.len(),
        peak.map(|p| p.gradient),
        score,
        analyzer_passed
    );

    StripOutcome {
        contour_found: true,
        analyzer_passed,
        score,
        discontinuities,
        peak,
        zones,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::ThicknessZone;
    use image::Luma;

    /// Frame holding a bright strip that steps from 24 px to 10 px thick at
    /// x = 100.
    fn stepped_frame() -> GrayImage {
        let mut img = GrayImage::from_pixel(200, 80, Luma([12u8]));
        for x in 20..180 {
            let (y0, y1) = if x < 100 { (28, 52) } else { (35, 45) };
            for y in y0..y1 {
                img.put_pixel(x, y, Luma([230u8]));
            }
        }
        img
    }

    fn strip_params() -> StripParams {
        StripParams {
            gradient_start_percent: 10.0,
            gradient_end_percent: 90.0,
            gradient_threshold: 3.0,
            intensity_threshold: 100,
            intensity_delta: 40,
            zones: [
                ThicknessZone {
                    box_width: 8,
                    box_height: 60,
                    min_thickness: 18.0,
                    max_thickness: 30.0,
                },
                ThicknessZone {
                    box_width: 8,
                    box_height: 60,
                    min_thickness: 6.0,
                    max_thickness: 14.0,
                },
            ],
        }
    }

    #[test]
    fn detects_the_thickness_step() {
        let frame = stepped_frame();
        let rect = Rect::new(15.0, 20.0, 170.0, 40.0);
        let out = analyze_strip(&frame, rect, rect, 0.0, &strip_params(), 0.3);
        assert!(out.contour_found);
        assert!(
            !out.discontinuities.is_empty(),
            "expected at least one discontinuity"
        );
        assert!(out.analyzer_passed, "score={}", out.score);
        // All discontinuities cluster near the step at x = 100.
        for p in &out.discontinuities {
            assert!((p[0] - 100.0).abs() < 8.0, "point at x={}", p[0]);
        }
    }

    #[test]
    fn zone_thickness_matches_construction() {
        let frame = stepped_frame();
        let rect = Rect::new(15.0, 20.0, 170.0, 40.0);
        let out = analyze_strip(&frame, rect, rect, 0.0, &strip_params(), 0.3);
        let thick = out.zones[0].expect("left zone");
        assert!((thick.avg - 24.0).abs() <= 1.0, "avg={}", thick.avg);
        let thin = out.zones[1].expect("right zone");
        assert!((thin.avg - 10.0).abs() <= 1.0, "avg={}", thin.avg);
    }

    #[test]
    fn featureless_crop_fails_without_contour() {
        let frame = GrayImage::new(100, 100);
        let rect = Rect::new(10.0, 10.0, 60.0, 40.0);
        let out = analyze_strip(&frame, rect, rect, 0.0, &strip_params(), 0.5);
        assert!(!out.contour_found);
        assert!(!out.analyzer_passed);
        assert_eq!(out.score, 0.0);
    }
}
