//! Directional contour scanning and thickness-gradient analysis.
//!
//! The strip object is walked column by column in four configurations —
//! {top edge, bottom edge} × {left→right, right→left} — recording where the
//! object starts and how thick it is at every step. Sharp changes in the
//! thickness series mark the transition the inspection is looking for.

use crate::geom::PixelRect;
use image::GrayImage;

/// Which object edge a scan follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

/// Traversal order along the scan axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// One directional scan: per step, the x column, the first object pixel
/// along the probe and the contiguous object run length. Columns without
/// object pixels carry `position = -1` and zero thickness.
#[derive(Clone, Debug)]
pub struct EdgeScan {
    pub edge: Edge,
    pub direction: Direction,
    pub xs: Vec<u32>,
    pub positions: Vec<f32>,
    pub thickness: Vec<f32>,
}

impl EdgeScan {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

#[inline]
fn column_run(bin: &GrayImage, x: u32, bbox: PixelRect, from_top: bool) -> (f32, f32) {
    let ys: Box<dyn Iterator<Item = u32>> = if from_top {
        Box::new(bbox.y..bbox.y + bbox.h)
    } else {
        Box::new((bbox.y..bbox.y + bbox.h).rev())
    };
    let mut first = -1.0f32;
    let mut run = 0.0f32;
    let mut in_run = false;
    for y in ys {
        let on = bin.get_pixel(x, y).0[0] != 0;
        if on && !in_run {
            first = y as f32;
            in_run = true;
        }
        if in_run {
            if on {
                run += 1.0;
            } else {
                break;
            }
        }
    }
    (first, run)
}

/// Scan one edge of the object in one direction across its bounding box.
pub fn scan_contour(bin: &GrayImage, bbox: PixelRect, edge: Edge, direction: Direction) -> EdgeScan {
    let columns: Vec<u32> = match direction {
        Direction::Forward => (bbox.x..bbox.x + bbox.w).collect(),
        Direction::Reverse => (bbox.x..bbox.x + bbox.w).rev().collect(),
    };
    let mut xs = Vec::with_capacity(columns.len());
    let mut positions = Vec::with_capacity(columns.len());
    let mut thickness = Vec::with_capacity(columns.len());
    for x in columns {
        let (first, run) = column_run(bin, x, bbox, edge == Edge::Top);
        xs.push(x);
        positions.push(first);
        thickness.push(run);
    }
    EdgeScan {
        edge,
        direction,
        xs,
        positions,
        thickness,
    }
}

/// Central-difference gradient of the thickness series.
///
/// Entries whose column lies outside `[x_min, x_max]` (the interesting range
/// derived from the taught rect width) or whose magnitude is below
/// `threshold` are zeroed.
pub fn thickness_gradient(scan: &EdgeScan, x_min: f32, x_max: f32, threshold: f32) -> Vec<f32> {
    let n = scan.len();
    let mut grad = vec![0.0f32; n];
    if n < 3 {
        return grad;
    }
    for i in 1..n - 1 {
        let x = scan.xs[i] as f32;
        if x < x_min || x > x_max {
            continue;
        }
        let g = (scan.thickness[i + 1] - scan.thickness[i - 1]) * 0.5;
        if g.abs() >= threshold {
            grad[i] = g;
        }
    }
    grad
}

/// Index and signed value of the largest-magnitude gradient entry.
pub fn max_abs_gradient(grad: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &g) in grad.iter().enumerate() {
        if g != 0.0 && best.map(|(_, b)| g.abs() > b.abs()).unwrap_or(true) {
            best = Some((i, g));
        }
    }
    best
}

/// Largest-magnitude gradient entry, preferring the second half of the scan;
/// falls back to the full range when the second half is flat.
pub fn peak_gradient_biased(grad: &[f32]) -> Option<(usize, f32)> {
    let half = grad.len() / 2;
    max_abs_gradient(&grad[half..])
        .map(|(i, g)| (i + half, g))
        .or_else(|| max_abs_gradient(grad))
}

/// Up to `max_points` local maxima of |gradient| within the 10–90 % span of
/// the scan, separated by at least `min_separation` steps.
pub fn find_discontinuities(grad: &[f32], max_points: usize, min_separation: usize) -> Vec<usize> {
    let n = grad.len();
    if n == 0 {
        return Vec::new();
    }
    let lo = n / 10;
    let hi = n - n / 10;
    let mut candidates: Vec<usize> = (lo..hi).filter(|&i| grad[i] != 0.0).collect();
    candidates.sort_by(|&a, &b| {
        grad[b]
            .abs()
            .partial_cmp(&grad[a].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut picked: Vec<usize> = Vec::new();
    for i in candidates {
        if picked.len() >= max_points {
            break;
        }
        if picked.iter().all(|&p| p.abs_diff(i) >= min_separation) {
            picked.push(i);
        }
    }
    picked.sort_unstable();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Strip that is 20 px thick on the left half and 8 px on the right.
    fn stepped_strip() -> (GrayImage, PixelRect) {
        let mut img = GrayImage::new(80, 40);
        for x in 5..75 {
            let (y0, y1) = if x < 40 { (10, 30) } else { (10, 18) };
            for y in y0..y1 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        (
            img,
            PixelRect {
                x: 5,
                y: 10,
                w: 70,
                h: 20,
            },
        )
    }

    #[test]
    fn top_scan_measures_column_thickness() {
        let (img, bbox) = stepped_strip();
        let scan = scan_contour(&img, bbox, Edge::Top, Direction::Forward);
        assert_eq!(scan.len(), 70);
        assert_eq!(scan.thickness[0], 20.0);
        assert_eq!(scan.thickness[69], 8.0);
        assert_eq!(scan.positions[0], 10.0);
    }

    #[test]
    fn gradient_spikes_at_the_step() {
        let (img, bbox) = stepped_strip();
        let scan = scan_contour(&img, bbox, Edge::Top, Direction::Forward);
        let grad = thickness_gradient(&scan, 0.0, 100.0, 1.0);
        let (idx, g) = max_abs_gradient(&grad).expect("gradient peak");
        // The step sits at x = 40, i.e. scan index 35.
        assert!(idx.abs_diff(35) <= 1, "idx={idx}");
        assert!(g < 0.0, "thickness drops, gradient must be negative: {g}");
    }

    #[test]
    fn interesting_range_suppresses_outside_columns() {
        let (img, bbox) = stepped_strip();
        let scan = scan_contour(&img, bbox, Edge::Top, Direction::Forward);
        let grad = thickness_gradient(&scan, 50.0, 70.0, 1.0);
        assert!(max_abs_gradient(&grad).is_none());
    }

    #[test]
    fn discontinuity_picker_respects_separation() {
        let mut grad = vec![0.0f32; 100];
        grad[40] = 6.0;
        grad[41] = 5.0; // swallowed by separation
        grad[60] = 4.0;
        let picked = find_discontinuities(&grad, 2, 3);
        assert_eq!(picked, vec![40, 60]);
    }
}
