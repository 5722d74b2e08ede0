//! Thickness measurements: fixed-position zones and the intensity walk used
//! at the peak-gradient point.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Aggregate thickness of contiguous object runs inside one sampling box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneThickness {
    pub min: f32,
    pub max: f32,
    pub avg: f32,
    /// Box centre in absolute frame coordinates.
    pub center: [f32; 2],
}

/// Longest contiguous run of pixels at or above `level` in one column slice.
fn column_object_run(gray: &GrayImage, x: u32, y0: u32, y1: u32, level: u8) -> u32 {
    let mut best = 0u32;
    let mut run = 0u32;
    for y in y0..y1 {
        if gray.get_pixel(x, y).0[0] >= level {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

/// Measure object thickness inside a `box_w × box_h` window centred at
/// `(cx, cy)` in crop coordinates. Columns without object pixels do not
/// contribute; `None` when no column holds any object.
pub fn measure_zone(
    gray: &GrayImage,
    cx: f32,
    cy: f32,
    box_w: u32,
    box_h: u32,
    level: u8,
) -> Option<(f32, f32, f32)> {
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    let x0 = ((cx - box_w as f32 * 0.5).round() as i64).clamp(0, w);
    let x1 = ((cx + box_w as f32 * 0.5).round() as i64).clamp(0, w);
    let y0 = ((cy - box_h as f32 * 0.5).round() as i64).clamp(0, h);
    let y1 = ((cy + box_h as f32 * 0.5).round() as i64).clamp(0, h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let mut min = f32::MAX;
    let mut max = 0.0f32;
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for x in x0..x1 {
        let run = column_object_run(gray, x as u32, y0 as u32, y1 as u32, level) as f32;
        if run > 0.0 {
            min = min.min(run);
            max = max.max(run);
            sum += run;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some((min, max, sum / count as f32))
}

/// Thickness at `(x, y)` measured by walking vertically both ways while the
/// intensity stays within `delta` of the seed pixel.
pub fn intensity_walk(gray: &GrayImage, x: u32, y: u32, delta: u8) -> f32 {
    if x >= gray.width() || y >= gray.height() {
        return 0.0;
    }
    let seed = gray.get_pixel(x, y).0[0] as i16;
    let within = |yy: u32| -> bool {
        (gray.get_pixel(x, yy).0[0] as i16 - seed).abs() <= delta as i16
    };
    let mut count = 1.0f32;
    let mut up = y;
    while up > 0 && within(up - 1) {
        up -= 1;
        count += 1.0;
    }
    let mut down = y;
    while down + 1 < gray.height() && within(down + 1) {
        down += 1;
        count += 1.0;
    }
    count
}
