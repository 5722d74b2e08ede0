//! Rotated-rect extraction.
//!
//! A taught rect with a non-zero angle is sampled by cropping a
//! rotation-safe square around its centre, rotating that square back to the
//! upright frame and cutting the region-sized window from the middle. The
//! [`Extraction`] keeps enough bookkeeping to map points measured in the
//! upright window back to absolute frame coordinates.

use super::rotate_deg;
use crate::geom::{rotate_about, Rect};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Upright grayscale extraction of a (possibly rotated) region rect.
#[derive(Clone, Debug)]
pub struct Extraction {
    /// Region-sized upright crop, `rect.w × rect.h` pixels (rounded).
    pub region: GrayImage,
    square_origin: [f32; 2],
    square_side: f32,
    inner_offset: [f32; 2],
    angle_deg: f32,
}

impl Extraction {
    /// Map a point in the upright region crop back to absolute frame
    /// coordinates, undoing the extraction rotation.
    pub fn to_absolute(&self, local: [f32; 2]) -> [f32; 2] {
        let in_square = [
            local[0] + self.inner_offset[0],
            local[1] + self.inner_offset[1],
        ];
        let c = self.square_side * 0.5;
        let rotated = rotate_about(in_square, [c, c], self.angle_deg);
        [
            rotated[0] + self.square_origin[0],
            rotated[1] + self.square_origin[1],
        ]
    }
}

/// Upright color extraction; used by the histogram comparison.
#[derive(Clone, Debug)]
pub struct RgbExtraction {
    pub region: RgbImage,
}

fn square_canvas_gray(frame: &GrayImage, ox: i64, oy: i64, side: u32) -> Option<GrayImage> {
    let (fw, fh) = (frame.width() as i64, frame.height() as i64);
    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = (ox + side as i64).min(fw);
    let y1 = (oy + side as i64).min(fh);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let mut canvas = GrayImage::new(side, side);
    let part =
        image::imageops::crop_imm(frame, x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
            .to_image();
    image::imageops::replace(&mut canvas, &part, x0 - ox, y0 - oy);
    Some(canvas)
}

fn square_canvas_rgb(frame: &RgbImage, ox: i64, oy: i64, side: u32) -> Option<RgbImage> {
    let (fw, fh) = (frame.width() as i64, frame.height() as i64);
    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = (ox + side as i64).min(fw);
    let y1 = (oy + side as i64).min(fh);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let mut canvas = RgbImage::new(side, side);
    let part =
        image::imageops::crop_imm(frame, x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
            .to_image();
    image::imageops::replace(&mut canvas, &part, x0 - ox, y0 - oy);
    Some(canvas)
}

fn inner_window(rect: Rect, side: u32) -> Option<(u32, u32, u32, u32)> {
    let w = (rect.w.round() as u32).clamp(1, side);
    let h = (rect.h.round() as u32).clamp(1, side);
    let ix = (side - w) / 2;
    let iy = (side - h) / 2;
    if rect.w < 1.0 || rect.h < 1.0 {
        return None;
    }
    Some((ix, iy, w, h))
}

/// Extract the upright content of `rect` rotated by `angle_deg` from a
/// grayscale frame. `None` when the rect has no overlap with the frame or a
/// degenerate size.
pub fn extract_rotated(frame: &GrayImage, rect: Rect, angle_deg: f32) -> Option<Extraction> {
    if frame.width() == 0 || frame.height() == 0 {
        return None;
    }
    let side = rect.rotation_safe_side().max(1);
    let center = rect.center();
    let ox = (center[0] - side as f32 * 0.5).round() as i64;
    let oy = (center[1] - side as f32 * 0.5).round() as i64;
    let canvas = square_canvas_gray(frame, ox, oy, side)?;
    let upright = if angle_deg.abs() > f32::EPSILON {
        rotate_deg(&canvas, -angle_deg)
    } else {
        canvas
    };
    let (ix, iy, w, h) = inner_window(rect, side)?;
    let region = image::imageops::crop_imm(&upright, ix, iy, w, h).to_image();
    Some(Extraction {
        region,
        square_origin: [ox as f32, oy as f32],
        square_side: side as f32,
        inner_offset: [ix as f32, iy as f32],
        angle_deg,
    })
}

/// Color variant of [`extract_rotated`]; only the upright crop is needed.
pub fn extract_rotated_rgb(frame: &RgbImage, rect: Rect, angle_deg: f32) -> Option<RgbExtraction> {
    if frame.width() == 0 || frame.height() == 0 {
        return None;
    }
    let side = rect.rotation_safe_side().max(1);
    let center = rect.center();
    let ox = (center[0] - side as f32 * 0.5).round() as i64;
    let oy = (center[1] - side as f32 * 0.5).round() as i64;
    let canvas = square_canvas_rgb(frame, ox, oy, side)?;
    let upright = if angle_deg.abs() > f32::EPSILON {
        rotate_about_center(
            &canvas,
            (-angle_deg).to_radians(),
            Interpolation::Bilinear,
            Rgb([0u8, 0, 0]),
        )
    } else {
        canvas
    };
    let (ix, iy, w, h) = inner_window(rect, side)?;
    let region = image::imageops::crop_imm(&upright, ix, iy, w, h).to_image();
    Some(RgbExtraction { region })
}
