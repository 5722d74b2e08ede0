//! Plain geometric value types shared across the engine.
//!
//! All recipe geometry is stored in floating-point image coordinates with
//! axis-aligned teach rectangles; rotation is carried separately as an angle
//! in degrees and applied about the rectangle centre.

use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in floating-point image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning two corner points.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            w: (x1 - x0).abs(),
            h: (y1 - y0).abs(),
        }
    }

    #[inline]
    pub fn center(&self) -> [f32; 2] {
        [self.x + self.w * 0.5, self.y + self.h * 0.5]
    }

    /// Rectangle with the same size centred at `c`.
    pub fn centered_at(&self, c: [f32; 2]) -> Self {
        Self {
            x: c[0] - self.w * 0.5,
            y: c[1] - self.h * 0.5,
            w: self.w,
            h: self.h,
        }
    }

    #[inline]
    pub fn contains(&self, p: [f32; 2]) -> bool {
        p[0] >= self.x && p[0] < self.x + self.w && p[1] >= self.y && p[1] < self.y + self.h
    }

    /// Grow by `margin` pixels on every side.
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            w: self.w + 2.0 * margin,
            h: self.h + 2.0 * margin,
        }
    }

    /// Clip to an image of `width × height` pixels and round to an integer
    /// pixel rect. Returns `None` when nothing remains.
    pub fn clip_to_image(&self, width: u32, height: u32) -> Option<PixelRect> {
        let x0 = self.x.max(0.0).floor() as i64;
        let y0 = self.y.max(0.0).floor() as i64;
        let x1 = ((self.x + self.w).ceil() as i64).min(width as i64);
        let y1 = ((self.y + self.h).ceil() as i64).min(height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0 as u32,
            y: y0 as u32,
            w: (x1 - x0) as u32,
            h: (y1 - y0) as u32,
        })
    }

    /// Side length of the smallest axis-aligned square that contains this
    /// rectangle under any rotation about its centre.
    pub fn rotation_safe_side(&self) -> u32 {
        (self.w * self.w + self.h * self.h).sqrt().ceil() as u32
    }
}

/// Integer pixel rectangle, always inside image bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Rotate `p` about `pivot` by `angle_deg` degrees (counter-clockwise in a
/// y-down image frame this appears clockwise on screen; the engine only
/// requires the forward/inverse pair to be consistent).
pub fn rotate_about(p: [f32; 2], pivot: [f32; 2], angle_deg: f32) -> [f32; 2] {
    let rot = Rotation2::new(angle_deg.to_radians());
    let v = Vector2::new(p[0] - pivot[0], p[1] - pivot[1]);
    let r = rot * v;
    let out = Point2::new(pivot[0] + r.x, pivot[1] + r.y);
    [out.x, out.y]
}
