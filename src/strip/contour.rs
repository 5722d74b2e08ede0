//! Dominant-object extraction for the strip analysis.

use crate::geom::PixelRect;
use crate::raster::{binarize, denoise_open_close};
use crate::recipe::BinarizeSpec;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

/// Binarized crop plus the bounding box of its largest external contour.
pub struct StripObject {
    pub binary: GrayImage,
    pub bbox: PixelRect,
}

/// Binarize (automatic global threshold), denoise with open+close and locate
/// the dominant external contour. `None` when the crop holds no object.
pub fn find_strip_object(crop: &GrayImage) -> Option<StripObject> {
    if crop.width() < 3 || crop.height() < 3 {
        return None;
    }
    let binary = denoise_open_close(&binarize(crop, BinarizeSpec::Auto));

    let contours = find_contours::<i32>(&binary);
    let mut best: Option<PixelRect> = None;
    for contour in &contours {
        if contour.border_type != BorderType::Outer || contour.points.is_empty() {
            continue;
        }
        let (mut x0, mut y0, mut x1, mut y1) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for p in &contour.points {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        let bbox = PixelRect {
            x: x0.max(0) as u32,
            y: y0.max(0) as u32,
            w: (x1 - x0 + 1).max(1) as u32,
            h: (y1 - y0 + 1).max(1) as u32,
        };
        let better = match &best {
            Some(b) => bbox.w as u64 * bbox.h as u64 > b.w as u64 * b.h as u64,
            None => true,
        };
        if better {
            best = Some(bbox);
        }
    }
    best.map(|bbox| StripObject { binary, bbox })
}
