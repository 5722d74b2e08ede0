//! Raster primitives shared by the matcher, measurement methods and the
//! strip analyzer.
//!
//! Everything operates on owned `image` buffers (`GrayImage`/`RgbImage`).
//! Rotation helpers all go through [`rotate_deg`] so the forward and inverse
//! mappings used across the engine share one sign convention: positive
//! angles rotate content from +x toward +y (clockwise on screen in the
//! y-down image frame).

mod binarize;
mod extract;

pub use binarize::{binarize, denoise_open_close, rebinarize};
pub use extract::{extract_rotated, extract_rotated_rgb, Extraction, RgbExtraction};

use crate::geom::PixelRect;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Convert a color frame to 8-bit grayscale.
pub fn to_gray(rgb: &RgbImage) -> GrayImage {
    image::imageops::grayscale(rgb)
}

/// Copy a pixel sub-rect out of a grayscale image.
pub fn crop_gray(img: &GrayImage, rect: PixelRect) -> GrayImage {
    image::imageops::crop_imm(img, rect.x, rect.y, rect.w, rect.h).to_image()
}

/// Copy a pixel sub-rect out of a color image.
pub fn crop_rgb(img: &RgbImage, rect: PixelRect) -> RgbImage {
    image::imageops::crop_imm(img, rect.x, rect.y, rect.w, rect.h).to_image()
}

/// Rotate content by `angle_deg` about the image centre, bilinear, filling
/// uncovered pixels with black.
pub fn rotate_deg(img: &GrayImage, angle_deg: f32) -> GrayImage {
    rotate_about_center(
        img,
        angle_deg.to_radians(),
        Interpolation::Bilinear,
        Luma([0u8]),
    )
}

/// Binary mask (0/255) marking the "ink" pixels of a reference snapshot.
///
/// Splits at the Otsu level and takes the minority side: taught templates
/// are dominated by background, the marked shape is the smaller population.
pub fn ink_mask(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    let mut below = 0usize;
    for p in gray.pixels() {
        if p.0[0] <= level {
            below += 1;
        }
    }
    let total = (gray.width() * gray.height()) as usize;
    let ink_is_dark = below * 2 <= total;
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (m, p) in mask.pixels_mut().zip(gray.pixels()) {
        let dark = p.0[0] <= level;
        m.0[0] = if dark == ink_is_dark { 255 } else { 0 };
    }
    mask
}

/// Count of non-zero mask pixels.
pub fn mask_area(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] != 0).count()
}

/// Centre `img` on a zero-filled square canvas whose side is the diagonal of
/// the input, so that any rotation keeps all content inside the canvas.
pub fn padded_diagonal_canvas(img: &GrayImage) -> GrayImage {
    let (w, h) = (img.width(), img.height());
    let side = ((w as f32).hypot(h as f32)).ceil() as u32;
    let mut canvas = GrayImage::new(side, side);
    let ox = (side - w) / 2;
    let oy = (side - h) / 2;
    image::imageops::replace(&mut canvas, img, ox as i64, oy as i64);
    canvas
}
