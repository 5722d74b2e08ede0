use image::{Rgb, RgbImage};

/// L-shaped high-contrast fiducial mark on a light background.
pub fn corner_mark_rgb(side: u32) -> RgbImage {
    assert!(side >= 8, "mark too small to carry a shape");
    let mut img = RgbImage::from_pixel(side, side, Rgb([205u8, 205, 205]));
    let bar = side / 4;
    for y in 0..side {
        for x in 0..side {
            if x < bar || y >= side - bar {
                img.put_pixel(x, y, Rgb([25u8, 25, 25]));
            }
        }
    }
    img
}

/// Frame holding a bright strip that steps from 24 px down to 10 px thick at
/// `step_x`.
pub fn stepped_strip_frame(width: u32, height: u32, step_x: u32) -> RgbImage {
    assert!(step_x > 20 && step_x < width - 20);
    let mut img = RgbImage::from_pixel(width, height, Rgb([12u8, 12, 12]));
    let mid = height / 2;
    for x in 20..width - 20 {
        let half = if x < step_x { 12 } else { 5 };
        for y in mid - half..mid + half {
            img.put_pixel(x, y, Rgb([230u8, 230, 230]));
        }
    }
    img
}

/// Deterministic speckle inside a rectangle, enough to pull a correlation
/// score visibly below 1 without breaking the match.
pub fn speckle(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32) {
    for i in 0..8u32 {
        let x = x0 + (i * 7 + 3) % w.max(1);
        let y = y0 + (i * 5 + 2) % h.max(1);
        if x < img.width() && y < img.height() {
            let p = img.get_pixel(x, y).0;
            let v = p[0].wrapping_add(70);
            img.put_pixel(x, y, Rgb([v, v, v]));
        }
    }
}
