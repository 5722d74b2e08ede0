//! Binarization and binary-image cleanup.

use crate::recipe::BinarizeSpec;
use image::GrayImage;
use imageproc::contrast::{adaptive_threshold, otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

/// Binarize to a strict 0/255 image according to `spec`.
pub fn binarize(gray: &GrayImage, spec: BinarizeSpec) -> GrayImage {
    match spec {
        BinarizeSpec::Fixed { level } => threshold(gray, level, ThresholdType::Binary),
        BinarizeSpec::Auto => {
            let level = otsu_level(gray);
            threshold(gray, level, ThresholdType::Binary)
        }
        BinarizeSpec::AdaptiveMean { block_radius } => {
            adaptive_threshold(gray, block_radius.max(1))
        }
    }
}

/// Re-threshold a mask whose edges were blurred by rotation interpolation.
pub fn rebinarize(mask: &GrayImage) -> GrayImage {
    threshold(mask, 127, ThresholdType::Binary)
}

/// Morphological open then close with a 1-pixel structuring element, the
/// standard salt/pepper cleanup before contour extraction.
pub fn denoise_open_close(bin: &GrayImage) -> GrayImage {
    close(&open(bin, Norm::LInf, 1), Norm::LInf, 1)
}
