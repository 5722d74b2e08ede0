//! Binary agreement comparison.

use crate::raster::binarize;
use crate::recipe::BinarizeSpec;
use image::GrayImage;

const AGREEMENT_WEIGHT: f64 = 0.7;
const RECALL_WEIGHT: f64 = 0.3;

/// Compare the binarized live crop against the binarized reference.
///
/// Score is `0.7 · pixel agreement + 0.3 · recall of the reference's "on"
/// pixels`. With no reference it degrades to the plain on-pixel ratio of the
/// live crop.
pub fn binary_score(live: &GrayImage, reference: Option<&GrayImage>, spec: BinarizeSpec) -> f64 {
    if live.width() == 0 || live.height() == 0 {
        return 0.0;
    }
    let live_bin = binarize(live, spec);

    let Some(reference) = reference else {
        let on = live_bin.pixels().filter(|p| p.0[0] != 0).count() as f64;
        return on / (live_bin.width() as f64 * live_bin.height() as f64);
    };
    if reference.width() == 0 || reference.height() == 0 {
        return 0.0;
    }
    let ref_bin = binarize(reference, spec);

    // Extraction rounding can leave a one-pixel size mismatch; compare over
    // the shared area.
    let w = live_bin.width().min(ref_bin.width());
    let h = live_bin.height().min(ref_bin.height());
    let total = (w as f64) * (h as f64);
    if total == 0.0 {
        return 0.0;
    }

    let mut agree = 0usize;
    let mut ref_on = 0usize;
    let mut both_on = 0usize;
    for y in 0..h {
        for x in 0..w {
            let l = live_bin.get_pixel(x, y).0[0] != 0;
            let r = ref_bin.get_pixel(x, y).0[0] != 0;
            if l == r {
                agree += 1;
            }
            if r {
                ref_on += 1;
                if l {
                    both_on += 1;
                }
            }
        }
    }
    let agreement = agree as f64 / total;
    let recall = if ref_on > 0 {
        both_on as f64 / ref_on as f64
    } else {
        1.0
    };
    AGREEMENT_WEIGHT * agreement + RECALL_WEIGHT * recall
}
