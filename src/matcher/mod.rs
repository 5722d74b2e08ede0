//! Fiducial template matching.
//!
//! Locates the taught reference snapshot of a FID region inside a search
//! window — the containing ROI when one exists, otherwise a margin-expanded
//! box around the FID's own rect — using masked normalized correlation with
//! an optional two-stage rotation search.

mod rotation;
mod zncc;

pub use rotation::{two_stage_rotation_search, RotationHit, EARLY_EXIT_SCORE};
pub use zncc::{masked_zncc_search, Peak};

use crate::geom::Rect;
use crate::raster::{crop_gray, ink_mask, to_gray};
use crate::recipe::{MatchMethod, Region, RegionKind, RegionStore};
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use log::{debug, warn};

/// Search-window margin around a FID without a containing ROI, as a fraction
/// of the larger template side.
const SEARCH_MARGIN_FACTOR: f32 = 0.75;

/// Outcome of one fiducial search.
///
/// The best angle and centre are reported even when `matched` is false:
/// downstream propagation must reflect the true detected pose, not the
/// pass/fail verdict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FidMatch {
    pub matched: bool,
    pub score: f64,
    /// Detected template centre in absolute frame coordinates.
    pub center: [f32; 2],
    /// Detected absolute angle in degrees.
    pub angle: f32,
}

impl FidMatch {
    /// The documented degraded default: unmatched at the taught pose.
    fn unmatched(fid: &Region) -> Self {
        Self {
            matched: false,
            score: 0.0,
            center: fid.rect.center(),
            angle: fid.angle,
        }
    }
}

/// Resolve the search rect for `fid`: containing ROI (whole frame when so
/// flagged), else the margin-expanded FID rect.
fn search_rect(fid: &Region, store: &RegionStore, frame_w: u32, frame_h: u32) -> Rect {
    if let Some(roi) = store.find_ancestor(fid.id, |r| r.kind.is_roi() && r.enabled) {
        if let RegionKind::Roi { whole_frame } = roi.kind {
            if whole_frame {
                return Rect::new(0.0, 0.0, frame_w as f32, frame_h as f32);
            }
        }
        return roi.rect;
    }
    let margin = fid.rect.w.max(fid.rect.h) * SEARCH_MARGIN_FACTOR;
    fid.rect.expanded(margin)
}

/// Match a FID region's reference template inside `gray`.
pub fn match_fiducial(gray: &GrayImage, fid: &Region, store: &RegionStore) -> FidMatch {
    let params = match &fid.kind {
        RegionKind::Fid(p) => p,
        _ => return FidMatch::unmatched(fid),
    };
    if gray.width() == 0 || gray.height() == 0 {
        return FidMatch::unmatched(fid);
    }
    let reference = match &fid.reference {
        Some(r) if r.width() > 0 && r.height() > 0 => to_gray(r),
        _ => {
            warn!("fid {:?}: no reference snapshot, skipping match", fid.id);
            return FidMatch::unmatched(fid);
        }
    };
    if params.method == MatchMethod::Feature {
        // Feature matching belongs to an external pipeline; fall back to the
        // template path so a pose is still produced.
        warn!("fid {:?}: feature matching unavailable, using template search", fid.id);
    }

    let rect = search_rect(fid, store, gray.width(), gray.height());
    let window_rect = match rect.clip_to_image(gray.width(), gray.height()) {
        Some(r) => r,
        None => {
            warn!("fid {:?}: search window outside frame", fid.id);
            return FidMatch::unmatched(fid);
        }
    };
    let window = crop_gray(gray, window_rect);
    // One-pixel dilation pulls the shape boundary into the mask; a solid
    // single-intensity mark would otherwise have no variance to correlate.
    let mask = dilate(&ink_mask(&reference), Norm::LInf, 1);

    let hit = if params.use_rotation {
        two_stage_rotation_search(
            &window,
            &reference,
            &mask,
            fid.angle,
            params.min_angle,
            params.max_angle,
            params.angle_step,
        )
    } else {
        masked_zncc_search(&window, &reference, &mask).map(|peak| RotationHit {
            center: [
                peak.x as f32 + reference.width() as f32 * 0.5,
                peak.y as f32 + reference.height() as f32 * 0.5,
            ],
            angle: fid.angle,
            score: peak.score,
        })
    };

    match hit {
        Some(h) => {
            let center = [
                h.center[0] + window_rect.x as f32,
                h.center[1] + window_rect.y as f32,
            ];
            let matched = h.score >= params.match_threshold;
            debug!(
                "fid {:?}: score={:.3} angle={:.1}° center=({:.1},{:.1}) matched={}",
                fid.id, h.score, h.angle, center[0], center[1], matched
            );
            FidMatch {
                matched,
                score: h.score,
                center,
                angle: h.angle,
            }
        }
        None => {
            debug!("fid {:?}: no evaluable placement in window", fid.id);
            FidMatch::unmatched(fid)
        }
    }
}
