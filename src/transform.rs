//! Rigid-body transform propagation from a matched fiducial to its group.
//!
//! The FID+INS cluster moves and rotates together: each child keeps its
//! teach-time offset from the fiducial, rotated by the detected angle delta
//! and re-anchored at the detected centre. Width and height never change —
//! translation plus rotation, no scale.

use crate::geom::Rect;
use crate::recipe::{RegionId, RegionStore};
use log::debug;
use nalgebra::{Rotation2, Vector2};

/// A FID score at or above this is treated as "no detected offset" and
/// propagation is skipped entirely.
pub const PERFECT_SCORE: f64 = 0.999;

/// Teach-time or detected pose of a fiducial: centre plus angle in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub center: [f32; 2],
    pub angle: f32,
}

/// Derived geometry written into the run result for one child region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedPlacement {
    pub id: RegionId,
    /// Adjusted rect: teach-time size re-centred at the transformed position.
    pub rect: Rect,
    /// Working angle: child teach angle plus the detected delta.
    pub angle: f32,
}

/// Apply the detected rigid transform of `fid_id` to every INS region
/// transitively grouped under it.
///
/// Teach-time values in the store are never written; callers stash the
/// returned placements in the per-run result.
pub fn propagate(
    store: &RegionStore,
    fid_id: RegionId,
    taught: Pose,
    detected: Pose,
    score: f64,
) -> Vec<DerivedPlacement> {
    if score >= PERFECT_SCORE {
        debug!("fid {fid_id:?}: score {score:.4} ~ 1.0, propagation skipped");
        return Vec::new();
    }
    let angle_diff = detected.angle - taught.angle;
    let rot = Rotation2::new((angle_diff as f64).to_radians());

    let mut placements = Vec::new();
    for ins_id in store.descendant_ins(fid_id) {
        let Some(child) = store.get(ins_id) else {
            continue;
        };
        let c = child.rect.center();
        let rel = Vector2::new(
            (c[0] - taught.center[0]) as f64,
            (c[1] - taught.center[1]) as f64,
        );
        let moved = rot * rel;
        let new_center = [
            detected.center[0] + moved.x as f32,
            detected.center[1] + moved.y as f32,
        ];
        placements.push(DerivedPlacement {
            id: ins_id,
            rect: child.rect.centered_at(new_center),
            angle: child.angle + angle_diff,
        });
    }
    debug!(
        "fid {fid_id:?}: propagated Δ={:.2}° Δc=({:.1},{:.1}) to {} region(s)",
        angle_diff,
        detected.center[0] - taught.center[0],
        detected.center[1] - taught.center[1],
        placements.len()
    );
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{FidParams, InsParams, Region, RegionKind};

    fn store_with_group() -> RegionStore {
        let mut store = RegionStore::new();
        store.insert(Region::new(
            RegionId(1),
            RegionKind::Fid(FidParams::default()),
            Rect::from_corners(100.0, 100.0, 150.0, 150.0),
        ));
        store.insert(Region::new(
            RegionId(2),
            RegionKind::Ins(InsParams::default()),
            Rect::from_corners(160.0, 100.0, 200.0, 140.0),
        ));
        store.attach(RegionId(1), RegionId(2));
        store
    }

    #[test]
    fn pure_translation_shifts_children() {
        let store = store_with_group();
        let taught = Pose {
            center: [125.0, 125.0],
            angle: 0.0,
        };
        let detected = Pose {
            center: [145.0, 125.0],
            angle: 0.0,
        };
        let out = propagate(&store, RegionId(1), taught, detected, 0.9);
        assert_eq!(out.len(), 1);
        let p = &out[0];
        assert_eq!(p.rect.center(), [200.0, 120.0]);
        assert_eq!(p.rect.w, 40.0);
        assert_eq!(p.angle, 0.0);
    }

    #[test]
    fn rotation_moves_child_on_the_arc() {
        let store = store_with_group();
        let taught = Pose {
            center: [125.0, 125.0],
            angle: 0.0,
        };
        let detected = Pose {
            center: [125.0, 125.0],
            angle: 90.0,
        };
        let out = propagate(&store, RegionId(1), taught, detected, 0.5);
        let p = &out[0];
        // Child offset (55, -5) rotated by 90° (x→y) becomes (5, 55).
        let c = p.rect.center();
        assert!((c[0] - 130.0).abs() < 1e-3, "cx={}", c[0]);
        assert!((c[1] - 180.0).abs() < 1e-3, "cy={}", c[1]);
        assert_eq!(p.angle, 90.0);
    }

    #[test]
    fn near_perfect_score_skips_propagation() {
        let store = store_with_group();
        let pose = Pose {
            center: [125.0, 125.0],
            angle: 0.0,
        };
        let detected = Pose {
            center: [300.0, 300.0],
            angle: 45.0,
        };
        assert!(propagate(&store, RegionId(1), pose, detected, 0.9995).is_empty());
    }
}
