//! Inspection orchestrator.
//!
//! Runs the full pipeline over one frame and a taught region collection:
//! classify regions, resolve ROI grouping, match fiducials, propagate the
//! detected transforms and measure every in-scope inspection region. The
//! store is read-only during a run; all detected geometry lands in the
//! returned [`InspectionResult`].

pub mod report;

pub use report::{
    InspectionReport, InspectionResult, RunTrace, SkipReason, SkipRecord, StageTiming,
    TimingBreakdown,
};

use crate::geom::Rect;
use crate::matcher::{match_fiducial, FidMatch};
use crate::measure::check_region;
use crate::raster::to_gray;
use crate::recipe::{
    FilterPipeline, InspectionMethod, NoopFilterPipeline, Region, RegionId, RegionKind,
    RegionStore,
};
use crate::transform::{propagate, DerivedPlacement, Pose};
use image::RgbImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Run-level knobs of the orchestrator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectParams {
    /// Apply attached region filters before COLOR/EDGE measurement.
    pub apply_filters: bool,
}

impl Default for InspectParams {
    fn default() -> Self {
        Self {
            apply_filters: true,
        }
    }
}

/// Where a region is allowed to be measured.
#[derive(Clone, Copy, Debug)]
enum Scope {
    WholeFrame,
    Bounds(Rect),
    Excluded,
}

impl Scope {
    fn admits(&self, center: [f32; 2]) -> bool {
        match *self {
            Scope::WholeFrame => true,
            Scope::Bounds(r) => r.contains(center),
            Scope::Excluded => false,
        }
    }
}

struct Classified {
    rois: Vec<RegionId>,
    fids: Vec<RegionId>,
    inss: Vec<RegionId>,
}

/// Stateless inspection engine; one instance serves any number of runs.
pub struct Inspector {
    params: InspectParams,
    filters: Box<dyn FilterPipeline + Send + Sync>,
}

impl Inspector {
    pub fn new(params: InspectParams) -> Self {
        Self {
            params,
            filters: Box::new(NoopFilterPipeline),
        }
    }

    /// Replace the no-op filter pipeline with an external implementation.
    pub fn with_filter_pipeline(
        mut self,
        filters: Box<dyn FilterPipeline + Send + Sync>,
    ) -> Self {
        self.filters = filters;
        self
    }

    /// Inspect one frame against the taught collection.
    pub fn inspect(&self, frame: &RgbImage, store: &RegionStore) -> InspectionReport {
        let run_start = Instant::now();
        let mut result = InspectionResult::empty();
        let mut trace = RunTrace {
            frame_width: frame.width(),
            frame_height: frame.height(),
            ..RunTrace::default()
        };

        let t = Instant::now();
        let classes = classify(store);
        trace.rois = classes.rois.len();
        trace.fids = classes.fids.len();
        trace.inss = classes.inss.len();
        trace.timings.push("classify", ms(t));

        let t = Instant::now();
        let scopes = group_rois(store, &classes);
        trace.timings.push("group_rois", ms(t));

        let t = Instant::now();
        let gray = to_gray(frame);
        let mut matches: BTreeMap<RegionId, FidMatch> = BTreeMap::new();
        for &fid_id in &classes.fids {
            let Some(fid) = store.get(fid_id) else { continue };
            if !scopes
                .get(&fid_id)
                .map(|s| s.admits(fid.rect.center()))
                .unwrap_or(false)
            {
                debug!("fid {fid_id:?}: outside its group ROI, skipped");
                trace.skipped.push(SkipRecord {
                    id: fid_id,
                    reason: SkipReason::OutsideRoi,
                });
                continue;
            }
            let m = match_fiducial(&gray, fid, store);
            result.fid_results.insert(fid_id, m.matched);
            result.scores.insert(fid_id, m.score);
            result.angles.insert(fid_id, m.angle);
            result.locations.insert(fid_id, m.center);
            result
                .adjusted_rects
                .insert(fid_id, fid.rect.centered_at(m.center));
            matches.insert(fid_id, m);
        }
        trace.timings.push("match_fiducials", ms(t));

        let t = Instant::now();
        let mut placements: BTreeMap<RegionId, DerivedPlacement> = BTreeMap::new();
        for (&fid_id, m) in &matches {
            let Some(fid) = store.get(fid_id) else { continue };
            let taught = Pose {
                center: fid.rect.center(),
                angle: fid.angle,
            };
            let detected = Pose {
                center: m.center,
                angle: m.angle,
            };
            for p in propagate(store, fid_id, taught, detected, m.score) {
                placements.insert(p.id, p);
            }
        }
        trace.timings.push("propagate", ms(t));

        let t = Instant::now();
        let frame_rect = Rect::new(0.0, 0.0, frame.width() as f32, frame.height() as f32);
        for &ins_id in &classes.inss {
            let Some(region) = store.get(ins_id) else { continue };
            let RegionKind::Ins(ins) = &region.kind else { continue };

            if let Some(fid) = store.find_ancestor(ins_id, |r| r.kind.is_fid()) {
                if fid.enabled && !matches.get(&fid.id).map(|m| m.matched).unwrap_or(false) {
                    trace.skipped.push(SkipRecord {
                        id: ins_id,
                        reason: SkipReason::ParentFidUnmatched,
                    });
                    continue;
                }
            }

            let (rect, angle) = match placements.get(&ins_id) {
                Some(p) => (p.rect, p.angle),
                None => (region.rect, region.angle),
            };
            let center = rect.center();
            if !scopes
                .get(&ins_id)
                .map(|s| s.admits(center))
                .unwrap_or(false)
            {
                trace.skipped.push(SkipRecord {
                    id: ins_id,
                    reason: SkipReason::OutsideRoi,
                });
                continue;
            }
            if !frame_rect.contains(center) {
                trace.skipped.push(SkipRecord {
                    id: ins_id,
                    reason: SkipReason::OutsideImage,
                });
                continue;
            }
            result.adjusted_rects.insert(ins_id, rect);
            result.angles.insert(ins_id, angle);

            if region.has_mask_filter() {
                result.ins_results.insert(ins_id, true);
                trace.skipped.push(SkipRecord {
                    id: ins_id,
                    reason: SkipReason::MaskFiltered,
                });
                continue;
            }

            // The external filter stack only participates in the COLOR and
            // EDGE methods.
            let filterable = matches!(
                ins.method,
                InspectionMethod::Color | InspectionMethod::Edge
            );
            let measurement = if self.params.apply_filters && filterable && has_active_filters(region)
            {
                let mut work = frame.clone();
                self.filters.apply_filters(&mut work, &region.filters, rect);
                let work_gray = to_gray(&work);
                check_region(&work, &work_gray, region, ins, rect, angle)
            } else {
                check_region(frame, &gray, region, ins, rect, angle)
            };
            result.ins_results.insert(ins_id, measurement.passed);
            result.scores.insert(ins_id, measurement.score);
            if let Some(strip) = measurement.strip {
                result.strip.insert(ins_id, strip);
            }
        }
        trace.timings.push("measure", ms(t));

        result.is_passed = result.fid_results.values().all(|&v| v)
            && result.ins_results.values().all(|&v| v);
        trace.timings.total_ms = ms(run_start);
        info!(
            "inspection: {} fid(s), {} ins measured, {} skipped, passed={} in {:.1} ms",
            matches.len(),
            result.ins_results.len(),
            trace.skipped.len(),
            result.is_passed,
            trace.timings.total_ms
        );
        InspectionReport { result, trace }
    }
}

fn ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1e3
}

fn has_active_filters(region: &Region) -> bool {
    region.filters.iter().any(|f| f.enabled && !f.kind.is_mask())
}

fn classify(store: &RegionStore) -> Classified {
    let mut classes = Classified {
        rois: Vec::new(),
        fids: Vec::new(),
        inss: Vec::new(),
    };
    for region in store.iter().filter(|r| r.enabled) {
        match region.kind {
            RegionKind::Roi { .. } => classes.rois.push(region.id),
            RegionKind::Fid(_) => classes.fids.push(region.id),
            RegionKind::Ins(_) => classes.inss.push(region.id),
            RegionKind::FilterGroup => {}
        }
    }
    classes
}

/// Resolve the measurement scope of every FID and INS region.
///
/// A linked ROI ancestor wins; otherwise the region falls back to a
/// whole-frame ROI when one exists, then to the first ROI geometrically
/// containing its taught centre. With no enabled ROI at all the recipe is
/// unbounded and everything is in scope; with ROIs present, a region none of
/// them covers is excluded.
fn group_rois(store: &RegionStore, classes: &Classified) -> BTreeMap<RegionId, Scope> {
    let roi_scope = |roi: &Region| match roi.kind {
        RegionKind::Roi { whole_frame: true } => Scope::WholeFrame,
        _ => Scope::Bounds(roi.rect),
    };
    let any_whole_frame = classes.rois.iter().any(|&id| {
        matches!(
            store.get(id).map(|r| &r.kind),
            Some(RegionKind::Roi { whole_frame: true })
        )
    });

    let mut scopes = BTreeMap::new();
    for &id in classes.fids.iter().chain(classes.inss.iter()) {
        let Some(region) = store.get(id) else { continue };
        let scope = if let Some(roi) = store.find_ancestor(id, |r| r.kind.is_roi() && r.enabled)
        {
            roi_scope(roi)
        } else if classes.rois.is_empty() || any_whole_frame {
            Scope::WholeFrame
        } else {
            classes
                .rois
                .iter()
                .filter_map(|&rid| store.get(rid))
                .find(|roi| roi.rect.contains(region.rect.center()))
                .map(roi_scope)
                .unwrap_or(Scope::Excluded)
        };
        scopes.insert(id, scope);
    }
    scopes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{
        FidParams, FilterDescriptor, FilterKind, InsParams, InspectionMethod, BinarizeSpec,
        CompareMode,
    };
    use image::Rgb;

    fn whole_frame_roi(id: u32) -> Region {
        Region::new(
            RegionId(id),
            RegionKind::Roi { whole_frame: true },
            Rect::new(0.0, 0.0, 1.0, 1.0),
        )
    }

    fn binary_ins(id: u32, rect: Rect) -> Region {
        Region::new(
            RegionId(id),
            RegionKind::Ins(InsParams {
                method: InspectionMethod::Binary,
                pass_threshold: 0.5,
                compare: CompareMode::AtLeast,
                binarize: BinarizeSpec::Fixed { level: 100 },
                ..InsParams::default()
            }),
            rect,
        )
    }

    #[test]
    fn empty_recipe_passes() {
        let frame = RgbImage::from_pixel(64, 64, Rgb([90u8, 90, 90]));
        let report = Inspector::new(InspectParams::default()).inspect(&frame, &RegionStore::new());
        assert!(report.result.is_passed);
        assert!(report.result.ins_results.is_empty());
        assert!(report.trace.skipped.is_empty());
    }

    #[test]
    fn bright_block_passes_binary_check() {
        let mut frame = RgbImage::from_pixel(100, 100, Rgb([20u8, 20, 20]));
        for y in 30..60 {
            for x in 30..70 {
                frame.put_pixel(x, y, Rgb([220u8, 220, 220]));
            }
        }
        let mut store = RegionStore::new();
        store.insert(whole_frame_roi(1));
        store.insert(binary_ins(2, Rect::from_corners(32.0, 32.0, 68.0, 58.0)));
        store.attach(RegionId(1), RegionId(2));

        let report = Inspector::new(InspectParams::default()).inspect(&frame, &store);
        assert!(report.result.is_passed);
        assert_eq!(report.result.ins_results.get(&RegionId(2)), Some(&true));
        assert!(report.result.scores[&RegionId(2)] > 0.9);
        assert_eq!(
            report.result.adjusted_rects[&RegionId(2)].center(),
            [50.0, 45.0]
        );
    }

    #[test]
    fn mask_filter_forces_pass_without_measurement() {
        let frame = RgbImage::from_pixel(80, 80, Rgb([10u8, 10, 10]));
        let mut store = RegionStore::new();
        store.insert(whole_frame_roi(1));
        let mut ins = binary_ins(2, Rect::new(10.0, 10.0, 20.0, 20.0));
        ins.filters.push(FilterDescriptor {
            kind: FilterKind::Mask,
            enabled: true,
            params: Default::default(),
        });
        store.insert(ins);
        store.attach(RegionId(1), RegionId(2));

        let report = Inspector::new(InspectParams::default()).inspect(&frame, &store);
        assert!(report.result.is_passed);
        assert_eq!(report.result.ins_results.get(&RegionId(2)), Some(&true));
        assert!(!report.result.scores.contains_key(&RegionId(2)));
        assert!(report
            .trace
            .skipped
            .iter()
            .any(|s| s.id == RegionId(2) && s.reason == SkipReason::MaskFiltered));
    }

    #[test]
    fn unmatched_fiducial_excludes_its_group() {
        let frame = RgbImage::from_pixel(120, 120, Rgb([128u8, 128, 128]));
        let mut store = RegionStore::new();
        store.insert(whole_frame_roi(1));
        // No reference snapshot, so this fiducial can never match.
        store.insert(Region::new(
            RegionId(2),
            RegionKind::Fid(FidParams::default()),
            Rect::new(20.0, 20.0, 24.0, 24.0),
        ));
        store.insert(binary_ins(3, Rect::new(60.0, 20.0, 24.0, 24.0)));
        store.attach(RegionId(1), RegionId(2));
        store.attach(RegionId(2), RegionId(3));

        let report = Inspector::new(InspectParams::default()).inspect(&frame, &store);
        assert!(!report.result.is_passed);
        assert_eq!(report.result.fid_results.get(&RegionId(2)), Some(&false));
        // The taught angle of the failed fiducial is still reported.
        assert_eq!(report.result.angles.get(&RegionId(2)), Some(&0.0));
        assert!(!report.result.ins_results.contains_key(&RegionId(3)));
        assert!(report
            .trace
            .skipped
            .iter()
            .any(|s| s.id == RegionId(3) && s.reason == SkipReason::ParentFidUnmatched));
    }

    #[test]
    fn region_outside_bounded_roi_is_skipped() {
        let frame = RgbImage::from_pixel(100, 100, Rgb([200u8, 200, 200]));
        let mut store = RegionStore::new();
        store.insert(Region::new(
            RegionId(1),
            RegionKind::Roi { whole_frame: false },
            Rect::new(0.0, 0.0, 50.0, 50.0),
        ));
        store.insert(binary_ins(2, Rect::new(70.0, 70.0, 20.0, 20.0)));
        store.attach(RegionId(1), RegionId(2));

        let report = Inspector::new(InspectParams::default()).inspect(&frame, &store);
        assert!(!report.result.ins_results.contains_key(&RegionId(2)));
        assert!(report
            .trace
            .skipped
            .iter()
            .any(|s| s.id == RegionId(2) && s.reason == SkipReason::OutsideRoi));
        // Nothing measured, nothing failed.
        assert!(report.result.is_passed);
    }
}
