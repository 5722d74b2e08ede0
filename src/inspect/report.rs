//! Inspection run output: verdicts, detected geometry and the stage trace.
//!
//! All per-region data lives in maps keyed by region id; an absent key
//! always means "not applicable for this run", never zero.

use crate::geom::Rect;
use crate::recipe::RegionId;
use crate::strip::StripOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a region took no part in measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Centre outside the group ROI.
    OutsideRoi,
    /// Centre outside the frame after propagation.
    OutsideImage,
    /// The fiducial this region is grouped under did not match.
    ParentFidUnmatched,
    /// An enabled mask filter forces the region to pass unmeasured.
    MaskFiltered,
}

/// One skipped region and the rule that excluded it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    pub id: RegionId,
    pub reason: SkipReason,
}

/// Result of one inspection run. Immutable once returned; overlay renderers
/// consume it read-only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InspectionResult {
    /// Conjunction of every FID and INS verdict; trivially true for a run
    /// with no checks.
    pub is_passed: bool,
    pub fid_results: BTreeMap<RegionId, bool>,
    pub ins_results: BTreeMap<RegionId, bool>,
    pub scores: BTreeMap<RegionId, f64>,
    /// Detected (FID) or derived (INS) working angle, degrees.
    pub angles: BTreeMap<RegionId, f32>,
    /// Detected template centres for FID regions.
    pub locations: BTreeMap<RegionId, [f32; 2]>,
    /// Post-propagation working rects.
    pub adjusted_rects: BTreeMap<RegionId, Rect>,
    /// Strip diagnostics for STRIP-method regions.
    pub strip: BTreeMap<RegionId, StripOutcome>,
}

impl InspectionResult {
    pub fn empty() -> Self {
        Self {
            is_passed: true,
            ..Self::default()
        }
    }
}

/// Wall-clock timing of one pipeline stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed_ms: f64,
}

/// Stage timings plus the run total.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, stage: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming {
            stage: stage.into(),
            elapsed_ms,
        });
    }
}

/// Structured diagnostics of one run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunTrace {
    pub frame_width: u32,
    pub frame_height: u32,
    pub rois: usize,
    pub fids: usize,
    pub inss: usize,
    pub skipped: Vec<SkipRecord>,
    pub timings: TimingBreakdown,
}

/// Result plus trace, the full return of an inspection call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InspectionReport {
    pub result: InspectionResult,
    pub trace: RunTrace,
}
