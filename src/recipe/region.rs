//! Region types: one taught inspection primitive per [`Region`].

use super::filters::FilterDescriptor;
use crate::geom::Rect;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Opaque unique region identifier, assigned by the teaching layer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RegionId(pub u32);

/// Template-vs-feature selector for fiducial matching.
///
/// Feature matching is delegated to an external pipeline; the built-in
/// matcher treats it as the template path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    Template,
    Feature,
}

/// Fiducial matching parameters. Rotation bounds are relative to the
/// teach-time angle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FidParams {
    pub method: MatchMethod,
    /// Minimum correlation score for a successful match.
    pub match_threshold: f64,
    pub use_rotation: bool,
    /// Lower rotation bound in degrees, relative to the teach angle.
    pub min_angle: f32,
    /// Upper rotation bound in degrees, relative to the teach angle.
    pub max_angle: f32,
    /// Coarse search step in degrees.
    pub angle_step: f32,
}

impl Default for FidParams {
    fn default() -> Self {
        Self {
            method: MatchMethod::Template,
            match_threshold: 0.7,
            use_rotation: false,
            min_angle: -10.0,
            max_angle: 10.0,
            angle_step: 5.0,
        }
    }
}

/// Measurement method for an inspection region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionMethod {
    Color,
    Edge,
    Binary,
    Strip,
    AiMatch1,
}

/// How a measured score is compared against the pass threshold(s).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CompareMode {
    /// Pass when `score >= threshold`. A score exactly at the threshold passes.
    AtLeast,
    /// Pass when `score <= threshold`.
    AtMost,
    /// Pass when `lo <= score <= hi`.
    InRange { lo: f64, hi: f64 },
}

impl CompareMode {
    /// Evaluate `score` against `threshold` under this mode.
    pub fn accepts(&self, score: f64, threshold: f64) -> bool {
        match *self {
            CompareMode::AtLeast => score >= threshold,
            CompareMode::AtMost => score <= threshold,
            CompareMode::InRange { lo, hi } => score >= lo && score <= hi,
        }
    }
}

/// Binarization used by the BINARY method and reference comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinarizeSpec {
    /// Fixed global threshold; pixels above `level` are "on".
    Fixed { level: u8 },
    /// Automatic global threshold (Otsu).
    Auto,
    /// Adaptive mean threshold over a square window of `block_radius`.
    AdaptiveMean { block_radius: u32 },
}

impl Default for BinarizeSpec {
    fn default() -> Self {
        BinarizeSpec::Auto
    }
}

/// One strip thickness-measurement zone: a sampling box and the accepted
/// thickness range in pixels.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ThicknessZone {
    pub box_width: u32,
    pub box_height: u32,
    pub min_thickness: f32,
    pub max_thickness: f32,
}

impl Default for ThicknessZone {
    fn default() -> Self {
        Self {
            box_width: 10,
            box_height: 60,
            min_thickness: 2.0,
            max_thickness: 60.0,
        }
    }
}

/// Geometry and thresholds for the strip contour analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StripParams {
    /// Start of the gradient-interesting range, percent of the taught width.
    pub gradient_start_percent: f32,
    /// End of the gradient-interesting range, percent of the taught width.
    pub gradient_end_percent: f32,
    /// Minimum absolute thickness gradient kept by the scan.
    pub gradient_threshold: f32,
    /// Intensity level separating object from background during thickness
    /// run classification.
    pub intensity_threshold: u8,
    /// Maximum intensity deviation from the seed pixel tolerated while
    /// walking outward at the peak-gradient point.
    pub intensity_delta: u8,
    /// Two thickness-measurement zones at fixed fractional positions.
    pub zones: [ThicknessZone; 2],
}

impl Default for StripParams {
    fn default() -> Self {
        Self {
            gradient_start_percent: 20.0,
            gradient_end_percent: 80.0,
            gradient_threshold: 4.0,
            intensity_threshold: 100,
            intensity_delta: 40,
            zones: [ThicknessZone::default(), ThicknessZone::default()],
        }
    }
}

/// Inspection-region parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsParams {
    pub method: InspectionMethod,
    pub pass_threshold: f64,
    pub compare: CompareMode,
    /// Flip the final verdict of this region.
    pub invert_result: bool,
    pub binarize: BinarizeSpec,
    pub strip: StripParams,
}

impl Default for InsParams {
    fn default() -> Self {
        Self {
            method: InspectionMethod::Color,
            pass_threshold: 0.8,
            compare: CompareMode::AtLeast,
            invert_result: false,
            binarize: BinarizeSpec::default(),
            strip: StripParams::default(),
        }
    }
}

/// Kind-specific payload of a region.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RegionKind {
    /// Region of interest bounding which FID/INS regions are in scope.
    Roi {
        /// When set the ROI covers the whole frame regardless of its rect.
        whole_frame: bool,
    },
    /// Fiducial marker used for alignment only.
    Fid(FidParams),
    /// Inspection region, measured and judged pass/fail.
    Ins(InsParams),
    /// Inert marker consumed by the external filter pipeline.
    FilterGroup,
}

impl RegionKind {
    pub fn is_roi(&self) -> bool {
        matches!(self, RegionKind::Roi { .. })
    }
    pub fn is_fid(&self) -> bool {
        matches!(self, RegionKind::Fid(_))
    }
    pub fn is_ins(&self) -> bool {
        matches!(self, RegionKind::Ins(_))
    }
}

/// One taught inspection primitive.
///
/// `rect` and `angle` are teach-time values and are never mutated by an
/// inspection run; detected/derived geometry lives in the run's result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub kind: RegionKind,
    /// Teach-time rect, unrotated.
    pub rect: Rect,
    /// Teach-time rotation in degrees.
    pub angle: f32,
    pub parent: Option<RegionId>,
    pub children: Vec<RegionId>,
    /// Disabled regions are excluded from inspection entirely.
    pub enabled: bool,
    pub filters: Vec<FilterDescriptor>,
    /// Raster snapshot captured at teach time. Required for FID matching and
    /// the COLOR/BINARY/EDGE comparison methods. Persisted out of band.
    #[serde(skip)]
    pub reference: Option<RgbImage>,
}

impl Region {
    /// Fresh region with no links, enabled, angle 0.
    pub fn new(id: RegionId, kind: RegionKind, rect: Rect) -> Self {
        Self {
            id,
            kind,
            rect,
            angle: 0.0,
            parent: None,
            children: Vec::new(),
            enabled: true,
            filters: Vec::new(),
            reference: None,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_reference(mut self, reference: RgbImage) -> Self {
        self.reference = Some(reference);
        self
    }

    /// True when any enabled attached filter is a mask filter.
    pub fn has_mask_filter(&self) -> bool {
        self.filters.iter().any(|f| f.enabled && f.kind.is_mask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::filters::{FilterDescriptor, FilterKind};

    #[test]
    fn score_exactly_at_threshold_passes() {
        assert!(CompareMode::AtLeast.accepts(0.8, 0.8));
        assert!(!CompareMode::AtLeast.accepts(0.7999, 0.8));
        assert!(CompareMode::AtMost.accepts(0.8, 0.8));
        assert!(!CompareMode::AtMost.accepts(0.8001, 0.8));
    }

    #[test]
    fn in_range_is_inclusive_on_both_ends() {
        let mode = CompareMode::InRange { lo: 0.2, hi: 0.6 };
        assert!(mode.accepts(0.2, 0.0));
        assert!(mode.accepts(0.6, 0.0));
        assert!(!mode.accepts(0.61, 0.0));
    }

    #[test]
    fn disabled_mask_filter_does_not_mask() {
        let mut region = Region::new(
            RegionId(1),
            RegionKind::Ins(InsParams::default()),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        let mut mask = FilterDescriptor::new(FilterKind::Mask);
        mask.enabled = false;
        region.filters.push(mask);
        assert!(!region.has_mask_filter());

        region.filters.push(FilterDescriptor::new(FilterKind::Mask));
        assert!(region.has_mask_filter());
    }
}
