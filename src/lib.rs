#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod inspect;
pub mod recipe;
pub mod transform;

// “Expert” modules – still public, but considered unstable internals.
pub mod angle;
pub mod geom;
pub mod matcher;
pub mod measure;
pub mod raster;
pub mod strip;

// --- High-level re-exports -------------------------------------------------

// Main entry points: inspector + results.
pub use crate::inspect::{InspectParams, InspectionReport, InspectionResult, Inspector};
pub use crate::recipe::{Region, RegionId, RegionKind, RegionStore};

// Structured run diagnostics returned alongside the result.
pub use crate::inspect::{RunTrace, SkipReason, TimingBreakdown};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use aoi_inspect::prelude::*;
///
/// let store = RegionStore::new();
/// let frame = image::RgbImage::new(640, 480);
///
/// let inspector = Inspector::new(InspectParams::default());
/// let report = inspector.inspect(&frame, &store);
/// println!(
///     "passed={} in {:.2} ms",
///     report.result.is_passed, report.trace.timings.total_ms
/// );
/// ```
pub mod prelude {
    pub use crate::geom::Rect;
    pub use crate::recipe::{Region, RegionId, RegionKind, RegionStore};
    pub use crate::{InspectParams, InspectionReport, InspectionResult, Inspector};
}
