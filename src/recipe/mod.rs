//! Taught recipe data: regions, their grouping links and filter descriptors.
//!
//! A recipe is a flat collection of [`Region`]s with optional parent/child
//! links encoding ROI→FID→INS and FID→INS grouping. The engine consumes the
//! collection read-only; teaching and persistence live outside this crate.

mod filters;
mod region;
mod store;

pub use filters::{FilterDescriptor, FilterKind, FilterPipeline, NoopFilterPipeline};
pub use region::{
    BinarizeSpec, CompareMode, FidParams, InsParams, InspectionMethod, MatchMethod, Region,
    RegionId, RegionKind, StripParams, ThicknessZone,
};
pub use store::RegionStore;
