//! Filter descriptors and the external filter-pipeline seam.
//!
//! The engine never implements filter primitives itself; it hands the live
//! frame plus the region's descriptor list to a [`FilterPipeline`]
//! collaborator before COLOR/EDGE measurement.

use crate::geom::Rect;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed set of filter operations known to the teaching UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    Blur,
    Threshold,
    Canny,
    Sobel,
    Brightness,
    Contrast,
    /// Masks the region out of measurement; such regions pass without being
    /// measured.
    Mask,
}

impl FilterKind {
    #[inline]
    pub fn is_mask(&self) -> bool {
        matches!(self, FilterKind::Mask)
    }
}

/// Plain value object describing one filter application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub kind: FilterKind,
    pub enabled: bool,
    /// Named integer parameters, e.g. `kernel` or `level`.
    pub params: BTreeMap<String, i32>,
}

impl FilterDescriptor {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            enabled: true,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: i32) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }
}

/// External collaborator applying an ordered filter list to a sub-rectangle
/// of a frame, in place.
pub trait FilterPipeline {
    fn apply_filters(&self, image: &mut RgbImage, filters: &[FilterDescriptor], sub_rect: Rect);
}

/// Pipeline that applies nothing; used when the caller has no filter stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopFilterPipeline;

impl FilterPipeline for NoopFilterPipeline {
    fn apply_filters(&self, _image: &mut RgbImage, _filters: &[FilterDescriptor], _sub_rect: Rect) {}
}
