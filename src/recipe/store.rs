//! Index-based arena holding the taught region collection.
//!
//! Parent/child links are mutated only through the helpers here, which keep
//! both directions symmetric: a child's `parent` always points at a region
//! that lists the child in `children`.

use super::region::{Region, RegionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Contiguous region storage plus an `id -> index` side map.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegionStore {
    regions: Vec<Region>,
    #[serde(skip)]
    index: HashMap<RegionId, usize>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the id map after deserialization.
    pub fn reindex(&mut self) {
        self.index = self
            .regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.index.get(&id).map(|&i| &self.regions[i])
    }

    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.index.get(&id).copied().map(move |i| &mut self.regions[i])
    }

    /// Insert a region. Any pre-set parent link is re-established through
    /// [`RegionStore::attach`] so both directions stay symmetric.
    pub fn insert(&mut self, mut region: Region) -> RegionId {
        let id = region.id;
        let parent = region.parent.take();
        region.children.retain(|c| self.index.contains_key(c));
        debug_assert!(
            !self.index.contains_key(&id),
            "duplicate region id {id:?}"
        );
        self.index.insert(id, self.regions.len());
        self.regions.push(region);
        if let Some(p) = parent {
            self.attach(p, id);
        }
        id
    }

    /// Link `child` under `parent`, detaching it from any previous parent.
    /// No-op when either id is unknown.
    pub fn attach(&mut self, parent: RegionId, child: RegionId) {
        if !self.index.contains_key(&parent) || !self.index.contains_key(&child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.get_mut(parent) {
            if !p.children.contains(&child) {
                p.children.push(child);
            }
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Remove `child`'s parent link, on both sides.
    pub fn detach(&mut self, child: RegionId) {
        let old_parent = self.get(child).and_then(|c| c.parent);
        if let Some(p) = old_parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
    }

    /// Remove a region. Its children are detached first so no child is left
    /// pointing at a dead parent.
    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let idx = *self.index.get(&id)?;
        for child in self.regions[idx].children.clone() {
            self.detach(child);
        }
        self.detach(id);
        let removed = self.regions.remove(idx);
        self.index.remove(&id);
        for (i, r) in self.regions.iter().enumerate().skip(idx) {
            self.index.insert(r.id, i);
        }
        Some(removed)
    }

    /// Walk parent links from `id` until a region matching `pred` is found.
    pub fn find_ancestor(
        &self,
        id: RegionId,
        pred: impl Fn(&Region) -> bool,
    ) -> Option<&Region> {
        let mut current = self.get(id)?.parent;
        while let Some(pid) = current {
            let region = self.get(pid)?;
            if pred(region) {
                return Some(region);
            }
            current = region.parent;
        }
        None
    }

    /// Ids of all INS regions transitively below `id` (through FID links).
    pub fn descendant_ins(&self, id: RegionId) -> Vec<RegionId> {
        let mut out = Vec::new();
        let mut stack = match self.get(id) {
            Some(r) => r.children.clone(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            if let Some(region) = self.get(next) {
                if region.kind.is_ins() {
                    out.push(region.id);
                }
                stack.extend(region.children.iter().copied());
            }
        }
        out
    }
}
