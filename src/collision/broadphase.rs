//! Coarse candidate-pair generation over a uniform hash grid.
//!
//! The grid is rebuilt from scratch every step: each object's world AABB is
//! clamped into the world bounds and registered in every cell it touches,
//! then pairs are read off per cell, filtered by group/mask, and deduped.

use ahash::{AHashMap, AHashSet};
use glam::{IVec3, Vec3A};

use crate::math::Aabb;
use crate::object::ObjectKind;

#[repr(u8)]
pub(crate) enum CollisionFilterGroups {
    Default = 1,
    Static = 1 << 1,
    Sensor = 1 << 2,
}

const ALL_FILTER: u8 = u8::MAX;

/// Group and mask for an object kind. Static-ish kinds mask each other out,
/// so pairs of {static, kinematic} objects are never even candidates.
pub(crate) const fn filter_for_kind(kind: ObjectKind) -> (u8, u8) {
    match kind {
        ObjectKind::Dynamic => (CollisionFilterGroups::Default as u8, ALL_FILTER),
        ObjectKind::Static | ObjectKind::Kinematic => (
            CollisionFilterGroups::Static as u8,
            ALL_FILTER ^ CollisionFilterGroups::Static as u8,
        ),
        ObjectKind::Trigger => (CollisionFilterGroups::Sensor as u8, ALL_FILTER),
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BroadphaseProxy {
    /// Slot of the client object in the world's object table.
    pub client_slot: u32,
    pub aabb: Aabb,
    pub collision_filter_group: u8,
    pub collision_filter_mask: u8,
}

#[inline]
fn needs_collision(a: &BroadphaseProxy, b: &BroadphaseProxy) -> bool {
    (a.collision_filter_group & b.collision_filter_mask) != 0
        && (b.collision_filter_group & a.collision_filter_mask) != 0
}

pub(crate) struct Broadphase {
    bounds: Aabb,
    cell_size: f32,
    proxies: Vec<BroadphaseProxy>,
    cells: AHashMap<IVec3, Vec<u32>>,
}

impl Broadphase {
    #[must_use]
    pub fn new(min_pos: Vec3A, max_pos: Vec3A, cell_size: f32) -> Self {
        debug_assert!(min_pos.cmple(max_pos).all(), "invalid world bounds");
        debug_assert!(cell_size > 0.0);

        Self {
            bounds: Aabb::new(min_pos, max_pos),
            cell_size,
            proxies: Vec::with_capacity(32),
            cells: AHashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.proxies.clear();
        for handles in self.cells.values_mut() {
            handles.clear();
        }
    }

    fn cell_indices(&self, pos: Vec3A) -> IVec3 {
        ((pos - self.bounds.min) / self.cell_size).floor().as_ivec3()
    }

    pub fn add_proxy(&mut self, proxy: BroadphaseProxy) {
        let clamped = proxy.aabb.clamped(&self.bounds);
        let min = self.cell_indices(clamped.min);
        let max = self.cell_indices(clamped.max);

        let proxy_idx = self.proxies.len() as u32;
        self.proxies.push(proxy);

        for i in min.x..=max.x {
            for j in min.y..=max.y {
                for k in min.z..=max.z {
                    self.cells
                        .entry(IVec3::new(i, j, k))
                        .or_default()
                        .push(proxy_idx);
                }
            }
        }
    }

    /// Candidate object-slot pairs: proxies sharing a cell whose filters
    /// admit each other and whose AABBs overlap. Sorted so downstream
    /// processing order does not depend on hash iteration order.
    #[must_use]
    pub fn overlapping_pairs(&self) -> Vec<(u32, u32)> {
        let mut seen = AHashSet::new();
        let mut pairs = Vec::new();

        for handles in self.cells.values() {
            for (i, &a_idx) in handles.iter().enumerate() {
                for &b_idx in &handles[i + 1..] {
                    let a = &self.proxies[a_idx as usize];
                    let b = &self.proxies[b_idx as usize];

                    if !needs_collision(a, b) || !a.aabb.overlaps(&b.aabb) {
                        continue;
                    }

                    let key = (
                        a.client_slot.min(b.client_slot),
                        a.client_slot.max(b.client_slot),
                    );
                    if seen.insert(key) {
                        pairs.push(key);
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs
    }
}
