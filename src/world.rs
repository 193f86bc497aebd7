use glam::Vec2;

use std::collections::{HashMap, HashSet};

use crate::api::{MovingWorld, NarrowphaseApi, ObstacleWorldApi, ShapeQuery};
use crate::config::WorldConfig;
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// Ephemeral obstacle world answering swept-shape casts.
///
/// Obstacles are pushed between `begin_frame` and `end_frame`, which bins
/// them into a uniform grid; casts then only visit the cells their swept
/// bounds cover.
pub struct CollisionWorld {
    pub cfg: WorldConfig,
    pub frame_counter: u32,

    // Frame-local storage
    entries: Vec<ColliderDesc>,
    by_key: HashMap<ColKey, Vec<usize>>,

    // Uniform grid: cell coord -> list of indices into `entries`
    grid: HashMap<(i32, i32), Vec<usize>>,
}

impl ObstacleWorldApi for CollisionWorld {
    fn new(cfg: WorldConfig) -> Self {
        Self {
            cfg,
            frame_counter: 0,
            entries: Vec::new(),
            by_key: HashMap::new(),
            grid: HashMap::new(),
        }
    }

    fn begin_frame(&mut self) {
        self.entries.clear();
        self.by_key.clear();
        self.grid.clear();
        self.frame_counter = self.frame_counter.wrapping_add(1);
    }

    fn push(&mut self, desc: ColliderDesc) -> FrameId {
        let id = FrameId(self.entries.len() as u32);
        if let Some(key) = desc.user_key {
            self.by_key.entry(key).or_default().push(self.entries.len());
        }
        self.entries.push(desc);
        id
    }

    fn push_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        mask: LayerMask,
        user_key: Option<ColKey>,
    ) -> FrameId {
        self.push(ColliderDesc { kind: ColliderKind::Circle { radius }, center, mask, user_key })
    }

    fn push_aabb(
        &mut self,
        center: Vec2,
        half_extents: Vec2,
        mask: LayerMask,
        user_key: Option<ColKey>,
    ) -> FrameId {
        self.push(ColliderDesc { kind: ColliderKind::Aabb { half_extents }, center, mask, user_key })
    }

    fn push_point(&mut self, p: Vec2, mask: LayerMask, user_key: Option<ColKey>) -> FrameId {
        self.push(ColliderDesc { kind: ColliderKind::Point, center: p, mask, user_key })
    }

    fn end_frame(&mut self) {
        self.grid.clear();
        for idx in 0..self.entries.len() {
            let (min, max) = self.bounds(idx);
            self.insert_into_grid(idx, min, max);
        }
        log::debug!(
            "frame {}: binned {} obstacles into {} cells",
            self.frame_counter,
            self.entries.len(),
            self.grid.len()
        );
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl ShapeQuery for CollisionWorld {
    fn cast(
        &self,
        shape: ColliderKind,
        pose: Pose,
        direction: Vec2,
        distance: f32,
        filter: CastFilter,
        out: &mut HitBuffer,
    ) -> usize {
        out.clear();
        let dir = direction.normalize_or_zero();
        let distance = if dir == Vec2::ZERO { 0.0 } else { distance.max(0.0) };
        let motion = dir * distance;
        let shape = solid(shape.rotated(pose.rotation));
        let origin = pose.position;

        let half = shape.half_extents();
        let end = origin + motion;
        let (ix0, iy0) = self.world_to_cell(origin.min(end) - half);
        let (ix1, iy1) = self.world_to_cell(origin.max(end) + half);
        let mut test = |idx: usize| {
            let e = &self.entries[idx];
            if !filter.admits(e) {
                return;
            }
            if let Some(hit) = Self::cast_entry(shape, origin, dir, distance, e) {
                out.offer(CastHit {
                    id: FrameId(idx as u32),
                    user_key: e.user_key,
                    point: hit.contact,
                    centroid: origin + dir * hit.toi * distance,
                    normal: hit.normal,
                    distance: hit.toi * distance,
                    fraction: hit.toi,
                });
            }
        };

        // Long sweeps cover more cells than there are obstacles
        if self.cell_count((ix0, iy0), (ix1, iy1)) > self.entries.len() as u64 {
            (0..self.entries.len()).for_each(&mut test);
        } else {
            let mut seen = HashSet::new();
            for iy in iy0..=iy1 { for ix in ix0..=ix1 {
                let Some(list) = self.grid.get(&(ix, iy)) else { continue };
                for &idx in list {
                    if seen.insert(idx) {
                        test(idx);
                    }
                }
            }}
        }
        out.len()
    }
}

impl MovingWorld for CollisionWorld {
    fn relocate(&mut self, key: ColKey, position: Vec2) -> usize {
        let Some(indices) = self.by_key.get(&key) else {
            return 0;
        };
        let indices = indices.clone();
        for &idx in &indices {
            let (min, max) = self.bounds(idx);
            self.remove_from_grid(idx, min, max);
            self.entries[idx].center = position;
            let (min, max) = self.bounds(idx);
            self.insert_into_grid(idx, min, max);
        }
        indices.len()
    }
}

/// Points behave as zero-radius circles in every test.
fn solid(kind: ColliderKind) -> ColliderKind {
    match kind {
        ColliderKind::Point => ColliderKind::Circle { radius: 0.0 },
        other => other,
    }
}

impl CollisionWorld {
    /// Cast a solid `shape` from `origin` against one obstacle. `toi` is a
    /// fraction of `distance`.
    fn cast_entry(
        shape: ColliderKind,
        origin: Vec2,
        dir: Vec2,
        distance: f32,
        e: &ColliderDesc,
    ) -> Option<SweepHit> {
        let target = solid(e.kind);

        if let Some(ov) = Self::overlap(shape, origin, target, e.center) {
            // Already touching: block only motion that heads into the obstacle.
            if distance == 0.0 || ov.normal.dot(dir) < 0.0 {
                return Some(SweepHit { toi: 0.0, normal: ov.normal, contact: ov.contact });
            }
            return None;
        }
        if distance == 0.0 {
            return None;
        }

        let motion = dir * distance;
        match (shape, target) {
            (ColliderKind::Aabb { half_extents: h0 }, ColliderKind::Aabb { half_extents: h1 }) => {
                Narrowphase::sweep_aabb_aabb(origin, h0, motion, e.center, h1)
            }
            (ColliderKind::Circle { radius }, ColliderKind::Aabb { half_extents }) => {
                Narrowphase::sweep_circle_aabb(origin, radius, motion, e.center, half_extents)
            }
            (ColliderKind::Aabb { half_extents }, ColliderKind::Circle { radius }) => {
                Narrowphase::sweep_aabb_circle(origin, half_extents, motion, e.center, radius)
            }
            (ColliderKind::Circle { radius: r0 }, ColliderKind::Circle { radius: r1 }) => {
                Narrowphase::sweep_circle_circle(origin, r0, motion, e.center, r1)
            }
            _ => None,
        }
    }

    /// Overlap between the cast shape (A) and an obstacle (B); normal from B into A.
    fn overlap(a: ColliderKind, ca: Vec2, b: ColliderKind, cb: Vec2) -> Option<Overlap> {
        match (a, b) {
            (ColliderKind::Aabb { half_extents: h0 }, ColliderKind::Aabb { half_extents: h1 }) => {
                Narrowphase::overlap_aabb_aabb(ca, h0, cb, h1)
            }
            (ColliderKind::Circle { radius }, ColliderKind::Aabb { half_extents }) => {
                Narrowphase::overlap_circle_aabb(ca, radius, cb, half_extents)
            }
            (ColliderKind::Aabb { half_extents }, ColliderKind::Circle { radius }) => {
                let ov = Narrowphase::overlap_circle_aabb(cb, radius, ca, half_extents)?;
                Some(Overlap { normal: -ov.normal, depth: ov.depth, contact: ov.contact })
            }
            (ColliderKind::Circle { radius: r0 }, ColliderKind::Circle { radius: r1 }) => {
                Narrowphase::overlap_circle_circle(ca, r0, cb, r1)
            }
            _ => None,
        }
    }

    fn bounds(&self, idx: usize) -> (Vec2, Vec2) {
        let e = &self.entries[idx];
        let half = e.kind.half_extents();
        (e.center - half, e.center + half)
    }

    fn cell_count(&self, (ix0, iy0): (i32, i32), (ix1, iy1): (i32, i32)) -> u64 {
        let w = (i64::from(ix1) - i64::from(ix0) + 1).max(0) as u64;
        let h = (i64::from(iy1) - i64::from(iy0) + 1).max(0) as u64;
        w.saturating_mul(h)
    }

    fn remove_from_grid(&mut self, idx: usize, min: Vec2, max: Vec2) {
        let (ix0, iy0) = self.world_to_cell(min);
        let (ix1, iy1) = self.world_to_cell(max);
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                if let Some(list) = self.grid.get_mut(&(ix, iy)) {
                    list.retain(|&i| i != idx);
                    if list.is_empty() {
                        self.grid.remove(&(ix, iy));
                    }
                }
            }
        }
    }

    fn insert_into_grid(&mut self, idx: usize, min: Vec2, max: Vec2) {
        let (ix0, iy0) = self.world_to_cell(min);
        let (ix1, iy1) = self.world_to_cell(max);
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                self.grid.entry((ix, iy)).or_default().push(idx);
            }
        }
    }

    fn world_to_cell(&self, p: Vec2) -> (i32, i32) {
        let cs = self.cfg.cell_size.max(1e-5);
        ((p.x / cs).floor() as i32, (p.y / cs).floor() as i32)
    }

    /// Obstacle inserted this frame, if any.
    pub fn get(&self, id: FrameId) -> Option<&ColliderDesc> {
        self.entries.get(id.0 as usize)
    }

    /// Return debug stats for the current built frame.
    pub fn debug_stats(&self) -> WorldStats {
        WorldStats {
            entries: self.entries.len(),
            cells: self.grid.len(),
            cell_refs: self.grid.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALL: u32 = 1;

    fn world() -> CollisionWorld {
        CollisionWorld::new(WorldConfig { cell_size: 1.0 })
    }

    fn filter() -> CastFilter {
        CastFilter::new(LayerMask::simple(2, WALL), None)
    }

    fn unit_box() -> ColliderKind {
        ColliderKind::Aabb { half_extents: Vec2::splat(0.5) }
    }

    #[test]
    fn test_push_and_end_frame_grid_coverage() {
        let mut w = world();
        w.begin_frame();
        w.push_aabb(Vec2::ZERO, Vec2::splat(0.5), LayerMask::simple(WALL, 0), None);
        w.end_frame();
        // With floor indexing, bounds straddling origin cover 4 cells
        assert_eq!(w.grid.len(), 4);
        for k in [(-1, -1), (-1, 0), (0, -1), (0, 0)] {
            assert_eq!(w.grid[&k].len(), 1);
        }
        let stats = w.debug_stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.cell_refs, 4);
    }

    #[test]
    fn test_cast_reports_nearest_first() {
        let mut w = world();
        w.begin_frame();
        let mask = LayerMask::simple(WALL, 0);
        let far = w.push_aabb(Vec2::new(6.0, 0.0), Vec2::splat(0.5), mask, Some(2));
        let near = w.push_aabb(Vec2::new(3.0, 0.0), Vec2::splat(0.5), mask, Some(1));
        w.end_frame();

        let mut out = HitBuffer::with_capacity(4).unwrap();
        let n = w.cast(unit_box(), Pose::default(), Vec2::new(2.0, 0.0), 10.0, filter(), &mut out);
        assert_eq!(n, 2);
        let hits = out.as_slice();
        assert_eq!(hits[0].id, near);
        assert_eq!(hits[1].id, far);
        // Box edges meet after travelling 3 - 0.5 - 0.5
        assert!((hits[0].distance - 2.0).abs() < 1e-5);
        assert!((hits[0].fraction - 0.2).abs() < 1e-5);
        assert!((hits[0].centroid - Vec2::new(2.0, 0.0)).length() < 1e-5);
        assert!((hits[0].normal - Vec2::NEG_X).length() < 1e-5);
        assert!((hits[0].point.x - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_cast_respects_distance_and_capacity() {
        let mut w = world();
        w.begin_frame();
        let mask = LayerMask::simple(WALL, 0);
        w.push_aabb(Vec2::new(3.0, 0.0), Vec2::splat(0.5), mask, None);
        w.push_aabb(Vec2::new(6.0, 0.0), Vec2::splat(0.5), mask, None);
        w.end_frame();

        let mut out = HitBuffer::with_capacity(1).unwrap();
        assert_eq!(w.cast(unit_box(), Pose::default(), Vec2::X, 1.5, filter(), &mut out), 0);
        assert_eq!(w.cast(unit_box(), Pose::default(), Vec2::X, 10.0, filter(), &mut out), 1);
        assert!((out.as_slice()[0].distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_cast_filters_layers_and_own_key() {
        let mut w = world();
        w.begin_frame();
        w.push_aabb(Vec2::new(2.0, 0.0), Vec2::splat(0.5), LayerMask::simple(4, 0), None);
        w.push_aabb(Vec2::ZERO, Vec2::splat(0.5), LayerMask::simple(WALL, 0), Some(9));
        w.end_frame();

        let mut out = HitBuffer::with_capacity(4).unwrap();
        let own = CastFilter::new(LayerMask::simple(2, WALL), Some(9));
        assert_eq!(w.cast(unit_box(), Pose::default(), Vec2::X, 5.0, own, &mut out), 0);
        // Without the ignore key the caster overlaps its own collider
        assert_eq!(w.cast(unit_box(), Pose::default(), Vec2::ZERO, 0.0, filter(), &mut out), 1);
    }

    #[test]
    fn test_overlap_only_blocks_motion_into_obstacle() {
        let mut w = world();
        w.begin_frame();
        // Floor whose top sits at y = 0; box bottom sunk 0.1 into it
        w.push_aabb(Vec2::new(0.0, -0.5), Vec2::new(5.0, 0.5), LayerMask::simple(WALL, 0), None);
        w.end_frame();
        let pose = Pose::new(Vec2::new(0.0, 0.4), 0.0);

        let mut out = HitBuffer::with_capacity(1).unwrap();
        assert_eq!(w.cast(unit_box(), pose, Vec2::NEG_Y, 1.0, filter(), &mut out), 1);
        assert_eq!(out.as_slice()[0].distance, 0.0);
        assert!((out.as_slice()[0].normal - Vec2::Y).length() < 1e-5);
        assert_eq!(w.cast(unit_box(), pose, Vec2::Y, 1.0, filter(), &mut out), 0);
        assert_eq!(w.cast(unit_box(), pose, Vec2::X, 1.0, filter(), &mut out), 0);
    }

    #[test]
    fn test_rotated_box_overlaps_where_unrotated_does_not() {
        let mut w = world();
        w.begin_frame();
        w.push_aabb(Vec2::new(0.0, 1.5), Vec2::new(5.0, 0.5), LayerMask::simple(WALL, 0), None);
        w.end_frame();
        let plank = ColliderKind::Aabb { half_extents: Vec2::new(2.0, 0.25) };

        let mut out = HitBuffer::with_capacity(1).unwrap();
        let flat = Pose::new(Vec2::ZERO, 0.0);
        let upright = Pose::new(Vec2::ZERO, core::f32::consts::FRAC_PI_2);
        assert_eq!(w.cast(plank, flat, Vec2::ZERO, 0.0, filter(), &mut out), 0);
        assert_eq!(w.cast(plank, upright, Vec2::ZERO, 0.0, filter(), &mut out), 1);
    }

    #[test]
    fn test_box_cast_against_circle_and_point() {
        let mut w = world();
        w.begin_frame();
        let mask = LayerMask::simple(WALL, 0);
        w.push_circle(Vec2::new(0.0, -1.0), 1.0, mask, Some(1));
        w.push_point(Vec2::new(4.0, 3.0), mask, Some(2));
        w.end_frame();

        let mut out = HitBuffer::with_capacity(1).unwrap();
        let pose = Pose::new(Vec2::new(0.0, 3.0), 0.0);
        assert_eq!(w.cast(unit_box(), pose, Vec2::NEG_Y, 5.0, filter(), &mut out), 1);
        let hit = out.as_slice()[0];
        assert_eq!(hit.user_key, Some(1));
        assert!((hit.distance - 2.5).abs() < 1e-4);
        assert!((hit.normal - Vec2::Y).length() < 1e-4);

        assert_eq!(w.cast(unit_box(), pose, Vec2::X, 5.0, filter(), &mut out), 1);
        assert_eq!(out.as_slice()[0].user_key, Some(2));
        assert!((out.as_slice()[0].distance - 3.5).abs() < 1e-4);
    }

    #[test]
    fn test_begin_frame_clears_obstacles() {
        let mut w = world();
        w.begin_frame();
        w.push_point(Vec2::ZERO, LayerMask::simple(WALL, 0), None);
        w.end_frame();
        assert_eq!(w.len(), 1);
        w.begin_frame();
        w.end_frame();
        assert_eq!(w.len(), 0);
        assert_eq!(w.debug_stats().cells, 0);
    }

    #[test]
    fn test_relocate_moves_keyed_collider() {
        let mut w = world();
        w.begin_frame();
        let mask = LayerMask::simple(WALL, 0);
        w.push_aabb(Vec2::new(3.0, 0.0), Vec2::splat(0.5), mask, Some(5));
        w.push_aabb(Vec2::new(0.0, -5.0), Vec2::splat(0.5), mask, None);
        w.end_frame();

        assert_eq!(w.relocate(5, Vec2::new(6.0, 0.0)), 1);
        assert_eq!(w.relocate(77, Vec2::ZERO), 0);

        let mut out = HitBuffer::with_capacity(1).unwrap();
        assert_eq!(w.cast(unit_box(), Pose::default(), Vec2::X, 10.0, filter(), &mut out), 1);
        assert!((out.as_slice()[0].distance - 5.0).abs() < 1e-5);
        // Nothing is left behind in the old cells
        assert_eq!(w.cast(unit_box(), Pose::default(), Vec2::X, 3.0, filter(), &mut out), 0);
        assert_eq!(w.debug_stats().cell_refs, 8);
    }

    #[test]
    fn test_relocate_before_end_frame() {
        let mut w = world();
        w.begin_frame();
        w.push_circle(Vec2::ZERO, 0.5, LayerMask::simple(WALL, 0), Some(3));
        w.relocate(3, Vec2::new(0.0, 4.0));
        w.end_frame();

        let mut out = HitBuffer::with_capacity(1).unwrap();
        assert_eq!(w.cast(unit_box(), Pose::default(), Vec2::Y, 10.0, filter(), &mut out), 1);
        assert!((out.as_slice()[0].distance - 3.0).abs() < 1e-4);
        assert_eq!(w.get(FrameId(0)).map(|e| e.center), Some(Vec2::new(0.0, 4.0)));
    }

    #[test]
    fn test_long_diagonal_cast_scans_entries() {
        let mut w = world();
        w.begin_frame();
        w.push_aabb(Vec2::splat(700.0), Vec2::splat(0.5), LayerMask::simple(WALL, 0), Some(1));
        w.end_frame();
        assert!(w.cell_count((0, 0), (1000, 1000)) > w.len() as u64);
        assert_eq!(w.cell_count((2, 3), (2, 3)), 1);

        let mut out = HitBuffer::with_capacity(1).unwrap();
        let n = w.cast(unit_box(), Pose::default(), Vec2::ONE, 1500.0, filter(), &mut out);
        assert_eq!(n, 1);
        // Corner to corner along the diagonal: 699 units on each axis
        assert!((out.as_slice()[0].distance - 699.0 * 2f32.sqrt()).abs() < 1e-2);
    }
}
