use glam::Vec2;

use crate::config::WorldConfig;
use crate::types::*;

/// Swept-shape query service consumed by kinematic bodies.
///
/// Object safe so riders can query through a `&dyn MovingWorld` from inside
/// a platform move.
pub trait ShapeQuery {
    /// Sweep `shape` at `pose` along `direction` for `distance` and fill `out`
    /// with the hits admitted by `filter`, nearest first. Returns the number
    /// of hits written.
    ///
    /// `direction` need not be normalized. A zero direction or zero distance
    /// is a pure overlap test at `pose` (all hits at distance 0).
    fn cast(
        &self,
        shape: ColliderKind,
        pose: Pose,
        direction: Vec2,
        distance: f32,
        filter: CastFilter,
        out: &mut HitBuffer,
    ) -> usize;
}

/// A query world whose keyed colliders can follow bodies that move mid-tick.
///
/// Platforms and riders move one after another inside a single tick; each
/// one re-places its collider right after moving so the next query sees it
/// where it actually is.
pub trait MovingWorld: ShapeQuery {
    /// Re-center every collider carrying `key` at `position`. Returns how
    /// many colliders moved.
    fn relocate(&mut self, key: ColKey, position: Vec2) -> usize;
}

/// Frame lifecycle of the bundled obstacle world.
pub trait ObstacleWorldApi {
    /// Construct a new world with the given configuration.
    fn new(cfg: WorldConfig) -> Self
    where
        Self: Sized;

    // --- Frame lifecycle ---------------------------------------------------

    /// Begin a new frame. Clears obstacles inserted for the previous frame.
    fn begin_frame(&mut self);

    /// Insert an obstacle for this frame and return its frame-local handle.
    fn push(&mut self, desc: ColliderDesc) -> FrameId;

    /// Convenience: push a circle obstacle.
    fn push_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        mask: LayerMask,
        user_key: Option<ColKey>,
    ) -> FrameId;

    /// Convenience: push an AABB obstacle (center + half extents).
    fn push_aabb(
        &mut self,
        center: Vec2,
        half_extents: Vec2,
        mask: LayerMask,
        user_key: Option<ColKey>,
    ) -> FrameId;

    /// Convenience: push a point obstacle.
    fn push_point(&mut self, p: Vec2, mask: LayerMask, user_key: Option<ColKey>) -> FrameId;

    /// Finalize insertions and build the uniform grid.
    fn end_frame(&mut self);

    /// Number of obstacles inserted this frame.
    fn len(&self) -> usize;
}

/// Narrowphase primitives. Sweeps move shape 0 by `motion` against a static shape 1.
pub trait NarrowphaseApi {
    // Rays ------------------------------------------------------------------

    fn ray_aabb(origin: Vec2, dir: Vec2, aabb_min: Vec2, aabb_max: Vec2) -> Option<SweepHit>;
    fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, r: f32) -> Option<SweepHit>;

    // Overlaps --------------------------------------------------------------

    fn overlap_aabb_aabb(c0: Vec2, h0: Vec2, c1: Vec2, h1: Vec2) -> Option<Overlap>;
    fn overlap_circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> Option<Overlap>;
    fn overlap_circle_aabb(c: Vec2, r: f32, box_c: Vec2, box_h: Vec2) -> Option<Overlap>;

    // Sweeps against static targets -----------------------------------------

    fn sweep_aabb_aabb(c0: Vec2, h0: Vec2, motion: Vec2, c1: Vec2, h1: Vec2) -> Option<SweepHit>;
    fn sweep_circle_aabb(c: Vec2, r: f32, motion: Vec2, box_c: Vec2, box_h: Vec2) -> Option<SweepHit>;
    fn sweep_aabb_circle(box_c: Vec2, box_h: Vec2, motion: Vec2, c: Vec2, r: f32) -> Option<SweepHit>;
    fn sweep_circle_circle(c0: Vec2, r0: f32, motion: Vec2, c1: Vec2, r1: f32) -> Option<SweepHit>;
}
