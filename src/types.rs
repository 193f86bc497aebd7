use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// User-defined opaque key carried through hits (e.g., pack your entity id).
pub type ColKey = u64;

/// Bitmask-based filtering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerMask {
    /// Layer(s) this collider belongs to.
    pub layer: u32,
    /// Layers this collider wants to collide with.
    pub collides_with: u32,
    /// Extra mask to exclude (applied after `collides_with`).
    pub exclude: u32,
}

impl LayerMask {
    /// Belongs to layer 1 and sees every layer.
    pub const ALL: LayerMask = LayerMask { layer: 1, collides_with: u32::MAX, exclude: 0 };

    /// Convenience constructor.
    pub fn simple(layer: u32, collides_with: u32) -> Self {
        Self {
            layer,
            collides_with,
            exclude: 0,
        }
    }

    /// A may hit B iff `(A.collides_with & B.layer) != 0` AND `(A.exclude & B.layer) == 0`.
    pub fn allows(self, other: LayerMask) -> bool {
        let hit = (self.collides_with & other.layer) != 0;
        let blocked = (self.exclude & other.layer) != 0;
        hit && !blocked
    }
}

/// Supported collider shapes, for obstacles and for moving bodies alike.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColliderKind {
    /// Centered box (half extents along local X/Y).
    Aabb { half_extents: Vec2 },
    /// Centered circle.
    Circle { radius: f32 },
    /// Mathematical point.
    Point,
}

impl ColliderKind {
    /// World-space shape after applying `rotation` (radians).
    ///
    /// Rotated boxes are widened to their axis-aligned bounds; circles and
    /// points are rotation invariant.
    pub fn rotated(self, rotation: f32) -> ColliderKind {
        match self {
            ColliderKind::Aabb { half_extents } if rotation != 0.0 => {
                let (s, c) = rotation.sin_cos();
                let (s, c) = (s.abs(), c.abs());
                ColliderKind::Aabb {
                    half_extents: Vec2::new(
                        c * half_extents.x + s * half_extents.y,
                        s * half_extents.x + c * half_extents.y,
                    ),
                }
            }
            other => other,
        }
    }

    /// Half extents of the axis-aligned bounds.
    pub fn half_extents(self) -> Vec2 {
        match self {
            ColliderKind::Aabb { half_extents } => half_extents,
            ColliderKind::Circle { radius } => Vec2::splat(radius),
            ColliderKind::Point => Vec2::ZERO,
        }
    }
}

/// One static obstacle considered for **this frame**.
#[derive(Copy, Clone, Debug)]
pub struct ColliderDesc {
    pub kind: ColliderKind,
    pub center: Vec2,
    pub mask: LayerMask,
    /// Optional user key echoed in cast hits.
    pub user_key: Option<ColKey>,
}

/// Frame-local handle for obstacles inserted this frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u32);

/// Position and rotation (radians) of a shape.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub rotation: f32,
}

impl Pose {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }
}

/// Which obstacles a cast may report.
#[derive(Copy, Clone, Debug)]
pub struct CastFilter {
    /// Obstacle is visible iff `mask.allows(obstacle.mask)`.
    pub mask: LayerMask,
    /// Obstacle carrying this key is skipped (the caster's own collider).
    pub ignore: Option<ColKey>,
}

impl CastFilter {
    pub fn new(mask: LayerMask, ignore: Option<ColKey>) -> Self {
        Self { mask, ignore }
    }

    pub fn admits(&self, desc: &ColliderDesc) -> bool {
        if self.ignore.is_some() && self.ignore == desc.user_key {
            return false;
        }
        self.mask.allows(desc.mask)
    }
}

/// Overlap contact result (discrete).
#[derive(Copy, Clone, Debug)]
pub struct Overlap {
    /// Separating normal, from B into A (may be (0,0) for degenerate cases).
    pub normal: Vec2,
    /// Penetration depth (≥ 0).
    pub depth: f32,
    /// A representative contact point (approx for AABBs).
    pub contact: Vec2,
}

/// Sweep (time-of-impact) result for a moving shape against a static one.
#[derive(Copy, Clone, Debug)]
pub struct SweepHit {
    /// Fraction in [0,1] of the motion where first impact occurs.
    pub toi: f32,
    /// Normal at impact (points from the static shape into the moving one).
    pub normal: Vec2,
    /// Representative impact/contact point.
    pub contact: Vec2,
}

/// One obstacle reported by a swept-shape cast.
#[derive(Copy, Clone, Debug)]
pub struct CastHit {
    pub id: FrameId,
    pub user_key: Option<ColKey>,
    /// Contact point on the obstacle surface.
    pub point: Vec2,
    /// Where the cast shape's center sits at the moment of contact.
    pub centroid: Vec2,
    /// Surface normal, pointing away from the obstacle.
    pub normal: Vec2,
    /// Distance travelled along the cast direction before contact.
    pub distance: f32,
    /// `distance` as a fraction of the requested cast length (0 for overlap tests).
    pub fraction: f32,
}

/// Caller-owned scratch storage for cast results.
///
/// Every cast clears the buffer and keeps at most `capacity` hits, nearest
/// first. Contents stay valid only until the next cast into the same buffer.
#[derive(Clone, Debug)]
pub struct HitBuffer {
    hits: Vec<CastHit>,
    capacity: usize,
}

impl HitBuffer {
    pub fn with_capacity(capacity: usize) -> ConfigResult<Self> {
        if capacity == 0 {
            return Err(ConfigError::HitBufferCapacity(capacity));
        }
        Ok(Self { hits: Vec::with_capacity(capacity), capacity })
    }

    pub fn capacity(&self) -> usize { self.capacity }
    pub fn len(&self) -> usize { self.hits.len() }
    pub fn is_empty(&self) -> bool { self.hits.is_empty() }
    pub fn as_slice(&self) -> &[CastHit] { &self.hits }
    pub fn nearest(&self) -> Option<&CastHit> { self.hits.first() }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    /// Insert keeping ascending distance; the farthest hit falls off when full.
    pub fn offer(&mut self, hit: CastHit) {
        let at = self.hits.partition_point(|h| h.distance <= hit.distance);
        if at >= self.capacity {
            return;
        }
        if self.hits.len() == self.capacity {
            self.hits.pop();
        }
        self.hits.insert(at, hit);
    }
}

/// Outcome of one collide step.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Collision {
    /// Where the body ended up.
    pub point: Vec2,
    /// Normal of the surface hit, or zero when nothing was hit.
    pub normal: Vec2,
    /// The part of the requested displacement that was applied.
    pub motion: Vec2,
    /// The part that was not, due to the collision.
    pub remainder: Vec2,
}

impl Collision {
    /// Squared remainder below which leftover motion counts as resolved.
    pub const RESOLVED_SQ: f32 = 1.0e-4;

    pub fn collided(&self) -> bool {
        self.remainder.length_squared() > Self::RESOLVED_SQ
    }
}

/// Contact classification relative to gravity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    Floor,
    Wall,
    Ceiling,
}

/// Contact flags describing the outcome of the most recent slide.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ContactState {
    pub on_floor: bool,
    pub on_wall: bool,
    pub on_ceiling: bool,
    pub floor_normal: Vec2,
}

impl ContactState {
    pub fn record(&mut self, kind: SurfaceKind, normal: Vec2) {
        match kind {
            SurfaceKind::Floor => {
                self.on_floor = true;
                self.floor_normal = normal;
            }
            SurfaceKind::Wall => self.on_wall = true,
            SurfaceKind::Ceiling => self.on_ceiling = true,
        }
    }
}

/// Debug statistics for a built frame.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub entries: usize,
    pub cells: usize,
    /// Sum of grid bucket lengths (entries spanning cells count once per cell).
    pub cell_refs: usize,
}
