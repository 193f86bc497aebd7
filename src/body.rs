use glam::Vec2;

use crate::api::ShapeQuery;
use crate::config::{BodyConfig, is_zero_or_unit};
use crate::contact::{classify_contact, retreat_along_normal, slide};
use crate::error::ConfigResult;
use crate::types::*;

/// Squared tolerance for "moving straight along gravity" in the stop-on-slope check.
const GRAVITY_ALIGNED_SQ: f32 = 1.0e-4;

/// Applied motion (squared) below which a floor contact may cancel lateral creep.
const CREEP_MOTION_SQ: f32 = 1.0;

/// A shape moved by explicit displacements that collides and slides against a
/// [`ShapeQuery`] world.
///
/// Velocity is derived from what actually happened during the last
/// [`move_and_slide`](Self::move_and_slide); it is never an input.
#[derive(Clone, Debug)]
pub struct KinematicBody {
    cfg: BodyConfig,
    shape: ColliderKind,
    pose: Pose,
    velocity: Vec2,
    contacts: ContactState,
    hits: HitBuffer,
    min_slope_dot: f32,
}

impl KinematicBody {
    /// Validates `cfg`; a zero-capacity hit buffer or a non-unit gravity fails here.
    pub fn new(shape: ColliderKind, position: Vec2, cfg: BodyConfig) -> ConfigResult<Self> {
        cfg.validate()?;
        let hits = HitBuffer::with_capacity(cfg.hit_buffer_size)?;
        let min_slope_dot = cfg.min_slope_dot();
        Ok(Self {
            cfg,
            shape,
            pose: Pose::new(position, 0.0),
            velocity: Vec2::ZERO,
            contacts: ContactState::default(),
            hits,
            min_slope_dot,
        })
    }

    // --- Accessors ---------------------------------------------------------

    pub fn config(&self) -> &BodyConfig { &self.cfg }
    pub fn shape(&self) -> ColliderKind { self.shape }
    pub fn key(&self) -> Option<ColKey> { self.cfg.key }
    pub fn margin(&self) -> f32 { self.cfg.margin }
    pub fn pose(&self) -> Pose { self.pose }
    pub fn position(&self) -> Vec2 { self.pose.position }
    pub fn rotation(&self) -> f32 { self.pose.rotation }
    pub fn velocity(&self) -> Vec2 { self.velocity }
    pub fn set_velocity(&mut self, velocity: Vec2) { self.velocity = velocity; }
    pub fn contacts(&self) -> ContactState { self.contacts }
    pub fn is_on_floor(&self) -> bool { self.contacts.on_floor }
    pub fn is_on_wall(&self) -> bool { self.contacts.on_wall }
    pub fn is_on_ceiling(&self) -> bool { self.contacts.on_ceiling }
    pub fn floor_normal(&self) -> Vec2 { self.contacts.floor_normal }

    /// Hits of the most recent query; overwritten by the next one.
    pub fn hit_results(&self) -> &[CastHit] {
        self.hits.as_slice()
    }

    // --- Queries -----------------------------------------------------------

    /// Sweep the body's shape from its current pose against obstacles in `mask`.
    ///
    /// The returned slice borrows the body's hit buffer, nearest hit first.
    pub fn cast<Q: ShapeQuery + ?Sized>(
        &mut self,
        world: &Q,
        direction: Vec2,
        distance: f32,
        mask: LayerMask,
    ) -> &[CastHit] {
        debug_assert!(distance >= 0.0, "cast distance must be non-negative");
        let filter = CastFilter::new(mask, self.cfg.key);
        world.cast(self.shape, self.pose, direction, distance, filter, &mut self.hits);
        self.hits.as_slice()
    }

    /// Would moving by `movement` hit anything? Looks `|movement| + margin`
    /// ahead without moving the body.
    pub fn test_move_and_collide<Q: ShapeQuery + ?Sized>(
        &mut self,
        world: &Q,
        movement: Vec2,
    ) -> Option<CastHit> {
        self.test_move_and_collide_masked(world, movement, self.cfg.collision_mask)
    }

    pub fn test_move_and_collide_masked<Q: ShapeQuery + ?Sized>(
        &mut self,
        world: &Q,
        movement: Vec2,
        mask: LayerMask,
    ) -> Option<CastHit> {
        let distance = movement.length() + self.cfg.margin;
        self.cast(world, movement, distance, mask).first().copied()
    }

    fn is_blocked<Q: ShapeQuery + ?Sized>(&mut self, world: &Q) -> bool {
        !self.cast(world, Vec2::ZERO, 0.0, self.cfg.collision_mask).is_empty()
    }

    // --- Movement ----------------------------------------------------------

    /// Translate without any collision query.
    pub fn move_unchecked(&mut self, movement: Vec2) {
        self.pose.position += movement;
    }

    /// Move toward `movement`, stopping `margin` short of the first obstacle.
    ///
    /// The body's position is updated in place. The returned collision
    /// reports what was applied and what is left over; see
    /// [`Collision::collided`].
    pub fn move_and_collide<Q: ShapeQuery + ?Sized>(&mut self, world: &Q, movement: Vec2) -> Collision {
        let position = self.pose.position;
        if movement == Vec2::ZERO {
            return Collision { point: position, ..Default::default() };
        }

        let distance = movement.length();
        let mask = self.cfg.collision_mask;
        let Some(hit) = self.cast(world, movement, distance, mask).first().copied() else {
            let target = position + movement;
            self.pose.position = target;
            return Collision { point: target, normal: Vec2::ZERO, motion: movement, remainder: Vec2::ZERO };
        };

        let to_contact = hit.centroid - position;
        let applied = retreat_along_normal(to_contact, hit.normal, self.cfg.margin)
            .clamp_length_max(distance);
        let target = position + applied;
        self.pose.position = target;
        Collision { point: target, normal: hit.normal, motion: applied, remainder: movement - applied }
    }

    /// Collide-and-slide under the configured gravity. Returns the realized velocity.
    pub fn move_and_slide<Q: ShapeQuery + ?Sized>(&mut self, world: &Q, movement: Vec2) -> Vec2 {
        let gravity = self.cfg.gravity;
        self.move_and_slide_with_gravity(world, movement, gravity)
    }

    /// Collide-and-slide, classifying contacts against `gravity` (zero or unit length).
    ///
    /// Runs at most `max_slides` collide steps, projecting the leftover motion
    /// onto each surface hit. Contact flags are reset on entry and describe
    /// only this call.
    pub fn move_and_slide_with_gravity<Q: ShapeQuery + ?Sized>(
        &mut self,
        world: &Q,
        movement: Vec2,
        gravity: Vec2,
    ) -> Vec2 {
        debug_assert!(is_zero_or_unit(gravity), "gravity must be zero or unit length");

        if movement == Vec2::ZERO {
            self.velocity = Vec2::ZERO;
            return Vec2::ZERO;
        }

        let direction = movement.normalize();
        let initial = self.pose.position;
        let mut remaining = movement;
        self.contacts = ContactState::default();

        for step in 0..self.cfg.max_slides {
            let collision = self.move_and_collide(world, remaining);
            let collided = collision.collided();

            if !collided {
                remaining = Vec2::ZERO;
            } else {
                remaining = collision.remainder;
                let kind = classify_contact(collision.normal, gravity, self.min_slope_dot);
                log::trace!(
                    "slide {step}: {kind:?} normal=({:.3},{:.3}) motion=({:.3},{:.3})",
                    collision.normal.x,
                    collision.normal.y,
                    collision.motion.x,
                    collision.motion.y
                );
                self.contacts.record(kind, collision.normal);

                if kind == SurfaceKind::Floor
                    && self.cfg.stop_on_slope
                    && (direction - gravity).length_squared() < GRAVITY_ALIGNED_SQ
                    && collision.motion.length_squared() < CREEP_MOTION_SQ
                {
                    self.pose.position -= slide(collision.motion, gravity);
                    break;
                }

                remaining = slide(remaining, collision.normal);
            }

            if !collided || remaining == Vec2::ZERO {
                break;
            }
        }

        self.velocity = (self.pose.position - initial) / self.cfg.dt;
        self.velocity
    }

    // --- Rotation ----------------------------------------------------------

    /// Rotate by `delta` radians without ending up inside an obstacle.
    /// Returns the rotation actually applied.
    pub fn rotate_by<Q: ShapeQuery + ?Sized>(&mut self, world: &Q, delta: f32) -> f32 {
        let previous = self.pose.rotation;
        self.rotate_between(world, previous, previous + delta)
    }

    /// Rotate to `target` radians without ending up inside an obstacle.
    /// Returns the rotation actually applied.
    pub fn rotate_to<Q: ShapeQuery + ?Sized>(&mut self, world: &Q, target: f32) -> f32 {
        let previous = self.pose.rotation;
        self.rotate_between(world, previous, target)
    }

    fn rotate_between<Q: ShapeQuery + ?Sized>(&mut self, world: &Q, previous: f32, next: f32) -> f32 {
        self.pose.rotation = next;
        if !self.is_blocked(world) {
            return next;
        }

        // Bisect toward the clear half; `from` is always a known-clear angle.
        let (mut from, mut to) = (previous, next);
        let mut tries = self.cfg.rotation_search_tries;
        loop {
            let mid = (from + to) * 0.5;
            self.pose.rotation = mid;
            let clear = !self.is_blocked(world);
            match (clear, tries) {
                (true, 0) => return mid,
                (true, _) => from = mid,
                (false, 0) => {
                    log::debug!("rotation to {next:.4} blocked, settled at {from:.4}");
                    self.pose.rotation = from;
                    return from;
                }
                (false, _) => to = mid,
            }
            tries -= 1;
        }
    }
}
