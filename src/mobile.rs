use std::collections::{BTreeMap, HashMap};
use std::fmt;

use glam::Vec2;

use crate::api::MovingWorld;
use crate::body::KinematicBody;
use crate::types::{CastHit, ColKey};

/// A moving platform swept into a mobile it does not carry.
#[derive(Copy, Clone, Debug)]
pub struct PlatformCollision {
    /// Collider key of the platform.
    pub platform: ColKey,
    /// Platform position when the message was sent (before it moved).
    pub platform_position: Vec2,
    /// The raw cast hit against the mobile's collider.
    pub hit: CastHit,
    /// Displacement the platform is about to attempt.
    pub movement: Vec2,
}

impl fmt::Display for PlatformCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlatformCollision {{ platform = {}, at = {}, hit = {{ key = {:?}, point = {}, normal = {}, distance = {} }}, movement = {} }}",
            self.platform,
            self.platform_position,
            self.hit.user_key,
            self.hit.point,
            self.hit.normal,
            self.hit.distance,
            self.movement
        )
    }
}

/// A platform carrying an attached mobile by `movement`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlatformMovement {
    /// Collider key of the platform.
    pub platform: ColKey,
    /// Platform position when the message was sent: pre-move for pushed
    /// riders, post-move for pulled ones.
    pub platform_position: Vec2,
    pub movement: Vec2,
}

impl fmt::Display for PlatformMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlatformMovement {{ platform = {}, at = {}, movement = {} }}",
            self.platform, self.platform_position, self.movement
        )
    }
}

/// Receiver side of the platform protocol, implemented by anything that can ride.
///
/// Deliveries are synchronous and happen inside the platform's move; a
/// handler cannot reach back into that platform. A mobile that moves while
/// handling a message re-places its collider in `world` before returning.
pub trait Mobile {
    /// Current position, read once per platform move for push/pull classification.
    fn position(&self) -> Vec2;

    fn on_platform_collision(&mut self, world: &mut dyn MovingWorld, msg: &PlatformCollision);

    fn on_platform_movement(&mut self, world: &mut dyn MovingWorld, msg: &PlatformMovement);
}

/// Lookup from collider key to rider, used by a platform during its move.
pub trait Riders {
    fn rider_mut(&mut self, key: ColKey) -> Option<&mut dyn Mobile>;
}

impl<M: Mobile> Riders for HashMap<ColKey, M> {
    fn rider_mut(&mut self, key: ColKey) -> Option<&mut dyn Mobile> {
        self.get_mut(&key).map(|m| m as &mut dyn Mobile)
    }
}

impl<M: Mobile> Riders for BTreeMap<ColKey, M> {
    fn rider_mut(&mut self, key: ColKey) -> Option<&mut dyn Mobile> {
        self.get_mut(&key).map(|m| m as &mut dyn Mobile)
    }
}

pub type CollisionHandler = Box<dyn FnMut(&mut KinematicBody, &dyn MovingWorld, &PlatformCollision)>;
pub type MovementHandler = Box<dyn FnMut(&mut KinematicBody, &dyn MovingWorld, &PlatformMovement)>;

/// A rider's kinematic body plus the controller's platform handlers.
///
/// Messages go straight to the handlers; with no handler registered a
/// message is dropped. After a handler runs, the body's keyed collider is
/// moved to the body's new position.
pub struct KinematicMobile {
    body: KinematicBody,
    on_collision: Option<CollisionHandler>,
    on_movement: Option<MovementHandler>,
}

impl KinematicMobile {
    pub fn new(body: KinematicBody) -> Self {
        Self { body, on_collision: None, on_movement: None }
    }

    /// A rider that translates by whatever its platform moves.
    pub fn follow_platform(body: KinematicBody) -> Self {
        Self::new(body).with_movement_handler(|body, _, msg| body.move_unchecked(msg.movement))
    }

    pub fn with_collision_handler(
        mut self,
        handler: impl FnMut(&mut KinematicBody, &dyn MovingWorld, &PlatformCollision) + 'static,
    ) -> Self {
        self.on_collision = Some(Box::new(handler));
        self
    }

    pub fn with_movement_handler(
        mut self,
        handler: impl FnMut(&mut KinematicBody, &dyn MovingWorld, &PlatformMovement) + 'static,
    ) -> Self {
        self.on_movement = Some(Box::new(handler));
        self
    }

    pub fn body(&self) -> &KinematicBody { &self.body }
    pub fn body_mut(&mut self) -> &mut KinematicBody { &mut self.body }
    pub fn into_body(self) -> KinematicBody { self.body }

    fn sync(&self, world: &mut dyn MovingWorld, before: Vec2) {
        let position = self.body.position();
        if position == before {
            return;
        }
        if let Some(key) = self.body.key() {
            world.relocate(key, position);
        }
    }
}

impl Mobile for KinematicMobile {
    fn position(&self) -> Vec2 {
        self.body.position()
    }

    fn on_platform_collision(&mut self, world: &mut dyn MovingWorld, msg: &PlatformCollision) {
        let before = self.body.position();
        if let Some(handler) = self.on_collision.as_mut() {
            handler(&mut self.body, &*world, msg);
        }
        self.sync(world, before);
    }

    fn on_platform_movement(&mut self, world: &mut dyn MovingWorld, msg: &PlatformMovement) {
        let before = self.body.position();
        if let Some(handler) = self.on_movement.as_mut() {
            handler(&mut self.body, &*world, msg);
        }
        self.sync(world, before);
    }
}

impl fmt::Debug for KinematicMobile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KinematicMobile")
            .field("body", &self.body)
            .field("on_collision", &self.on_collision.is_some())
            .field("on_movement", &self.on_movement.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::api::ObstacleWorldApi;
    use crate::config::{BodyConfig, WorldConfig};
    use crate::types::{ColliderKind, FrameId, LayerMask};
    use crate::world::CollisionWorld;

    fn body() -> KinematicBody {
        KinematicBody::new(ColliderKind::Circle { radius: 0.5 }, Vec2::new(1.0, 1.0), BodyConfig::default())
            .unwrap()
    }

    fn empty_world() -> CollisionWorld {
        let mut w = CollisionWorld::new(WorldConfig::default());
        w.begin_frame();
        w.end_frame();
        w
    }

    fn movement(delta: Vec2) -> PlatformMovement {
        PlatformMovement { platform: 1, platform_position: Vec2::ZERO, movement: delta }
    }

    fn collision() -> PlatformCollision {
        PlatformCollision {
            platform: 1,
            platform_position: Vec2::ZERO,
            hit: CastHit {
                id: FrameId(3),
                user_key: Some(5),
                point: Vec2::new(0.5, 0.0),
                centroid: Vec2::ZERO,
                normal: Vec2::NEG_X,
                distance: 0.25,
                fraction: 0.5,
            },
            movement: Vec2::new(0.5, 0.0),
        }
    }

    #[test]
    fn test_handlers_receive_messages_verbatim() {
        let mut w = empty_world();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (s1, s2) = (seen.clone(), seen.clone());
        let mut m = KinematicMobile::new(body())
            .with_collision_handler(move |_, _, msg| s1.borrow_mut().push(format!("c:{}", msg.hit.distance)))
            .with_movement_handler(move |_, _, msg| s2.borrow_mut().push(format!("m:{}", msg.movement.x)));

        m.on_platform_collision(&mut w, &collision());
        m.on_platform_movement(&mut w, &movement(Vec2::new(2.0, 0.0)));
        assert_eq!(*seen.borrow(), vec!["c:0.25".to_string(), "m:2".to_string()]);
    }

    #[test]
    fn test_missing_handlers_drop_messages() {
        let mut w = empty_world();
        let mut m = KinematicMobile::new(body());
        m.on_platform_collision(&mut w, &collision());
        m.on_platform_movement(&mut w, &movement(Vec2::new(2.0, 0.0)));
        assert_eq!(m.position(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_follow_platform_translates_body() {
        let mut w = empty_world();
        let mut m = KinematicMobile::follow_platform(body());
        m.on_platform_movement(&mut w, &movement(Vec2::new(0.5, -0.25)));
        assert_eq!(m.position(), Vec2::new(1.5, 0.75));
    }

    #[test]
    fn test_handler_can_slide_rider() {
        let mut w = CollisionWorld::new(WorldConfig::default());
        w.begin_frame();
        w.push_aabb(Vec2::new(3.0, 1.0), Vec2::new(0.5, 2.0), LayerMask::simple(1, 0), None);
        w.end_frame();
        let mut m = KinematicMobile::new(body())
            .with_movement_handler(|body, world, msg| {
                body.move_and_slide(world, msg.movement);
            });
        m.on_platform_movement(&mut w, &movement(Vec2::new(5.0, 0.0)));
        // Circle stops a margin short of the wall's left face at x = 2.5
        assert!((m.position().x - (2.0 - m.body().margin())).abs() < 1e-4);
        assert!(m.body().is_on_wall());
    }

    #[test]
    fn test_moved_rider_carries_its_collider() {
        let mut w = CollisionWorld::new(WorldConfig::default());
        w.begin_frame();
        let id = w.push_circle(Vec2::new(1.0, 1.0), 0.5, LayerMask::simple(4, 0), Some(6));
        w.end_frame();
        let keyed = BodyConfig { key: Some(6), ..Default::default() };
        let b = KinematicBody::new(ColliderKind::Circle { radius: 0.5 }, Vec2::new(1.0, 1.0), keyed).unwrap();

        let mut m = KinematicMobile::follow_platform(b);
        m.on_platform_movement(&mut w, &movement(Vec2::new(3.0, 0.0)));
        assert_eq!(w.get(id).map(|e| e.center), Some(Vec2::new(4.0, 1.0)));

        // A shove from a collision handler is synced the same way
        let mut m = KinematicMobile::new(m.into_body())
            .with_collision_handler(|body, _, msg| body.move_unchecked(msg.movement));
        m.on_platform_collision(&mut w, &collision());
        assert_eq!(w.get(id).map(|e| e.center), Some(Vec2::new(4.5, 1.0)));
    }

    #[test]
    fn test_riders_lookup() {
        let mut riders: HashMap<ColKey, KinematicMobile> = HashMap::new();
        riders.insert(4, KinematicMobile::follow_platform(body()));
        assert!(riders.rider_mut(4).is_some());
        assert!(riders.rider_mut(5).is_none());

        let mut ordered: BTreeMap<ColKey, KinematicMobile> = BTreeMap::new();
        ordered.insert(9, KinematicMobile::new(body()));
        assert_eq!(ordered.rider_mut(9).map(|m| m.position()), Some(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_messages_display() {
        let text = movement(Vec2::new(1.0, 0.0)).to_string();
        assert!(text.starts_with("PlatformMovement {"));
        assert!(text.contains("platform = 1"));
        let text = collision().to_string();
        assert!(text.contains("key = Some(5)"));
    }
}
