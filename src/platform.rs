use glam::Vec2;

use crate::api::MovingWorld;
use crate::body::KinematicBody;
use crate::config::PlatformConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::mobile::{PlatformCollision, PlatformMovement, Riders};
use crate::types::{CastHit, ColKey};

/// A kinematic body that carries riders.
///
/// Riders are tracked by collider key and resolved through a [`Riders`]
/// lookup on every move, so the platform never holds on to them.
#[derive(Clone, Debug)]
pub struct KinematicPlatform {
    body: KinematicBody,
    key: ColKey,
    cfg: PlatformConfig,
    attached: Vec<ColKey>,
    // Per-move scratch
    pushed: Vec<ColKey>,
    pulled: Vec<ColKey>,
    hits: Vec<CastHit>,
}

impl KinematicPlatform {
    /// The body must carry a collider key so the platform's casts skip itself.
    pub fn new(body: KinematicBody, cfg: PlatformConfig) -> ConfigResult<Self> {
        let key = body.key().ok_or(ConfigError::MissingPlatformKey)?;
        Ok(Self {
            body,
            key,
            attached: Vec::with_capacity(cfg.max_attached),
            cfg,
            pushed: Vec::new(),
            pulled: Vec::new(),
            hits: Vec::new(),
        })
    }

    pub fn key(&self) -> ColKey { self.key }
    pub fn config(&self) -> &PlatformConfig { &self.cfg }
    pub fn body(&self) -> &KinematicBody { &self.body }
    pub fn body_mut(&mut self) -> &mut KinematicBody { &mut self.body }
    pub fn position(&self) -> Vec2 { self.body.position() }
    pub fn capacity(&self) -> usize { self.cfg.max_attached }
    pub fn attached(&self) -> &[ColKey] { &self.attached }

    pub fn is_attached(&self, mobile: ColKey) -> bool {
        self.attached.contains(&mobile)
    }

    /// Attach a rider. Returns whether it is attached afterwards: `false`
    /// only when the platform is already full.
    pub fn attach(&mut self, mobile: ColKey) -> bool {
        if self.is_attached(mobile) {
            return true;
        }
        if self.attached.len() >= self.cfg.max_attached {
            log::warn!(
                "platform {}: attach of {mobile} dropped, {} riders already attached",
                self.key,
                self.attached.len()
            );
            return false;
        }
        self.attached.push(mobile);
        true
    }

    /// Detach a rider. Returns whether it was attached.
    pub fn detach(&mut self, mobile: ColKey) -> bool {
        match self.attached.iter().position(|&k| k == mobile) {
            Some(i) => {
                self.attached.remove(i);
                true
            }
            None => false,
        }
    }

    /// Move the platform by `displacement` and carry its riders.
    ///
    /// In order: riders the platform moves toward get their movement, mobiles
    /// that are not attached but lie in the path get a collision, the
    /// platform slides, and finally riders it moves away from get their
    /// movement. Rider positions are read once, before any delivery.
    ///
    /// The platform's collider in `world` (keyed by the body's key) is moved
    /// with it right after its own slide, so pulled riders query against the
    /// platform where it ended up. Returns the platform's realized velocity.
    pub fn move_by<R: Riders + ?Sized>(
        &mut self,
        world: &mut dyn MovingWorld,
        displacement: Vec2,
        riders: &mut R,
    ) -> Vec2 {
        let before = self.body.position();
        let after = before + displacement;

        self.pushed.clear();
        self.pulled.clear();
        for &key in &self.attached {
            let Some(rider) = riders.rider_mut(key) else {
                continue;
            };
            let p = rider.position();
            if after.distance_squared(p) > before.distance_squared(p) {
                self.pulled.push(key);
            } else {
                self.pushed.push(key);
            }
        }

        let push = PlatformMovement { platform: self.key, platform_position: before, movement: displacement };
        for &key in &self.pushed {
            if let Some(rider) = riders.rider_mut(key) {
                log::debug!("platform {}: pushing rider {key}", self.key);
                rider.on_platform_movement(&mut *world, &push);
            }
        }

        if displacement != Vec2::ZERO {
            self.collide_with_mobiles(&mut *world, before, displacement, riders);
        }

        let velocity = self.body.move_and_slide(&*world, displacement);
        if self.body.position() != before {
            world.relocate(self.key, self.body.position());
        }

        let pull = PlatformMovement {
            platform: self.key,
            platform_position: self.body.position(),
            movement: displacement,
        };
        for &key in &self.pulled {
            if let Some(rider) = riders.rider_mut(key) {
                log::debug!("platform {}: pulling rider {key}", self.key);
                rider.on_platform_movement(&mut *world, &pull);
            }
        }

        velocity
    }

    fn collide_with_mobiles<R: Riders + ?Sized>(
        &mut self,
        world: &mut dyn MovingWorld,
        position: Vec2,
        displacement: Vec2,
        riders: &mut R,
    ) {
        self.hits.clear();
        let found = self.body.cast(&*world, displacement, displacement.length(), self.cfg.mobile_mask);
        self.hits.extend_from_slice(found);

        for hit in &self.hits {
            let Some(key) = hit.user_key else { continue };
            if self.attached.contains(&key) {
                continue;
            }
            let Some(mobile) = riders.rider_mut(key) else { continue };
            log::debug!("platform {}: collided with mobile {key} at {:.3}", self.key, hit.distance);
            mobile.on_platform_collision(
                &mut *world,
                &PlatformCollision { platform: self.key, platform_position: position, hit: *hit, movement: displacement },
            );
        }
    }
}
