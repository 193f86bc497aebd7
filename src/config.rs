use glam::Vec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{ColKey, LayerMask};

/// Tolerance used when checking that a configured gravity is unit length.
const UNIT_TOLERANCE: f32 = 1.0e-3;

/// Parse any config section from a TOML string; missing keys take their defaults.
pub fn from_toml_str<T: DeserializeOwned>(src: &str) -> ConfigResult<T> {
    Ok(toml::from_str(src)?)
}

/// Per-body tuning for the move-and-slide solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Capacity of the body's cast hit buffer (must be positive).
    pub hit_buffer_size: usize,
    /// Clearance kept between the body and any surface it collides with.
    pub margin: f32,
    /// Cancel lateral creep when resting on a walkable slope under gravity.
    pub stop_on_slope: bool,
    /// Upper bound on collide steps per `move_and_slide`.
    pub max_slides: u32,
    /// Steepest walkable slope, degrees from "up".
    pub max_slope_angle: f32,
    /// Default gravity direction; zero or unit length.
    pub gravity: Vec2,
    /// Obstacles this body collides with.
    pub collision_mask: LayerMask,
    /// Key of the body's own collider in the query world, skipped by its casts.
    pub key: Option<ColKey>,
    /// Fixed simulation step in seconds; realized velocity is displacement / dt.
    pub dt: f32,
    /// Bisection steps tried when a rotation lands in an obstacle.
    pub rotation_search_tries: u32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            hit_buffer_size: 1,
            margin: 0.08,
            stop_on_slope: true,
            max_slides: 4,
            max_slope_angle: 45.0,
            gravity: Vec2::NEG_Y,
            collision_mask: LayerMask::ALL,
            key: None,
            dt: 1.0 / 60.0,
            rotation_search_tries: 1,
        }
    }
}

impl BodyConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hit_buffer_size == 0 {
            return Err(ConfigError::HitBufferCapacity(self.hit_buffer_size));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(ConfigError::Margin(self.margin));
        }
        if !(0.0..=180.0).contains(&self.max_slope_angle) {
            return Err(ConfigError::SlopeAngle(self.max_slope_angle));
        }
        if self.dt <= 0.0 || !self.dt.is_finite() {
            return Err(ConfigError::TickDuration(self.dt));
        }
        if !is_zero_or_unit(self.gravity) {
            return Err(ConfigError::GravityNotUnit { x: self.gravity.x, y: self.gravity.y });
        }
        Ok(())
    }

    /// Cosine of `max_slope_angle`: the walkable-ground dot product threshold.
    pub fn min_slope_dot(&self) -> f32 {
        self.max_slope_angle.to_radians().cos()
    }
}

/// Platform-specific settings; the platform's body carries its own `BodyConfig`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Maximum number of attached riders.
    pub max_attached: usize,
    /// Layers whose colliders belong to mobiles.
    pub mobile_mask: LayerMask,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self { max_attached: 8, mobile_mask: LayerMask::ALL }
    }
}

/// Settings for the bundled grid-indexed obstacle world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid cell size in world units.
    pub cell_size: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { cell_size: 1.0 }
    }
}

pub(crate) fn is_zero_or_unit(v: Vec2) -> bool {
    v == Vec2::ZERO || (v.length() - 1.0).abs() <= UNIT_TOLERANCE
}
