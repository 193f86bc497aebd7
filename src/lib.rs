//! kinebonk: kinematic move-and-slide bodies and riding platforms over a swept-shape query world

pub mod types;
pub mod api;
pub mod config;
pub mod error;
pub mod world;
pub mod narrowphase;
pub mod contact;
pub mod body;
pub mod mobile;
pub mod platform;

#[cfg(test)]
mod testing;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::body::KinematicBody;
pub use crate::config::{BodyConfig, PlatformConfig, WorldConfig, from_toml_str};
pub use crate::error::{ConfigError, ConfigResult};
pub use crate::mobile::{KinematicMobile, Mobile, PlatformCollision, PlatformMovement, Riders};
pub use crate::platform::KinematicPlatform;
pub use crate::world::CollisionWorld;
