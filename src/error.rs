use thiserror::Error;

/// Construction-time configuration failures. Per-tick operations never return these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("hit buffer capacity must be positive, got {0}")]
    HitBufferCapacity(usize),

    #[error("gravity direction must be zero or unit length, got ({x}, {y})")]
    GravityNotUnit { x: f32, y: f32 },

    #[error("margin must be finite and non-negative, got {0}")]
    Margin(f32),

    #[error("max slope angle must lie in [0, 180] degrees, got {0}")]
    SlopeAngle(f32),

    #[error("tick duration must be positive, got {0}")]
    TickDuration(f32),

    #[error("a platform body needs a collider key")]
    MissingPlatformKey,

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
