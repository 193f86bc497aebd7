//! Contact math shared by the slide solver: surface classification against
//! gravity, slide projection and margin retreat.

use glam::Vec2;

use crate::types::SurfaceKind;

/// Slack applied to slope threshold comparisons so a surface sitting exactly
/// on the walkable limit classifies the same way every tick.
pub const SLOPE_EPSILON: f32 = 1.0e-4;

/// Classify a contact normal relative to `gravity`.
///
/// `min_slope_dot` is the cosine of the steepest walkable slope. A zero
/// gravity makes every contact a wall.
pub fn classify_contact(normal: Vec2, gravity: Vec2, min_slope_dot: f32) -> SurfaceKind {
    if gravity == Vec2::ZERO {
        return SurfaceKind::Wall;
    }
    let threshold = min_slope_dot - SLOPE_EPSILON;
    if normal.dot(-gravity) > threshold {
        SurfaceKind::Floor
    } else if normal.dot(gravity) > threshold {
        SurfaceKind::Ceiling
    } else {
        SurfaceKind::Wall
    }
}

/// Remove the component of `v` along `normal`.
#[inline]
pub fn slide(v: Vec2, normal: Vec2) -> Vec2 {
    v - normal * v.dot(normal)
}

/// Stretch or shrink `motion` along its own direction so that, measured along
/// `normal`, the end point stays exactly `margin` short of where `motion` ends.
///
/// `motion` is the delta from the body to its contact pose; `normal` points
/// away from the surface. Motion perpendicular to the normal is returned as is.
pub fn retreat_along_normal(motion: Vec2, normal: Vec2, margin: f32) -> Vec2 {
    let scaled = normal * margin;
    let dot = scaled.dot(motion);
    if dot == 0.0 {
        motion
    } else {
        motion + motion * (scaled.length_squared() / dot)
    }
}
