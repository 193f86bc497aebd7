use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::types::*;

/// Narrowphase primitive tests used by the obstacle world's casts.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn ray_aabb(origin: Vec2, dir: Vec2, aabb_min: Vec2, aabb_max: Vec2) -> Option<SweepHit> {
        // Slab method with normal tracking; returns earliest t >= 0
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;
        let mut n_enter = Vec2::ZERO;

        for axis in 0..2 {
            let (o, d, lo, hi) = (origin[axis], dir[axis], aabb_min[axis], aabb_max[axis]);
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t1 = (lo - o) * inv;
            let mut t2 = (hi - o) * inv;
            let mut n = -1.0;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
                n = 1.0;
            }
            if t1 > tmin {
                tmin = t1;
                n_enter = Vec2::ZERO;
                n_enter[axis] = n;
            }
            if t2 < tmax {
                tmax = t2;
            }
            if tmin > tmax {
                return None;
            }
        }
        if tmax < 0.0 {
            return None;
        }

        // If origin inside, tmin < 0; treat as immediate hit
        let toi = if tmin < 0.0 { 0.0 } else { tmin };
        let contact = origin + dir * toi;
        let normal = if tmin < 0.0 { Vec2::ZERO } else { n_enter };
        Some(SweepHit { toi, normal, contact })
    }

    fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, r: f32) -> Option<SweepHit> {
        // Solve ||origin + t*dir - center||^2 = r^2 for t >= 0
        let m = origin - center;
        let a = dir.length_squared();
        if a == 0.0 {
            return None;
        }
        let b = 2.0 * m.dot(dir);
        let c = m.length_squared() - r * r;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let t0 = (-b - sqrt_disc) / (2.0 * a);
        let t1 = (-b + sqrt_disc) / (2.0 * a);
        let t = if t0 >= 0.0 { t0 } else { t1 };
        if t < 0.0 {
            return None;
        }
        let contact = origin + dir * t;
        let normal = (contact - center).normalize_or_zero();
        Some(SweepHit { toi: t, normal, contact })
    }

    fn overlap_aabb_aabb(c0: Vec2, h0: Vec2, c1: Vec2, h1: Vec2) -> Option<Overlap> {
        let d = c1 - c0;
        let ox = (h0.x + h1.x) - d.x.abs();
        let oy = (h0.y + h1.y) - d.y.abs();
        if ox < 0.0 || oy < 0.0 {
            return None;
        }

        // Axis of minimum penetration; normal from B into A
        let (depth, normal, axis_h) = if ox <= oy {
            let nx = if d.x >= 0.0 { -1.0 } else { 1.0 };
            (ox, Vec2::new(nx, 0.0), h0.x)
        } else {
            let ny = if d.y >= 0.0 { -1.0 } else { 1.0 };
            (oy, Vec2::new(0.0, ny), h0.y)
        };

        // Project A's center onto B's box, then move to A's surface along the normal
        let mut contact = c0.clamp(c1 - h1, c1 + h1);
        contact -= normal * axis_h;

        Some(Overlap { normal, depth, contact })
    }

    fn overlap_circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> Option<Overlap> {
        let delta = c0 - c1;
        let dist2 = delta.length_squared();
        let rsum = r0 + r1;
        if dist2 > rsum * rsum {
            return None;
        }
        if dist2 == 0.0 {
            // Coincident centers; undefined normal.
            return Some(Overlap { normal: Vec2::ZERO, depth: rsum, contact: c0 });
        }
        let dist = dist2.sqrt();
        let normal = delta / dist; // from B into A
        let depth = (rsum - dist).max(0.0);
        let contact = c0 - normal * r0;
        Some(Overlap { normal, depth, contact })
    }

    fn overlap_circle_aabb(c: Vec2, r: f32, box_c: Vec2, box_h: Vec2) -> Option<Overlap> {
        let closest = c.clamp(box_c - box_h, box_c + box_h);
        let delta = c - closest;
        let dist2 = delta.length_squared();
        if dist2 > r * r {
            return None;
        }
        if dist2 > 0.0 {
            let dist = dist2.sqrt();
            let normal = delta / dist; // from box into circle
            return Some(Overlap { normal, depth: r - dist, contact: closest });
        }
        // Center inside the box: push out through the nearest face
        let local = c - box_c;
        let gap = box_h - local.abs();
        let normal = if gap.x <= gap.y {
            Vec2::new(if local.x >= 0.0 { 1.0 } else { -1.0 }, 0.0)
        } else {
            Vec2::new(0.0, if local.y >= 0.0 { 1.0 } else { -1.0 })
        };
        let depth = gap.x.min(gap.y) + r;
        Some(Overlap { normal, depth, contact: c })
    }

    fn sweep_aabb_aabb(c0: Vec2, h0: Vec2, motion: Vec2, c1: Vec2, h1: Vec2) -> Option<SweepHit> {
        if motion.length_squared() <= f32::EPSILON {
            return None;
        }
        let expand = h0 + h1;
        let hit = Self::ray_aabb(c0, motion, c1 - expand, c1 + expand)?;
        if hit.toi > 1.0 {
            return None;
        }
        let center_at_hit = c0 + motion * hit.toi;
        // Contact on B's face, clamped to the span both boxes share
        let contact = (center_at_hit - hit.normal * h0).clamp(c1 - h1, c1 + h1);
        Some(SweepHit { toi: hit.toi, normal: hit.normal, contact })
    }

    fn sweep_circle_aabb(c: Vec2, r: f32, motion: Vec2, box_c: Vec2, box_h: Vec2) -> Option<SweepHit> {
        if motion.length_squared() <= f32::EPSILON {
            return None;
        }
        let min = box_c - box_h;
        let max = box_c + box_h;
        let rvec = Vec2::splat(r);
        let hit = Self::ray_aabb(c, motion, min - rvec, max + rvec)?;
        if hit.toi > 1.0 {
            return None;
        }
        let p = c + motion * hit.toi;
        // Entering through a corner square of the expanded box: the true
        // Minkowski sum is rounded there, so test the corner circle instead.
        let outside_x = p.x < min.x || p.x > max.x;
        let outside_y = p.y < min.y || p.y > max.y;
        let (toi, normal) = if outside_x && outside_y && r > 0.0 {
            let corner = p.clamp(min, max);
            let h = Self::ray_circle(c, motion, corner, r)?;
            if h.toi > 1.0 {
                return None;
            }
            (h.toi, h.normal)
        } else {
            (hit.toi, hit.normal)
        };
        let center_at_hit = c + motion * toi;
        let contact = (center_at_hit - normal * r).clamp(min, max);
        Some(SweepHit { toi, normal, contact })
    }

    fn sweep_aabb_circle(box_c: Vec2, box_h: Vec2, motion: Vec2, c: Vec2, r: f32) -> Option<SweepHit> {
        // Equivalent to the circle moving by -motion against a still box.
        let hit = Self::sweep_circle_aabb(c, r, -motion, box_c, box_h)?;
        let normal = -hit.normal;
        Some(SweepHit { toi: hit.toi, normal, contact: c + normal * r })
    }

    fn sweep_circle_circle(c0: Vec2, r0: f32, motion: Vec2, c1: Vec2, r1: f32) -> Option<SweepHit> {
        if motion.length_squared() <= f32::EPSILON {
            return None;
        }
        let hit = Self::ray_circle(c0, motion, c1, r0 + r1)?;
        if hit.toi > 1.0 {
            return None;
        }
        // Outward from the expanded circle => from B to A
        let contact = c1 + hit.normal * r1;
        Some(SweepHit { toi: hit.toi, normal: hit.normal, contact })
    }
}
