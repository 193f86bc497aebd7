//! Test double for [`ShapeQuery`] with scripted contact normals.

use std::cell::Cell;

use glam::Vec2;

use crate::api::{MovingWorld, ShapeQuery};
use crate::types::*;

/// Reports one hit at a fixed distance whenever the cast reaches that far,
/// cycling through `normals` call by call.
pub(crate) struct ScriptedQuery {
    distance: f32,
    normals: Vec<Vec2>,
    calls: Cell<usize>,
}

impl ScriptedQuery {
    pub(crate) fn always(distance: f32, normal: Vec2) -> Self {
        Self::alternating(distance, &[normal])
    }

    pub(crate) fn alternating(distance: f32, normals: &[Vec2]) -> Self {
        assert!(!normals.is_empty());
        Self { distance, normals: normals.to_vec(), calls: Cell::new(0) }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ShapeQuery for ScriptedQuery {
    fn cast(
        &self,
        _shape: ColliderKind,
        pose: Pose,
        direction: Vec2,
        distance: f32,
        _filter: CastFilter,
        out: &mut HitBuffer,
    ) -> usize {
        out.clear();
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.distance > distance {
            return 0;
        }
        let centroid = pose.position + direction.normalize_or_zero() * self.distance;
        out.offer(CastHit {
            id: FrameId(0),
            user_key: None,
            point: centroid,
            centroid,
            normal: self.normals[call % self.normals.len()],
            distance: self.distance,
            fraction: if distance > 0.0 { self.distance / distance } else { 0.0 },
        });
        out.len()
    }
}

/// Scripted hits do not depend on where colliders are.
impl MovingWorld for ScriptedQuery {
    fn relocate(&mut self, _key: ColKey, _position: Vec2) -> usize {
        0
    }
}
