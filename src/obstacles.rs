//! A self-contained [`OcclusionQuery`] over a list of axis-aligned boxes,
//! for games without a physics engine (and for the demo and tests).

use crate::line_of_sight::{ObstacleBounds, OcclusionQuery};
use crate::mapping::FogMode;
use bevy::math::Vec3;

#[derive(Debug, Clone, Copy)]
struct Obstacle {
    bounds: ObstacleBounds,
    categories: u32,
}

/// 轴对齐盒障碍物集合
/// Axis-aligned box obstacles with category bits
///
/// In [`FogMode::Mode2D`] boxes are treated as infinitely tall along Z, so
/// only their X/Y extents matter. A box containing the ray origin is ignored
/// by [`OcclusionQuery::raycast`]: an observer standing inside an obstacle is
/// not blinded by it.
#[derive(Debug, Clone, Default)]
pub struct AabbObstacles {
    mode: FogMode,
    obstacles: Vec<Obstacle>,
}

impl AabbObstacles {
    pub fn new(mode: FogMode) -> Self {
        Self {
            mode,
            obstacles: Vec::new(),
        }
    }

    pub fn with(mut self, bounds: ObstacleBounds, categories: u32) -> Self {
        self.push(bounds, categories);
        self
    }

    pub fn push(&mut self, bounds: ObstacleBounds, categories: u32) {
        self.obstacles.push(Obstacle { bounds, categories });
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    fn matching(&self, mask: u32) -> impl Iterator<Item = &ObstacleBounds> {
        self.obstacles
            .iter()
            .filter(move |o| o.categories & mask != 0)
            .map(|o| &o.bounds)
    }

    /// Bounds as seen by this mode: 2D flattens the Z extent away.
    fn effective(&self, bounds: &ObstacleBounds) -> (Vec3, Vec3) {
        match self.mode {
            FogMode::Mode2D => (
                bounds.min.with_z(f32::NEG_INFINITY),
                bounds.max.with_z(f32::INFINITY),
            ),
            FogMode::Mode3D => (bounds.min, bounds.max),
        }
    }
}

impl OcclusionQuery for AabbObstacles {
    fn obstacles_in_circle(&self, center: Vec3, radius: f32, mask: u32) -> Vec<ObstacleBounds> {
        self.matching(mask)
            .filter(|bounds| {
                let (min, max) = self.effective(bounds);
                let closest = center.clamp(min, max);
                let delta = center - closest;
                let delta = match self.mode {
                    FogMode::Mode2D => delta.with_z(0.0),
                    FogMode::Mode3D => delta,
                };
                delta.length_squared() <= radius * radius
            })
            .copied()
            .collect()
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> Option<f32> {
        if max_distance <= 0.0 || direction == Vec3::ZERO {
            return None;
        }
        self.matching(mask)
            .filter_map(|bounds| {
                let (min, max) = self.effective(bounds);
                ray_box(origin, direction, min, max)
            })
            .filter(|&distance| distance <= max_distance)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Slab test. Returns the entry distance, or None when the ray misses or
/// starts inside the box.
fn ray_box(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = 0.0f32;
    let mut t_far = f32::INFINITY;
    let mut inside = true;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if o < min[axis] || o > max[axis] {
            inside = false;
        }
        if d.abs() <= f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    (!inside).then_some(t_near)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> ObstacleBounds {
        ObstacleBounds::new(Vec3::new(5.0, -1.0, -3.0), Vec3::new(6.0, 1.0, 3.0))
    }

    #[test]
    fn test_raycast_hits_nearest_face() {
        let obstacles = AabbObstacles::new(FogMode::Mode3D)
            .with(wall(), 1)
            .with(
                ObstacleBounds::new(Vec3::new(8.0, -1.0, -1.0), Vec3::new(9.0, 1.0, 1.0)),
                1,
            );
        let hit = obstacles.raycast(Vec3::ZERO, Vec3::X, 20.0, 1);
        assert_eq!(hit, Some(5.0));
    }

    #[test]
    fn test_raycast_respects_distance_and_mask() {
        let obstacles = AabbObstacles::new(FogMode::Mode3D).with(wall(), 0b100);
        assert_eq!(obstacles.raycast(Vec3::ZERO, Vec3::X, 4.0, 0b100), None);
        assert_eq!(obstacles.raycast(Vec3::ZERO, Vec3::X, 10.0, 0b011), None);
        assert_eq!(obstacles.raycast(Vec3::ZERO, Vec3::NEG_X, 10.0, 0b100), None);
        assert_eq!(obstacles.raycast(Vec3::ZERO, Vec3::X, 0.0, 0b100), None);
    }

    #[test]
    fn test_raycast_ignores_box_around_origin() {
        let obstacles = AabbObstacles::new(FogMode::Mode3D).with(
            ObstacleBounds::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0)),
            1,
        );
        assert_eq!(obstacles.raycast(Vec3::ZERO, Vec3::Z, 10.0, 1), None);
    }

    #[test]
    fn test_2d_ignores_depth() {
        let obstacles = AabbObstacles::new(FogMode::Mode2D).with(
            ObstacleBounds::new(Vec3::new(-1.0, 3.0, 0.0), Vec3::new(1.0, 4.0, 0.0)),
            1,
        );
        let origin = Vec3::new(0.0, 0.0, 10.0);
        assert_eq!(obstacles.raycast(origin, Vec3::Y, 10.0, 1), Some(3.0));
        assert_eq!(obstacles.obstacles_in_circle(origin, 3.0, 1).len(), 1);
        assert!(obstacles.obstacles_in_circle(origin, 2.5, 1).is_empty());
    }

    #[test]
    fn test_circle_overlap_3d() {
        let obstacles = AabbObstacles::new(FogMode::Mode3D).with(wall(), 1);
        assert_eq!(obstacles.obstacles_in_circle(Vec3::ZERO, 5.0, 1), vec![wall()]);
        assert!(obstacles.obstacles_in_circle(Vec3::ZERO, 4.9, 1).is_empty());
        assert!(obstacles.obstacles_in_circle(Vec3::ZERO, 5.0, 2).is_empty());
        // above the wall in 3D
        assert!(
            obstacles
                .obstacles_in_circle(Vec3::new(5.5, 10.0, 0.0), 5.0, 1)
                .is_empty()
        );
    }
}
