use crate::mapping::FogMode;
use bevy::math::{IVec2, Vec3};
use bevy::prelude::Resource;

/// 障碍物的世界空间轴对齐包围盒
/// World-space axis-aligned bounds of an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ObstacleBounds {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }
}

/// Physics capabilities the fog needs from the host game.
///
/// `mask` is a category bitmask chosen by the vision source; implementations
/// should only consider obstacles sharing at least one bit with it.
pub trait OcclusionQuery: Send + Sync + 'static {
    /// All obstacles whose bounds intersect the circle (a sphere in 3D mode).
    /// False positives are fine, missing obstacles means missed occlusion.
    fn obstacles_in_circle(&self, center: Vec3, radius: f32, mask: u32) -> Vec<ObstacleBounds>;

    /// Distance to the nearest blocking hit along a normalized `direction`
    /// within `max_distance`, if any.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> Option<f32>;
}

/// 可选的遮挡查询资源；缺失时所有揭示都忽略遮挡
/// Optional occlusion resource; without it every reveal ignores occlusion
#[derive(Resource)]
pub struct FogOcclusion(pub Box<dyn OcclusionQuery>);

impl FogOcclusion {
    pub fn new(query: impl OcclusionQuery) -> Self {
        Self(Box::new(query))
    }
}

/// 视线检测结果
/// Outcome of a single line-of-sight test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SightLine {
    /// 没有障碍 / Nothing in the way
    Clear,
    /// 被挡住，但目标在穿透距离内
    /// Hit something, but the cell is within the penetration distance past it
    Penetrated { hit_distance: f32 },
    /// 被挡住 / Blocked
    Blocked { hit_distance: f32 },
}

impl SightLine {
    #[inline]
    pub fn is_visible(&self) -> bool {
        !matches!(self, SightLine::Blocked { .. })
    }
}

/// Casts one ray per candidate cell and applies the penetration tolerance.
pub struct LineOfSight<'a> {
    pub query: &'a dyn OcclusionQuery,
    pub mode: FogMode,
    /// 单元的世界尺寸 / World size of one cell
    pub cell_size: f32,
    /// 视线可以穿透障碍物的距离 / How far sight carries past a hit
    pub penetration: f32,
    pub mask: u32,
}

impl LineOfSight<'_> {
    /// Tests the cell at grid `offset` (with squared length `sq_distance`)
    /// from an observer at `origin` whose view reaches `world_radius`.
    pub fn test(&self, origin: Vec3, world_radius: f32, offset: IVec2, sq_distance: i64) -> SightLine {
        let max_distance = (sq_distance as f32).sqrt() * self.cell_size;
        let direction = self.mode.unproject(offset.as_vec2()).normalize_or_zero();

        let Some(hit_distance) = self
            .query
            .raycast(origin, direction, max_distance, self.mask)
        else {
            return SightLine::Clear;
        };

        if self.penetration == 0.0 {
            return SightLine::Blocked { hit_distance };
        }

        // compare against the cell's own distance, not the ray length
        let cell_distance = (offset.as_vec2() * self.cell_size).length();
        let allowed = (hit_distance + self.penetration).min(world_radius);
        if cell_distance <= allowed {
            SightLine::Penetrated { hit_distance }
        } else {
            SightLine::Blocked { hit_distance }
        }
    }
}
