use crate::line_of_sight::ObstacleBounds;
use crate::mapping::{GridCoord, GridMapping};
use bevy::math::IVec2;

/// 障碍物在网格空间的包围矩形（闭区间）
/// Obstacle bounds in grid space, inclusive on both ends
///
/// The setters keep `min <= max` on both axes: moving one edge past the
/// opposite edge drags the opposite edge along, collapsing the rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FogRect {
    min: GridCoord,
    max: GridCoord,
}

impl FogRect {
    pub fn new(a: GridCoord, b: GridCoord) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// 将障碍物的世界包围盒映射到网格
    /// Maps an obstacle's world bounds onto the grid
    pub fn from_bounds(bounds: &ObstacleBounds, mapping: &GridMapping) -> Self {
        Self::new(
            mapping.world_to_grid(bounds.min),
            mapping.world_to_grid(bounds.max),
        )
    }

    #[inline]
    pub fn min(&self) -> GridCoord {
        self.min
    }

    #[inline]
    pub fn max(&self) -> GridCoord {
        self.max
    }

    #[inline]
    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    pub fn set_min_x(&mut self, value: i32) {
        self.min.x = value;
        self.max.x = self.max.x.max(value);
    }

    pub fn set_min_y(&mut self, value: i32) {
        self.min.y = value;
        self.max.y = self.max.y.max(value);
    }

    pub fn set_max_x(&mut self, value: i32) {
        self.max.x = value;
        self.min.x = self.min.x.min(value);
    }

    pub fn set_max_y(&mut self, value: i32) {
        self.max.y = value;
        self.min.y = self.min.y.min(value);
    }

    #[inline]
    pub fn contains(&self, point: GridCoord) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn contains_rect(&self, other: &FogRect) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// Pushes every edge that reaches past `center` on its own side out to
    /// the circle's edge, so everything behind the obstacle (as seen from
    /// the center) is inside the rectangle.
    pub fn extend_to_circle_edge(&mut self, center: GridCoord, radius: i32) {
        if self.min.x < center.x {
            self.set_min_x(center.x.saturating_sub(radius));
        }
        if self.max.x > center.x {
            self.set_max_x(center.x.saturating_add(radius));
        }
        if self.min.y < center.y {
            self.set_min_y(center.y.saturating_sub(radius));
        }
        if self.max.y > center.y {
            self.set_max_y(center.y.saturating_add(radius));
        }
    }
}

/// Regions of one reveal within which a cell might be occluded and needs a
/// raycast. Cells outside every region are revealed without one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccluderSet {
    rects: Vec<FogRect>,
}

impl OccluderSet {
    /// Builds the set for an observer at grid `center` with grid `radius`:
    /// maps, extends and optimises the obstacle bounds. Returns `None` when
    /// nothing is left, meaning no cell needs a raycast.
    pub fn build<'a>(
        obstacles: impl IntoIterator<Item = &'a ObstacleBounds>,
        mapping: &GridMapping,
        center: GridCoord,
        radius: i32,
    ) -> Option<Self> {
        let mut set = Self {
            rects: obstacles
                .into_iter()
                .map(|bounds| FogRect::from_bounds(bounds, mapping))
                .collect(),
        };
        set.extend_to_circle_edge(center, radius);
        set.optimise();
        (!set.is_empty()).then_some(set)
    }

    pub fn from_rects(rects: Vec<FogRect>) -> Self {
        Self { rects }
    }

    pub fn rects(&self) -> &[FogRect] {
        &self.rects
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    #[inline]
    pub fn contains(&self, point: GridCoord) -> bool {
        self.rects.iter().any(|rect| rect.contains(point))
    }

    pub fn extend_to_circle_edge(&mut self, center: GridCoord, radius: i32) {
        for rect in &mut self.rects {
            rect.extend_to_circle_edge(center, radius);
        }
    }

    /// Drops every rectangle contained in another one. Of several identical
    /// rectangles the first is kept.
    pub fn optimise(&mut self) {
        let rects = &self.rects;
        let keep: Vec<bool> = (0..rects.len())
            .map(|i| {
                !rects.iter().enumerate().any(|(j, other)| {
                    j != i && other.contains_rect(&rects[i]) && (other != &rects[i] || j < i)
                })
            })
            .collect();

        let mut keep = keep.into_iter();
        self.rects.retain(|_| keep.next().unwrap_or(true));
    }
}
