use crate::mapping::{GridCoord, GridMapping};
use bevy::math::{IVec2, Vec3};
use bevy::prelude::Resource;

/// 完全可见
/// Fully visible cell value
pub const FULLY_VISIBLE: u8 = 0;
/// 完全被迷雾覆盖
/// Fully fogged cell value
pub const FULLY_FOGGED: u8 = 255;
/// 高于此值视为完全迷雾
/// Values above this count as complete fog
pub const COMPLETE_FOG_THRESHOLD: u8 = 240;
/// 高于此值视为部分迷雾
/// Values above this count as partial fog
pub const PARTIAL_FOG_THRESHOLD: u8 = 20;

/// 单元迷雾等级
/// Fog classification of a single cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogLevel {
    /// 可见 / Visible
    Clear,
    /// 部分迷雾 / Partially fogged
    Partial,
    /// 完全迷雾 / Completely fogged
    Complete,
}

impl FogLevel {
    pub fn classify(value: u8) -> Self {
        if value > COMPLETE_FOG_THRESHOLD {
            FogLevel::Complete
        } else if value > PARTIAL_FOG_THRESHOLD {
            FogLevel::Partial
        } else {
            FogLevel::Clear
        }
    }
}

/// Per-cell visibility store: `resolution²` bytes, row-major by y then x,
/// where 0 is fully visible and 255 fully fogged.
///
/// Reveals only ever lower a cell ([`FogGrid::reveal_cell`]), so reveals
/// from several observers combine as a minimum in any order. The decay
/// pass is the only writer that raises values and must not interleave with
/// a reveal.
#[derive(Resource, Debug, Clone)]
pub struct FogGrid {
    mapping: GridMapping,
    values: Vec<u8>,
}

impl FogGrid {
    /// 创建一个完全被迷雾覆盖的网格
    /// Creates a grid with every cell fully fogged
    pub fn new(mapping: GridMapping) -> Self {
        let cells = mapping.resolution as usize * mapping.resolution as usize;
        Self {
            mapping,
            values: vec![FULLY_FOGGED; cells],
        }
    }

    #[inline]
    pub fn mapping(&self) -> &GridMapping {
        &self.mapping
    }

    #[inline]
    pub fn resolution(&self) -> u32 {
        self.mapping.resolution
    }

    /// 只读原始数据
    /// Read-only raw cell values
    #[inline]
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn set_all(&mut self, value: u8) {
        self.values.fill(value);
    }

    #[inline]
    pub fn get(&self, coord: GridCoord) -> Option<u8> {
        self.mapping.index(coord).map(|index| self.values[index])
    }

    #[inline]
    pub(crate) fn value_at_index(&self, index: usize) -> u8 {
        self.values[index]
    }

    /// Lowers the cell at `index` to `value`. Returns whether the cell changed;
    /// a cell that is already at least as visible is left alone.
    #[inline]
    pub fn reveal_cell(&mut self, index: usize, value: u8) -> bool {
        match self.values.get_mut(index) {
            Some(current) if value < *current => {
                *current = value;
                true
            }
            _ => false,
        }
    }

    /// Raises every cell below `floor` up to `floor`. Cells at or above the
    /// floor are untouched.
    pub fn decay_pass(&mut self, floor: u8) {
        for value in self.values.iter_mut() {
            if *value < floor {
                *value = floor;
            }
        }
    }

    /// 将世界坐标矩形区域完全揭示（超出网格的部分被忽略）
    /// Fully reveals a world-space rectangle, ignoring the part outside the grid
    pub fn reveal_rect(&mut self, world_min: Vec3, world_max: Vec3) {
        let res = self.mapping.resolution as i32;
        let a = self.mapping.world_to_grid(world_min);
        let b = self.mapping.world_to_grid(world_max);
        let min = a.min(b).max(IVec2::ZERO);
        let max = a.max(b).min(IVec2::splat(res));
        if min.x >= max.x {
            return;
        }
        for y in min.y..max.y {
            let row = y as usize * res as usize;
            self.values[row + min.x as usize..row + max.x as usize].fill(FULLY_VISIBLE);
        }
    }

    /// 查询世界坐标处的迷雾值，网格之外视为完全迷雾
    /// Fog value at a world position; outside the grid counts as fully fogged
    pub fn value_at(&self, position: Vec3) -> u8 {
        self.get(self.mapping.world_to_grid(position))
            .unwrap_or(FULLY_FOGGED)
    }

    pub fn level_at(&self, position: Vec3) -> FogLevel {
        FogLevel::classify(self.value_at(position))
    }

    pub fn is_in_complete_fog(&self, position: Vec3) -> bool {
        self.value_at(position) > COMPLETE_FOG_THRESHOLD
    }

    pub fn is_in_partial_fog(&self, position: Vec3) -> bool {
        self.value_at(position) > PARTIAL_FOG_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FogMode;
    use bevy::math::Vec2;

    fn grid() -> FogGrid {
        FogGrid::new(GridMapping::new(8, 8.0, Vec2::ZERO, FogMode::Mode2D))
    }

    #[test]
    fn test_new_grid_is_fully_fogged() {
        let grid = grid();
        assert_eq!(grid.values().len(), 64);
        assert!(grid.values().iter().all(|&v| v == FULLY_FOGGED));
    }

    #[test]
    fn test_reveal_is_monotonic() {
        let mut grid = grid();
        assert!(grid.reveal_cell(3, 100));
        assert!(!grid.reveal_cell(3, 150));
        assert_eq!(grid.values()[3], 100);
        assert!(grid.reveal_cell(3, 40));
        assert!(!grid.reveal_cell(3, 40));
        assert_eq!(grid.values()[3], 40);
        assert!(!grid.reveal_cell(1000, 0));
    }

    #[test]
    fn test_decay_floor() {
        let mut grid = grid();
        grid.reveal_cell(0, 0);
        grid.reveal_cell(1, 127);
        grid.reveal_cell(2, 128);
        grid.reveal_cell(3, 200);
        grid.decay_pass(127);
        assert_eq!(&grid.values()[..5], &[127, 127, 128, 200, 255]);
        assert!(grid.values().iter().all(|&v| v >= 127));
    }

    #[test]
    fn test_set_all() {
        let mut grid = grid();
        grid.set_all(7);
        assert!(grid.values().iter().all(|&v| v == 7));
    }

    #[test]
    fn test_value_queries() {
        let mut grid = grid();
        let index = grid.mapping().index(IVec2::new(4, 4)).unwrap();
        grid.reveal_cell(index, 0);
        assert_eq!(grid.value_at(Vec3::new(0.5, 0.5, 0.0)), 0);
        assert_eq!(grid.value_at(Vec3::new(100.0, 0.0, 0.0)), FULLY_FOGGED);
        assert!(!grid.is_in_partial_fog(Vec3::new(0.5, 0.5, 0.0)));
        assert!(grid.is_in_complete_fog(Vec3::new(-2.5, 0.5, 0.0)));
        assert_eq!(grid.level_at(Vec3::new(0.5, 0.5, 0.0)), FogLevel::Clear);
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(FogLevel::classify(20), FogLevel::Clear);
        assert_eq!(FogLevel::classify(21), FogLevel::Partial);
        assert_eq!(FogLevel::classify(240), FogLevel::Partial);
        assert_eq!(FogLevel::classify(241), FogLevel::Complete);
    }

    #[test]
    fn test_reveal_rect_clamps_to_grid() {
        let mut grid = grid();
        grid.reveal_rect(Vec3::new(-10.0, -1.0, 0.0), Vec3::new(-2.0, 1.0, 0.0));
        // x cells [0, 2), y cells [3, 5)
        for y in 0..8 {
            for x in 0..8 {
                let expected = if x < 2 && (3..5).contains(&y) { 0 } else { 255 };
                assert_eq!(grid.get(IVec2::new(x, y)), Some(expected), "cell {x},{y}");
            }
        }
    }
}
