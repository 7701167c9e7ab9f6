use bevy::math::{IVec2, Vec2, Vec3};
use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

/// 网格单元坐标，范围为 [0, resolution)
/// Grid cell coordinate, valid range is [0, resolution)
pub type GridCoord = IVec2;

/// 世界坐标到地图平面的投影模式
/// Which two world axes form the fog plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum FogMode {
    /// 使用 X/Y 轴（2D 游戏）
    /// Uses the X/Y axes (2D games)
    Mode2D,
    /// 使用 X/Z 轴（3D 游戏，Y 轴向上）
    /// Uses the X/Z axes (3D games, Y up)
    #[default]
    Mode3D,
}

impl FogMode {
    /// 将世界坐标投影到雾平面
    /// Projects a world position onto the fog plane
    #[inline]
    pub fn project(self, position: Vec3) -> Vec2 {
        match self {
            FogMode::Mode2D => Vec2::new(position.x, position.y),
            FogMode::Mode3D => Vec2::new(position.x, position.z),
        }
    }

    /// 将雾平面上的方向提升回世界空间
    /// Lifts a fog plane direction back into world space
    #[inline]
    pub fn unproject(self, direction: Vec2) -> Vec3 {
        match self {
            FogMode::Mode2D => Vec3::new(direction.x, direction.y, 0.0),
            FogMode::Mode3D => Vec3::new(direction.x, 0.0, direction.y),
        }
    }
}

/// World to grid affine mapping, fixed when the grid is created.
///
/// The grid is centered on `offset`: world `offset` lands on cell
/// `(resolution / 2, resolution / 2)` and the grid spans `size` world units
/// per side. Outputs are not clamped; callers decide what to do with cells
/// outside `[0, resolution)`.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct GridMapping {
    /// 每边的单元数量
    /// Cells per side
    pub resolution: u32,
    /// 网格覆盖的世界尺寸
    /// World units covered per side
    pub size: f32,
    /// 网格中心的世界坐标（雾平面内）
    /// World position of the grid center, in the fog plane
    pub offset: Vec2,
    pub mode: FogMode,
}

impl GridMapping {
    pub fn new(resolution: u32, size: f32, offset: Vec2, mode: FogMode) -> Self {
        Self {
            resolution,
            size,
            offset,
            mode,
        }
    }

    /// 单个网格单元的世界尺寸
    /// World size of a single cell
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.size / self.resolution as f32
    }

    /// 世界单位到网格单位的缩放系数
    /// Scale factor from world units to cells
    #[inline]
    pub fn cells_per_unit(&self) -> f32 {
        self.resolution as f32 / self.size
    }

    #[inline]
    pub fn project(&self, position: Vec3) -> Vec2 {
        self.mode.project(position)
    }

    /// 将世界坐标转换为网格坐标
    /// Converts a world position to the cell containing it
    pub fn world_to_grid(&self, position: Vec3) -> GridCoord {
        self.plane_to_grid(self.project(position))
    }

    /// Same as [`Self::world_to_grid`] for a position already in the fog plane.
    pub fn plane_to_grid(&self, position: Vec2) -> GridCoord {
        let scaled = (position - self.offset) * self.cells_per_unit();
        let half = (self.resolution >> 1) as i32;
        // far positions stay pinned to the i32 limits
        let cell = scaled.floor().as_ivec2();
        IVec2::new(cell.x.saturating_add(half), cell.y.saturating_add(half))
    }

    /// 将世界坐标转换为 [0,1] 归一化的网格坐标（用于叠加层采样）
    /// Converts a world position to normalized [0,1] grid space, for overlay sampling
    pub fn world_to_normalized(&self, position: Vec3) -> Vec2 {
        (self.project(position) - self.offset) / self.size + Vec2::splat(0.5)
    }

    /// 将归一化的网格坐标转换回雾平面内的世界坐标
    /// Converts a normalized grid position back to a world position in the fog plane
    pub fn normalized_to_world(&self, normalized: Vec2) -> Vec2 {
        (normalized - Vec2::splat(0.5)) * self.size + self.offset
    }

    /// 网格单元中心的世界坐标（雾平面内）
    /// World position of a cell's center, in the fog plane
    pub fn cell_center(&self, coord: GridCoord) -> Vec2 {
        let half = (self.resolution >> 1) as i32;
        ((coord - IVec2::splat(half)).as_vec2() + Vec2::splat(0.5)) * self.cell_size()
            + self.offset
    }

    /// 单元是否在网格内
    /// Whether the cell lies inside the grid
    #[inline]
    pub fn contains(&self, coord: GridCoord) -> bool {
        let res = self.resolution as i32;
        coord.x >= 0 && coord.y >= 0 && coord.x < res && coord.y < res
    }

    /// 行优先索引，超出网格时返回 None
    /// Row-major index, None when outside the grid
    #[inline]
    pub fn index(&self, coord: GridCoord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.y as usize * self.resolution as usize + coord.x as usize)
    }
}
