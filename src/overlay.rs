use crate::grid::FogGrid;
use crate::mapping::{FogMode, GridMapping};
use crate::settings::FogOfWarSettings;
use crate::snapshot::FogSnapshot;
use bevy::log::debug;
use bevy::prelude::*;
use bytemuck::{Pod, Zeroable};

/// 覆盖层着色器采样快照所需的参数
/// Parameters an overlay shader needs to sample the published values
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct FogOverlayParams {
    /// 纹理每边的像素数 / Texels per side
    pub texture_size: u32,
    /// 覆盖的世界尺寸 / World units per side
    pub map_size: f32,
    pub map_offset: [f32; 2],
    pub mode: u32, // 0 = 2D (X/Y), 1 = 3D (X/Z)
    pub _padding: [u32; 3],
}

impl FogOverlayParams {
    pub fn from_mapping(mapping: &GridMapping) -> Self {
        Self {
            texture_size: mapping.resolution,
            map_size: mapping.size,
            map_offset: mapping.offset.to_array(),
            mode: match mapping.mode {
                FogMode::Mode2D => 0,
                FogMode::Mode3D => 1,
            },
            _padding: [0; 3],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// 已发布的迷雾值，供覆盖层读取
/// The last published fog values, read by overlay consumers
///
/// This is a copy taken before the decay pass of the same publish, so it
/// shows exactly what the observers revealed since the previous publish.
#[derive(Resource, Debug, Clone)]
pub struct FogOverlay {
    resolution: u32,
    values: Vec<u8>,
    generation: u64,
    params: FogOverlayParams,
}

impl FogOverlay {
    /// Generation 0, holding the grid's current values.
    pub fn from_grid(grid: &FogGrid) -> Self {
        Self {
            resolution: grid.resolution(),
            values: grid.values().to_vec(),
            generation: 0,
            params: FogOverlayParams::from_mapping(grid.mapping()),
        }
    }

    /// Copies the grid in and bumps the generation, returning the new one.
    pub fn publish(&mut self, grid: &FogGrid) -> u64 {
        self.resolution = grid.resolution();
        self.params = FogOverlayParams::from_mapping(grid.mapping());
        self.values.clear();
        self.values.extend_from_slice(grid.values());
        self.generation += 1;
        self.generation
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> &FogOverlayParams {
        &self.params
    }

    pub fn snapshot(&self) -> FogSnapshot {
        FogSnapshot {
            resolution: self.resolution,
            generation: self.generation,
            values: self.values.clone(),
        }
    }
}

/// Countdown to the next publish, in seconds.
#[derive(Resource, Debug, Clone, Default)]
pub struct FogUpdateTimer(pub f32);

/// 迷雾覆盖层已更新事件
/// Written after every publish
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FogOverlayUpdated {
    pub generation: u64,
}

/// Publishes the grid to [`FogOverlay`] and lets fog grow back over cells
/// nobody is looking at any more.
pub fn publish_fog(
    time: Res<Time>,
    settings: Res<FogOfWarSettings>,
    mut timer: ResMut<FogUpdateTimer>,
    grid: Option<ResMut<FogGrid>>,
    overlay: Option<ResMut<FogOverlay>>,
    mut updated: EventWriter<FogOverlayUpdated>,
) {
    if !settings.enabled {
        return;
    }
    let (Some(mut grid), Some(mut overlay)) = (grid, overlay) else {
        return;
    };

    timer.0 -= time.delta_secs();
    if timer.0 > 0.0 {
        return;
    }
    timer.0 = settings.update_frequency;

    let generation = overlay.publish(&grid);
    updated.write(FogOverlayUpdated { generation });
    grid.decay_pass(settings.partial_fog_value());
    debug!("published fog overlay generation {generation}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec2;

    fn grid() -> FogGrid {
        FogGrid::new(GridMapping::new(8, 16.0, Vec2::new(4.0, -2.0), FogMode::Mode2D))
    }

    #[test]
    fn test_params_layout() {
        let params = FogOverlayParams::from_mapping(grid().mapping());
        assert_eq!(params.texture_size, 8);
        assert_eq!(params.map_offset, [4.0, -2.0]);
        assert_eq!(params.mode, 0);
        assert_eq!(params.as_bytes().len(), 32);
        assert_eq!(&params.as_bytes()[..4], &8u32.to_ne_bytes());
    }

    #[test]
    fn test_publish_copies_and_counts() {
        let mut grid = grid();
        let mut overlay = FogOverlay::from_grid(&grid);
        assert_eq!(overlay.generation(), 0);
        assert!(overlay.values().iter().all(|&v| v == 255));

        grid.reveal_cell(0, 10);
        assert_eq!(overlay.publish(&grid), 1);
        assert_eq!(overlay.values()[0], 10);

        // later grid changes do not leak into the published copy
        grid.decay_pass(127);
        assert_eq!(overlay.values()[0], 10);

        let snapshot = overlay.snapshot();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.resolution, 8);
        assert_eq!(snapshot.values.len(), 64);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_publish_follows_replaced_grid() {
        let mut overlay = FogOverlay::from_grid(&grid());
        // same resolution, different layout
        let moved = FogGrid::new(GridMapping::new(8, 32.0, Vec2::new(-1.0, 1.0), FogMode::Mode3D));
        overlay.publish(&moved);
        assert_eq!(overlay.params(), &FogOverlayParams::from_mapping(moved.mapping()));
        assert_eq!(overlay.params().map_size, 32.0);
        assert_eq!(overlay.params().map_offset, [-1.0, 1.0]);
        assert_eq!(overlay.params().mode, 1);
    }
}
