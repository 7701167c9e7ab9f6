use crate::error::FogError;
use crate::mapping::{FogMode, GridMapping};
use bevy::math::Vec2;
use bevy::ecs::reflect::ReflectResource;
use bevy::prelude::Resource;
use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

/// Global configuration resource for the fog of war grid.
/// 战争迷雾网格的全局设置
///
/// The grid layout (`map_resolution`, `map_size`, `map_offset`, `mode`) is
/// read once when the grid is created. The remaining values are read on
/// every reveal or publish and may be changed at runtime.
///
/// # Example
/// ```rust
/// # use bevy_grid_fog::prelude::*;
/// # use bevy::prelude::*;
/// let settings = FogOfWarSettings {
///     map_resolution: 256,
///     map_size: 512.0,
///     mode: FogMode::Mode2D,
///     ..Default::default()
/// };
/// assert_eq!(settings.cell_size(), 2.0);
/// assert_eq!(settings.partial_fog_value(), 127);
/// ```
#[derive(Resource, Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct FogOfWarSettings {
    /// 是否启用雾效系统
    /// Master switch; when off no reveal or publish happens
    pub enabled: bool,

    /// 每边的网格单元数量
    /// Cells per side of the square grid
    pub map_resolution: u32,

    /// 网格覆盖的世界尺寸
    /// World units covered per side
    pub map_size: f32,

    /// 网格中心的世界坐标
    /// World position of the grid center, in the fog plane
    pub map_offset: Vec2,

    /// 2D 使用 X/Y 平面，3D 使用 X/Z 平面
    /// 2D uses the X/Y plane, 3D the X/Z plane
    pub mode: FogMode,

    /// How far (world units) sight carries past the first obstacle hit.
    /// 0 makes every hit opaque.
    pub field_of_view_penetration: f32,

    /// 视野边缘渐变带占半径的比例 [0, 1]
    /// Share of the view radius used for the soft edge, in [0, 1]
    pub fog_edge_radius: f32,

    /// 衰减时迷雾恢复到的最低程度 [0, 1]
    /// How far fog grows back over unseen cells on each publish, in [0, 1]
    pub partial_fog_amount: f32,

    /// 发布与视野源更新的间隔（秒）
    /// Seconds between overlay publishes and between each source's reveals
    pub update_frequency: f32,
}

impl Default for FogOfWarSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            map_resolution: 128,
            map_size: 128.0,
            map_offset: Vec2::ZERO,
            mode: FogMode::Mode3D,
            field_of_view_penetration: 1.0,
            fog_edge_radius: 0.2,
            partial_fog_amount: 0.5,
            update_frequency: 0.1,
        }
    }
}

impl FogOfWarSettings {
    pub fn mapping(&self) -> GridMapping {
        GridMapping::new(self.map_resolution, self.map_size, self.map_offset, self.mode)
    }

    /// 单个网格单元的世界尺寸
    /// World size of a single cell
    pub fn cell_size(&self) -> f32 {
        self.map_size / self.map_resolution as f32
    }

    /// Floor the decay pass raises cells to.
    pub fn partial_fog_value(&self) -> u8 {
        (self.partial_fog_amount.clamp(0.0, 1.0) * 255.0) as u8
    }

    /// Checks the values for anything that would make the grid degenerate.
    /// Nothing here is fatal: a bad configuration only yields an empty or
    /// over-wide reveal.
    pub fn validate(&self) -> Result<(), FogError> {
        if self.map_resolution < 2 {
            return Err(FogError::InvalidSettings(format!(
                "map_resolution must be at least 2, got {}",
                self.map_resolution
            )));
        }
        if !(self.map_size.is_finite() && self.map_size > 0.0) {
            return Err(FogError::InvalidSettings(format!(
                "map_size must be positive, got {}",
                self.map_size
            )));
        }
        if !(0.0..=1.0).contains(&self.fog_edge_radius) {
            return Err(FogError::InvalidSettings(format!(
                "fog_edge_radius must be in [0, 1], got {}",
                self.fog_edge_radius
            )));
        }
        if !(0.0..=1.0).contains(&self.partial_fog_amount) {
            return Err(FogError::InvalidSettings(format!(
                "partial_fog_amount must be in [0, 1], got {}",
                self.partial_fog_amount
            )));
        }
        if self.field_of_view_penetration < 0.0 {
            return Err(FogError::InvalidSettings(format!(
                "field_of_view_penetration must not be negative, got {}",
                self.field_of_view_penetration
            )));
        }
        if self.update_frequency < 0.0 {
            return Err(FogError::InvalidSettings(format!(
                "update_frequency must not be negative, got {}",
                self.update_frequency
            )));
        }
        Ok(())
    }

    /// 从 JSON 加载设置，缺失的字段使用默认值
    /// Loads settings from JSON; missing fields take their defaults
    #[cfg(feature = "format-json")]
    pub fn from_json_str(json: &str) -> Result<Self, FogError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| FogError::DeserializationFailed(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = FogOfWarSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.cell_size(), 1.0);
        assert_eq!(settings.partial_fog_value(), 127);
        assert_eq!(settings.mapping().resolution, 128);
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let bad = [
            FogOfWarSettings {
                map_resolution: 1,
                ..Default::default()
            },
            FogOfWarSettings {
                map_size: 0.0,
                ..Default::default()
            },
            FogOfWarSettings {
                fog_edge_radius: 1.5,
                ..Default::default()
            },
            FogOfWarSettings {
                partial_fog_amount: -0.1,
                ..Default::default()
            },
            FogOfWarSettings {
                field_of_view_penetration: -1.0,
                ..Default::default()
            },
        ];
        for settings in bad {
            assert!(matches!(
                settings.validate(),
                Err(FogError::InvalidSettings(_))
            ));
        }
    }

    #[test]
    fn test_partial_fog_value_clamps() {
        let full = FogOfWarSettings {
            partial_fog_amount: 3.0,
            ..Default::default()
        };
        assert_eq!(full.partial_fog_value(), 255);
        let none = FogOfWarSettings {
            partial_fog_amount: 0.0,
            ..Default::default()
        };
        assert_eq!(none.partial_fog_value(), 0);
    }

    #[cfg(feature = "format-json")]
    #[test]
    fn test_from_json_str() {
        let settings =
            FogOfWarSettings::from_json_str(r#"{ "map_resolution": 64, "mode": "Mode2D" }"#)
                .unwrap();
        assert_eq!(settings.map_resolution, 64);
        assert_eq!(settings.mode, FogMode::Mode2D);
        assert_eq!(settings.map_size, 128.0);

        assert!(matches!(
            FogOfWarSettings::from_json_str(r#"{ "map_size": -4.0 }"#),
            Err(FogError::InvalidSettings(_))
        ));
        assert!(matches!(
            FogOfWarSettings::from_json_str("not json"),
            Err(FogError::DeserializationFailed(_))
        ));
    }
}
