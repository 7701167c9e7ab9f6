//! Grid based fog of war for Bevy.
//!
//! 基于网格的 Bevy 战争迷雾
//!
//! A square grid of fog bytes (0 clear, 255 fogged) covers the world plane.
//! [`VisionSource`](vision::VisionSource) entities carve view cones with a
//! soft edge into it, optionally stopped by obstacles through an
//! [`OcclusionQuery`](line_of_sight::OcclusionQuery). Periodically the grid is
//! published to [`FogOverlay`](overlay::FogOverlay) for rendering, and fog
//! grows back to the partial level over cells nobody sees any more.
//!
//! The algorithms in [`mapping`], [`grid`], [`occluder`], [`line_of_sight`]
//! and [`fill`] work without an `App`; [`FogOfWarPlugin`] drives them.

use crate::grid::FogGrid;
use crate::mapping::FogMode;
use crate::overlay::{FogOverlay, FogOverlayUpdated, FogUpdateTimer, publish_fog};
use crate::settings::FogOfWarSettings;
use crate::vision::{VisionSource, reveal_vision_sources};
use bevy::log::{info, warn};
use bevy::prelude::*;

pub mod error;
pub mod fill;
pub mod grid;
pub mod line_of_sight;
pub mod mapping;
pub mod obstacles;
pub mod occluder;
pub mod overlay;
pub mod prelude;
pub mod settings;
pub mod snapshot;
pub mod vision;

/// 迷雾系统集合，按顺序执行
/// Fog system sets, run in this order in `Update`
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FogSystems {
    /// 视野源揭示迷雾 / Vision sources reveal the grid
    Reveal,
    /// 发布覆盖层并衰减 / Publish the overlay, then decay
    Publish,
}

pub struct FogOfWarPlugin;

impl Plugin for FogOfWarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FogOfWarSettings>()
            .init_resource::<FogUpdateTimer>()
            .register_type::<FogOfWarSettings>()
            .register_type::<FogMode>()
            .register_type::<VisionSource>()
            .add_event::<FogOverlayUpdated>()
            .configure_sets(Update, (FogSystems::Reveal, FogSystems::Publish).chain())
            .add_systems(Startup, setup_fog_grid)
            .add_systems(
                Update,
                (
                    reveal_vision_sources.in_set(FogSystems::Reveal),
                    publish_fog.in_set(FogSystems::Publish),
                ),
            );
    }
}

/// Creates the grid from the settings unless one was inserted already.
fn setup_fog_grid(
    mut commands: Commands,
    settings: Res<FogOfWarSettings>,
    existing: Option<Res<FogGrid>>,
) {
    if let Err(err) = settings.validate() {
        warn!("fog of war settings: {err}");
    }

    let mapping = match existing {
        Some(grid) => {
            commands.insert_resource(FogOverlay::from_grid(&grid));
            *grid.mapping()
        }
        None => {
            let grid = FogGrid::new(settings.mapping());
            commands.insert_resource(FogOverlay::from_grid(&grid));
            let mapping = *grid.mapping();
            commands.insert_resource(grid);
            mapping
        }
    };

    info!(
        "fog of war grid ready: {}x{} cells of {} world units, {:?}",
        mapping.resolution,
        mapping.resolution,
        mapping.cell_size(),
        mapping.mode
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FULLY_FOGGED;
    use crate::line_of_sight::{FogOcclusion, ObstacleBounds};
    use crate::obstacles::AabbObstacles;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn app(settings: FogOfWarSettings) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(60)))
            .insert_resource(settings)
            .add_plugins(FogOfWarPlugin);
        app
    }

    fn spawn_source(app: &mut App, source: VisionSource, position: Vec3) {
        app.world_mut().spawn((
            source.with_initial_delay(0.0),
            GlobalTransform::from_translation(position),
        ));
    }

    fn overlay_value(app: &App, position: Vec3) -> u8 {
        let grid = app.world().resource::<FogGrid>();
        let index = grid
            .mapping()
            .index(grid.mapping().world_to_grid(position))
            .unwrap();
        app.world().resource::<FogOverlay>().values()[index]
    }

    #[test]
    fn test_reveal_publish_decay() {
        let mut app = app(FogOfWarSettings::default());
        spawn_source(&mut app, VisionSource::circle(5.0), Vec3::ZERO);
        app.update();

        // the overlay shows the reveal, the grid has already decayed
        assert_eq!(overlay_value(&app, Vec3::ZERO), 0);
        assert_eq!(overlay_value(&app, Vec3::new(20.0, 0.0, 20.0)), FULLY_FOGGED);
        let grid = app.world().resource::<FogGrid>();
        assert_eq!(grid.value_at(Vec3::ZERO), 127);
        assert_eq!(grid.value_at(Vec3::new(20.0, 0.0, 20.0)), FULLY_FOGGED);
        assert_eq!(app.world().resource::<FogOverlay>().generation(), 1);
    }

    #[test]
    fn test_disabled_does_nothing() {
        let mut app = app(FogOfWarSettings {
            enabled: false,
            ..Default::default()
        });
        spawn_source(&mut app, VisionSource::circle(5.0), Vec3::ZERO);
        app.update();
        app.update();

        let grid = app.world().resource::<FogGrid>();
        assert!(grid.values().iter().all(|&v| v == FULLY_FOGGED));
        assert_eq!(app.world().resource::<FogOverlay>().generation(), 0);
    }

    #[test]
    fn test_occlusion_resource() {
        let mut app = app(FogOfWarSettings {
            field_of_view_penetration: 0.0,
            ..Default::default()
        });
        let wall = ObstacleBounds::new(Vec3::new(2.0, -1.0, -1.0), Vec3::new(3.0, 1.0, 1.0));
        app.insert_resource(FogOcclusion::new(
            AabbObstacles::new(FogMode::Mode3D).with(wall, 1),
        ));
        spawn_source(
            &mut app,
            VisionSource::circle(5.0).with_line_of_sight_mask(1),
            Vec3::ZERO,
        );
        app.update();

        assert_eq!(overlay_value(&app, Vec3::new(4.0, 0.0, 0.0)), FULLY_FOGGED);
        assert!(overlay_value(&app, Vec3::new(-4.0, 0.0, 0.0)) < FULLY_FOGGED);
    }

    #[test]
    fn test_publish_cadence_and_event() {
        let mut app = app(FogOfWarSettings::default());
        for _ in 0..3 {
            app.update();
        }
        let generation = app.world().resource::<FogOverlay>().generation();
        assert_eq!(generation, 2);

        let events = app.world().resource::<Events<FogOverlayUpdated>>();
        let mut cursor = events.get_cursor();
        assert_eq!(
            cursor.read(events).last(),
            Some(&FogOverlayUpdated { generation: 2 })
        );
    }

    #[test]
    fn test_existing_grid_is_kept() {
        let mut app = app(FogOfWarSettings::default());
        let mut grid = FogGrid::new(FogOfWarSettings::default().mapping());
        grid.set_all(200);
        app.insert_resource(grid);
        app.update();

        let grid = app.world().resource::<FogGrid>();
        assert!(grid.values().iter().all(|&v| v == 200));
        assert_eq!(app.world().resource::<FogOverlay>().values()[0], 200);
    }
}
