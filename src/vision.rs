use crate::fill::{Viewer, unfog};
use crate::grid::FogGrid;
use crate::line_of_sight::FogOcclusion;
use crate::mapping::FogMode;
use crate::settings::FogOfWarSettings;
use bevy::log::trace;
use bevy::prelude::*;
use rand::Rng;

/// 视野源组件
/// Vision source component
///
/// Reveals the fog around its entity's `GlobalTransform` once every
/// [`FogOfWarSettings::update_frequency`] seconds. Sources are staggered by a
/// random first delay so many of them do not all reveal on the same frame.
#[derive(Component, Reflect, Clone, Debug)]
#[reflect(Component)]
pub struct VisionSource {
    /// 视野范围（世界单位）
    /// Vision range (world units)
    pub radius: f32,
    /// View angle in degrees; 180 and above sees all around.
    pub angle: f32,
    /// Obstacle categories that block sight; 0 ignores obstacles.
    pub line_of_sight_mask: u32,
    /// 是否启用
    /// Enabled
    pub enabled: bool,
    next_update: Option<f32>,
}

impl Default for VisionSource {
    fn default() -> Self {
        Self {
            radius: 5.0,
            angle: 180.0,
            line_of_sight_mask: 0,
            enabled: true,
            next_update: None,
        }
    }
}

impl VisionSource {
    pub fn circle(radius: f32) -> Self {
        Self {
            radius,
            ..default()
        }
    }

    pub fn cone(radius: f32, angle: f32) -> Self {
        Self {
            radius,
            angle,
            ..default()
        }
    }

    pub fn with_line_of_sight_mask(mut self, mask: u32) -> Self {
        self.line_of_sight_mask = mask;
        self
    }

    /// Overrides the random first delay.
    pub fn with_initial_delay(mut self, seconds: f32) -> Self {
        self.next_update = Some(seconds);
        self
    }

    /// Counts down by `delta`; returns true when a reveal is due and
    /// restarts the countdown at `frequency`.
    pub fn tick(&mut self, delta: f32, frequency: f32) -> bool {
        let remaining = self.next_update.get_or_insert_with(|| stagger(frequency));
        *remaining -= delta;
        if *remaining > 0.0 {
            return false;
        }
        *remaining = frequency;
        true
    }

    /// The viewer this source describes at `transform`.
    pub fn viewer(&self, transform: &GlobalTransform, mode: FogMode) -> Viewer {
        let facing = *transform.forward() + *transform.up();
        Viewer {
            position: transform.translation(),
            radius: self.radius,
            angle: self.angle,
            forward: mode.project(facing).normalize_or_zero(),
            line_of_sight_mask: self.line_of_sight_mask,
        }
    }
}

fn stagger(frequency: f32) -> f32 {
    if frequency > 0.0 {
        rand::rng().random_range(0.0..frequency)
    } else {
        0.0
    }
}

/// Reveals the fog for every vision source whose countdown expired.
pub fn reveal_vision_sources(
    time: Res<Time>,
    settings: Res<FogOfWarSettings>,
    grid: Option<ResMut<FogGrid>>,
    occlusion: Option<Res<FogOcclusion>>,
    mut sources: Query<(Entity, &mut VisionSource, &GlobalTransform)>,
) {
    if !settings.enabled {
        return;
    }
    let Some(mut grid) = grid else {
        return;
    };

    let delta = time.delta_secs();
    let mode = grid.mapping().mode;
    let query = occlusion.as_deref().map(|o| o.0.as_ref());

    for (entity, mut source, transform) in &mut sources {
        if !source.enabled || !source.tick(delta, settings.update_frequency) {
            continue;
        }
        let viewer = source.viewer(transform, mode);
        let stats = unfog(&mut grid, &viewer, &settings, query);
        trace!(
            "vision source {entity} revealed {} of {} cells ({} raycasts, {} blocked)",
            stats.revealed,
            stats.visited,
            stats.raycasts,
            stats.blocked
        );
    }
}
