//! Runs the fog without a window: a scout patrols past a wall and every
//! published overlay is printed as ASCII.
//!
//! cargo run --example headless

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_grid_fog::prelude::*;
use std::time::Duration;

#[derive(Component)]
struct Patrol {
    speed: f32,
    range: f32,
}

fn main() {
    let settings = FogOfWarSettings {
        map_resolution: 48,
        map_size: 48.0,
        mode: FogMode::Mode2D,
        update_frequency: 0.25,
        ..Default::default()
    };

    let obstacles = AabbObstacles::new(FogMode::Mode2D)
        .with(
            ObstacleBounds::new(Vec3::new(-6.0, 3.0, 0.0), Vec3::new(6.0, 4.0, 0.0)),
            1,
        )
        .with(
            ObstacleBounds::from_center_half_extents(Vec3::new(10.0, -6.0, 0.0), Vec3::splat(1.5)),
            2,
        );

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)))
        .insert_resource(settings)
        .insert_resource(FogOcclusion::new(obstacles))
        .add_plugins(FogOfWarPlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, patrol.before(FogSystems::Reveal))
        .add_systems(Update, print_overlay.after(FogSystems::Publish));

    for _ in 0..60 {
        app.update();
    }
}

fn setup(mut commands: Commands) {
    commands.spawn((
        VisionSource::cone(9.0, 120.0).with_line_of_sight_mask(1 | 2),
        GlobalTransform::from_translation(Vec3::new(-14.0, 0.0, 0.0)),
        Patrol {
            speed: 6.0,
            range: 14.0,
        },
    ));
    commands.spawn((
        VisionSource::circle(4.0),
        GlobalTransform::from_translation(Vec3::new(8.0, 12.0, 0.0)),
    ));
}

fn patrol(time: Res<Time>, mut scouts: Query<(&mut GlobalTransform, &mut Patrol)>) {
    for (mut transform, mut patrol) in &mut scouts {
        let mut position = transform.translation();
        position.x += patrol.speed * time.delta_secs();
        if position.x.abs() > patrol.range {
            position.x = position.x.clamp(-patrol.range, patrol.range);
            patrol.speed = -patrol.speed;
        }
        // face along the x axis; in 2D the facing is the transform's up
        let rotation = if patrol.speed > 0.0 {
            Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2)
        } else {
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)
        };
        *transform = GlobalTransform::from(Transform::from_translation(position).with_rotation(rotation));
    }
}

fn print_overlay(mut updated: EventReader<FogOverlayUpdated>, overlay: Res<FogOverlay>) {
    let Some(event) = updated.read().last() else {
        return;
    };

    let resolution = overlay.resolution() as usize;
    let mut out = format!("generation {}\n", event.generation);
    // top row first
    for row in overlay.values().chunks(resolution).rev() {
        out.extend(row.iter().map(|&value| match FogLevel::classify(value) {
            FogLevel::Clear => ' ',
            FogLevel::Partial => '.',
            FogLevel::Complete => '#',
        }));
        out.push('\n');
    }
    println!("{out}");
}
