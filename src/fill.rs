//! Per-observer visibility fill.
//!
//! A reveal walks every cell in the observer's clamped bounding box and
//! lowers it according to radial falloff and the view cone. When obstacles
//! are near, cells inside an [`OccluderSet`] region are confirmed with a
//! raycast first; every other cell is revealed directly.

use crate::grid::{FULLY_VISIBLE, FogGrid};
use crate::line_of_sight::{LineOfSight, OcclusionQuery};
use crate::mapping::{GridCoord, GridMapping};
use crate::occluder::OccluderSet;
use crate::settings::FogOfWarSettings;
use bevy::log::trace;
use bevy::math::{IVec2, Vec2, Vec3};

/// A cone threshold at or below this value means the observer sees all
/// around and the cone test is skipped.
pub const OMNIDIRECTIONAL_COS: f32 = -0.99;

/// Maps a view angle in degrees to the cone threshold compared against
/// `dot(direction, forward)`. 180 degrees and above is omnidirectional.
#[inline]
pub fn cone_threshold(view_angle: f32) -> f32 {
    1.0 - view_angle / 90.0
}

/// Everything one observer update needs, precomputed once.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealRequest {
    pub world_position: Vec3,
    pub world_radius: f32,
    pub center: GridCoord,
    pub radius: i32,
    pub radius_sq: i64,
    /// Cells up to this distance are fully revealed
    pub inner_radius: i32,
    pub inner_radius_sq: i64,
    /// Facing in the fog plane
    pub forward: Vec2,
    pub cos_threshold: f32,
    pub x_start: i32,
    pub x_end: i32,
    pub y_start: i32,
    pub y_end: i32,
}

impl RevealRequest {
    /// `edge_fraction` is the share of the radius used for the falloff band;
    /// 0 disables falloff.
    pub fn new(
        mapping: &GridMapping,
        world_position: Vec3,
        world_radius: f32,
        view_angle: f32,
        forward: Vec2,
        edge_fraction: f32,
    ) -> Self {
        let center = mapping.world_to_grid(world_position);
        let radius = (world_radius * mapping.cells_per_unit()) as i32;
        let inner_radius = ((1.0 - edge_fraction.clamp(0.0, 1.0)) * radius as f32) as i32;

        // keep one cell away from the border to avoid edge artifacts
        let last = mapping.resolution as i32 - 1;
        let clamp = |v: i32| v.max(1).min(last);
        let x_start = clamp(center.x.saturating_sub(radius));
        let x_end = clamp(center.x.saturating_add(radius));
        let y_start = clamp(center.y.saturating_sub(radius));
        let y_end = clamp(center.y.saturating_add(radius));

        Self {
            world_position,
            world_radius,
            center,
            radius,
            radius_sq: square(radius as i64),
            inner_radius,
            inner_radius_sq: square(inner_radius as i64),
            forward,
            cos_threshold: cone_threshold(view_angle),
            x_start,
            x_end,
            y_start,
            y_end,
        }
    }

    /// Number of cells in the iteration box.
    pub fn cell_count(&self) -> usize {
        let w = (self.x_end - self.x_start).max(0) as usize;
        let h = (self.y_end - self.y_start).max(0) as usize;
        w * h
    }

    #[inline]
    pub fn in_view_cone(&self, direction: Vec2) -> bool {
        self.cos_threshold <= OMNIDIRECTIONAL_COS || direction.dot(self.forward) > self.cos_threshold
    }

    /// Fog value for a revealed cell at squared grid distance `sq_distance`.
    #[inline]
    pub fn falloff(&self, sq_distance: i64) -> u8 {
        if sq_distance <= self.inner_radius_sq {
            return FULLY_VISIBLE;
        }
        let band = (self.radius - self.inner_radius) as f32;
        if band <= 0.0 {
            return FULLY_VISIBLE;
        }
        let t = ((sq_distance as f32).sqrt() - self.inner_radius as f32) / band;
        (t.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

#[inline]
fn square(v: i64) -> i64 {
    v.saturating_mul(v)
}

/// Counters for one fill, for tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    pub visited: usize,
    pub revealed: usize,
    pub raycasts: usize,
    pub blocked: usize,
}

/// Reveals the request's cells in `grid`. With `occlusion`, cells inside an
/// occluder region are revealed only when the line of sight allows it.
pub fn fill(
    grid: &mut FogGrid,
    request: &RevealRequest,
    occlusion: Option<(&OccluderSet, &LineOfSight<'_>)>,
) -> FillStats {
    let mut stats = FillStats::default();
    let resolution = grid.resolution() as usize;

    for y in request.y_start..request.y_end {
        for x in request.x_start..request.x_end {
            let index = y as usize * resolution + x as usize;
            stats.visited += 1;

            if grid.value_at_index(index) == FULLY_VISIBLE {
                continue;
            }

            let offset = IVec2::new(
                x.saturating_sub(request.center.x),
                y.saturating_sub(request.center.y),
            );
            let sq_distance = square(offset.x as i64).saturating_add(square(offset.y as i64));
            if sq_distance >= request.radius_sq {
                continue;
            }

            if !request.in_view_cone(offset.as_vec2().normalize_or_zero()) {
                continue;
            }

            if let Some((occluders, line_of_sight)) = occlusion {
                if occluders.contains(IVec2::new(x, y)) {
                    stats.raycasts += 1;
                    let sight = line_of_sight.test(
                        request.world_position,
                        request.world_radius,
                        offset,
                        sq_distance,
                    );
                    if !sight.is_visible() {
                        stats.blocked += 1;
                        continue;
                    }
                }
            }

            if grid.reveal_cell(index, request.falloff(sq_distance)) {
                stats.revealed += 1;
            }
        }
    }

    stats
}

/// One observer's view for a single reveal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewer {
    pub position: Vec3,
    /// World units
    pub radius: f32,
    /// Degrees
    pub angle: f32,
    /// Facing in the fog plane
    pub forward: Vec2,
    /// Obstacle categories that block sight; 0 ignores occlusion
    pub line_of_sight_mask: u32,
}

/// Reveals what `viewer` can see. Occlusion is only considered when a query
/// is available, the mask is non-zero and obstacles overlap the view circle;
/// otherwise this is a plain circle reveal.
pub fn unfog(
    grid: &mut FogGrid,
    viewer: &Viewer,
    settings: &FogOfWarSettings,
    query: Option<&dyn OcclusionQuery>,
) -> FillStats {
    let mapping = *grid.mapping();
    let request = RevealRequest::new(
        &mapping,
        viewer.position,
        viewer.radius,
        viewer.angle,
        viewer.forward,
        settings.fog_edge_radius,
    );

    let mask = viewer.line_of_sight_mask;
    let Some(query) = query.filter(|_| mask != 0) else {
        return fill(grid, &request, None);
    };

    let obstacles = query.obstacles_in_circle(viewer.position, viewer.radius, mask);
    let Some(occluders) = OccluderSet::build(&obstacles, &mapping, request.center, request.radius)
    else {
        return fill(grid, &request, None);
    };

    trace!(
        "reveal at {:?}: {} obstacles, {} occluder regions",
        request.center,
        obstacles.len(),
        occluders.len()
    );

    let line_of_sight = LineOfSight {
        query,
        mode: mapping.mode,
        cell_size: mapping.cell_size(),
        penetration: settings.field_of_view_penetration,
        mask,
    };
    fill(grid, &request, Some((&occluders, &line_of_sight)))
}
