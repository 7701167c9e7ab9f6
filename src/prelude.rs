pub use crate::{
    FogOfWarPlugin, FogSystems,
    error::FogError,
    fill::{FillStats, RevealRequest, Viewer, fill, unfog},
    grid::{
        COMPLETE_FOG_THRESHOLD, FULLY_FOGGED, FULLY_VISIBLE, FogGrid, FogLevel,
        PARTIAL_FOG_THRESHOLD,
    },
    line_of_sight::{FogOcclusion, LineOfSight, ObstacleBounds, OcclusionQuery, SightLine},
    mapping::{FogMode, GridCoord, GridMapping},
    obstacles::AabbObstacles,
    occluder::{FogRect, OccluderSet},
    overlay::{FogOverlay, FogOverlayParams, FogOverlayUpdated, FogUpdateTimer},
    settings::FogOfWarSettings,
    snapshot::{FogSnapshot, SnapshotFormat},
    vision::VisionSource,
};
