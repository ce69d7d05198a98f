use bevy::math::Vec2;

/// Samples per world unit along the surface.
pub const SUBDIVISION: u32 = 5;
/// Reference tick rate the velocity kernel was tuned for.
pub const TIME_SCALE: f32 = 60.0;
/// Longest single integration step; longer ticks are split into substeps.
pub const MAX_STEP: f32 = 1.0 / 60.0;
/// Upper bound on substeps per `advance` call.
pub const MAX_SUBSTEPS: usize = 120;
/// Fraction of surface velocity left after one second.
pub const DAMPING: f32 = 0.5;
/// How strongly velocity moves the surface.
pub const VELOCITY_GAIN: f32 = 10.0;
/// Fraction of the old surface velocity kept after one second of contact with a body.
pub const DRAG_BLEND: f32 = 0.6;
/// Scale applied to `vy * |vy|` of a body hitting the surface.
pub const IMPACT_GAIN: f32 = 0.1;
/// Upward buoyant acceleration per unit of submerged area.
pub const BUOYANCY: Vec2 = Vec2::new(0.0, 500.0);
/// Linear drag coefficient applied to submerged bodies.
pub const WATER_DRAG: f32 = 20.0;
