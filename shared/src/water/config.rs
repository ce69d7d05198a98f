//! Tunable water parameters.
//!
//! Defaults reproduce the fixed constants in [`crate::constants`]. Scenes may
//! override any subset of fields; omitted fields fall back to the defaults.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BUOYANCY, DAMPING, DRAG_BLEND, IMPACT_GAIN, MAX_STEP, SUBDIVISION, TIME_SCALE,
    VELOCITY_GAIN, WATER_DRAG,
};

/// Per-field physical tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterTuning {
    /// Samples per world unit
    pub subdivision: u32,
    /// Scales the velocity kernel by `dt * time_scale`
    pub time_scale: f32,
    /// Longest step `advance` integrates at once
    pub max_step: f32,
    /// Velocity kept after one second (applied as `damping^dt`)
    pub damping: f32,
    /// Multiplier from velocity to height change
    pub velocity_gain: f32,
    /// Surface velocity kept after one second under a body
    pub drag_blend: f32,
    /// Gain of the `vy * |vy|` impact term
    pub impact_gain: f32,
    /// Buoyant acceleration per unit of submerged area
    pub buoyancy: Vec2,
    /// Linear drag on submerged bodies
    pub water_drag: f32,
}

impl Default for WaterTuning {
    fn default() -> Self {
        Self {
            subdivision: SUBDIVISION,
            time_scale: TIME_SCALE,
            max_step: MAX_STEP,
            damping: DAMPING,
            velocity_gain: VELOCITY_GAIN,
            drag_blend: DRAG_BLEND,
            impact_gain: IMPACT_GAIN,
            buoyancy: BUOYANCY,
            water_drag: WATER_DRAG,
        }
    }
}

impl WaterTuning {
    /// Returns the tuning with values that would break the integrator pulled
    /// back into range.
    ///
    /// `subdivision` is at least 1, the decay factors stay within `[0, 1]`,
    /// `max_step` stays positive and non-finite scalars fall back to their
    /// defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };

        Self {
            subdivision: self.subdivision.max(1),
            time_scale: finite_or(self.time_scale, defaults.time_scale),
            max_step: if self.max_step.is_finite() && self.max_step > 0.0 {
                self.max_step
            } else {
                defaults.max_step
            },
            damping: finite_or(self.damping, defaults.damping).clamp(0.0, 1.0),
            velocity_gain: finite_or(self.velocity_gain, defaults.velocity_gain),
            drag_blend: finite_or(self.drag_blend, defaults.drag_blend).clamp(0.0, 1.0),
            impact_gain: finite_or(self.impact_gain, defaults.impact_gain),
            buoyancy: if self.buoyancy.is_finite() {
                self.buoyancy
            } else {
                defaults.buoyancy
            },
            water_drag: finite_or(self.water_drag, defaults.water_drag),
        }
    }

    /// World-space distance between two samples.
    #[inline]
    pub fn spacing(&self) -> f32 {
        1.0 / self.subdivision.max(1) as f32
    }
}
