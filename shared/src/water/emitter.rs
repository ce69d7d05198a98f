//! Scripted disturbances of the water surface.

use bevy_log::debug;
use serde::{Deserialize, Serialize};

use super::field::HeightField;

/// Drop a single drip into `field`.
///
/// The sample `offset_from_end` places before the last one is pushed down to
/// `-depth` and its velocity cleared; the next `advance` spreads it out.
/// Returns the touched index, or `None` when the offset runs past the start
/// of the field.
pub fn drip(field: &mut HeightField, offset_from_end: usize, depth: f32) -> Option<usize> {
    let Some(index) = (field.sample_count() - 1).checked_sub(offset_from_end) else {
        debug!(
            "Ignoring drip {} samples from the end of a {}-sample field",
            offset_from_end,
            field.sample_count()
        );
        return None;
    };

    field.heights_mut()[index] = -depth;
    field.velocities_mut()[index] = 0.0;
    Some(index)
}

/// Periodic drip configuration. The host owns the clock and calls [`drip`]
/// whenever the schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DripSchedule {
    /// Index of the field the drips land in
    pub field: usize,
    /// Seconds between drips
    pub period: f32,
    /// Maximum random deviation from `period`, in seconds
    pub jitter: f32,
    pub offset_from_end: usize,
    pub depth: f32,
}

impl Default for DripSchedule {
    fn default() -> Self {
        Self {
            field: 0,
            period: 2.0,
            jitter: 0.0,
            offset_from_end: 8,
            depth: 0.5,
        }
    }
}

impl DripSchedule {
    /// Delay until the next drip given a jitter sample in `[-1, 1]`.
    ///
    /// Never shorter than a tenth of the period so drips cannot pile up.
    pub fn next_delay(&self, jitter_sample: f32) -> f32 {
        let period = self.period.max(0.0);
        let delay = period + self.jitter.abs() * jitter_sample.clamp(-1.0, 1.0);
        delay.max(period * 0.1)
    }
}
