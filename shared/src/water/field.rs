//! One-dimensional height field simulating a water surface cross-section.

use bevy::math::Vec2;
use bevy_log::debug;

use super::config::WaterTuning;
use super::kernel::{convolve_same_into, POSITION_KERNEL, VELOCITY_KERNEL};
use crate::constants::MAX_SUBSTEPS;

/// Axis-aligned box in world units, y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl BoundingBox {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Box of the given size with its bottom-left corner at `(x, y)`.
    pub fn from_corner(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.bottom + self.top) * 0.5,
        )
    }

    /// Whether the two boxes overlap. Touching edges count as overlapping.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.bottom <= other.top
            && other.bottom <= self.top
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(
            self.left + offset.x,
            self.bottom + offset.y,
            self.right + offset.x,
            self.top + offset.y,
        )
    }
}

/// Water surface stored as displacements from a rest level.
///
/// Samples are `spacing` apart starting at `origin_x`. `advance` integrates
/// the surface; bodies push it through [`HeightField::velocities_mut`].
#[derive(Debug, Clone)]
pub struct HeightField {
    origin_x: f32,
    spacing: f32,
    rest_level: f32,
    floor_level: f32,
    heights: Vec<f32>,
    velocities: Vec<f32>,
    tuning: WaterTuning,
    /// Reused output buffer for the convolutions
    scratch: Vec<f32>,
}

impl HeightField {
    /// Flat field covering `span` world units to the right of `origin_x`.
    pub fn new(origin_x: f32, span: f32, rest_level: f32, floor_level: f32) -> Self {
        Self::with_tuning(origin_x, span, rest_level, floor_level, WaterTuning::default())
    }

    pub fn with_tuning(
        origin_x: f32,
        span: f32,
        rest_level: f32,
        floor_level: f32,
        tuning: WaterTuning,
    ) -> Self {
        let tuning = tuning.sanitized();
        let sample_count = Self::sample_count_for(span, tuning.subdivision);

        debug!(
            "Creating height field at x={} with {} samples (rest {}, floor {})",
            origin_x, sample_count, rest_level, floor_level
        );

        Self {
            origin_x,
            spacing: tuning.spacing(),
            rest_level,
            floor_level,
            heights: vec![0.0; sample_count],
            velocities: vec![0.0; sample_count],
            tuning,
            scratch: vec![0.0; sample_count],
        }
    }

    /// `round(span) * subdivision + 1`, with invalid spans treated as zero.
    /// Saturates at `usize::MAX` instead of overflowing.
    pub fn sample_count_for(span: f32, subdivision: u32) -> usize {
        let units = if span.is_finite() {
            span.round().max(0.0) as usize
        } else {
            0
        };
        units
            .saturating_mul(subdivision.max(1) as usize)
            .saturating_add(1)
    }

    /// Integrate the surface by `dt` seconds.
    ///
    /// Skipped entirely when `dt` is zero, negative or not finite. Ticks
    /// longer than `tuning.max_step` are split into equal substeps, at most
    /// [`MAX_SUBSTEPS`] of them; anything beyond that is dropped.
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let max_step = self.tuning.max_step;
        // Tolerance keeps a tick of exactly `max_step` from rounding up to two.
        let substeps = ((dt / max_step) - 1e-3).ceil().max(1.0);
        if substeps <= 1.0 {
            self.step(dt);
            return;
        }

        let substeps = if substeps > MAX_SUBSTEPS as f32 {
            debug!("Clamping water tick of {}s to {} substeps", dt, MAX_SUBSTEPS);
            MAX_SUBSTEPS
        } else {
            substeps as usize
        };
        let step = (dt / substeps as f32).min(max_step);
        for _ in 0..substeps {
            self.step(step);
        }
    }

    /// One explicit integration step.
    fn step(&mut self, dt: f32) {
        let tuning = self.tuning;

        // Restoring acceleration from the surface shape.
        convolve_same_into(
            &self.heights,
            &VELOCITY_KERNEL,
            dt * tuning.time_scale,
            &mut self.scratch,
        );
        let decay = tuning.damping.powf(dt);
        for (velocity, accel) in self.velocities.iter_mut().zip(&self.scratch) {
            *velocity = (*velocity + accel) * decay;
        }

        // Smooth the surface, then move it along the new velocities.
        convolve_same_into(&self.heights, &POSITION_KERNEL, 1.0, &mut self.scratch);
        let gain = tuning.velocity_gain * dt;
        for ((height, smoothed), velocity) in self
            .heights
            .iter_mut()
            .zip(&self.scratch)
            .zip(&self.velocities)
        {
            *height = smoothed + velocity * gain;
        }
    }

    /// Zero every height and velocity.
    pub fn reset(&mut self) {
        self.heights.fill(0.0);
        self.velocities.fill(0.0);
    }

    #[inline]
    pub fn origin_x(&self) -> f32 {
        self.origin_x
    }

    #[inline]
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Samples per world unit.
    #[inline]
    pub fn subdivision(&self) -> u32 {
        self.tuning.subdivision
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.heights.len()
    }

    #[inline]
    pub fn rest_level(&self) -> f32 {
        self.rest_level
    }

    #[inline]
    pub fn floor_level(&self) -> f32 {
        self.floor_level
    }

    #[inline]
    pub fn tuning(&self) -> &WaterTuning {
        &self.tuning
    }

    /// World x of the last sample.
    pub fn right_x(&self) -> f32 {
        self.sample_x(self.sample_count() - 1)
    }

    /// Displacement of each sample from the rest level.
    #[inline]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    #[inline]
    pub fn heights_mut(&mut self) -> &mut [f32] {
        &mut self.heights
    }

    #[inline]
    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    #[inline]
    pub fn velocities_mut(&mut self) -> &mut [f32] {
        &mut self.velocities
    }

    #[inline]
    pub fn sample_x(&self, index: usize) -> f32 {
        self.origin_x + index as f32 * self.spacing
    }

    pub fn xs(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.sample_count()).map(|i| self.sample_x(i))
    }

    /// Absolute water level of each sample.
    pub fn levels(&self) -> impl Iterator<Item = f32> + '_ {
        self.heights.iter().map(|h| h + self.rest_level)
    }

    /// Absolute water level at world `x`, linearly interpolated between
    /// samples and held constant past either end.
    pub fn level_at(&self, x: f32) -> f32 {
        let last = self.sample_count() - 1;
        let t = (x - self.origin_x) * self.tuning.subdivision as f32;
        if !t.is_finite() || t <= 0.0 {
            return self.heights[0] + self.rest_level;
        }
        if t >= last as f32 {
            return self.heights[last] + self.rest_level;
        }
        let i = t.floor() as usize;
        let frac = t - i as f32;
        let h = self.heights[i] * (1.0 - frac) + self.heights[(i + 1).min(last)] * frac;
        h + self.rest_level
    }

    /// The still-water box: horizontal extent of the field from the floor up
    /// to the rest level.
    pub fn water_bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin_x,
            self.floor_level,
            self.right_x(),
            self.rest_level,
        )
    }

    /// Indices `[a, b)` of the samples under the horizontal span
    /// `[left, right]`.
    ///
    /// The left edge rounds down and the right edge rounds up so every sample
    /// interval the span touches is included. Both ends are clamped to the
    /// field. Spans entirely beside the field, inverted spans and non-finite
    /// input yield an empty range.
    pub fn sample_range(&self, left: f32, right: f32) -> std::ops::Range<usize> {
        let n = self.sample_count();
        if !left.is_finite() || !right.is_finite() {
            return 0..0;
        }
        if right < self.origin_x || left > self.right_x() {
            return 0..0;
        }
        let per_unit = self.tuning.subdivision as f32;
        let clamp = |value: f32| value.clamp(0.0, n as f32) as usize;

        let a = clamp(((left - self.origin_x) * per_unit).floor());
        let b = clamp(((right - self.origin_x) * per_unit).ceil());
        if b <= a {
            a..a
        } else {
            a..b
        }
    }

    /// Whether every height and velocity is finite.
    pub fn is_finite(&self) -> bool {
        self.heights.iter().all(|h| h.is_finite()) && self.velocities.iter().all(|v| v.is_finite())
    }

    /// Triangle-strip vertices for the renderer: for each sample the surface
    /// point followed by the floor point below it.
    pub fn write_strip(&self, out: &mut Vec<[f32; 2]>) {
        out.clear();
        out.reserve(self.sample_count() * 2);
        for (i, height) in self.heights.iter().enumerate() {
            let x = self.sample_x(i);
            out.push([x, height + self.rest_level]);
            out.push([x, self.floor_level]);
        }
    }

    pub fn strip(&self) -> Vec<[f32; 2]> {
        let mut out = Vec::new();
        self.write_strip(&mut out);
        out
    }
}
