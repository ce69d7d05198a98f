//! Two-way coupling between floating bodies and a height field.
//!
//! A body is reduced to its bounding box and linear velocity. The water under
//! the box decides how much buoyancy and drag the body receives, and a body
//! crossing the surface drags the surface velocity along with it.

use bevy::math::Vec2;

use super::field::{BoundingBox, HeightField};

/// Snapshot of an external rigid body taken for one coupling call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySample<H> {
    /// Handle into the rigid-body engine that owns the body
    pub handle: H,
    pub bounds: BoundingBox,
    pub velocity: Vec2,
    /// World-space point where forces should be applied
    pub center_of_mass: Vec2,
}

impl<H> BodySample<H> {
    pub fn new(handle: H, bounds: BoundingBox, velocity: Vec2) -> Self {
        Self {
            handle,
            center_of_mass: bounds.center(),
            bounds,
            velocity,
        }
    }

    pub fn with_center_of_mass(mut self, center_of_mass: Vec2) -> Self {
        self.center_of_mass = center_of_mass;
        self
    }
}

/// Outcome of coupling one body with one field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Buoyancy {
    /// Fraction of the body's height below the surface, in `[0, 1]`
    pub submersion: f32,
    /// Force to apply at the body's centre of mass
    pub force: Vec2,
}

/// Mean fraction of `bounds` below the water surface over the samples it
/// spans. Zero when the box does not span any sample.
pub fn submersion_fraction(field: &HeightField, bounds: &BoundingBox) -> f32 {
    let range = field.sample_range(bounds.left, bounds.right);
    if range.is_empty() {
        return 0.0;
    }

    let rest = field.rest_level();
    let height = bounds.height();
    let count = range.len() as f32;

    let total: f32 = field.heights()[range]
        .iter()
        .map(|h| {
            let level = h + rest;
            if height > 0.0 {
                ((level - bounds.bottom) / height).clamp(0.0, 1.0)
            } else if level >= bounds.bottom {
                1.0
            } else {
                0.0
            }
        })
        .sum();

    total / count
}

/// Couple a body with `field` for a step of `dt` seconds.
///
/// Blends the surface velocity under a partly submerged body towards its
/// impact velocity and returns the buoyancy and drag force for the body.
/// Never touches the heights.
pub fn apply(field: &mut HeightField, bounds: &BoundingBox, velocity: Vec2, dt: f32) -> Buoyancy {
    debug_assert!(velocity.is_finite(), "non-finite body velocity {velocity:?}");

    let range = field.sample_range(bounds.left, bounds.right);
    if range.is_empty() {
        return Buoyancy::default();
    }

    let submersion = submersion_fraction(field, bounds);
    let tuning = *field.tuning();

    if submersion < 1.0 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let keep = tuning.drag_blend.powf(dt);
        let vy = velocity.y;
        let impact = vy * vy.abs() * tuning.impact_gain * (1.0 - keep);
        for v in &mut field.velocities_mut()[range] {
            *v = *v * keep + impact;
        }
    }

    let force = (tuning.buoyancy * bounds.area() - velocity * tuning.water_drag) * submersion;

    Buoyancy { submersion, force }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const DT: f32 = 1.0 / 180.0;

    fn pond() -> HeightField {
        HeightField::new(0.0, 10.0, 6.5, 0.0)
    }

    fn unit_box_at(x: f32, bottom: f32) -> BoundingBox {
        BoundingBox::from_corner(x, bottom, 1.0, 1.0)
    }

    #[test]
    fn test_submersion_on_flat_water() {
        let field = pond();
        assert_eq!(submersion_fraction(&field, &unit_box_at(4.0, 7.0)), 0.0);
        assert_eq!(submersion_fraction(&field, &unit_box_at(4.0, 6.5)), 0.0);
        assert!((submersion_fraction(&field, &unit_box_at(4.0, 6.0)) - 0.5).abs() < 1e-6);
        assert!((submersion_fraction(&field, &unit_box_at(4.0, 6.25)) - 0.25).abs() < 1e-6);
        assert_eq!(submersion_fraction(&field, &unit_box_at(4.0, 5.5)), 1.0);
        assert_eq!(submersion_fraction(&field, &unit_box_at(4.0, 1.0)), 1.0);
    }

    #[test]
    fn test_submersion_follows_waves() {
        let mut field = pond();
        let bounds = unit_box_at(4.0, 6.0);
        let range = field.sample_range(bounds.left, bounds.right);
        for h in &mut field.heights_mut()[range] {
            *h = 0.25;
        }
        assert!((submersion_fraction(&field, &bounds) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_submersion_is_monotonic_in_height() {
        let field = pond();
        let mut previous = f32::INFINITY;
        for step in 0..=40 {
            let bottom = 4.5 + step as f32 * 0.1;
            let fraction = submersion_fraction(&field, &unit_box_at(4.0, bottom));
            let top = bottom + 1.0;

            if top <= 6.5 {
                assert_eq!(fraction, 1.0, "bottom {bottom}");
            } else if bottom >= 6.5 {
                assert_eq!(fraction, 0.0, "bottom {bottom}");
            } else {
                assert!(fraction < previous, "bottom {bottom}: {fraction} >= {previous}");
                assert!((fraction - (6.5 - bottom)).abs() < 1e-4);
            }
            assert!(fraction <= previous);
            previous = fraction;
        }
    }

    #[test]
    fn test_degenerate_box() {
        let field = pond();
        let flat_below = BoundingBox::new(4.0, 6.0, 5.0, 6.0);
        let flat_above = BoundingBox::new(4.0, 7.0, 5.0, 7.0);
        let inverted = BoundingBox::new(4.0, 7.0, 5.0, 6.0);
        assert_eq!(submersion_fraction(&field, &flat_below), 1.0);
        assert_eq!(submersion_fraction(&field, &flat_above), 0.0);
        assert_eq!(submersion_fraction(&field, &inverted), 0.0);

        let mut field = pond();
        let result = apply(&mut field, &flat_below, Vec2::new(0.0, -3.0), DT);
        assert_eq!(result.submersion, 1.0);
        assert!(result.force.is_finite());
        assert!(field.is_finite());
    }

    #[test]
    fn test_box_outside_field_is_ignored() {
        let mut field = pond();
        for bounds in [
            BoundingBox::from_corner(-5.0, 5.0, 2.0, 2.0),
            BoundingBox::from_corner(12.0, 5.0, 2.0, 2.0),
        ] {
            let result = apply(&mut field, &bounds, Vec2::new(1.0, -4.0), DT);
            assert_eq!(result, Buoyancy::default());
        }
        assert!(field.velocities().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_force_for_half_submerged_box() {
        let mut field = pond();
        let bounds = BoundingBox::from_corner(4.0, 6.0, 2.0, 1.0);
        let velocity = Vec2::new(1.0, -2.0);
        let result = apply(&mut field, &bounds, velocity, DT);

        assert!((result.submersion - 0.5).abs() < 1e-6);
        // (500 * 2 - (-2) * 20) * 0.5 vertically, (-1 * 20) * 0.5 horizontally
        assert!((result.force.y - 520.0).abs() < 1e-3);
        assert!((result.force.x + 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_partial_submersion_drags_surface() {
        let mut field = pond();
        let bounds = unit_box_at(4.0, 6.0);
        let range = field.sample_range(bounds.left, bounds.right);
        apply(&mut field, &bounds, Vec2::new(0.0, -3.0), DT);

        let keep = 0.6f32.powf(DT);
        let expected = -9.0 * 0.1 * (1.0 - keep);
        for (i, &v) in field.velocities().iter().enumerate() {
            if range.contains(&i) {
                assert!((v - expected).abs() < 1e-7, "sample {i}: {v}");
            } else {
                assert_eq!(v, 0.0, "sample {i} outside the body moved");
            }
        }
        assert!(field.heights().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_full_submersion_leaves_surface_alone() {
        let mut field = pond();
        field.velocities_mut().fill(0.5);
        let result = apply(&mut field, &unit_box_at(4.0, 2.0), Vec2::new(0.0, -3.0), DT);
        assert_eq!(result.submersion, 1.0);
        assert!(field.velocities().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_negative_dt_does_not_amplify() {
        let mut field = pond();
        field.velocities_mut().fill(0.5);
        apply(&mut field, &unit_box_at(4.0, 6.0), Vec2::new(0.0, -3.0), -1.0);
        assert!(field.velocities().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_random_boxes_stay_finite() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut field = pond();
        field.heights_mut()[20] = -0.5;

        for _ in 0..2000 {
            let left = rng.gen_range(-20.0..30.0);
            let bottom = rng.gen_range(-5.0..15.0);
            let width = rng.gen_range(0.0..4.0);
            let height = rng.gen_range(0.0..3.0);
            let bounds = BoundingBox::from_corner(left, bottom, width, height);
            let velocity = Vec2::new(rng.gen_range(-30.0..30.0), rng.gen_range(-30.0..30.0));
            let dt = rng.gen_range(0.0..=1.0);

            let result = apply(&mut field, &bounds, velocity, dt);
            assert!((0.0..=1.0).contains(&result.submersion));
            assert!(result.force.is_finite());

            if bounds.right < 0.0 || bounds.left > 10.0 {
                assert_eq!(result.submersion, 0.0);
            }

            field.advance(dt);
            assert!(field.is_finite());
        }
    }
}
