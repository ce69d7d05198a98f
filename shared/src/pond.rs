//! The simulation owner: every body of water in a scene plus the per-tick
//! ordering between rigid bodies and the surface.

use bevy::math::Vec2;
use bevy_ecs::prelude::Resource;
use bevy_log::trace;

use crate::water::{buoyancy, emitter, BodySample, HeightField};

/// Receives the forces computed for bodies during coupling.
///
/// Implemented by whatever owns the rigid bodies. Applying a force cannot
/// fail from the pond's point of view.
pub trait ForceSink<H> {
    fn apply_force_at_point(&mut self, body: H, force: Vec2, point: Vec2);
}

/// A force recorded by the `Vec` sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedForce<H> {
    pub body: H,
    pub force: Vec2,
    pub point: Vec2,
}

impl<H> ForceSink<H> for Vec<AppliedForce<H>> {
    fn apply_force_at_point(&mut self, body: H, force: Vec2, point: Vec2) {
        self.push(AppliedForce { body, force, point });
    }
}

/// Index of a field inside its [`Pond`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub usize);

/// All water in a scene.
#[derive(Resource, Debug, Default)]
pub struct Pond {
    fields: Vec<HeightField>,
}

impl Pond {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: HeightField) -> FieldId {
        self.fields.push(field);
        FieldId(self.fields.len() - 1)
    }

    pub fn field(&self, id: FieldId) -> Option<&HeightField> {
        self.fields.get(id.0)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut HeightField> {
        self.fields.get_mut(id.0)
    }

    pub fn fields(&self) -> &[HeightField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Couple every body with every field whose still-water box it overlaps.
    ///
    /// Forces go to `sink` at each body's centre of mass; surface
    /// perturbations are written into the fields. Returns the number of
    /// (field, body) pairs that were coupled.
    pub fn couple<H: Copy>(
        &mut self,
        bodies: &[BodySample<H>],
        dt: f32,
        sink: &mut impl ForceSink<H>,
    ) -> usize {
        let mut coupled = 0;
        for field in &mut self.fields {
            let water = field.water_bounds();
            for body in bodies.iter().filter(|b| b.bounds.intersects(&water)) {
                let result = buoyancy::apply(field, &body.bounds, body.velocity, dt);
                if result.submersion > 0.0 {
                    sink.apply_force_at_point(body.handle, result.force, body.center_of_mass);
                }
                coupled += 1;
            }
        }
        trace!("Coupled {} body/field pairs", coupled);
        coupled
    }

    /// Advance every field by `dt`.
    pub fn advance(&mut self, dt: f32) {
        for field in &mut self.fields {
            field.advance(dt);
            debug_assert!(field.is_finite(), "water surface went non-finite");
        }
    }

    /// One full tick: all coupling first, then the surface update.
    pub fn tick<H: Copy>(
        &mut self,
        bodies: &[BodySample<H>],
        dt: f32,
        sink: &mut impl ForceSink<H>,
    ) -> usize {
        let coupled = self.couple(bodies, dt, sink);
        self.advance(dt);
        coupled
    }

    /// Drip into one field; see [`emitter::drip`].
    pub fn drip(&mut self, id: FieldId, offset_from_end: usize, depth: f32) -> Option<usize> {
        let field = self.fields.get_mut(id.0)?;
        emitter::drip(field, offset_from_end, depth)
    }
}
