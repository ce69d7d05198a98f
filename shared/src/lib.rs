//! Real-time 1-D water surface with two-way buoyancy coupling.
//!
//! [`water::HeightField`] propagates disturbances along a sampled surface,
//! [`water::buoyancy`] turns the water under a body into a force and writes
//! the body's impact back into the surface, and [`pond::Pond`] owns every
//! field of a scene and runs them in the right order each tick.
//!
//! The crate does no I/O and never reads the clock: the host decides the
//! tick length and owns the rigid bodies.

pub mod constants;
pub mod pond;
pub mod water;

pub use constants::*;
pub use pond::{AppliedForce, FieldId, ForceSink, Pond};
