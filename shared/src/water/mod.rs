//! One-dimensional water surface coupled to rigid bodies.
//!
//! ## Per-tick data flow
//!
//! ```text
//!   rigid-body step ──► BodySample (bounds, velocity)
//!                              │
//!                              ▼
//!                     buoyancy::apply ──► force back to the body
//!                              │
//!                              ▼ (surface velocity perturbation)
//!                     HeightField::advance
//!                              │
//!                              ▼
//!                     heights / strip for the renderer
//! ```
//!
//! Every coupling call for a tick must run before that tick's `advance`,
//! otherwise the impulses only show up one tick late. [`crate::pond::Pond`]
//! enforces that ordering.

pub mod buoyancy;
pub mod config;
pub mod emitter;
pub mod field;
pub mod kernel;

pub use buoyancy::{BodySample, Buoyancy};
pub use config::WaterTuning;
pub use emitter::DripSchedule;
pub use field::{BoundingBox, HeightField};
