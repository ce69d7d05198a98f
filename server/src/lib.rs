//! Headless host for the pond: loads a scene, couples rapier2d bodies with
//! the water surface and runs the result on a fixed tick.

pub mod init;
pub mod physics;
pub mod scene;
pub mod simulation;
