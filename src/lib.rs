//! Skyshard simulation library
//!
//! Spatially-varying gravity on top of Rapier3D, with a first-person
//! controller whose movement, jumping and camera follow the local up vector.

pub mod config;
pub mod game;
