//! Ballast engine crate.
//!
//! Lifecycle shell for an application that owns a GPU surface and a rigid-body
//! physics world: ordered bring-up, a per-frame step/clear/present contract,
//! and ordered teardown on every exit path.

pub mod coords;
pub mod core;
pub mod device;
pub mod display;
pub mod logging;
pub mod paint;
pub mod physics;
pub mod time;
pub mod window;
