//! Geometry types shared by the physics and render layers.
//!
//! World space is right-handed, +Y up. Gravity defaults to -Y.

mod vec3;

pub use vec3::Vec3;
