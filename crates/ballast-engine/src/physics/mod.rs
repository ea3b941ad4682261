//! Physics world provider seam and the rapier3d backend.
//!
//! `PhysicsWorld` owns the dynamics world and its four collaborators
//! (configuration, dispatcher, broadphase, solver) and guarantees that the
//! world is released before any of them.

mod backend;
mod rapier;
mod world;

pub use backend::{DynamicsWorld, PhysicsBackend, StepParts};
pub use rapier::{
    RapierBackend, RapierBroadphase, RapierConfiguration, RapierDispatcher, RapierSolver,
    RapierWorld,
};
pub use world::PhysicsWorld;
