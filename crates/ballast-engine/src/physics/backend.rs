use crate::coords::Vec3;

/// Read/write access to a composed simulation's global forces.
pub trait DynamicsWorld {
    fn set_gravity(&mut self, gravity: Vec3);
    fn gravity(&self) -> Vec3;
}

/// Mutable view of the four collaborators for the duration of one step.
pub struct StepParts<'a, B: PhysicsBackend + ?Sized> {
    pub configuration: &'a mut B::Configuration,
    pub dispatcher: &'a mut B::Dispatcher,
    pub broadphase: &'a mut B::Broadphase,
    pub solver: &'a mut B::Solver,
}

/// Physics world provider.
///
/// Constructors are infallible. A backend that can fail to build one of its
/// objects has no recovery path and must abort.
pub trait PhysicsBackend {
    type Configuration;
    type Dispatcher;
    type Broadphase;
    type Solver;
    type World: DynamicsWorld;

    fn create_configuration(&mut self) -> Self::Configuration;

    fn create_dispatcher(&mut self, configuration: &Self::Configuration) -> Self::Dispatcher;

    fn create_broadphase(&mut self) -> Self::Broadphase;

    fn create_solver(&mut self) -> Self::Solver;

    fn create_world(
        &mut self,
        dispatcher: &Self::Dispatcher,
        broadphase: &Self::Broadphase,
        solver: &Self::Solver,
        configuration: &Self::Configuration,
    ) -> Self::World;

    /// Advances `world` by a single step of `dt` seconds.
    fn step(&mut self, world: &mut Self::World, parts: StepParts<'_, Self>, dt: f32);
}
