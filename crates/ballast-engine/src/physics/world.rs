use crate::coords::Vec3;
use crate::time::{StepAccumulator, StepPlan, StepPolicy};

use super::backend::{DynamicsWorld, PhysicsBackend, StepParts};

/// Simulation context: the dynamics world together with the collaborators it
/// was composed from.
///
/// Fields are declared in release order. Rust drops fields top to bottom, so
/// even an implicit drop releases `world` before any collaborator.
pub struct PhysicsWorld<B: PhysicsBackend> {
    world: B::World,
    solver: B::Solver,
    broadphase: B::Broadphase,
    configuration: B::Configuration,
    dispatcher: B::Dispatcher,

    accumulator: StepAccumulator,
    steps_taken: u64,
}

impl<B: PhysicsBackend> PhysicsWorld<B> {
    /// Builds the collaborators in dependency order, then composes the world
    /// and applies `gravity`.
    pub fn build(backend: &mut B, gravity: Vec3) -> Self {
        let configuration = backend.create_configuration();
        let dispatcher = backend.create_dispatcher(&configuration);
        let broadphase = backend.create_broadphase();
        let solver = backend.create_solver();

        let mut world = backend.create_world(&dispatcher, &broadphase, &solver, &configuration);
        world.set_gravity(gravity);

        Self {
            world,
            solver,
            broadphase,
            configuration,
            dispatcher,
            accumulator: StepAccumulator::new(),
            steps_taken: 0,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.world.gravity()
    }

    pub fn world(&self) -> &B::World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut B::World {
        &mut self.world
    }

    /// Total number of single steps run since construction.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Advances the simulation by `frame_dt` seconds of wall time according
    /// to `policy`. Returns the number of steps run.
    pub fn step_simulation(&mut self, backend: &mut B, frame_dt: f32, policy: &StepPolicy) -> u32 {
        let StepPlan { steps, dt } = self.accumulator.advance(policy, frame_dt);

        for _ in 0..steps {
            let parts = StepParts {
                configuration: &mut self.configuration,
                dispatcher: &mut self.dispatcher,
                broadphase: &mut self.broadphase,
                solver: &mut self.solver,
            };
            backend.step(&mut self.world, parts, dt);
        }

        self.steps_taken += u64::from(steps);
        steps
    }

    /// Releases the world, then its collaborators.
    pub fn release(self) {
        let Self {
            world,
            solver,
            broadphase,
            configuration,
            dispatcher,
            steps_taken,
            ..
        } = self;

        drop(world);
        log::debug!("dynamics world released after {steps_taken} steps");
        drop(solver);
        drop(broadphase);
        drop(configuration);
        drop(dispatcher);
        log::debug!("physics collaborators released");
    }
}
