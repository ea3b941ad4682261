use rapier3d::prelude::{
    CCDSolver, ColliderSet, DefaultBroadPhase, ImpulseJointSet, IntegrationParameters,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryPipeline, Real,
    RigidBodySet, Vector,
};

use crate::coords::Vec3;

use super::backend::{DynamicsWorld, PhysicsBackend, StepParts};

/// rapier3d-backed physics provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct RapierBackend;

/// Shared integration settings read by every step.
pub struct RapierConfiguration {
    pub integration: IntegrationParameters,
}

/// Narrow phase: turns broadphase candidate pairs into contacts.
pub struct RapierDispatcher {
    narrow_phase: NarrowPhase,
}

pub struct RapierBroadphase {
    broad_phase: DefaultBroadPhase,
}

/// Constraint solving lives in the pipeline; islands and CCD state are
/// solver-side bookkeeping carried between steps.
pub struct RapierSolver {
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    ccd: CCDSolver,
}

/// Bodies, colliders, joints and the global gravity vector.
pub struct RapierWorld {
    gravity: Vector<Real>,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    query_pipeline: QueryPipeline,
}

impl RapierWorld {
    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    /// Body and collider sets together, for inserting colliders with a parent.
    pub fn sets_mut(&mut self) -> (&mut RigidBodySet, &mut ColliderSet) {
        (&mut self.bodies, &mut self.colliders)
    }
}

impl DynamicsWorld for RapierWorld {
    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = Vector::new(gravity.x, gravity.y, gravity.z);
    }

    fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }
}

impl PhysicsBackend for RapierBackend {
    type Configuration = RapierConfiguration;
    type Dispatcher = RapierDispatcher;
    type Broadphase = RapierBroadphase;
    type Solver = RapierSolver;
    type World = RapierWorld;

    fn create_configuration(&mut self) -> RapierConfiguration {
        RapierConfiguration {
            integration: IntegrationParameters::default(),
        }
    }

    fn create_dispatcher(&mut self, _configuration: &RapierConfiguration) -> RapierDispatcher {
        RapierDispatcher {
            narrow_phase: NarrowPhase::new(),
        }
    }

    fn create_broadphase(&mut self) -> RapierBroadphase {
        RapierBroadphase {
            broad_phase: DefaultBroadPhase::new(),
        }
    }

    fn create_solver(&mut self) -> RapierSolver {
        RapierSolver {
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            ccd: CCDSolver::new(),
        }
    }

    fn create_world(
        &mut self,
        _dispatcher: &RapierDispatcher,
        _broadphase: &RapierBroadphase,
        _solver: &RapierSolver,
        _configuration: &RapierConfiguration,
    ) -> RapierWorld {
        RapierWorld {
            gravity: Vector::zeros(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    fn step(&mut self, world: &mut RapierWorld, parts: StepParts<'_, Self>, dt: f32) {
        let StepParts {
            configuration,
            dispatcher,
            broadphase,
            solver,
        } = parts;
        let RapierSolver {
            pipeline,
            islands,
            ccd,
        } = solver;

        configuration.integration.dt = dt;

        pipeline.step(
            &world.gravity,
            &configuration.integration,
            islands,
            &mut broadphase.broad_phase,
            &mut dispatcher.narrow_phase,
            &mut world.bodies,
            &mut world.colliders,
            &mut world.impulse_joints,
            &mut world.multibody_joints,
            ccd,
            Some(&mut world.query_pipeline),
            &(),
            &(),
        );
    }
}
