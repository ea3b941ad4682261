//! Recording providers shared by the lifecycle tests.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};

use crate::coords::Vec3;
use crate::display::{DisplayProvider, RenderContext, SurfaceAttribute, SurfaceDesc};
use crate::paint::Color;
use crate::physics::{DynamicsWorld, PhysicsBackend, StepParts};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitSubsystem,
    SetAttribute(SurfaceAttribute),
    CreateSurface(u32),
    CreateContext(u32),
    PresentationInterval(i32),
    SetClearColor(Color),
    Clear(u32),
    Show(u32),
    Swap(u32),
    DestroyContext(u32),
    DestroySurface(u32),
    Shutdown,

    CreateConfiguration,
    CreateDispatcher,
    CreateBroadphase,
    CreateSolver,
    CreateWorld,
    Step(f32),
    DropWorld,
    DropSolver,
    DropBroadphase,
    DropConfiguration,
    DropDispatcher,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.0.borrow().iter().position(|c| c == call)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FailAt {
    InitSubsystem,
    CreateSurface,
    CreateContext,
    Clear,
    Swap,
}

pub struct MockSurface {
    pub id: u32,
}

pub struct MockContext {
    id: u32,
    fail_clear: bool,
    log: CallLog,
}

impl RenderContext for MockContext {
    fn set_clear_color(&mut self, color: Color) {
        self.log.push(Call::SetClearColor(color));
    }

    fn clear(&mut self) -> Result<()> {
        if self.fail_clear {
            return Err(anyhow!("device lost"));
        }
        self.log.push(Call::Clear(self.id));
        Ok(())
    }
}

pub struct RecordingDisplay {
    pub log: CallLog,
    pub fail_at: Option<FailAt>,
    pub reject_hints: bool,
    next_id: u32,
    surface_alive: bool,
    last_error: Option<String>,
}

impl RecordingDisplay {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_at: None,
            reject_hints: false,
            next_id: 1,
            surface_alive: false,
            last_error: None,
        }
    }

    pub fn failing_at(log: CallLog, at: FailAt) -> Self {
        Self {
            fail_at: Some(at),
            ..Self::new(log)
        }
    }

    fn fail<T>(&mut self, msg: &str) -> Result<T> {
        self.last_error = Some(msg.to_string());
        Err(anyhow!("{msg}"))
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl DisplayProvider for RecordingDisplay {
    type Surface = MockSurface;
    type Context = MockContext;

    fn init_subsystem(&mut self) -> Result<()> {
        if self.fail_at == Some(FailAt::InitSubsystem) {
            return self.fail("no video device");
        }
        self.log.push(Call::InitSubsystem);
        Ok(())
    }

    fn set_attribute(&mut self, attribute: SurfaceAttribute) -> Result<()> {
        if self.surface_alive {
            return self.fail("attributes must be set before the surface is created");
        }
        if self.reject_hints {
            return self.fail("attribute not supported");
        }
        self.log.push(Call::SetAttribute(attribute));
        Ok(())
    }

    fn create_surface(&mut self, _desc: &SurfaceDesc) -> Result<MockSurface> {
        if self.fail_at == Some(FailAt::CreateSurface) {
            return self.fail("surface creation refused");
        }
        let id = self.next();
        self.surface_alive = true;
        self.log.push(Call::CreateSurface(id));
        Ok(MockSurface { id })
    }

    fn create_context(&mut self, _surface: &MockSurface) -> Result<MockContext> {
        if self.fail_at == Some(FailAt::CreateContext) {
            return self.fail("no GPU context");
        }
        let id = self.next();
        self.log.push(Call::CreateContext(id));
        Ok(MockContext {
            id,
            fail_clear: self.fail_at == Some(FailAt::Clear),
            log: self.log.clone(),
        })
    }

    fn set_presentation_interval(
        &mut self,
        _context: &mut MockContext,
        interval: i32,
    ) -> Result<()> {
        if self.reject_hints {
            return self.fail("interval not supported");
        }
        self.log.push(Call::PresentationInterval(interval));
        Ok(())
    }

    fn show(&mut self, surface: &MockSurface) {
        self.log.push(Call::Show(surface.id));
    }

    fn swap(&mut self, surface: &MockSurface, _context: &mut MockContext) -> Result<()> {
        if self.fail_at == Some(FailAt::Swap) {
            return self.fail("present failed");
        }
        self.log.push(Call::Swap(surface.id));
        Ok(())
    }

    fn destroy_context(&mut self, context: MockContext) {
        self.log.push(Call::DestroyContext(context.id));
    }

    fn destroy_surface(&mut self, surface: MockSurface) {
        self.surface_alive = false;
        self.log.push(Call::DestroySurface(surface.id));
    }

    fn shutdown_subsystem(&mut self) {
        self.log.push(Call::Shutdown);
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

/// Physics backend whose objects record their own construction and drop.
pub struct RecordingBackend {
    pub log: CallLog,
}

macro_rules! recorded {
    ($name:ident, $on_drop:expr) => {
        pub struct $name {
            log: CallLog,
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.log.push($on_drop);
            }
        }
    };
}

recorded!(MockConfiguration, Call::DropConfiguration);
recorded!(MockDispatcher, Call::DropDispatcher);
recorded!(MockBroadphase, Call::DropBroadphase);
recorded!(MockSolver, Call::DropSolver);

pub struct MockWorld {
    gravity: Vec3,
    log: CallLog,
}

impl Drop for MockWorld {
    fn drop(&mut self) {
        self.log.push(Call::DropWorld);
    }
}

impl DynamicsWorld for MockWorld {
    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }
}

impl PhysicsBackend for RecordingBackend {
    type Configuration = MockConfiguration;
    type Dispatcher = MockDispatcher;
    type Broadphase = MockBroadphase;
    type Solver = MockSolver;
    type World = MockWorld;

    fn create_configuration(&mut self) -> MockConfiguration {
        self.log.push(Call::CreateConfiguration);
        MockConfiguration { log: self.log.clone() }
    }

    fn create_dispatcher(&mut self, _configuration: &MockConfiguration) -> MockDispatcher {
        self.log.push(Call::CreateDispatcher);
        MockDispatcher { log: self.log.clone() }
    }

    fn create_broadphase(&mut self) -> MockBroadphase {
        self.log.push(Call::CreateBroadphase);
        MockBroadphase { log: self.log.clone() }
    }

    fn create_solver(&mut self) -> MockSolver {
        self.log.push(Call::CreateSolver);
        MockSolver { log: self.log.clone() }
    }

    fn create_world(
        &mut self,
        _dispatcher: &MockDispatcher,
        _broadphase: &MockBroadphase,
        _solver: &MockSolver,
        _configuration: &MockConfiguration,
    ) -> MockWorld {
        self.log.push(Call::CreateWorld);
        MockWorld {
            gravity: Vec3::zero(),
            log: self.log.clone(),
        }
    }

    fn step(&mut self, _world: &mut MockWorld, _parts: StepParts<'_, Self>, dt: f32) {
        self.log.push(Call::Step(dt));
    }
}
