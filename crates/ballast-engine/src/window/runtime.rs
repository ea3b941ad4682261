use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{LaunchConfig, Lifecycle, Phase, RunSignal};
use crate::device::{Gpu, GpuInit};
use crate::display::AppEvent;
use crate::physics::PhysicsBackend;
use crate::time::FrameClock;

use super::display::{DisplayHost, WinitDisplay};

/// Lifecycle specialized to winit windows and wgpu contexts.
pub type WinitLifecycle<B> = Lifecycle<Arc<Window>, Gpu, B>;

/// Entry point: owns the winit event loop and drives the lifecycle from it.
pub struct Runtime;

impl Runtime {
    /// Runs until the lifecycle reaches a terminal signal and returns it.
    ///
    /// Errors are reserved for the event loop itself; a failed Init is
    /// reported as `RunSignal::Failure`.
    pub fn run<B>(config: LaunchConfig, gpu_init: GpuInit, backend: B) -> Result<RunSignal>
    where
        B: PhysicsBackend + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut driver = Driver::new(config, gpu_init, backend);

        event_loop
            .run_app(&mut driver)
            .context("winit event loop terminated with error")?;

        Ok(driver.outcome())
    }
}

struct Driver<B: PhysicsBackend> {
    lifecycle: WinitLifecycle<B>,
    host: DisplayHost,
    clock: FrameClock,
}

impl<B: PhysicsBackend> Driver<B> {
    fn new(config: LaunchConfig, gpu_init: GpuInit, backend: B) -> Self {
        Self {
            lifecycle: Lifecycle::new(config, backend),
            host: DisplayHost::new(gpu_init),
            clock: FrameClock::default(),
        }
    }

    fn outcome(&self) -> RunSignal {
        match (self.lifecycle.phase(), self.lifecycle.signal()) {
            (Phase::Terminated, signal) => signal,
            (phase, _) => {
                log::error!("event loop ended in phase {phase:?}");
                RunSignal::Failure
            }
        }
    }

    fn window(&self) -> Option<&Arc<Window>> {
        self.lifecycle.app_state().map(|app| app.surface())
    }

    fn finish(&mut self, event_loop: &ActiveEventLoop, outcome: RunSignal) {
        let mut display = WinitDisplay::new(event_loop, &mut self.host);
        self.lifecycle.quit(&mut display, outcome);

        if outcome == RunSignal::Failure {
            if let Some(diagnostic) = self.lifecycle.diagnostic() {
                log::error!("run failed: {diagnostic}");
            }
        }
    }
}

impl<B: PhysicsBackend> ApplicationHandler for Driver<B> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.lifecycle.phase() != Phase::Uninitialized {
            return;
        }

        let mut display = WinitDisplay::new(event_loop, &mut self.host);
        let signal = self.lifecycle.init(&mut display);

        if signal.is_terminal() {
            self.finish(event_loop, signal);
            return;
        }

        self.clock.reset();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.lifecycle.phase() != Phase::Running {
            return;
        }

        // A quit request must not depend on another redraw being delivered.
        if let Some(outcome) = pending_quit(self.lifecycle.phase(), self.lifecycle.signal()) {
            self.finish(event_loop, outcome);
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: every wakeup schedules the next frame.
        if let Some(window) = self.window() {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.lifecycle.phase() != Phase::Running {
            return;
        }
        if self.window().map(|w| w.id()) != Some(window_id) {
            return;
        }

        let signal = self.lifecycle.handle_event(translate_event(&event));
        if signal.is_terminal() {
            // Let the next frame observe the signal.
            if let Some(window) = self.window() {
                window.request_redraw();
            }
        }

        match event {
            WindowEvent::Resized(new_size) => {
                if let Some(app) = self.lifecycle.app_state_mut() {
                    app.context_mut().resize(new_size);
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(app) = self.lifecycle.app_state_mut() {
                    let new_size = app.surface().inner_size();
                    app.context_mut().resize(new_size);
                }
            }

            WindowEvent::RedrawRequested => {
                let frame = self.clock.tick();

                let mut display = WinitDisplay::new(event_loop, &mut self.host);
                let signal = self.lifecycle.iterate(&mut display, frame);

                if signal.is_terminal() {
                    self.finish(event_loop, signal);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if self.lifecycle.phase() == Phase::Terminated {
            return;
        }

        let outcome = exit_outcome(self.lifecycle.signal());
        self.finish(event_loop, outcome);
    }
}

/// Outcome to quit with, once a running lifecycle has reached a terminal signal.
fn pending_quit(phase: Phase, signal: RunSignal) -> Option<RunSignal> {
    (phase == Phase::Running && signal.is_terminal()).then_some(signal)
}

/// Outcome recorded when the platform ends the loop on its own. An
/// uninterrupted run counts as a success.
fn exit_outcome(signal: RunSignal) -> RunSignal {
    match signal {
        RunSignal::Continue => RunSignal::Success,
        terminal => terminal,
    }
}

fn translate_event(event: &WindowEvent) -> AppEvent {
    match event {
        WindowEvent::CloseRequested => AppEvent::QuitRequested,
        _ => AppEvent::Other,
    }
}
