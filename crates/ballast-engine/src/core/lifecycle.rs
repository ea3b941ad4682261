use anyhow::{Context, Result};

use crate::display::{AppEvent, DisplayProvider, RenderContext, SurfaceDesc};
use crate::physics::{PhysicsBackend, PhysicsWorld};
use crate::time::FrameTime;

use super::config::LaunchConfig;
use super::signal::RunSignal;
use super::state::AppState;

/// Coarse lifecycle position. `Running` covers both a live app and one whose
/// Init failed and is waiting for Quit.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Uninitialized,
    Running,
    Terminated,
}

/// Drives Init → (Event* → Iterate)* → Quit.
///
/// The run loop calls `init` once, then `handle_event`/`iterate` until the
/// returned signal is terminal, then `quit` once. `quit` is required after
/// every `init`, failed or not: resources acquired before a failure are only
/// released there.
///
/// Release order on quit: context, surface, then the physics world and its
/// collaborators, then the display subsystem.
pub struct Lifecycle<S, C, B: PhysicsBackend> {
    config: LaunchConfig,
    backend: B,

    phase: Phase,
    signal: RunSignal,

    app: Option<AppState<S, C>>,

    /// Surface created by an Init that then failed to create its context.
    orphan_surface: Option<S>,

    physics: Option<PhysicsWorld<B>>,

    frames: u64,
    diagnostic: Option<String>,
}

impl<S, C, B> Lifecycle<S, C, B>
where
    C: RenderContext,
    B: PhysicsBackend,
{
    pub fn new(config: LaunchConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            phase: Phase::Uninitialized,
            signal: RunSignal::Continue,
            app: None,
            orphan_surface: None,
            physics: None,
            frames: 0,
            diagnostic: None,
        }
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn signal(&self) -> RunSignal {
        self.signal
    }

    pub fn app_state(&self) -> Option<&AppState<S, C>> {
        self.app.as_ref()
    }

    pub fn app_state_mut(&mut self) -> Option<&mut AppState<S, C>> {
        self.app.as_mut()
    }

    pub fn physics(&self) -> Option<&PhysicsWorld<B>> {
        self.physics.as_ref()
    }

    /// Number of frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Provider message captured when Init failed.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Brings up the display subsystem, surface, context and physics world.
    ///
    /// Returns `Continue` on success and `Failure` otherwise. Either way the
    /// caller must eventually call [`quit`](Self::quit).
    pub fn init<D>(&mut self, display: &mut D) -> RunSignal
    where
        D: DisplayProvider<Surface = S, Context = C>,
    {
        if self.phase != Phase::Uninitialized {
            log::warn!("init called in phase {:?}; ignored", self.phase);
            return self.signal;
        }
        self.phase = Phase::Running;

        match self.bring_up(display) {
            Ok(()) => {
                log::info!("init complete");
                self.signal
            }
            Err(err) => {
                log::error!("init failed: {err:#}");
                self.diagnostic = display.last_error().or_else(|| Some(format!("{err:#}")));
                self.signal.transition(RunSignal::Failure)
            }
        }
    }

    fn bring_up<D>(&mut self, display: &mut D) -> Result<()>
    where
        D: DisplayProvider<Surface = S, Context = C>,
    {
        display
            .init_subsystem()
            .context("failed to initialize display subsystem")?;

        for attribute in &self.config.surface_attributes {
            if let Err(err) = display.set_attribute(*attribute) {
                log::debug!("surface attribute {attribute:?} not applied: {err:#}");
            }
        }

        let desc = SurfaceDesc {
            title: self.config.title.clone(),
            width: self.config.width,
            height: self.config.height,
            gpu_capable: true,
            resizable: self.config.resizable,
        };
        let surface = display
            .create_surface(&desc)
            .context("failed to create surface")?;

        let mut context = match display.create_context(&surface) {
            Ok(context) => context,
            Err(err) => {
                self.orphan_surface = Some(surface);
                return Err(err.context("failed to create GPU context"));
            }
        };

        let interval = self.config.presentation_interval;
        if let Err(err) = display.set_presentation_interval(&mut context, interval) {
            log::debug!("presentation interval {interval} not applied: {err:#}");
        }

        context.set_clear_color(self.config.clear_color);

        let physics = PhysicsWorld::build(&mut self.backend, self.config.gravity);
        log::info!("gravity = {}", physics.gravity());
        self.physics = Some(physics);

        let app = self.app.insert(AppState::new(surface, context));
        display.show(app.surface());

        Ok(())
    }

    /// Applies a platform event. Only a quit request has an effect.
    pub fn handle_event(&mut self, event: AppEvent) -> RunSignal {
        if self.phase != Phase::Running || self.signal.is_terminal() {
            return self.signal;
        }

        match event {
            AppEvent::QuitRequested => {
                log::info!("quit requested");
                self.signal.transition(RunSignal::Success)
            }
            AppEvent::Other => self.signal,
        }
    }

    /// Frame tick: advances physics, clears, presents.
    ///
    /// Once the signal is terminal the frame is skipped and the signal
    /// returned unchanged.
    pub fn iterate<D>(&mut self, display: &mut D, frame: FrameTime) -> RunSignal
    where
        D: DisplayProvider<Surface = S, Context = C>,
    {
        match self.phase {
            Phase::Running => {}
            Phase::Uninitialized => {
                log::warn!("iterate called before init");
                return RunSignal::Failure;
            }
            Phase::Terminated => return self.signal,
        }

        if self.signal.is_terminal() {
            return self.signal;
        }

        let Some(app) = self.app.as_mut() else {
            log::error!("iterate without application state");
            return self.signal.transition(RunSignal::Failure);
        };

        if let Some(physics) = self.physics.as_mut() {
            physics.step_simulation(&mut self.backend, frame.dt, &self.config.step);
        }

        if let Err(err) = app.context_mut().clear() {
            log::error!("frame {}: clear failed: {err:#}", frame.frame_index);
            return self.signal.transition(RunSignal::Failure);
        }

        let (surface, context) = app.split_mut();
        if let Err(err) = display.swap(surface, context) {
            log::error!("frame {}: present failed: {err:#}", frame.frame_index);
            return self.signal.transition(RunSignal::Failure);
        }

        self.frames += 1;
        self.signal
    }

    /// Releases everything Init acquired, in dependency order, then shuts the
    /// display subsystem down. Safe after a failed Init; a second call is ignored.
    pub fn quit<D>(&mut self, display: &mut D, outcome: RunSignal)
    where
        D: DisplayProvider<Surface = S, Context = C>,
    {
        if self.phase == Phase::Terminated {
            log::warn!("quit called twice; ignored");
            return;
        }

        let outcome = self.signal.transition(outcome);

        if let Some(app) = self.app.take() {
            let (context, surface) = app.into_parts();
            display.destroy_context(context);
            display.destroy_surface(surface);
            log::debug!("context and surface released");
        }

        if let Some(surface) = self.orphan_surface.take() {
            display.destroy_surface(surface);
            log::debug!("orphaned surface released");
        }

        if let Some(physics) = self.physics.take() {
            physics.release();
        }

        display.shutdown_subsystem();
        self.phase = Phase::Terminated;

        log::info!("terminated with {outcome:?} after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec3;
    use crate::core::testing::{
        Call, CallLog, FailAt, MockContext, MockSurface, RecordingBackend, RecordingDisplay,
    };

    type TestLifecycle = Lifecycle<MockSurface, MockContext, RecordingBackend>;

    const DT: f32 = 1.0 / 60.0;

    fn setup(display_fail: Option<FailAt>) -> (TestLifecycle, RecordingDisplay, CallLog) {
        let log = CallLog::default();
        let display = match display_fail {
            Some(at) => RecordingDisplay::failing_at(log.clone(), at),
            None => RecordingDisplay::new(log.clone()),
        };
        let lifecycle = Lifecycle::new(
            LaunchConfig::default(),
            RecordingBackend { log: log.clone() },
        );
        (lifecycle, display, log)
    }

    fn frame(i: u64) -> FrameTime {
        FrameTime::with_dt(DT, i)
    }

    fn is_release(c: &Call) -> bool {
        matches!(c, Call::DestroyContext(_) | Call::DestroySurface(_))
    }

    fn pos(log: &CallLog, call: Call) -> usize {
        log.position(&call)
            .unwrap_or_else(|| panic!("{call:?} not recorded in {:?}", log.calls()))
    }

    // ── init ──────────────────────────────────────────────────────────────

    #[test]
    fn init_success_returns_continue_and_shows_surface() {
        let (mut lc, mut display, log) = setup(None);
        assert_eq!(lc.init(&mut display), RunSignal::Continue);
        assert_eq!(lc.phase(), Phase::Running);
        assert!(lc.app_state().is_some());

        // Show is the last init step.
        assert_eq!(log.calls().last(), Some(&Call::Show(1)));
        assert!(pos(&log, Call::CreateWorld) < pos(&log, Call::Show(1)));
    }

    #[test]
    fn init_sets_attributes_before_surface() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);

        let surface = pos(&log, Call::CreateSurface(1));
        for attribute in &lc.config().surface_attributes {
            assert!(pos(&log, Call::SetAttribute(*attribute)) < surface);
        }
        let first = Call::SetAttribute(lc.config().surface_attributes[0]);
        assert!(pos(&log, Call::InitSubsystem) < pos(&log, first));
    }

    #[test]
    fn init_applies_interval_and_clear_color() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);
        assert!(log.position(&Call::PresentationInterval(1)).is_some());
        assert!(log.position(&Call::SetClearColor(lc.config().clear_color)).is_some());
    }

    #[test]
    fn rejected_hints_do_not_fail_init() {
        let (mut lc, mut display, log) = setup(None);
        display.reject_hints = true;
        assert_eq!(lc.init(&mut display), RunSignal::Continue);
        let hints =
            log.count(|c| matches!(c, Call::SetAttribute(_) | Call::PresentationInterval(_)));
        assert_eq!(hints, 0);
    }

    #[test]
    fn second_init_is_ignored() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);
        let before = log.calls().len();
        assert_eq!(lc.init(&mut display), RunSignal::Continue);
        assert_eq!(log.calls().len(), before);
    }

    #[test]
    fn subsystem_failure_allocates_nothing_and_quit_is_safe() {
        let (mut lc, mut display, log) = setup(Some(FailAt::InitSubsystem));
        assert_eq!(lc.init(&mut display), RunSignal::Failure);
        assert_eq!(lc.diagnostic(), Some("no video device"));
        assert!(log.calls().is_empty());

        lc.quit(&mut display, RunSignal::Failure);
        assert_eq!(log.calls(), vec![Call::Shutdown]);
        assert_eq!(lc.phase(), Phase::Terminated);
    }

    // ── surface/context ordering ─────────────────────────────────────────

    #[test]
    fn context_created_after_surface_and_released_before_it() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);
        assert!(pos(&log, Call::CreateSurface(1)) < pos(&log, Call::CreateContext(2)));

        lc.quit(&mut display, RunSignal::Success);
        assert!(pos(&log, Call::DestroyContext(2)) < pos(&log, Call::DestroySurface(1)));
        assert!(pos(&log, Call::DestroySurface(1)) < pos(&log, Call::Shutdown));
    }

    // ── physics ownership ────────────────────────────────────────────────

    #[test]
    fn collaborators_built_before_world_in_fixed_order() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);

        let order = [
            Call::CreateContext(2),
            Call::CreateConfiguration,
            Call::CreateDispatcher,
            Call::CreateBroadphase,
            Call::CreateSolver,
            Call::CreateWorld,
        ];
        let positions: Vec<usize> = order.iter().map(|c| pos(&log, c.clone())).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", log.calls());
    }

    #[test]
    fn world_released_before_collaborators() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);
        log.clear();

        lc.quit(&mut display, RunSignal::Success);

        let physics: Vec<Call> = log
            .calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::DropWorld
                        | Call::DropSolver
                        | Call::DropBroadphase
                        | Call::DropConfiguration
                        | Call::DropDispatcher
                )
            })
            .collect();
        assert_eq!(
            physics,
            vec![
                Call::DropWorld,
                Call::DropSolver,
                Call::DropBroadphase,
                Call::DropConfiguration,
                Call::DropDispatcher,
            ]
        );
        assert!(pos(&log, Call::DropDispatcher) < pos(&log, Call::Shutdown));
    }

    // ── surface creation failure ─────────────────────────────────────────

    #[test]
    fn surface_failure_then_quit_releases_nothing_but_shuts_down() {
        let (mut lc, mut display, log) = setup(Some(FailAt::CreateSurface));
        assert_eq!(lc.init(&mut display), RunSignal::Failure);
        assert_eq!(lc.diagnostic(), Some("surface creation refused"));

        lc.quit(&mut display, RunSignal::Failure);

        assert_eq!(log.count(is_release), 0);
        assert_eq!(log.count(|c| matches!(c, Call::CreateConfiguration | Call::DropWorld)), 0);
        assert_eq!(log.count(|c| *c == Call::Shutdown), 1);
        assert_eq!(log.calls().last(), Some(&Call::Shutdown));
    }

    #[test]
    fn context_failure_leaves_surface_for_quit() {
        let (mut lc, mut display, log) = setup(Some(FailAt::CreateContext));
        assert_eq!(lc.init(&mut display), RunSignal::Failure);
        assert!(lc.app_state().is_none());
        assert_eq!(log.count(|c| matches!(c, Call::DestroySurface(_))), 0);

        lc.quit(&mut display, RunSignal::Failure);

        assert_eq!(log.count(|c| matches!(c, Call::DestroyContext(_))), 0);
        assert_eq!(log.count(|c| *c == Call::DestroySurface(1)), 1);
        assert!(pos(&log, Call::DestroySurface(1)) < pos(&log, Call::Shutdown));
    }

    // ── run-signal monotonicity ──────────────────────────────────────────

    #[test]
    fn success_survives_later_events_and_frames() {
        let (mut lc, mut display, _log) = setup(None);
        lc.init(&mut display);
        assert_eq!(lc.handle_event(AppEvent::QuitRequested), RunSignal::Success);

        assert_eq!(lc.handle_event(AppEvent::Other), RunSignal::Success);
        assert_eq!(lc.handle_event(AppEvent::QuitRequested), RunSignal::Success);
        assert_eq!(lc.iterate(&mut display, frame(0)), RunSignal::Success);
        assert_eq!(lc.iterate(&mut display, frame(1)), RunSignal::Success);
        assert_eq!(lc.signal(), RunSignal::Success);
    }

    #[test]
    fn failure_is_not_overridden_by_quit_request() {
        let (mut lc, mut display, _log) = setup(Some(FailAt::Clear));
        assert_eq!(lc.init(&mut display), RunSignal::Continue);
        assert_eq!(lc.iterate(&mut display, frame(0)), RunSignal::Failure);
        assert_eq!(lc.handle_event(AppEvent::QuitRequested), RunSignal::Failure);
        assert_eq!(lc.iterate(&mut display, frame(1)), RunSignal::Failure);
    }

    #[test]
    fn failed_init_is_not_revived_by_events() {
        let (mut lc, mut display, _log) = setup(Some(FailAt::CreateSurface));
        lc.init(&mut display);
        assert_eq!(lc.handle_event(AppEvent::QuitRequested), RunSignal::Failure);
        assert_eq!(lc.iterate(&mut display, frame(0)), RunSignal::Failure);
    }

    #[test]
    fn present_failure_ends_the_run() {
        let (mut lc, mut display, log) = setup(Some(FailAt::Swap));
        lc.init(&mut display);
        assert_eq!(lc.iterate(&mut display, frame(0)), RunSignal::Failure);
        assert_eq!(lc.frames(), 0);

        lc.quit(&mut display, RunSignal::Failure);
        assert_eq!(log.count(is_release), 2);
    }

    // ── gravity ──────────────────────────────────────────────────────────

    #[test]
    fn gravity_reads_back_after_init() {
        let (mut lc, mut display, _log) = setup(None);
        lc.init(&mut display);

        let gravity = lc.physics().map(|p| p.gravity());
        let gravity = gravity.unwrap_or_else(|| panic!("physics world missing"));
        assert!(gravity.approx_eq(Vec3::new(0.0, -9.8, 0.0), 1e-5), "{gravity}");
    }

    // ── plain frames ─────────────────────────────────────────────────────

    #[test]
    fn each_frame_clears_once_and_swaps_once() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);
        log.clear();

        for i in 0..3 {
            assert_eq!(lc.iterate(&mut display, frame(i)), RunSignal::Continue);
        }

        assert_eq!(log.count(|c| matches!(c, Call::Clear(_))), 3);
        assert_eq!(log.count(|c| matches!(c, Call::Swap(_))), 3);
        assert_eq!(lc.frames(), 3);

        // clear, swap, clear, swap, ...
        let render: Vec<Call> = log
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Clear(_) | Call::Swap(_)))
            .collect();
        assert_eq!(
            render,
            vec![
                Call::Clear(2),
                Call::Swap(1),
                Call::Clear(2),
                Call::Swap(1),
                Call::Clear(2),
                Call::Swap(1),
            ]
        );
    }

    #[test]
    fn each_frame_steps_physics_before_clearing() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);
        log.clear();

        lc.iterate(&mut display, frame(0));

        assert_eq!(log.count(|c| matches!(c, Call::Step(_))), 1);
        assert!(pos(&log, Call::Step(DT)) < pos(&log, Call::Clear(2)));
        assert_eq!(lc.physics().map(|p| p.steps_taken()), Some(1));
    }

    #[test]
    fn iterate_before_init_fails_without_side_effects() {
        let (mut lc, mut display, log) = setup(None);
        assert_eq!(lc.iterate(&mut display, frame(0)), RunSignal::Failure);
        assert!(log.calls().is_empty());
        assert_eq!(lc.signal(), RunSignal::Continue);
    }

    // ── quit event ───────────────────────────────────────────────────────

    #[test]
    fn quit_event_then_full_teardown_exactly_once() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);
        lc.iterate(&mut display, frame(0));

        assert_eq!(lc.handle_event(AppEvent::QuitRequested), RunSignal::Success);
        assert_eq!(lc.iterate(&mut display, frame(1)), RunSignal::Success);

        lc.quit(&mut display, RunSignal::Success);
        lc.quit(&mut display, RunSignal::Success);

        for call in [
            Call::DestroyContext(2),
            Call::DestroySurface(1),
            Call::DropWorld,
            Call::DropSolver,
            Call::DropBroadphase,
            Call::DropConfiguration,
            Call::DropDispatcher,
            Call::Shutdown,
        ] {
            assert_eq!(log.count(|c| *c == call), 1, "{call:?} in {:?}", log.calls());
        }

        assert!(pos(&log, Call::DestroyContext(2)) < pos(&log, Call::DestroySurface(1)));
        assert!(pos(&log, Call::DropWorld) < pos(&log, Call::DropSolver));
        assert_eq!(lc.signal(), RunSignal::Success);
        assert!(lc.app_state().is_none());
        assert!(lc.physics().is_none());
    }

    #[test]
    fn other_events_are_no_ops() {
        let (mut lc, mut display, log) = setup(None);
        lc.init(&mut display);
        let before = log.calls().len();

        assert_eq!(lc.handle_event(AppEvent::Other), RunSignal::Continue);
        assert_eq!(log.calls().len(), before);
    }
}
