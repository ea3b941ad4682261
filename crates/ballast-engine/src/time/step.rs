/// Physics advance policy applied once per Iterate.
///
/// With `max_sub_steps > 0` the policy is accumulate-and-step: the frame delta
/// is accumulated and consumed in `fixed_dt` slices, at most `max_sub_steps`
/// per frame. With `max_sub_steps == 0` the world is stepped exactly once by
/// the raw frame delta.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepPolicy {
    /// Length of one simulation step, in seconds.
    pub fixed_dt: f32,

    /// Upper bound on steps per frame. Zero selects variable stepping.
    pub max_sub_steps: u32,
}

impl StepPolicy {
    pub const fn fixed(fixed_dt: f32, max_sub_steps: u32) -> Self {
        Self { fixed_dt, max_sub_steps }
    }

    pub const fn variable() -> Self {
        Self { fixed_dt: 1.0 / 60.0, max_sub_steps: 0 }
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        self.max_sub_steps == 0
    }
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self::fixed(1.0 / 60.0, 5)
    }
}

/// Outcome of feeding one frame delta into a [`StepAccumulator`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepPlan {
    /// Number of steps to run this frame.
    pub steps: u32,

    /// Length of each step, in seconds.
    pub dt: f32,
}

impl StepPlan {
    pub const fn idle() -> Self {
        Self { steps: 0, dt: 0.0 }
    }
}

/// Carries leftover simulation time between frames.
#[derive(Debug, Clone, Default)]
pub struct StepAccumulator {
    pending: f32,
}

impl StepAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation time received but not yet stepped, in seconds.
    pub fn pending(&self) -> f32 {
        self.pending
    }

    /// Adds `frame_dt` and returns how many steps are due.
    ///
    /// Steps beyond `max_sub_steps` are dropped together with their time, so
    /// a long stall never turns into a backlog.
    pub fn advance(&mut self, policy: &StepPolicy, frame_dt: f32) -> StepPlan {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return StepPlan::idle();
        }

        if policy.is_variable() {
            return StepPlan { steps: 1, dt: frame_dt };
        }

        if policy.fixed_dt.is_nan() || policy.fixed_dt <= 0.0 {
            return StepPlan::idle();
        }

        self.pending += frame_dt;

        let due = (self.pending / policy.fixed_dt).floor();
        if due < 1.0 {
            return StepPlan::idle();
        }

        self.pending -= due * policy.fixed_dt;
        if self.pending < 0.0 {
            self.pending = 0.0;
        }

        let steps = (due as u32).min(policy.max_sub_steps);
        StepPlan { steps, dt: policy.fixed_dt }
    }
}
