//! Time subsystem.
//!
//! - `FrameClock` turns wall-clock time into clamped per-frame deltas.
//! - `StepAccumulator` converts those deltas into physics steps according to
//!   a `StepPolicy`.

mod frame_clock;
mod step;

pub use frame_clock::{FrameClock, FrameTime};
pub use step::{StepAccumulator, StepPlan, StepPolicy};
