//! Application lifecycle core.
//!
//! `Lifecycle` is the state machine the run loop calls into; `AppState` is
//! the typed owner of the surface and GPU context; `RunSignal` is the
//! continue/success/failure flag the loop polls.

mod config;
mod lifecycle;
mod signal;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use config::LaunchConfig;
pub use lifecycle::{Lifecycle, Phase};
pub use signal::RunSignal;
pub use state::AppState;
