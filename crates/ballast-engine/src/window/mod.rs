//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop, implements the display provider on top of
//! winit windows and wgpu contexts, and calls into the lifecycle once per
//! event and once per frame.

mod display;
mod runtime;

pub use runtime::{Runtime, WinitLifecycle};
