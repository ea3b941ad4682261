//! Surface/context provider seam.
//!
//! The lifecycle never talks to a windowing or GPU API directly. It drives a
//! `DisplayProvider` whose handles it owns and releases in order. The winit +
//! wgpu implementation lives in `window`.

mod provider;

pub use provider::{AppEvent, DisplayProvider, RenderContext, SurfaceAttribute, SurfaceDesc};
