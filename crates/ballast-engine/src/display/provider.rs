use anyhow::Result;

use crate::paint::Color;

/// Pre-creation request for the surface's pixel format.
///
/// Attributes are requests: a provider may degrade them silently (e.g. fall
/// back to single sampling when the device cannot multisample the format).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceAttribute {
    /// Number of multisample buffers; `0` disables multisampling.
    MultisampleBuffers(u32),
    /// Samples per pixel when multisampling is enabled.
    MultisampleSamples(u32),
}

/// Parameters for `DisplayProvider::create_surface`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDesc {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Surface must be presentable by a GPU context.
    pub gpu_capable: bool,
    pub resizable: bool,
}

/// Platform-agnostic event delivered to `Lifecycle::handle_event`.
///
/// Backends translate their native events into this type; everything the
/// lifecycle does not act on arrives as `Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppEvent {
    QuitRequested,
    Other,
}

/// GPU command boundary of a rendering context.
pub trait RenderContext {
    /// Sets the color used by subsequent `clear` calls.
    fn set_clear_color(&mut self, color: Color);

    /// Clears the color buffer of the next frame.
    ///
    /// An error means the context can no longer render.
    fn clear(&mut self) -> Result<()>;
}

/// Display surface and GPU context provider.
///
/// Handles are owned values: destroying one consumes it, so a handle cannot
/// be released twice.
pub trait DisplayProvider {
    type Surface;
    type Context: RenderContext;

    /// Acquires the display subsystem. Must succeed before any other call.
    fn init_subsystem(&mut self) -> Result<()>;

    /// Records a surface attribute request. Only valid before `create_surface`.
    fn set_attribute(&mut self, attribute: SurfaceAttribute) -> Result<()>;

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<Self::Surface>;

    /// Creates a GPU context bound to `surface`. The context must be
    /// destroyed before the surface.
    fn create_context(&mut self, surface: &Self::Surface) -> Result<Self::Context>;

    /// Requests a presentation interval (1 = sync to refresh, 0 = immediate,
    /// -1 = adaptive). A hint; providers may ignore it.
    fn set_presentation_interval(
        &mut self,
        context: &mut Self::Context,
        interval: i32,
    ) -> Result<()>;

    fn show(&mut self, surface: &Self::Surface);

    /// Presents the frame most recently cleared on `context`.
    fn swap(&mut self, surface: &Self::Surface, context: &mut Self::Context) -> Result<()>;

    fn destroy_context(&mut self, context: Self::Context);

    fn destroy_surface(&mut self, surface: Self::Surface);

    /// Releases the subsystem. Safe to call when `init_subsystem` failed or
    /// was never called.
    fn shutdown_subsystem(&mut self);

    /// Message describing the most recent provider failure, if any.
    fn last_error(&self) -> Option<String>;
}
