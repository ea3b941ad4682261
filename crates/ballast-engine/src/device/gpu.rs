use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::display::RenderContext;
use crate::paint::Color;

use super::{GpuFrame, GpuInit, SurfaceErrorAction};
use super::surface;

/// GPU rendering context bound to one window.
///
/// - owns the wgpu Surface (swapchain), Device and Queue
/// - owns the optional multisample target the clear pass resolves from
/// - holds at most one acquired frame between `clear` and `present`
///
/// The surface keeps its own reference to the window, so dropping the last
/// external `Arc<Window>` after this context is what closes the window.
pub struct Gpu {
    /// Surface bound to the window.
    surface: wgpu::Surface<'static>,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Present modes the surface accepts.
    present_modes: Vec<wgpu::PresentMode>,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    sample_count: u32,
    msaa_view: Option<wgpu::TextureView>,

    clear_color: Color,
    pending: Option<GpuFrame>,
}

impl Gpu {
    /// Creates a GPU context for `window` from a shared instance.
    ///
    /// `requested_samples` is degraded to what the adapter supports for the
    /// chosen surface format.
    pub async fn new(
        instance: &wgpu::Instance,
        window: Arc<Window>,
        init: GpuInit,
        requested_samples: u32,
    ) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let GpuInit {
            prefer_srgb,
            power_preference,
            alpha_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!(
            "GPU adapter: {} ({:?}, {:?}) driver: {} {}",
            info.name,
            info.backend,
            info.device_type,
            info.driver,
            info.driver_info,
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ballast-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&caps, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        let flags = adapter.get_texture_format_features(format).flags;
        let sample_count = surface::choose_sample_count(flags, requested_samples);
        if sample_count != requested_samples.max(1) {
            log::debug!("multisampling degraded from {requested_samples}x to {sample_count}x");
        }
        let msaa_view =
            (sample_count > 1).then(|| surface::create_msaa_view(&device, &config, sample_count));

        log::info!(
            "surface {}x{} {:?}, {}x multisampling",
            size.width,
            size.height,
            format,
            sample_count
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            present_modes: caps.present_modes,
            size,
            sample_count,
            msaa_view,
            clear_color: Color::black(),
            pending: None,
        })
    }

    /// Applies a swap interval. An unsupported mode falls back to Fifo and
    /// is reported as an error.
    pub fn set_swap_interval(&mut self, interval: i32) -> Result<()> {
        let wanted = surface::present_mode_for_interval(interval);
        let supported = self.present_modes.contains(&wanted);

        self.config.present_mode = if supported { wanted } else { wgpu::PresentMode::Fifo };
        self.surface.configure(&self.device, &self.config);

        anyhow::ensure!(supported, "present mode {wanted:?} unsupported, using Fifo");
        Ok(())
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that case,
    /// only internal state is updated and configuration is deferred.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.pending = None;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        if self.sample_count > 1 {
            self.msaa_view = Some(surface::create_msaa_view(
                &self.device,
                &self.config,
                self.sample_count,
            ));
        }
    }

    /// Acquires the next surface texture and creates an encoder.
    fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ballast frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
    }

    /// Submits and presents the frame recorded by the last `clear`.
    /// Returns `false` when there was nothing to present.
    pub fn present(&mut self) -> bool {
        let Some(frame) = self.pending.take() else {
            return false;
        };

        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
        true
    }
}

impl RenderContext for Gpu {
    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color.clamped();
    }

    fn clear(&mut self) -> Result<()> {
        // A frame cleared but never presented is discarded.
        self.pending = None;

        let mut frame = match self.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let message = err.to_string();
                return match self.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => Err(anyhow::anyhow!("surface error: {message}")),
                    action => {
                        log::debug!("frame skipped ({action:?}): {message}");
                        Ok(())
                    }
                };
            }
        };

        let (view, resolve_target, store) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&frame.view), wgpu::StoreOp::Discard),
            None => (&frame.view, None, wgpu::StoreOp::Store),
        };

        // Clear pass; dropped before the encoder is finished in `present`.
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ballast clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                        store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.pending = Some(frame);
        Ok(())
    }
}
