use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::device::{Gpu, GpuInit};
use crate::display::{DisplayProvider, SurfaceAttribute, SurfaceDesc};

/// Display state that outlives a single event-loop callback.
pub(crate) struct DisplayHost {
    gpu_init: GpuInit,
    instance: Option<wgpu::Instance>,
    multisample_buffers: u32,
    multisample_samples: u32,
    surface_alive: bool,
    last_error: Option<String>,
}

impl DisplayHost {
    pub(crate) fn new(gpu_init: GpuInit) -> Self {
        Self {
            gpu_init,
            instance: None,
            multisample_buffers: 0,
            multisample_samples: 0,
            surface_alive: false,
            last_error: None,
        }
    }

    fn requested_samples(&self) -> u32 {
        if self.multisample_buffers == 0 {
            1
        } else {
            self.multisample_samples.max(1)
        }
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.last_error = Some(format!("{err:#}"));
        }
        result
    }
}

/// winit + wgpu display provider for the callback currently running.
///
/// Windows can only be created from inside an event-loop callback, so the
/// runtime builds one of these per callback around the persistent host.
pub(crate) struct WinitDisplay<'a> {
    event_loop: &'a ActiveEventLoop,
    host: &'a mut DisplayHost,
}

impl<'a> WinitDisplay<'a> {
    pub(crate) fn new(event_loop: &'a ActiveEventLoop, host: &'a mut DisplayHost) -> Self {
        Self { event_loop, host }
    }
}

impl DisplayProvider for WinitDisplay<'_> {
    type Surface = Arc<Window>;
    type Context = Gpu;

    fn init_subsystem(&mut self) -> Result<()> {
        if self.event_loop.exiting() {
            return self.host.record(Err(anyhow!("event loop is already exiting")));
        }

        if self.host.instance.is_none() {
            self.host.instance = Some(wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            }));
            log::debug!("wgpu instance created");
        }
        Ok(())
    }

    fn set_attribute(&mut self, attribute: SurfaceAttribute) -> Result<()> {
        if self.host.surface_alive {
            return self
                .host
                .record(Err(anyhow!("{attribute:?} requested after surface creation")));
        }

        match attribute {
            SurfaceAttribute::MultisampleBuffers(n) => self.host.multisample_buffers = n,
            SurfaceAttribute::MultisampleSamples(n) => self.host.multisample_samples = n,
        }
        Ok(())
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<Arc<Window>> {
        if !desc.gpu_capable {
            log::debug!(
                "surface {:?} requested without GPU capability; wgpu surfaces always are",
                desc.title
            );
        }

        let attrs = Window::default_attributes()
            .with_title(desc.title.clone())
            .with_inner_size(LogicalSize::new(desc.width as f64, desc.height as f64))
            .with_resizable(desc.resizable)
            .with_visible(false);

        let result = self
            .event_loop
            .create_window(attrs)
            .context("failed to create window");
        let window = self.host.record(result)?;

        self.host.surface_alive = true;
        Ok(Arc::new(window))
    }

    fn create_context(&mut self, surface: &Arc<Window>) -> Result<Gpu> {
        let samples = self.host.requested_samples();
        let gpu_init = self.host.gpu_init.clone();

        let result = match self.host.instance.as_ref() {
            Some(instance) => {
                pollster::block_on(Gpu::new(instance, Arc::clone(surface), gpu_init, samples))
            }
            None => Err(anyhow!("display subsystem not initialized")),
        };
        self.host.record(result)
    }

    fn set_presentation_interval(&mut self, context: &mut Gpu, interval: i32) -> Result<()> {
        let result = context.set_swap_interval(interval);
        self.host.record(result)
    }

    fn show(&mut self, surface: &Arc<Window>) {
        surface.set_visible(true);
        surface.request_redraw();
    }

    fn swap(&mut self, surface: &Arc<Window>, context: &mut Gpu) -> Result<()> {
        surface.pre_present_notify();
        context.present();
        Ok(())
    }

    fn destroy_context(&mut self, context: Gpu) {
        drop(context);
        log::debug!("GPU context destroyed");
    }

    fn destroy_surface(&mut self, surface: Arc<Window>) {
        if Arc::strong_count(&surface) > 1 {
            log::warn!("surface still referenced elsewhere; window stays open until released");
        }
        drop(surface);
        self.host.surface_alive = false;
        log::debug!("window destroyed");
    }

    fn shutdown_subsystem(&mut self) {
        if self.host.instance.take().is_some() {
            log::debug!("wgpu instance released");
        }
        self.event_loop.exit();
    }

    fn last_error(&self) -> Option<String> {
        self.host.last_error.clone()
    }
}
