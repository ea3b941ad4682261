//! GPU device + surface management on wgpu.
//!
//! This module is responsible for:
//! - creating the Adapter/Device/Queue and configuring the Surface
//! - honoring multisample and swap-interval requests where the adapter can
//! - recording the per-frame clear and presenting it

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
