/// A single acquired frame awaiting present.
///
/// Holding the surface texture blocks acquisition of the next one, so a
/// frame must be presented (or dropped) before the next clear.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
