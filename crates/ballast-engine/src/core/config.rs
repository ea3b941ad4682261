use crate::coords::Vec3;
use crate::display::SurfaceAttribute;
use crate::paint::Color;
use crate::time::StepPolicy;

/// Everything Init needs to bring the surface, context and world up.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,

    /// Applied in order before the surface is created. Best-effort.
    pub surface_attributes: Vec<SurfaceAttribute>,

    /// 1 = sync to refresh, 0 = immediate, -1 = adaptive. Best-effort.
    pub presentation_interval: i32,

    pub clear_color: Color,

    pub gravity: Vec3,

    pub step: StepPolicy,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            title: "Setting up Bullet Physics from the config".to_string(),
            width: 380,
            height: 380,
            resizable: false,
            surface_attributes: vec![
                SurfaceAttribute::MultisampleBuffers(1),
                SurfaceAttribute::MultisampleSamples(2),
            ],
            presentation_interval: 1,
            clear_color: Color::rgba(0.2, 0.5, 0.3, 1.0),
            gravity: Vec3::new(0.0, -9.8, 0.0),
            step: StepPolicy::default(),
        }
    }
}
