mod raster;
mod renderer;
mod screen;
mod transform;

pub(crate) use raster::{blit_rotated, blit_scaled, fill_frame, scaled_dimensions};
pub use raster::Raster;
pub(crate) use renderer::WindowScreen;
pub use screen::{OffscreenScreen, Screen};
pub use transform::{screen_to_world, world_to_screen};

use super::Vec2;

pub const CLEAR_COLOR: [u8; 4] = [16, 18, 24, 255];

/// Anything the camera can paint: a world-space centre and, once loaded, an image.
pub trait Drawable {
    fn position(&self) -> Vec2;
    fn image(&self) -> Option<&Raster>;

    /// Counter-clockwise rotation in radians about the centre.
    fn angle(&self) -> f32 {
        0.0
    }
}
