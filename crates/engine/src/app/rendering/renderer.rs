use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use tracing::warn;
use winit::window::Window;

use super::Screen;

/// Window-backed screen. The pixel buffer keeps the viewport size for the
/// lifetime of the window; only the surface follows the window's physical size.
pub(crate) struct WindowScreen {
    pixels: Pixels<'static>,
    buffer_size: (u32, u32),
    present_error: Option<Error>,
}

impl WindowScreen {
    pub(crate) fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, Error> {
        let surface_size = window.inner_size();
        let surface = SurfaceTexture::new(surface_size.width, surface_size.height, window);
        let pixels = Pixels::new(width, height, surface)?;
        Ok(Self {
            pixels,
            buffer_size: (width, height),
            present_error: None,
        })
    }

    pub(crate) fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    /// The first presentation failure since the last call, if any.
    pub(crate) fn take_present_error(&mut self) -> Option<Error> {
        self.present_error.take()
    }
}

impl Screen for WindowScreen {
    fn size(&self) -> (u32, u32) {
        self.buffer_size
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        self.pixels.frame_mut()
    }

    fn present(&mut self) {
        if let Err(error) = self.pixels.render() {
            warn!(error = %error, "present_failed");
            if self.present_error.is_none() {
                self.present_error = Some(error);
            }
        }
    }
}
