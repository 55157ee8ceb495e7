use image::{Rgba, RgbaImage};

/// A drawing surface of fixed pixel size backed by an RGBA8 frame buffer.
pub trait Screen {
    fn size(&self) -> (u32, u32);
    fn frame_mut(&mut self) -> &mut [u8];
    fn present(&mut self);
}

/// In-memory screen used by tests and headless runs.
#[derive(Debug, Clone)]
pub struct OffscreenScreen {
    frame: RgbaImage,
    presented_frames: u64,
}

impl OffscreenScreen {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])),
            presented_frames: 0,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.frame.width() || y >= self.frame.height() {
            return None;
        }
        Some(self.frame.get_pixel(x, y).0)
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }
}

impl Screen for OffscreenScreen {
    fn size(&self) -> (u32, u32) {
        (self.frame.width(), self.frame.height())
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.frame
    }

    fn present(&mut self) {
        self.presented_frames += 1;
    }
}
