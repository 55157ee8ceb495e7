use image::{Rgba, RgbaImage};

/// An owned RGBA8 image used for sprites and backgrounds.
///
/// Pixels with alpha 0 are transparent when blitted; every other pixel
/// overwrites the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::from_image(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    /// A disc of `radius` pixels on a transparent square of side `2 * radius`.
    pub fn filled_circle(radius: u32, color: [u8; 4]) -> Self {
        let side = radius.saturating_mul(2);
        let r = radius as f32;
        Self::from_image(RgbaImage::from_fn(side, side, |x, y| {
            let dx = x as f32 + 0.5 - r;
            let dy = y as f32 + 0.5 - r;
            if dx * dx + dy * dy <= r * r {
                Rgba(color)
            } else {
                Rgba([0, 0, 0, 0])
            }
        }))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(x, y).0)
    }

    pub(crate) fn rgba(&self) -> &[u8] {
        self.image.as_raw()
    }
}

pub(crate) fn scaled_dimensions(raster: &Raster, scale: f32) -> (u32, u32) {
    let scale = normalized_scale(scale);
    let width = (raster.width() as f32 * scale).round().max(1.0) as u32;
    let height = (raster.height() as f32 * scale).round().max(1.0) as u32;
    (width, height)
}

fn normalized_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

pub(crate) fn fill_frame(frame: &mut [u8], color: [u8; 4]) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

/// Nearest-neighbour blit of `raster` scaled by `scale` with its top-left
/// corner at `(left, top)`, clipped to the frame.
pub(crate) fn blit_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    raster: &Raster,
    left: i32,
    top: i32,
    scale: f32,
) {
    if raster.width() == 0 || raster.height() == 0 || width == 0 || height == 0 {
        return;
    }
    let frame_width = width as usize;
    if frame.len() < frame_width * height as usize * 4 {
        return;
    }

    let scale = normalized_scale(scale);
    let inv_scale = scale.recip();
    let (scaled_w, scaled_h) = scaled_dimensions(raster, scale);
    let right = left.saturating_add(scaled_w as i32);
    let bottom = top.saturating_add(scaled_h as i32);

    let draw_left = left.max(0);
    let draw_top = top.max(0);
    let draw_right = right.min(width as i32);
    let draw_bottom = bottom.min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let rgba = raster.rgba();
    let raster_width = raster.width() as usize;

    for out_y in draw_top..draw_bottom {
        let dy = out_y - top;
        let src_y = ((dy as f32) * inv_scale).floor() as u32;
        let src_y = src_y.min(raster.height() - 1) as usize;
        let src_row_offset = src_y * raster_width * 4;
        let dst_row_offset = out_y as usize * frame_width * 4;

        for out_x in draw_left..draw_right {
            let dx = out_x - left;
            let src_x = ((dx as f32) * inv_scale).floor() as u32;
            let src_x = src_x.min(raster.width() - 1) as usize;
            let src_offset = src_row_offset + src_x * 4;
            if rgba[src_offset + 3] == 0 {
                continue;
            }
            let dst_offset = dst_row_offset + out_x as usize * 4;
            frame[dst_offset..dst_offset + 4].copy_from_slice(&rgba[src_offset..src_offset + 4]);
        }
    }
}

/// Nearest-neighbour blit of `raster` scaled by `scale` and rotated by
/// `angle` radians counter-clockwise about `center`, clipped to the frame.
///
/// Each destination pixel samples the source through the inverse rotation.
pub(crate) fn blit_rotated(
    frame: &mut [u8],
    width: u32,
    height: u32,
    raster: &Raster,
    center: (f32, f32),
    scale: f32,
    angle: f32,
) {
    if raster.width() == 0 || raster.height() == 0 || width == 0 || height == 0 {
        return;
    }
    let frame_width = width as usize;
    if frame.len() < frame_width * height as usize * 4 {
        return;
    }

    let scale = normalized_scale(scale);
    let inv_scale = scale.recip();
    let (scaled_w, scaled_h) = scaled_dimensions(raster, scale);
    let half_w = scaled_w as f32 / 2.0;
    let half_h = scaled_h as f32 / 2.0;
    let reach = half_w.hypot(half_h);
    let (sin, cos) = angle.sin_cos();

    let draw_left = ((center.0 - reach).floor() as i32).max(0);
    let draw_top = ((center.1 - reach).floor() as i32).max(0);
    let draw_right = ((center.0 + reach).ceil() as i32).min(width as i32);
    let draw_bottom = ((center.1 + reach).ceil() as i32).min(height as i32);

    let rgba = raster.rgba();
    let raster_width = raster.width() as usize;

    for out_y in draw_top..draw_bottom {
        let dy = out_y as f32 + 0.5 - center.1;
        let dst_row_offset = out_y as usize * frame_width * 4;
        for out_x in draw_left..draw_right {
            let dx = out_x as f32 + 0.5 - center.0;
            // Screen y points down, so a counter-clockwise turn inverts as
            // (dx, dy) -> (dx cos - dy sin, dx sin + dy cos).
            let u = dx * cos - dy * sin + half_w;
            let v = dx * sin + dy * cos + half_h;
            if u < 0.0 || v < 0.0 {
                continue;
            }
            let src_x = (u * inv_scale).floor() as u32;
            let src_y = (v * inv_scale).floor() as u32;
            if src_x >= raster.width() || src_y >= raster.height() {
                continue;
            }
            let src_offset = (src_y as usize * raster_width + src_x as usize) * 4;
            if rgba[src_offset + 3] == 0 {
                continue;
            }
            let dst_offset = dst_row_offset + out_x as usize * 4;
            frame[dst_offset..dst_offset + 4].copy_from_slice(&rgba[src_offset..src_offset + 4]);
        }
    }
}
