use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::rendering::{
    blit_rotated, blit_scaled, fill_frame, scaled_dimensions, world_to_screen, Drawable, Raster,
    Screen, CLEAR_COLOR,
};
use super::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("zoom must be finite and greater than zero, got {zoom}")]
    InvalidZoom { zoom: f32 },
    #[error("margin must be finite and non-negative, got {margin}")]
    InvalidMargin { margin: f32 },
    #[error("margin {margin} exceeds half the viewport ({half_viewport}) on the {axis} axis")]
    MarginExceedsHalfViewport {
        axis: Axis,
        margin: f32,
        half_viewport: f32,
    },
    #[error("visible extent {visible} exceeds world size {world} on the {axis} axis")]
    ViewportLargerThanWorld { axis: Axis, visible: f32, world: u32 },
    #[error("initial scroll {scroll} on the {axis} axis is outside [0, {max_scroll}]")]
    InitialScrollOutOfRange {
        axis: Axis,
        scroll: f32,
        max_scroll: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CameraError {
    #[error("invalid camera config: {0}")]
    InvalidConfig(#[from] ConfigIssue),
}

/// One blit of the composite pass, in paint order.
///
/// `top_left` places the unrotated, scaled image; a rotated image turns
/// about the centre of that box.
#[derive(Debug, Clone, Copy)]
pub struct DrawCommand<'a> {
    pub raster: &'a Raster,
    pub top_left: (i32, i32),
    pub scale: f32,
    pub angle: f32,
}

/// Scrolling viewport over a bounded world.
///
/// `scroll_pos` is the world point at the bottom-left corner of the
/// viewport. `margin` is measured in screen pixels from each viewport edge:
/// the target may move freely inside the inner dead zone and pushes the
/// viewport once it crosses into the margin.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    scroll_pos: Vec2,
    zoom: f32,
    margin: f32,
    viewport_size: (u32, u32),
    world_size: (u32, u32),
}

impl Camera {
    pub fn new(
        initial_scroll: Vec2,
        zoom: f32,
        margin: f32,
        viewport_size: (u32, u32),
        world_size: (u32, u32),
    ) -> Result<Self, CameraError> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(ConfigIssue::InvalidZoom { zoom }.into());
        }
        if !margin.is_finite() || margin < 0.0 {
            return Err(ConfigIssue::InvalidMargin { margin }.into());
        }

        let camera = Self {
            scroll_pos: initial_scroll,
            zoom,
            margin,
            viewport_size,
            world_size,
        };

        let half = camera.half_viewport();
        let visible = camera.visible_extent();
        let max_scroll = camera.max_scroll();
        let per_axis = [
            (Axis::X, half.x, visible.x, world_size.0, initial_scroll.x, max_scroll.x),
            (Axis::Y, half.y, visible.y, world_size.1, initial_scroll.y, max_scroll.y),
        ];
        for (axis, half_viewport, visible, world, scroll, max_scroll) in per_axis {
            if margin > half_viewport {
                return Err(ConfigIssue::MarginExceedsHalfViewport {
                    axis,
                    margin,
                    half_viewport,
                }
                .into());
            }
            if visible > world as f32 {
                return Err(ConfigIssue::ViewportLargerThanWorld {
                    axis,
                    visible,
                    world,
                }
                .into());
            }
            if !scroll.is_finite() || scroll < 0.0 || scroll > max_scroll {
                return Err(ConfigIssue::InitialScrollOutOfRange {
                    axis,
                    scroll,
                    max_scroll,
                }
                .into());
            }
        }

        debug!(
            zoom,
            margin,
            scroll_x = initial_scroll.x,
            scroll_y = initial_scroll.y,
            max_scroll_x = max_scroll.x,
            max_scroll_y = max_scroll.y,
            "camera_created"
        );
        Ok(camera)
    }

    pub fn scroll_pos(&self) -> Vec2 {
        self.scroll_pos
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Largest scroll position per axis that keeps the viewport inside the world.
    pub fn max_scroll(&self) -> Vec2 {
        let visible = self.visible_extent();
        Vec2::new(
            (self.world_size.0 as f32 - visible.x).max(0.0),
            (self.world_size.1 as f32 - visible.y).max(0.0),
        )
    }

    /// Shifts the viewport without clamping.
    pub fn move_by(&mut self, delta: Vec2) {
        self.scroll_pos += delta;
    }

    /// World-space scroll needed this frame to keep `target` out of the
    /// margins, already clamped to the world bounds.
    pub fn scroll_delta(&self, target: Vec2) -> Vec2 {
        let half = self.half_viewport();
        let rel = (target - self.scroll_pos) * self.zoom - half;
        let max_scroll = self.max_scroll();

        let dx = dead_zone_excess(rel.x, half.x - self.margin) / self.zoom;
        let dy = dead_zone_excess(rel.y, half.y - self.margin) / self.zoom;

        Vec2::new(
            clamped_step(self.scroll_pos.x, dx, max_scroll.x),
            clamped_step(self.scroll_pos.y, dy, max_scroll.y),
        )
    }

    /// Background first, then each drawable in slice order.
    pub fn draw_list<'a, D: Drawable>(
        &'a self,
        drawables: &'a [D],
        background: &'a Raster,
    ) -> impl Iterator<Item = DrawCommand<'a>> + 'a {
        let viewport_height = self.viewport_size.1;
        let background_top = Vec2::new(0.0, background.height() as f32);
        let background_cmd = DrawCommand {
            raster: background,
            top_left: world_to_screen(background_top, self.scroll_pos, self.zoom, viewport_height),
            scale: self.zoom,
            angle: 0.0,
        };

        let drawable_cmds = drawables.iter().filter_map(move |drawable| {
            let Some(raster) = drawable.image() else {
                debug_assert!(false, "drawable at {:?} has no image", drawable.position());
                return None;
            };
            let (center_x, center_y) = world_to_screen(
                drawable.position(),
                self.scroll_pos,
                self.zoom,
                viewport_height,
            );
            let (width, height) = scaled_dimensions(raster, self.zoom);
            Some(DrawCommand {
                raster,
                top_left: (center_x - (width / 2) as i32, center_y - (height / 2) as i32),
                scale: self.zoom,
                angle: drawable.angle(),
            })
        });

        std::iter::once(background_cmd).chain(drawable_cmds)
    }

    /// Scrolls toward `target`, repaints the whole frame and presents it.
    pub fn update<D: Drawable>(
        &mut self,
        target: Vec2,
        drawables: &[D],
        background: &Raster,
        screen: &mut dyn Screen,
    ) {
        let delta = self.scroll_delta(target);
        self.move_by(delta);

        let (width, height) = screen.size();
        let frame = screen.frame_mut();
        fill_frame(frame, CLEAR_COLOR);
        for cmd in self.draw_list(drawables, background) {
            if cmd.angle.is_finite() && cmd.angle != 0.0 {
                let (scaled_w, scaled_h) = scaled_dimensions(cmd.raster, cmd.scale);
                let center = (
                    (cmd.top_left.0 + (scaled_w / 2) as i32) as f32,
                    (cmd.top_left.1 + (scaled_h / 2) as i32) as f32,
                );
                blit_rotated(frame, width, height, cmd.raster, center, cmd.scale, cmd.angle);
            } else {
                blit_scaled(
                    frame,
                    width,
                    height,
                    cmd.raster,
                    cmd.top_left.0,
                    cmd.top_left.1,
                    cmd.scale,
                );
            }
        }
        screen.present();
    }

    fn half_viewport(&self) -> Vec2 {
        Vec2::new(
            self.viewport_size.0 as f32 / 2.0,
            self.viewport_size.1 as f32 / 2.0,
        )
    }

    fn visible_extent(&self) -> Vec2 {
        Vec2::new(
            self.viewport_size.0 as f32 / self.zoom,
            self.viewport_size.1 as f32 / self.zoom,
        )
    }
}

fn dead_zone_excess(rel: f32, threshold: f32) -> f32 {
    if rel > threshold {
        rel - threshold
    } else if rel < -threshold {
        rel + threshold
    } else {
        0.0
    }
}

fn clamped_step(scroll: f32, delta: f32, max_scroll: f32) -> f32 {
    (scroll + delta).clamp(0.0, max_scroll) - scroll
}
