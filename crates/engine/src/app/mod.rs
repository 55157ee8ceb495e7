mod camera;
mod input;
mod loop_runner;
mod rendering;
mod scene;
mod stats;

pub use camera::{Axis, Camera, CameraError, ConfigIssue, DrawCommand};
pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{
    screen_to_world, world_to_screen, Drawable, OffscreenScreen, Raster, Screen, CLEAR_COLOR,
};
pub use scene::{InputSnapshot, Scene, SceneCommand, Vec2};
