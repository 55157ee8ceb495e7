use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{Camera, CameraError, PhysicsError, Vec2};
use serde::Deserialize;
use thiserror::Error;

pub(crate) type Rgb = [u8; 3];

pub(crate) fn rgba(color: Rgb) -> [u8; 4] {
    [color[0], color[1], color[2], 255]
}

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("read level '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse level json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at {path}: {message}")]
    Invalid { path: String, message: String },
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelDesc {
    pub(crate) camera: CameraDesc,
    #[serde(default = "default_gravity")]
    pub(crate) gravity: Vec2,
    #[serde(default)]
    pub(crate) background: BackgroundDesc,
    pub(crate) player: PlayerDesc,
    #[serde(default)]
    pub(crate) objects: Vec<ObjectDesc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CameraDesc {
    #[serde(default)]
    pub(crate) pos: Vec2,
    #[serde(default = "default_zoom")]
    pub(crate) zoom: f32,
    pub(crate) world_size: (u32, u32),
    pub(crate) margin: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BackgroundDesc {
    pub(crate) color: Rgb,
}

impl Default for BackgroundDesc {
    fn default() -> Self {
        Self {
            color: [110, 160, 210],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlayerDesc {
    pub(crate) pos: Vec2,
    #[serde(default = "default_player_radius")]
    pub(crate) radius: f32,
    #[serde(default = "default_mass")]
    pub(crate) mass: f32,
    #[serde(default)]
    pub(crate) color: Rgb,
    #[serde(default = "default_move_impulse")]
    pub(crate) move_impulse: f32,
    #[serde(default = "default_jump_impulse")]
    pub(crate) jump_impulse: f32,
    #[serde(default = "default_sound_vol")]
    pub(crate) jump_sound_vol: f32,
    #[serde(default = "default_sound_vol")]
    pub(crate) bounce_sound_vol: f32,
    #[serde(default = "default_friction")]
    pub(crate) friction: f32,
    #[serde(default = "default_shape_elasticity")]
    pub(crate) elasticity: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub(crate) enum ObjectDesc {
    Rectangle {
        pos: Vec2,
        width: f32,
        height: f32,
        #[serde(default = "default_mass")]
        mass: f32,
        #[serde(default)]
        color: Rgb,
        #[serde(default = "default_friction")]
        friction: f32,
        #[serde(default = "default_shape_elasticity")]
        elasticity: f32,
    },
    Circle {
        pos: Vec2,
        radius: f32,
        #[serde(default = "default_mass")]
        mass: f32,
        #[serde(default)]
        color: Rgb,
        #[serde(default = "default_friction")]
        friction: f32,
        #[serde(default = "default_shape_elasticity")]
        elasticity: f32,
    },
    /// Invisible static line; `width` is the collision radius around it.
    Boundary {
        points: [Vec2; 2],
        #[serde(default = "default_boundary_width")]
        width: f32,
        #[serde(default = "default_friction")]
        friction: f32,
        #[serde(default = "default_boundary_elasticity")]
        elasticity: f32,
    },
}

fn default_gravity() -> Vec2 {
    Vec2::new(0.0, -900.0)
}

fn default_zoom() -> f32 {
    1.0
}

fn default_player_radius() -> f32 {
    20.0
}

fn default_mass() -> f32 {
    1.0
}

fn default_move_impulse() -> f32 {
    20.0
}

fn default_jump_impulse() -> f32 {
    500.0
}

fn default_sound_vol() -> f32 {
    0.5
}

fn default_friction() -> f32 {
    1.0
}

fn default_shape_elasticity() -> f32 {
    0.5
}

fn default_boundary_width() -> f32 {
    5.0
}

fn default_boundary_elasticity() -> f32 {
    0.8
}

pub(crate) fn level_path(levels_dir: &Path, level_name: &str) -> PathBuf {
    levels_dir.join(format!("{level_name}.json"))
}

/// Reads, parses and validates a level file.
pub(crate) fn load_level(path: &Path) -> Result<LevelDesc, LevelError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level(&raw)
}

pub(crate) fn parse_level(raw: &str) -> Result<LevelDesc, LevelError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let level: LevelDesc = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        LevelError::Parse {
            path,
            source: error.into_inner(),
        }
    })?;
    level.validate()?;
    Ok(level)
}

impl LevelDesc {
    /// The camera this level starts with, validated against `viewport_size`.
    pub(crate) fn build_camera(&self, viewport_size: (u32, u32)) -> Result<Camera, CameraError> {
        Camera::new(
            self.camera.pos,
            self.camera.zoom,
            self.camera.margin,
            viewport_size,
            self.camera.world_size,
        )
    }

    fn validate(&self) -> Result<(), LevelError> {
        finite_vec("gravity", self.gravity)?;
        finite_vec("player.pos", self.player.pos)?;
        positive("player.radius", self.player.radius)?;
        positive("player.mass", self.player.mass)?;
        finite("player.move_impulse", self.player.move_impulse)?;
        finite("player.jump_impulse", self.player.jump_impulse)?;
        unit_interval("player.jump_sound_vol", self.player.jump_sound_vol)?;
        unit_interval("player.bounce_sound_vol", self.player.bounce_sound_vol)?;

        for (index, object) in self.objects.iter().enumerate() {
            let at = |field: &str| format!("objects[{index}].{field}");
            match object {
                ObjectDesc::Rectangle {
                    pos,
                    width,
                    height,
                    mass,
                    ..
                } => {
                    finite_vec(&at("pos"), *pos)?;
                    positive(&at("width"), *width)?;
                    positive(&at("height"), *height)?;
                    positive(&at("mass"), *mass)?;
                }
                ObjectDesc::Circle {
                    pos, radius, mass, ..
                } => {
                    finite_vec(&at("pos"), *pos)?;
                    positive(&at("radius"), *radius)?;
                    positive(&at("mass"), *mass)?;
                }
                ObjectDesc::Boundary { points, width, .. } => {
                    finite_vec(&at("points[0]"), points[0])?;
                    finite_vec(&at("points[1]"), points[1])?;
                    positive(&at("width"), *width)?;
                }
            }
        }
        Ok(())
    }
}

fn invalid(path: &str, message: impl Into<String>) -> LevelError {
    LevelError::Invalid {
        path: path.to_string(),
        message: message.into(),
    }
}

fn finite(path: &str, value: f32) -> Result<(), LevelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(path, format!("expected finite number, got {value}")))
    }
}

fn finite_vec(path: &str, value: Vec2) -> Result<(), LevelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(path, format!("expected finite vector, got {value:?}")))
    }
}

fn positive(path: &str, value: f32) -> Result<(), LevelError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(path, format!("expected positive number, got {value}")))
    }
}

fn unit_interval(path: &str, value: f32) -> Result<(), LevelError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(path, format!("expected value in [0, 1], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL: &str = r#"{
        "camera": { "world_size": [2000, 480], "margin": 100 },
        "player": { "pos": { "x": 100, "y": 200 } }
    }"#;

    #[test]
    fn minimal_level_fills_defaults() {
        let level = parse_level(MINIMAL).expect("level");

        assert_eq!(level.camera.pos, Vec2::ZERO);
        assert_eq!(level.camera.zoom, 1.0);
        assert_eq!(level.gravity, Vec2::new(0.0, -900.0));
        assert_eq!(level.player.radius, 20.0);
        assert_eq!(level.player.move_impulse, 20.0);
        assert_eq!(level.player.jump_impulse, 500.0);
        assert!(level.objects.is_empty());
    }

    #[test]
    fn objects_are_tagged_by_kind() {
        let raw = r#"{
            "camera": { "world_size": [2000, 480], "margin": 100 },
            "player": { "pos": { "x": 100, "y": 200 } },
            "objects": [
                { "kind": "rectangle", "pos": { "x": 300, "y": 40 }, "width": 50, "height": 30, "color": [200, 40, 40] },
                { "kind": "circle", "pos": { "x": 500, "y": 60 }, "radius": 15, "mass": 2.5 },
                { "kind": "boundary", "points": [{ "x": 0, "y": 0 }, { "x": 2000, "y": 0 }] }
            ]
        }"#;

        let level = parse_level(raw).expect("level");

        assert_eq!(level.objects.len(), 3);
        assert!(matches!(
            level.objects[0],
            ObjectDesc::Rectangle { width, color: [200, 40, 40], .. } if width == 50.0
        ));
        assert!(matches!(level.objects[1], ObjectDesc::Circle { mass, .. } if mass == 2.5));
        assert!(matches!(
            level.objects[2],
            ObjectDesc::Boundary { width, elasticity, .. } if width == 5.0 && elasticity == 0.8
        ));
    }

    #[test]
    fn parse_errors_report_json_path() {
        let raw = r#"{
            "camera": { "world_size": [2000, 480], "margin": "wide" },
            "player": { "pos": { "x": 100, "y": 200 } }
        }"#;

        let err = parse_level(raw).expect_err("bad margin");
        match err {
            LevelError::Parse { path, .. } => assert_eq!(path, "camera.margin"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_object_kind_is_rejected() {
        let raw = r#"{
            "camera": { "world_size": [2000, 480], "margin": 100 },
            "player": { "pos": { "x": 100, "y": 200 } },
            "objects": [{ "kind": "triangle", "pos": { "x": 0, "y": 0 } }]
        }"#;

        let err = parse_level(raw).expect_err("unknown kind");
        match err {
            LevelError::Parse { path, .. } => assert!(path.starts_with("objects[0]"), "{path}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn misspelt_object_field_is_rejected() {
        let raw = r#"{
            "camera": { "world_size": [2000, 480], "margin": 100 },
            "player": { "pos": { "x": 100, "y": 200 } },
            "objects": [{ "kind": "circle", "pos": { "x": 0, "y": 0 }, "radius": 3, "elastcity": 0.2 }]
        }"#;

        let err = parse_level(raw).expect_err("misspelt field");
        match err {
            LevelError::Parse { path, source } => {
                assert!(path.starts_with("objects[0]"), "{path}");
                assert!(source.to_string().contains("elastcity"), "{source}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validation_errors_name_the_field() {
        let raw = r#"{
            "camera": { "world_size": [2000, 480], "margin": 100 },
            "player": { "pos": { "x": 100, "y": 200 } },
            "objects": [{ "kind": "circle", "pos": { "x": 0, "y": 0 }, "radius": -3 }]
        }"#;

        let err = parse_level(raw).expect_err("negative radius");
        assert_eq!(
            err.to_string(),
            "validation failed at objects[0].radius: expected positive number, got -3"
        );
    }

    #[test]
    fn camera_config_is_checked_against_viewport() {
        let level = parse_level(MINIMAL).expect("level");
        assert!(level.build_camera((600, 480)).is_ok());
        assert!(matches!(
            level.build_camera((2400, 480)),
            Err(CameraError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_level_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = level_path(dir.path(), "level_test");
        let mut file = fs::File::create(&path).expect("create");
        file.write_all(MINIMAL.as_bytes()).expect("write");

        let level = load_level(&path).expect("load");
        assert_eq!(level.camera.world_size, (2000, 480));
    }

    #[test]
    fn missing_level_file_reports_its_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = level_path(dir.path(), "absent");

        let err = load_level(&path).expect_err("missing");
        assert!(matches!(err, LevelError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }
}
