use engine::{BodyDesc, BodyShape, CollisionCategory, Drawable, EntityId, Raster, Vec2};

use crate::app::level::{rgba, ObjectDesc, PlayerDesc};

/// A visible body: its sprite follows the physics body after every step.
#[derive(Debug)]
pub(crate) struct Prop {
    owner: EntityId,
    position: Vec2,
    angle: f32,
    image: Raster,
}

impl Prop {
    pub(crate) fn owner(&self) -> EntityId {
        self.owner
    }

    pub(crate) fn set_pose(&mut self, position: Vec2, angle: f32) {
        self.position = position;
        self.angle = angle;
    }
}

impl Drawable for Prop {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn image(&self) -> Option<&Raster> {
        Some(&self.image)
    }

    fn angle(&self) -> f32 {
        self.angle
    }
}

/// Body and, for visible objects, the prop that draws it.
pub(crate) fn object_parts(owner: EntityId, object: &ObjectDesc) -> (BodyDesc, Option<Prop>) {
    match *object {
        ObjectDesc::Rectangle {
            pos,
            width,
            height,
            mass,
            color,
            friction,
            elasticity,
        } => {
            let body = BodyDesc {
                category: CollisionCategory::Moving,
                shape: BodyShape::Cuboid {
                    half_extents: Vec2::new(width / 2.0, height / 2.0),
                },
                position: pos,
                mass,
                friction,
                elasticity,
            };
            let image = Raster::solid(pixel_extent(width), pixel_extent(height), rgba(color));
            (body, Some(prop(owner, pos, image)))
        }
        ObjectDesc::Circle {
            pos,
            radius,
            mass,
            color,
            friction,
            elasticity,
        } => {
            let body = BodyDesc {
                category: CollisionCategory::Moving,
                shape: BodyShape::Ball { radius },
                position: pos,
                mass,
                friction,
                elasticity,
            };
            let image = Raster::filled_circle(pixel_extent(radius), rgba(color));
            (body, Some(prop(owner, pos, image)))
        }
        ObjectDesc::Boundary {
            points,
            width,
            friction,
            elasticity,
        } => {
            let body = BodyDesc {
                category: CollisionCategory::Static,
                shape: BodyShape::Segment {
                    a: points[0],
                    b: points[1],
                    radius: width,
                },
                position: Vec2::ZERO,
                mass: 0.0,
                friction,
                elasticity,
            };
            (body, None)
        }
    }
}

pub(crate) fn player_parts(owner: EntityId, desc: &PlayerDesc) -> (BodyDesc, Prop) {
    let body = BodyDesc {
        category: CollisionCategory::Player,
        shape: BodyShape::Ball {
            radius: desc.radius,
        },
        position: desc.pos,
        mass: desc.mass,
        friction: desc.friction,
        elasticity: desc.elasticity,
    };
    let image = Raster::filled_circle(pixel_extent(desc.radius), rgba(desc.color));
    (body, prop(owner, desc.pos, image))
}

fn prop(owner: EntityId, position: Vec2, image: Raster) -> Prop {
    Prop {
        owner,
        position,
        angle: 0.0,
        image,
    }
}

fn pixel_extent(world_units: f32) -> u32 {
    world_units.round().max(1.0) as u32
}
