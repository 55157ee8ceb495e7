mod collision;
mod response;
mod world;

pub use collision::{CollisionCategory, CollisionDispatcher, CollisionEvent, ContactBody, EntityId};
pub use response::{
    bounce_volume, moving_static_contact, platformer_dispatcher, respond_to_player_contact,
    ContactSink, PlayerContact, PlayerState, BOUNCE_IMPULSE_FOR_FULL_VOLUME,
};
pub use world::{BodyDesc, BodyShape, PhysicsError, PhysicsWorld, StepSummary};
