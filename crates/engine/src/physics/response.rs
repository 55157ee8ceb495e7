use tracing::trace;

use super::collision::{CollisionCategory, CollisionDispatcher, CollisionEvent, EntityId};

/// Contact impulse at which the bounce effect plays at full volume.
pub const BOUNCE_IMPULSE_FOR_FULL_VOLUME: f32 = 1000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub is_airborne: bool,
}

/// What a contact response may do to a player.
pub trait PlayerContact {
    fn set_airborne(&mut self, airborne: bool);
    /// `volume` is in `[0, 1]`. Fire-and-forget.
    fn play_bounce(&mut self, volume: f32);
}

/// Resolves contact owners back to gameplay objects.
pub trait ContactSink {
    fn player_mut(&mut self, owner: EntityId) -> Option<&mut dyn PlayerContact>;
}

pub fn bounce_volume(impulse_magnitude: f32) -> f32 {
    if impulse_magnitude.is_nan() {
        return 0.0;
    }
    (impulse_magnitude.abs() / BOUNCE_IMPULSE_FOR_FULL_VOLUME).clamp(0.0, 1.0)
}

/// Player touching anything solid: grounded again, and a bounce sound on
/// the first contact scaled by how hard it hit.
pub fn respond_to_player_contact<S: ContactSink + ?Sized>(event: &CollisionEvent, sink: &mut S) {
    let Some(body) = event.body_with_category(CollisionCategory::Player) else {
        return;
    };
    let Some(player) = sink.player_mut(body.owner) else {
        trace!(owner = body.owner.0, "contact_owner_unknown");
        return;
    };

    player.set_airborne(false);
    if event.is_first_contact {
        player.play_bounce(bounce_volume(event.impulse_magnitude()));
    }
}

/// Moving props resting on or hitting static geometry need no gameplay
/// response; registered so the pair is handled explicitly.
pub fn moving_static_contact<S: ?Sized>(_event: &CollisionEvent, _sink: &mut S) {}

pub fn platformer_dispatcher<S: ContactSink + ?Sized>() -> CollisionDispatcher<S> {
    let mut dispatcher = CollisionDispatcher::new();
    dispatcher.register(
        CollisionCategory::Player,
        CollisionCategory::Static,
        respond_to_player_contact::<S>,
    );
    dispatcher.register(
        CollisionCategory::Player,
        CollisionCategory::Moving,
        respond_to_player_contact::<S>,
    );
    dispatcher.register(
        CollisionCategory::Static,
        CollisionCategory::Moving,
        moving_static_contact::<S>,
    );
    dispatcher
}
