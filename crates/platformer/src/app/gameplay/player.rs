use engine::{
    ContactSink, EntityId, InputSnapshot, PhysicsError, PhysicsWorld, PlayerContact, PlayerState,
    Vec2,
};

use super::audio::{SoundEffect, SoundRequest};
use crate::app::level::PlayerDesc;

#[derive(Debug)]
pub(crate) struct Player {
    id: EntityId,
    state: PlayerState,
    move_impulse: f32,
    jump_impulse: f32,
    jump_sound_vol: f32,
    bounce_sound_vol: f32,
    /// Set by a jump and cleared once that tick's physics step is done, so
    /// the contact the player is leaving cannot ground it again.
    jumped_this_step: bool,
    sounds: Vec<SoundRequest>,
}

impl Player {
    /// Players spawn airborne; the first contact with the ground lands them.
    pub(crate) fn new(id: EntityId, desc: &PlayerDesc) -> Self {
        Self {
            id,
            state: PlayerState { is_airborne: true },
            move_impulse: desc.move_impulse,
            jump_impulse: desc.jump_impulse,
            jump_sound_vol: desc.jump_sound_vol,
            bounce_sound_vol: desc.bounce_sound_vol,
            jumped_this_step: false,
            sounds: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn is_airborne(&self) -> bool {
        self.state.is_airborne
    }

    /// Applies this tick's movement and, on a fresh press while grounded, a jump.
    pub(crate) fn apply_input(
        &mut self,
        input: &InputSnapshot,
        physics: &mut PhysicsWorld,
    ) -> Result<(), PhysicsError> {
        let direction = input.horizontal_direction();
        if direction != 0.0 {
            physics.apply_impulse(self.id, Vec2::new(direction * self.move_impulse, 0.0))?;
        }
        if input.jump_pressed() {
            self.jump(physics)?;
        }
        Ok(())
    }

    fn jump(&mut self, physics: &mut PhysicsWorld) -> Result<(), PhysicsError> {
        if self.state.is_airborne {
            return Ok(());
        }
        self.sounds.push(SoundRequest {
            effect: SoundEffect::Jump,
            volume: self.jump_sound_vol,
        });
        physics.apply_impulse(self.id, Vec2::new(0.0, self.jump_impulse))?;
        self.state.is_airborne = true;
        self.jumped_this_step = true;
        Ok(())
    }

    /// Call after every physics step.
    pub(crate) fn finish_step(&mut self) {
        self.jumped_this_step = false;
    }

    pub(crate) fn sounds_mut(&mut self) -> &mut Vec<SoundRequest> {
        &mut self.sounds
    }
}

impl PlayerContact for Player {
    fn set_airborne(&mut self, airborne: bool) {
        if !airborne && self.jumped_this_step {
            return;
        }
        self.state.is_airborne = airborne;
    }

    fn play_bounce(&mut self, volume: f32) {
        self.sounds.push(SoundRequest {
            effect: SoundEffect::Bounce,
            volume: volume * self.bounce_sound_vol,
        });
    }
}

impl ContactSink for Player {
    fn player_mut(&mut self, owner: EntityId) -> Option<&mut dyn PlayerContact> {
        if owner == self.id {
            Some(self)
        } else {
            None
        }
    }
}
