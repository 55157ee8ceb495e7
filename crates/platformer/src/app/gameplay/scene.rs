use std::path::PathBuf;

use engine::{
    platformer_dispatcher, Camera, CollisionDispatcher, EntityId, InputSnapshot, PhysicsWorld,
    Raster, Scene, SceneCommand, Screen, Vec2,
};
use tracing::{error, info, trace, warn};

use super::audio;
use super::player::Player;
use super::props::{object_parts, player_parts, Prop};
use crate::app::level::{load_level, rgba, LevelDesc, LevelError};

/// Everything that lives for one run of a level. Rebuilt from the
/// description on every load.
pub(crate) struct LevelState {
    pub(crate) physics: PhysicsWorld,
    pub(crate) camera: Camera,
    pub(crate) background: Raster,
    pub(crate) player: Player,
    /// Paint order: objects in description order, then the player.
    pub(crate) props: Vec<Prop>,
    dispatcher: CollisionDispatcher<Player>,
    ticks_run: u64,
}

impl LevelState {
    pub(crate) fn build(desc: &LevelDesc, viewport_size: (u32, u32)) -> Result<Self, LevelError> {
        let camera = desc.build_camera(viewport_size)?;
        let (world_width, world_height) = desc.camera.world_size;
        let background = Raster::solid(world_width, world_height, rgba(desc.background.color));

        let mut physics = PhysicsWorld::new(desc.gravity);
        let mut props = Vec::with_capacity(desc.objects.len() + 1);
        let mut next_id = 0u64;
        let mut allocate = || {
            next_id += 1;
            EntityId(next_id)
        };

        for object in &desc.objects {
            let owner = allocate();
            let (body, prop) = object_parts(owner, object);
            physics.add_body(owner, &body)?;
            props.extend(prop);
        }

        let player_id = allocate();
        let (player_body, player_prop) = player_parts(player_id, &desc.player);
        physics.add_body(player_id, &player_body)?;
        props.push(player_prop);

        Ok(Self {
            physics,
            camera,
            background,
            player: Player::new(player_id, &desc.player),
            props,
            dispatcher: platformer_dispatcher::<Player>(),
            ticks_run: 0,
        })
    }

    /// One fixed tick: player input, physics with contact responses, then
    /// sprite positions and queued sounds.
    pub(crate) fn tick(&mut self, dt: f32, input: &InputSnapshot) -> Result<(), LevelError> {
        self.player.apply_input(input, &mut self.physics)?;
        let summary = self.physics.step(dt, &self.dispatcher, &mut self.player);
        self.player.finish_step();
        self.ticks_run += 1;
        if summary.contacts > 0 {
            trace!(
                tick = self.ticks_run,
                contacts = summary.contacts,
                dispatched = summary.dispatched,
                "contacts_dispatched"
            );
        }

        for prop in &mut self.props {
            let owner = prop.owner();
            if let (Some(position), Some(angle)) =
                (self.physics.position(owner), self.physics.angle(owner))
            {
                prop.set_pose(position, angle);
            }
        }
        audio::play_all(self.player.sounds_mut());
        Ok(())
    }

    pub(crate) fn player_position(&self) -> Vec2 {
        self.physics
            .position(self.player.id())
            .unwrap_or(Vec2::ZERO)
    }

    pub(crate) fn render(&mut self, screen: &mut dyn Screen) {
        let target = self.player_position();
        self.camera
            .update(target, &self.props, &self.background, screen);
    }
}

/// The running game. Holds the last description that built successfully so
/// a reload whose file no longer parses falls back to it.
pub(crate) struct PlatformerScene {
    level_name: String,
    level_path: Option<PathBuf>,
    desc: LevelDesc,
    viewport_size: (u32, u32),
    state: Option<LevelState>,
}

impl PlatformerScene {
    /// Builds the level once up front so invalid descriptions fail at startup.
    pub(crate) fn new(
        level_name: impl Into<String>,
        level_path: Option<PathBuf>,
        desc: LevelDesc,
        viewport_size: (u32, u32),
    ) -> Result<Self, LevelError> {
        let state = LevelState::build(&desc, viewport_size)?;
        Ok(Self {
            level_name: level_name.into(),
            level_path,
            desc,
            viewport_size,
            state: Some(state),
        })
    }

    pub(crate) fn state(&self) -> Option<&LevelState> {
        self.state.as_ref()
    }

    fn refresh_description(&mut self) {
        let Some(path) = &self.level_path else {
            return;
        };
        let refreshed = load_level(path).and_then(|desc| {
            LevelState::build(&desc, self.viewport_size).map(|state| (desc, state))
        });
        match refreshed {
            Ok((desc, state)) => {
                self.desc = desc;
                self.state = Some(state);
            }
            Err(error) => {
                warn!(
                    level = %self.level_name,
                    error = %error,
                    "level_reload_failed_keeping_previous"
                );
            }
        }
    }
}

impl Scene for PlatformerScene {
    fn load(&mut self) {
        if self.state.is_none() {
            self.refresh_description();
        }
        if self.state.is_none() {
            match LevelState::build(&self.desc, self.viewport_size) {
                Ok(state) => self.state = Some(state),
                Err(error) => {
                    error!(level = %self.level_name, error = %error, "level_build_failed");
                    return;
                }
            }
        }
        if let Some(state) = &self.state {
            let scroll = state.camera.scroll_pos();
            info!(
                level = %self.level_name,
                body_count = state.physics.body_count(),
                scroll_x = scroll.x,
                scroll_y = scroll.y,
                zoom = state.camera.zoom(),
                "level_loaded"
            );
        }
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        if input.reload_pressed() {
            return SceneCommand::Reload;
        }
        let Some(state) = self.state.as_mut() else {
            return SceneCommand::None;
        };
        if let Err(error) = state.tick(fixed_dt_seconds, input) {
            error!(level = %self.level_name, error = %error, "tick_failed");
            return SceneCommand::Quit;
        }
        SceneCommand::None
    }

    fn render(&mut self, screen: &mut dyn Screen) {
        match self.state.as_mut() {
            Some(state) => state.render(screen),
            None => screen.present(),
        }
    }

    fn unload(&mut self) {
        if self.state.take().is_some() {
            info!(level = %self.level_name, "level_unloaded");
        }
    }

    fn debug_title(&self) -> Option<String> {
        let state = self.state.as_ref()?;
        let airborne = if state.player.is_airborne() {
            "airborne"
        } else {
            "grounded"
        };
        Some(format!("Hopper - {} [{airborne}]", self.level_name))
    }
}
