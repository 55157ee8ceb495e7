use std::env;

use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::PlatformerScene;
use super::level::{level_path, load_level, LevelError};

pub(crate) const LEVEL_ENV_VAR: &str = "HOPPER_LEVEL";
pub(crate) const DEFAULT_LEVEL: &str = "level_1";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("level '{name}': {source}")]
    Level {
        name: String,
        #[source]
        source: LevelError,
    },
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    info!("=== Hopper Startup ===");

    let app_paths = resolve_app_paths()?;
    let level_name = select_level_name(env::args().nth(1), env::var(LEVEL_ENV_VAR).ok());
    let path = level_path(&app_paths.levels_dir, &level_name);
    info!(
        root = %app_paths.root.display(),
        level = %level_name,
        level_path = %path.display(),
        "startup"
    );

    let config = LoopConfig {
        window_title: format!("Hopper - {level_name}"),
        ..LoopConfig::default()
    };
    let viewport_size = (config.window_width, config.window_height);
    let level_error = |source| BootstrapError::Level {
        name: level_name.clone(),
        source,
    };
    let desc = load_level(&path).map_err(level_error)?;
    let scene = PlatformerScene::new(level_name.clone(), Some(path), desc, viewport_size)
        .map_err(level_error)?;

    Ok(AppWiring {
        config,
        scene: Box::new(scene),
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// First CLI argument, then the environment, then the default level.
fn select_level_name(cli_arg: Option<String>, env_value: Option<String>) -> String {
    [cli_arg, env_value]
        .into_iter()
        .flatten()
        .map(|raw| raw.trim().trim_end_matches(".json").to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}
