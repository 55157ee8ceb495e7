mod audio;
mod player;
mod props;
mod scene;

pub(crate) use scene::PlatformerScene;
