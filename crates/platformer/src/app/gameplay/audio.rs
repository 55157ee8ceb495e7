use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SoundEffect {
    Jump,
    Bounce,
}

impl SoundEffect {
    fn name(self) -> &'static str {
        match self {
            SoundEffect::Jump => "jump",
            SoundEffect::Bounce => "bounce",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SoundRequest {
    pub(crate) effect: SoundEffect,
    pub(crate) volume: f32,
}

/// Hands queued sound requests to the output. There is no mixer; each
/// request is logged and forgotten.
pub(crate) fn play_all(requests: &mut Vec<SoundRequest>) {
    for request in requests.drain(..) {
        info!(
            effect = request.effect.name(),
            volume = request.volume,
            "sound_requested"
        );
    }
}
