//! Host service bundle injected into the desktop store.
//!
//! The store reaches persistence, audio, tone synthesis and the clock only through this context,
//! so a browser build, a native shell and the test suite can each supply their own adapters.

use std::{cell::Cell, rc::Rc};

use platform_host::{
    AudioPlayback, Clock, KeyValueStore, NoopAudio, NoopKeyValueStore, SystemClock, ToneSynth,
};

use crate::{config::RuntimeConfig, sound::SoundRouter};

#[derive(Clone)]
/// Host service bundle for desktop store side effects.
pub struct DesktopHostContext {
    storage: Rc<dyn KeyValueStore>,
    playback: Rc<dyn AudioPlayback>,
    synth: Rc<dyn ToneSynth>,
    clock: Rc<dyn Clock>,
    config: RuntimeConfig,
    has_booted: Rc<Cell<bool>>,
}

impl Default for DesktopHostContext {
    fn default() -> Self {
        Self {
            storage: Rc::new(NoopKeyValueStore),
            playback: Rc::new(NoopAudio),
            synth: Rc::new(NoopAudio),
            clock: Rc::new(SystemClock),
            config: RuntimeConfig::from_build_env(),
            has_booted: Rc::new(Cell::new(false)),
        }
    }
}

impl DesktopHostContext {
    pub fn with_storage(mut self, storage: Rc<dyn KeyValueStore>) -> Self {
        self.storage = storage;
        self
    }

    /// Uses `playback` for sources and `synth` for fallback tones.
    pub fn with_audio(mut self, playback: Rc<dyn AudioPlayback>, synth: Rc<dyn ToneSynth>) -> Self {
        self.playback = playback;
        self.synth = synth;
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configured snapshot storage service.
    pub fn storage(&self) -> Rc<dyn KeyValueStore> {
        self.storage.clone()
    }

    /// Returns the configured clock.
    pub fn clock(&self) -> Rc<dyn Clock> {
        self.clock.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Builds a sound router over this context's audio services.
    pub fn sound_router(&self) -> SoundRouter {
        SoundRouter::new(
            self.playback.clone(),
            self.synth.clone(),
            self.clock.clone(),
            self.config.asset_base_path.clone(),
        )
    }

    /// Whether the boot chime already played for this host. Shared by every clone.
    pub fn has_booted(&self) -> bool {
        self.has_booted.get()
    }

    pub fn mark_booted(&self) {
        self.has_booted.set(true);
    }

    /// Lets the next boot play the chime again (tests, simulated power cycles).
    pub fn reset_boot_flag(&self) {
        self.has_booted.set(false);
    }
}

#[cfg(test)]
mod tests {
    use platform_host::RecordingAudio;

    use super::*;
    use crate::sound::{SoundCue, SoundEvent, SoundState};

    #[test]
    fn boot_flag_is_shared_between_clones() {
        let host = DesktopHostContext::default();
        let clone = host.clone();
        assert!(!clone.has_booted());
        host.mark_booted();
        assert!(clone.has_booted());
        clone.reset_boot_flag();
        assert!(!host.has_booted());
    }

    #[test]
    fn sound_router_uses_configured_base_path_and_audio() {
        let audio = RecordingAudio::default();
        let host = DesktopHostContext::default()
            .with_audio(Rc::new(audio.clone()), Rc::new(audio.clone()))
            .with_config(RuntimeConfig::default().with_asset_base_path("/os/"));
        host.sound_router()
            .play(&SoundState::default(), SoundCue::new(SoundEvent::Boot));
        let played = audio.played();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].source, "/os/sounds/purple/boot-purple.wav");
    }
}
