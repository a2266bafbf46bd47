use std::{cell::Cell, rc::Rc};

use base64::Engine;
use leptos::logging;
use platform_host::{
    AudioPlayback, Clock, PlaybackRequest, ToneSpec, ToneSynth, UploadedFile, Waveform,
};

use super::{
    clamp_unit, default_sound_source, CustomSoundMeta, SoundCue, SoundEvent, SoundState,
    CLICK_FEEDBACK_MULTIPLIER,
};

/// Minimum spacing between two soft click cues.
pub const CLICK_DEBOUNCE_MS: u64 = 80;
const FALLBACK_FLOOR_GAIN: f64 = 0.0001;
const FALLBACK_GAIN_SCALE: f64 = 0.2;
const FALLBACK_ATTACK_MS: u32 = 10;
const FALLBACK_DURATION_MS: u32 = 140;
const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What the router ended up doing for one cue.
pub enum PlayOutcome {
    /// The resolved source started playing.
    Played,
    /// Playback failed and a synthesized tone was played instead.
    FallbackTone,
    /// Nothing audible happened (debounced, disabled, muted fallback, no synth).
    Silent,
}

/// Embeddable source and advisory metadata produced from an uploaded sound file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSoundUpload {
    pub source: String,
    pub meta: CustomSoundMeta,
}

/// Sine tone played when a source cannot be played.
pub fn fallback_tone(event: SoundEvent, volume: f64, volume_multiplier: f64) -> ToneSpec {
    let frequency_hz = match event {
        SoundEvent::Error => 180.0,
        SoundEvent::Notify => 620.0,
        _ => 420.0,
    };
    ToneSpec {
        waveform: Waveform::Sine,
        frequency_hz,
        floor_gain: FALLBACK_FLOOR_GAIN,
        peak_gain: clamp_unit(volume * volume_multiplier * FALLBACK_GAIN_SCALE)
            .max(FALLBACK_FLOOR_GAIN),
        attack_ms: FALLBACK_ATTACK_MS,
        duration_ms: FALLBACK_DURATION_MS,
    }
}

/// Resolves sound events to sources and drives the host audio capabilities.
///
/// The router keeps no copy of the sound configuration; every call reads the store's current
/// [`SoundState`]. Its only state is the click debounce timestamp.
pub struct SoundRouter {
    playback: Rc<dyn AudioPlayback>,
    synth: Rc<dyn ToneSynth>,
    clock: Rc<dyn Clock>,
    asset_base_path: String,
    last_click_at: Cell<Option<u64>>,
}

impl SoundRouter {
    pub fn new(
        playback: Rc<dyn AudioPlayback>,
        synth: Rc<dyn ToneSynth>,
        clock: Rc<dyn Clock>,
        asset_base_path: impl Into<String>,
    ) -> Self {
        Self {
            playback,
            synth,
            clock,
            asset_base_path: asset_base_path.into(),
            last_click_at: Cell::new(None),
        }
    }

    /// Per-event override if present, otherwise the pack default.
    pub fn resolve_source(&self, sound: &SoundState, event: SoundEvent) -> String {
        match sound.mappings.get(&event) {
            Some(source) if !source.trim().is_empty() => source.clone(),
            _ => default_sound_source(&self.asset_base_path, sound.pack_id, event),
        }
    }

    pub fn play(&self, sound: &SoundState, cue: SoundCue) -> PlayOutcome {
        let request = PlaybackRequest {
            source: self.resolve_source(sound, cue.event),
            volume: sound.effective_volume(cue.volume_multiplier),
        };
        match self.playback.play(&request) {
            Ok(()) => PlayOutcome::Played,
            Err(err) => {
                logging::warn!("sound `{}` failed to play: {err}", cue.event);
                self.play_fallback(sound, cue)
            }
        }
    }

    /// Entry point for failures the host only learns about after playback started.
    pub fn report_playback_failure(&self, sound: &SoundState, cue: SoundCue) -> PlayOutcome {
        self.play_fallback(sound, cue)
    }

    /// Soft click cue, skipped when disabled or within [`CLICK_DEBOUNCE_MS`] of the last one.
    pub fn play_click_feedback(&self, sound: &SoundState) -> PlayOutcome {
        if !sound.click_soft_enabled {
            return PlayOutcome::Silent;
        }
        let now = self.clock.now_ms();
        if let Some(last) = self.last_click_at.get() {
            if now.saturating_sub(last) < CLICK_DEBOUNCE_MS {
                return PlayOutcome::Silent;
            }
        }
        self.last_click_at.set(Some(now));
        self.play(
            sound,
            SoundCue::scaled(SoundEvent::ClickSoft, CLICK_FEEDBACK_MULTIPLIER),
        )
    }

    /// Asks the transport to warm every default source of the current pack.
    pub fn preload(&self, sound: &SoundState) {
        let sources = SoundEvent::ALL
            .into_iter()
            .map(|event| default_sound_source(&self.asset_base_path, sound.pack_id, event))
            .collect::<Vec<_>>();
        self.playback.preload(&sources);
    }

    /// Reads `file` into a `data:` reference. `None` when no file was picked or it cannot be read.
    pub async fn create_custom_sound(
        &self,
        file: Option<&dyn UploadedFile>,
    ) -> Option<CustomSoundUpload> {
        let file = file?;
        let bytes = match file.read_bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                logging::warn!("could not read uploaded sound `{}`: {err}", file.name());
                return None;
            }
        };
        let mime_type = if file.mime_type().is_empty() {
            UNKNOWN_MIME_TYPE
        } else {
            file.mime_type()
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Some(CustomSoundUpload {
            source: format!("data:{mime_type};base64,{encoded}"),
            meta: CustomSoundMeta {
                name: file.name().to_string(),
                mime_type: file.mime_type().to_string(),
                byte_size: file.byte_size(),
                updated_at: self.clock.now_ms(),
            },
        })
    }

    fn play_fallback(&self, sound: &SoundState, cue: SoundCue) -> PlayOutcome {
        if sound.muted {
            return PlayOutcome::Silent;
        }
        let tone = fallback_tone(cue.event, sound.volume, cue.volume_multiplier);
        match self.synth.play_tone(&tone) {
            Ok(()) => PlayOutcome::FallbackTone,
            Err(err) => {
                logging::warn!("fallback tone unavailable: {err}");
                PlayOutcome::Silent
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::{ManualClock, MemoryUploadedFile, RecordingAudio};
    use pretty_assertions::assert_eq;

    use super::*;

    fn router(audio: &RecordingAudio, clock: &ManualClock) -> SoundRouter {
        SoundRouter::new(
            Rc::new(audio.clone()),
            Rc::new(audio.clone()),
            Rc::new(clock.clone()),
            "",
        )
    }

    #[test]
    fn override_wins_over_pack_default() {
        let audio = RecordingAudio::default();
        let router = router(&audio, &ManualClock::default());
        let mut sound = SoundState::default();
        sound
            .mappings
            .insert(SoundEvent::Notify, "data:audio/wav;base64,AAAA".to_string());

        assert_eq!(
            router.play(&sound, SoundCue::new(SoundEvent::Notify)),
            PlayOutcome::Played
        );
        router.play(&sound, SoundCue::scaled(SoundEvent::Boot, 0.5));

        let played = audio.played();
        assert_eq!(played[0].source, "data:audio/wav;base64,AAAA");
        assert_eq!(played[1].source, "/sounds/purple/boot-purple.wav");
        assert!((played[1].volume - 0.36).abs() < 1e-12);
    }

    #[test]
    fn failed_playback_synthesizes_event_class_tone() {
        let audio = RecordingAudio::default();
        audio.fail_all_playback();
        let router = router(&audio, &ManualClock::default());
        let sound = SoundState::default();

        for event in [SoundEvent::Error, SoundEvent::Notify, SoundEvent::Lock] {
            assert_eq!(
                router.play(&sound, SoundCue::new(event)),
                PlayOutcome::FallbackTone
            );
        }
        let frequencies = audio
            .tones()
            .iter()
            .map(|tone| tone.frequency_hz)
            .collect::<Vec<_>>();
        assert_eq!(frequencies, vec![180.0, 620.0, 420.0]);
        assert!((audio.tones()[0].peak_gain - 0.144).abs() < 1e-12);
        assert_eq!(audio.tones()[0].duration_ms, 140);
    }

    #[test]
    fn muted_failure_stays_silent() {
        let audio = RecordingAudio::default();
        audio.fail_all_playback();
        let router = router(&audio, &ManualClock::default());
        let mut sound = SoundState::default();
        sound.muted = true;

        assert_eq!(
            router.play(&sound, SoundCue::new(SoundEvent::Error)),
            PlayOutcome::Silent
        );
        assert!(audio.tones().is_empty());
    }

    #[test]
    fn fallback_peak_never_drops_below_floor() {
        let tone = fallback_tone(SoundEvent::Boot, 0.0, 1.0);
        assert_eq!(tone.peak_gain, 0.0001);
    }

    #[test]
    fn late_failures_use_the_same_fallback() {
        let audio = RecordingAudio::default();
        let router = router(&audio, &ManualClock::default());
        let outcome =
            router.report_playback_failure(&SoundState::default(), SoundCue::new(SoundEvent::Notify));
        assert_eq!(outcome, PlayOutcome::FallbackTone);
        assert_eq!(audio.tones()[0].frequency_hz, 620.0);
    }

    #[test]
    fn click_feedback_is_debounced_and_scaled() {
        let audio = RecordingAudio::default();
        let clock = ManualClock::starting_at(1_000);
        let router = router(&audio, &clock);
        let sound = SoundState::default();

        assert_eq!(router.play_click_feedback(&sound), PlayOutcome::Played);
        clock.advance(79);
        assert_eq!(router.play_click_feedback(&sound), PlayOutcome::Silent);
        clock.advance(1);
        assert_eq!(router.play_click_feedback(&sound), PlayOutcome::Played);

        let played = audio.played();
        assert_eq!(played.len(), 2);
        assert!((played[0].volume - 0.72 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn disabled_click_feedback_never_plays() {
        let audio = RecordingAudio::default();
        let router = router(&audio, &ManualClock::default());
        let mut sound = SoundState::default();
        sound.click_soft_enabled = false;
        assert_eq!(router.play_click_feedback(&sound), PlayOutcome::Silent);
        assert!(audio.played().is_empty());
    }

    #[test]
    fn preload_warms_every_pack_source() {
        let audio = RecordingAudio::default();
        let router = router(&audio, &ManualClock::default());
        let mut sound = SoundState::default();
        sound.pack_id = crate::sound::SoundPackId::Classic;
        router.preload(&sound);
        let preloaded = audio.preloaded();
        assert_eq!(preloaded.len(), SoundEvent::ALL.len());
        assert_eq!(preloaded[0], "/sounds/classic/boot-classic.wav");
    }

    #[test]
    fn custom_sound_becomes_data_reference() {
        let audio = RecordingAudio::default();
        let clock = ManualClock::starting_at(42);
        let router = router(&audio, &clock);
        let file = MemoryUploadedFile::new("chime.wav", "audio/wav", b"RIFF".to_vec());

        let upload = block_on(router.create_custom_sound(Some(&file))).expect("upload");
        assert_eq!(upload.source, "data:audio/wav;base64,UklGRg==");
        assert_eq!(
            upload.meta,
            CustomSoundMeta {
                name: "chime.wav".to_string(),
                mime_type: "audio/wav".to_string(),
                byte_size: 4,
                updated_at: 42,
            }
        );
    }

    #[test]
    fn missing_or_unreadable_upload_yields_none() {
        let audio = RecordingAudio::default();
        let router = router(&audio, &ManualClock::default());
        assert_eq!(block_on(router.create_custom_sound(None)), None);
        let broken = MemoryUploadedFile::unreadable("x.wav", "boom");
        assert_eq!(block_on(router.create_custom_sound(Some(&broken))), None);
    }
}
