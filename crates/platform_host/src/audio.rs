//! Audio playback and tone-synthesis capability contracts.
//!
//! File decoding and output devices are host concerns. The store only asks for a source to be
//! played at a volume, and for a synthesized tone when that fails.

use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

#[derive(Debug, Clone, PartialEq)]
/// A request to play one audio source.
pub struct PlaybackRequest {
    /// Source reference: an asset path or an embedded `data:` reference.
    pub source: String,
    /// Output volume in `[0, 1]`.
    pub volume: f64,
}

/// Host service that starts playback of file-based audio.
///
/// Starting is synchronous; a failure that only surfaces later (decode error, blocked autoplay)
/// is reported back to the store's sound router by the host.
pub trait AudioPlayback {
    /// Starts playing `request`. Returns an error when playback cannot start.
    fn play(&self, request: &PlaybackRequest) -> Result<(), String>;

    /// Warms the given sources so the first play does not stall.
    fn preload(&self, sources: &[String]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Oscillator shape for synthesized tones.
pub enum Waveform {
    /// Pure sine wave.
    Sine,
}

#[derive(Debug, Clone, PartialEq)]
/// A short synthesized tone with an exponential attack/release envelope.
pub struct ToneSpec {
    /// Oscillator shape.
    pub waveform: Waveform,
    /// Oscillator frequency.
    pub frequency_hz: f64,
    /// Gain at the start and end of the envelope. Must be positive for exponential ramps.
    pub floor_gain: f64,
    /// Gain reached at the end of the attack.
    pub peak_gain: f64,
    /// Attack length in milliseconds.
    pub attack_ms: u32,
    /// Total tone length in milliseconds.
    pub duration_ms: u32,
}

impl ToneSpec {
    /// Envelope gain at `t_ms` after the tone starts.
    pub fn gain_at(&self, t_ms: f64) -> f64 {
        let attack = f64::from(self.attack_ms);
        let duration = f64::from(self.duration_ms);
        if t_ms <= 0.0 || t_ms >= duration {
            return self.floor_gain;
        }
        if t_ms <= attack {
            exponential_ramp(self.floor_gain, self.peak_gain, t_ms / attack)
        } else {
            exponential_ramp(
                self.peak_gain,
                self.floor_gain,
                (t_ms - attack) / (duration - attack),
            )
        }
    }
}

fn exponential_ramp(from: f64, to: f64, progress: f64) -> f64 {
    from * (to / from).powf(progress.clamp(0.0, 1.0))
}

/// Host service that synthesizes tones (a Web Audio oscillator, a native synth, a recorder).
pub trait ToneSynth {
    /// Plays `tone`. Returns an error when no synthesis backend is available.
    fn play_tone(&self, tone: &ToneSpec) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Silent audio backend for targets without sound output.
pub struct NoopAudio;

impl AudioPlayback for NoopAudio {
    fn play(&self, _request: &PlaybackRequest) -> Result<(), String> {
        Ok(())
    }

    fn preload(&self, _sources: &[String]) {}
}

impl ToneSynth for NoopAudio {
    fn play_tone(&self, _tone: &ToneSpec) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingAudioInner {
    played: Vec<PlaybackRequest>,
    tones: Vec<ToneSpec>,
    preloaded: Vec<String>,
    broken_sources: BTreeSet<String>,
    fail_all: bool,
}

#[derive(Debug, Clone, Default)]
/// Audio backend that records every request. Clones share the same log.
///
/// Sources can be marked broken to exercise the fallback-tone path.
pub struct RecordingAudio {
    inner: Rc<RefCell<RecordingAudioInner>>,
}

impl RecordingAudio {
    /// Makes every playback attempt fail.
    pub fn fail_all_playback(&self) {
        self.inner.borrow_mut().fail_all = true;
    }

    /// Makes playback of `source` fail.
    pub fn break_source(&self, source: impl Into<String>) {
        self.inner.borrow_mut().broken_sources.insert(source.into());
    }

    /// Successfully started playback requests, oldest first.
    pub fn played(&self) -> Vec<PlaybackRequest> {
        self.inner.borrow().played.clone()
    }

    /// Synthesized tones, oldest first.
    pub fn tones(&self) -> Vec<ToneSpec> {
        self.inner.borrow().tones.clone()
    }

    /// Sources passed to [`AudioPlayback::preload`].
    pub fn preloaded(&self) -> Vec<String> {
        self.inner.borrow().preloaded.clone()
    }

    /// Forgets everything recorded so far. Broken sources stay broken.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.played.clear();
        inner.tones.clear();
        inner.preloaded.clear();
    }
}

impl AudioPlayback for RecordingAudio {
    fn play(&self, request: &PlaybackRequest) -> Result<(), String> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_all || inner.broken_sources.contains(&request.source) {
            return Err(format!("could not play `{}`", request.source));
        }
        inner.played.push(request.clone());
        Ok(())
    }

    fn preload(&self, sources: &[String]) {
        self.inner
            .borrow_mut()
            .preloaded
            .extend(sources.iter().cloned());
    }
}

impl ToneSynth for RecordingAudio {
    fn play_tone(&self, tone: &ToneSpec) -> Result<(), String> {
        self.inner.borrow_mut().tones.push(tone.clone());
        Ok(())
    }
}
