//! Sound events, packs, per-event overrides and the router that turns them into playback.

mod packs;
mod router;
mod sequence;

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use packs::{default_sound_source, normalize_base_path, sound_pack, SoundPack, SOUND_PACKS};
pub use router::{fallback_tone, CustomSoundUpload, PlayOutcome, SoundRouter, CLICK_DEBOUNCE_MS};
pub use sequence::SoundSequence;

pub const DEFAULT_VOLUME: f64 = 0.72;
/// Multiplier applied to the soft click cue.
pub const CLICK_FEEDBACK_MULTIPLIER: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundEvent {
    Boot,
    Login,
    Lock,
    Unlock,
    OpenWindow,
    CloseWindow,
    Minimize,
    Maximize,
    Error,
    Notify,
    Recycle,
    ClickSoft,
}

impl SoundEvent {
    pub const ALL: [SoundEvent; 12] = [
        Self::Boot,
        Self::Login,
        Self::Lock,
        Self::Unlock,
        Self::OpenWindow,
        Self::CloseWindow,
        Self::Minimize,
        Self::Maximize,
        Self::Error,
        Self::Notify,
        Self::Recycle,
        Self::ClickSoft,
    ];

    /// Key used in persisted maps and the sound-config document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Login => "login",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::OpenWindow => "openWindow",
            Self::CloseWindow => "closeWindow",
            Self::Minimize => "minimize",
            Self::Maximize => "maximize",
            Self::Error => "error",
            Self::Notify => "notify",
            Self::Recycle => "recycle",
            Self::ClickSoft => "clickSoft",
        }
    }

    /// File-name stem shared by every pack.
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::OpenWindow => "open-window",
            Self::CloseWindow => "close-window",
            Self::ClickSoft => "click-soft",
            other => other.as_str(),
        }
    }

    /// Human label shown by the soundboard.
    pub fn label(self) -> &'static str {
        match self {
            Self::Boot => "Boot",
            Self::Login => "Login",
            Self::Lock => "Lock",
            Self::Unlock => "Unlock",
            Self::OpenWindow => "Open Window",
            Self::CloseWindow => "Close Window",
            Self::Minimize => "Minimize",
            Self::Maximize => "Maximize",
            Self::Error => "Error",
            Self::Notify => "Notify",
            Self::Recycle => "Recycle",
            Self::ClickSoft => "Click Soft",
        }
    }
}

impl fmt::Display for SoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundEvent {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == value)
            .ok_or_else(|| value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundPackId {
    Classic,
    Aero,
    #[default]
    Purple,
}

impl SoundPackId {
    pub const ALL: [SoundPackId; 3] = [Self::Classic, Self::Aero, Self::Purple];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Aero => "aero",
            Self::Purple => "purple",
        }
    }
}

impl FromStr for SoundPackId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|pack| pack.as_str() == value)
            .ok_or_else(|| value.to_string())
    }
}

/// Advisory description of a user-supplied sound file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSoundMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(rename = "size")]
    pub byte_size: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundState {
    pub pack_id: SoundPackId,
    pub volume: f64,
    pub muted: bool,
    pub mappings: BTreeMap<SoundEvent, String>,
    pub custom_files_meta: BTreeMap<SoundEvent, CustomSoundMeta>,
    pub click_soft_enabled: bool,
}

impl Default for SoundState {
    fn default() -> Self {
        Self {
            pack_id: SoundPackId::Purple,
            volume: DEFAULT_VOLUME,
            muted: false,
            mappings: BTreeMap::new(),
            custom_files_meta: BTreeMap::new(),
            click_soft_enabled: true,
        }
    }
}

impl SoundState {
    /// Volume handed to the playback transport: zero while muted.
    pub fn effective_volume(&self, multiplier: f64) -> f64 {
        if self.muted {
            0.0
        } else {
            clamp_unit(self.volume * multiplier)
        }
    }
}

/// One request to play an event, as emitted by the reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundCue {
    pub event: SoundEvent,
    pub volume_multiplier: f64,
}

impl SoundCue {
    pub fn new(event: SoundEvent) -> Self {
        Self {
            event,
            volume_multiplier: 1.0,
        }
    }

    pub fn scaled(event: SoundEvent, volume_multiplier: f64) -> Self {
        Self {
            event,
            volume_multiplier,
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn event_keys_round_trip_through_serde_names() {
        for event in SoundEvent::ALL {
            let encoded = serde_json::to_value(event).expect("serialize");
            assert_eq!(encoded, serde_json::Value::String(event.as_str().into()));
            assert_eq!(event.as_str().parse::<SoundEvent>(), Ok(event));
        }
    }

    #[test]
    fn muted_volume_is_zero_and_unmuted_is_clamped() {
        let mut sound = SoundState::default();
        sound.volume = 0.9;
        assert_eq!(sound.effective_volume(2.0), 1.0);
        assert!((sound.effective_volume(0.5) - 0.45).abs() < 1e-12);
        sound.muted = true;
        assert_eq!(sound.effective_volume(1.0), 0.0);
    }

    #[test]
    fn meta_uses_document_field_names() {
        let meta = CustomSoundMeta {
            name: "chime.wav".to_string(),
            mime_type: "audio/wav".to_string(),
            byte_size: 12,
            updated_at: 5,
        };
        assert_eq!(
            serde_json::to_value(&meta).expect("serialize"),
            serde_json::json!({"name": "chime.wav", "type": "audio/wav", "size": 12, "updatedAt": 5})
        );
    }
}
