//! Reducer helpers for settings and sound preference transitions.

use leptos::logging;

use crate::{
    codec,
    model::{DesktopState, NotificationLevel, NotificationRecord},
    notifications,
    reducer::{DesktopAction, ReducerError, RuntimeEffect},
    sound::{clamp_unit, SoundState},
    wallpaper,
};

const SOUND_IMPORT_TITLE: &str = "Sounds";

pub(super) fn reduce_preferences_action(
    state: &mut DesktopState,
    action: &DesktopAction,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<bool, ReducerError> {
    match action {
        DesktopAction::SetAccent { accent } => {
            let accent = accent.trim();
            if accent.is_empty() {
                return Ok(true);
            }
            state.settings.accent = accent.to_string();
        }
        DesktopAction::SetWallpaper { wallpaper_id } => {
            state.settings.wallpaper = wallpaper::wallpaper(wallpaper_id).id.to_string();
        }
        DesktopAction::SetReducedMotion { enabled } => {
            state.settings.reduce_motion = *enabled;
        }
        DesktopAction::SetShowCreditLine { enabled } => {
            state.settings.show_credit_line = *enabled;
        }
        DesktopAction::SetVolume { volume } => {
            state.sound.volume = clamp_unit(*volume);
        }
        DesktopAction::ToggleMute => {
            state.sound.muted = !state.sound.muted;
        }
        DesktopAction::SetPack { pack_id } => {
            state.sound.pack_id = *pack_id;
        }
        DesktopAction::SetMapping {
            event,
            source,
            meta,
        } => match source.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(source) => {
                state.sound.mappings.insert(*event, source.to_string());
                if let Some(meta) = meta {
                    state.sound.custom_files_meta.insert(*event, meta.clone());
                }
            }
            None => {
                state.sound.mappings.remove(event);
                state.sound.custom_files_meta.remove(event);
            }
        },
        DesktopAction::ApplyCustomSound { event, upload } => {
            let upload = upload
                .as_ref()
                .ok_or(ReducerError::CustomSoundRejected(event.label()))?;
            state.sound.mappings.insert(*event, upload.source.clone());
            state
                .sound
                .custom_files_meta
                .insert(*event, upload.meta.clone());
        }
        DesktopAction::ResetSounds => {
            state.sound = SoundState {
                volume: state.sound.volume,
                ..SoundState::default()
            };
        }
        DesktopAction::SetClickSoftEnabled { enabled } => {
            state.sound.click_soft_enabled = *enabled;
        }
        DesktopAction::ImportSoundConfig {
            payload,
            file_name,
            stamp,
        } => {
            let (sound, corrections) =
                codec::import_sound_config(&state.sound, payload, stamp.created_at_ms)
                    .ok_or(ReducerError::InvalidSoundConfig)?;
            for correction in &corrections {
                logging::log!("sound config `{file_name}` repaired {correction}");
            }
            state.sound = sound;
            let record = NotificationRecord::new(
                stamp.clone(),
                SOUND_IMPORT_TITLE,
                format!("Imported mapping from {file_name}."),
                NotificationLevel::Info,
            );
            let id = record.id.clone();
            notifications::push(state, record);
            effects.push(RuntimeEffect::ScheduleToastExpiry(id));
        }
        _ => return Ok(false),
    }

    effects.push(RuntimeEffect::PersistSnapshot);
    Ok(true)
}
