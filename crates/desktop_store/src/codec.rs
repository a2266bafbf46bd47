//! Sanitizes untrusted persisted JSON into a typed [`DesktopSnapshot`].
//!
//! Every field is validated on its own and healed with a default when it is missing or invalid.
//! Each healing step is recorded as a [`Correction`] so callers can see what was repaired.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    apps::app_definition,
    filesystem::initial_files,
    model::{
        AppId, DesktopLayoutPrefs, DesktopSettings, DesktopSnapshot, FileItem, FileKind,
        IconPosition, IconSizeTier, NotificationId, NotificationLevel, NotificationRecord,
        WindowId, WindowRecord, WindowRect,
    },
    notifications::{notification_id, MAX_HISTORY},
    sound::{clamp_unit, CustomSoundMeta, SoundEvent, SoundPackId, SoundState},
    window_manager::{normalize_window_stack, top_z, MAX_RECENT_APPS},
};

const RESTORED_WINDOW_X: i32 = 72;
const RESTORED_WINDOW_Y: i32 = 58;
const RESTORED_MIN_WIDTH: i32 = 320;
const RESTORED_MIN_HEIGHT: i32 = 220;
/// Restored coordinates and sizes are pulled into `-LIMIT..=LIMIT`.
const RESTORED_COORDINATE_LIMIT: i32 = 100_000;
/// Stored window ids at or above this are regenerated.
const MAX_RESTORED_WINDOW_ID: u64 = 1 << 32;
/// A stack whose top z-index exceeds this is re-ranked to `1..=n`.
const MAX_RESTORED_Z: u32 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionAction {
    /// Missing or invalid value replaced by its default.
    Defaulted,
    /// Out-of-range value pulled into range.
    Clamped,
    /// Entry removed.
    Dropped,
    /// Missing or conflicting id replaced by a fresh one.
    Regenerated,
    /// Collection replaced by its seed contents.
    Reseeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One repair applied while decoding, addressed by a JSON-ish path such as `windows[1].w`.
pub struct Correction {
    pub path: String,
    pub action: CorrectionAction,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.path, self.action)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSnapshot {
    pub snapshot: DesktopSnapshot,
    pub corrections: Vec<Correction>,
}

/// User-facing sound configuration document, as exported and imported by the soundboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundConfigDocument {
    pub pack_id: SoundPackId,
    pub volume: f64,
    pub muted: bool,
    pub click_soft_enabled: bool,
    pub mappings: BTreeMap<SoundEvent, String>,
    pub custom_files_meta: BTreeMap<SoundEvent, CustomSoundMeta>,
}

impl From<&SoundState> for SoundConfigDocument {
    fn from(sound: &SoundState) -> Self {
        Self {
            pack_id: sound.pack_id,
            volume: sound.volume,
            muted: sound.muted,
            click_soft_enabled: sound.click_soft_enabled,
            mappings: sound.mappings.clone(),
            custom_files_meta: sound.custom_files_meta.clone(),
        }
    }
}

struct Codec {
    now_ms: u64,
    generated: u64,
    corrections: Vec<Correction>,
}

impl Codec {
    fn new(now_ms: u64) -> Self {
        Self {
            now_ms,
            generated: 0,
            corrections: Vec::new(),
        }
    }

    fn note(&mut self, path: impl Into<String>, action: CorrectionAction) {
        self.corrections.push(Correction {
            path: path.into(),
            action,
        });
    }

    fn next_sequence(&mut self) -> u64 {
        self.generated += 1;
        self.generated
    }

    /// Reads `key`; a present-but-unusable value is noted as defaulted.
    fn field<T>(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        path: &str,
        read: impl FnOnce(&Value) -> Option<T>,
    ) -> Option<T> {
        let value = object.get(key)?;
        let parsed = read(value);
        if parsed.is_none() {
            self.note(format!("{path}.{key}"), CorrectionAction::Defaulted);
        }
        parsed
    }

    /// Reads `key`, noting a correction when it is missing as well as when it is invalid.
    fn required<T>(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        path: &str,
        read: impl FnOnce(&Value) -> Option<T>,
    ) -> Option<T> {
        let parsed = object.get(key).and_then(read);
        if parsed.is_none() {
            self.note(format!("{path}.{key}"), CorrectionAction::Defaulted);
        }
        parsed
    }

    fn windows(&mut self, value: Option<&Value>) -> Vec<WindowRecord> {
        let Some(entries) = self.array(value, "windows") else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        let mut pending_ids = Vec::new();
        let mut windows = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let path = format!("windows[{index}]");
            let Some(object) = entry.as_object() else {
                self.note(path, CorrectionAction::Dropped);
                continue;
            };
            let id = object
                .get("id")
                .and_then(Value::as_u64)
                .filter(|id| *id < MAX_RESTORED_WINDOW_ID && seen.insert(*id));
            if id.is_none() {
                self.note(format!("{path}.id"), CorrectionAction::Regenerated);
                pending_ids.push(windows.len());
            }
            let app_id = self
                .required(object, "appId", &path, parse_app_id)
                .unwrap_or(AppId::Explorer);
            let app = app_definition(app_id);
            let title = self
                .required(object, "title", &path, non_blank_string)
                .unwrap_or_else(|| app.title.to_string());
            let x = self.coordinate(object, "x", &path, RESTORED_WINDOW_X);
            let y = self.coordinate(object, "y", &path, RESTORED_WINDOW_Y);
            let w = self.dimension(object, "w", &path, RESTORED_MIN_WIDTH, app.default_size.w);
            let h = self.dimension(object, "h", &path, RESTORED_MIN_HEIGHT, app.default_size.h);
            let z_index = self
                .required(object, "z", &path, |value| {
                    value.as_u64().and_then(|z| u32::try_from(z).ok())
                })
                .unwrap_or(1);
            let minimized = self
                .field(object, "minimized", &path, Value::as_bool)
                .unwrap_or(false);
            let maximized = self
                .field(object, "maximized", &path, Value::as_bool)
                .unwrap_or(false);
            windows.push(WindowRecord {
                id: WindowId(id.unwrap_or(0)),
                app_id,
                title,
                rect: WindowRect { x, y, w, h },
                z_index,
                minimized,
                maximized,
            });
        }

        let mut next_id = seen.iter().max().copied().unwrap_or(0) + 1;
        for index in pending_ids {
            windows[index].id = WindowId(next_id);
            next_id += 1;
        }
        if top_z(&windows) > MAX_RESTORED_Z {
            normalize_window_stack(&mut windows);
            self.note("windows.z", CorrectionAction::Clamped);
        }
        windows
    }

    fn coordinate(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        path: &str,
        default: i32,
    ) -> i32 {
        match self.required(object, key, path, as_i32) {
            Some(value) if value.abs() > RESTORED_COORDINATE_LIMIT => {
                self.note(format!("{path}.{key}"), CorrectionAction::Clamped);
                value.clamp(-RESTORED_COORDINATE_LIMIT, RESTORED_COORDINATE_LIMIT)
            }
            Some(value) => value,
            None => default,
        }
    }

    fn dimension(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        path: &str,
        floor: i32,
        default: i32,
    ) -> i32 {
        match self.required(object, key, path, as_i32) {
            Some(value) if value < floor => {
                self.note(format!("{path}.{key}"), CorrectionAction::Clamped);
                floor
            }
            Some(value) if value > RESTORED_COORDINATE_LIMIT => {
                self.note(format!("{path}.{key}"), CorrectionAction::Clamped);
                RESTORED_COORDINATE_LIMIT
            }
            Some(value) => value,
            None => default,
        }
    }

    fn focused_window(
        &mut self,
        value: Option<&Value>,
        windows: &[WindowRecord],
    ) -> Option<WindowId> {
        let requested = value.filter(|value| !value.is_null())?;
        let focused = requested.as_u64().map(WindowId).filter(|id| {
            windows
                .iter()
                .any(|window| window.id == *id && !window.minimized)
        });
        if focused.is_none() {
            self.note("focusedWindowId", CorrectionAction::Dropped);
        }
        focused
    }

    fn recent_apps(&mut self, value: Option<&Value>) -> Vec<AppId> {
        let Some(entries) = self.array(value, "recentApps") else {
            return Vec::new();
        };
        let mut recents = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            match parse_app_id(entry) {
                Some(app_id) if !recents.contains(&app_id) => recents.push(app_id),
                _ => self.note(format!("recentApps[{index}]"), CorrectionAction::Dropped),
            }
        }
        if recents.len() > MAX_RECENT_APPS {
            recents.truncate(MAX_RECENT_APPS);
            self.note("recentApps", CorrectionAction::Clamped);
        }
        recents
    }

    fn history(&mut self, value: Option<&Value>) -> Vec<NotificationRecord> {
        let Some(entries) = self.array(value, "notificationHistory") else {
            return Vec::new();
        };
        let mut history: Vec<NotificationRecord> = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let path = format!("notificationHistory[{index}]");
            let Some(object) = entry.as_object() else {
                self.note(path, CorrectionAction::Dropped);
                continue;
            };
            let id = match object.get("id").and_then(non_blank_string) {
                Some(id) => NotificationId(id),
                None => {
                    self.note(format!("{path}.id"), CorrectionAction::Regenerated);
                    let sequence = self.next_sequence();
                    notification_id(self.now_ms, sequence)
                }
            };
            if history.iter().any(|existing| existing.id == id) {
                self.note(path, CorrectionAction::Dropped);
                continue;
            }
            let title = self
                .required(object, "title", &path, |value| {
                    value.as_str().map(str::to_string)
                })
                .unwrap_or_else(|| "Notification".to_string());
            let message = self
                .required(object, "message", &path, |value| {
                    value.as_str().map(str::to_string)
                })
                .unwrap_or_default();
            let created_at = self
                .required(object, "createdAt", &path, as_timestamp)
                .unwrap_or(self.now_ms);
            let level = match object.get("level").and_then(Value::as_str) {
                Some("error") => NotificationLevel::Error,
                Some("info") => NotificationLevel::Info,
                _ => {
                    self.note(format!("{path}.level"), CorrectionAction::Defaulted);
                    NotificationLevel::Info
                }
            };
            let app_id = self.field(object, "appId", &path, parse_app_id);
            history.push(NotificationRecord {
                id,
                title,
                message,
                created_at,
                level,
                app_id,
            });
        }
        if history.len() > MAX_HISTORY {
            history.truncate(MAX_HISTORY);
            self.note("notificationHistory", CorrectionAction::Clamped);
        }
        history
    }

    fn files(&mut self, value: Option<&Value>) -> Vec<FileItem> {
        let Some(entries) = value.and_then(Value::as_array) else {
            self.note("files", CorrectionAction::Reseeded);
            return initial_files();
        };
        let mut files = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let path = format!("files[{index}]");
            let Some(object) = entry.as_object() else {
                self.note(path, CorrectionAction::Dropped);
                continue;
            };
            let kind = match object.get("type").and_then(Value::as_str) {
                Some("folder") => FileKind::Folder,
                Some("file") => FileKind::File,
                _ => {
                    self.note(format!("{path}.type"), CorrectionAction::Defaulted);
                    FileKind::File
                }
            };
            let is_folder = kind == FileKind::Folder;
            let id = match object.get("id").and_then(non_blank_string) {
                Some(id) => id,
                None => {
                    self.note(format!("{path}.id"), CorrectionAction::Regenerated);
                    let sequence = self.next_sequence();
                    format!("fs-{}-{sequence:x}", self.now_ms)
                }
            };
            let name = self
                .required(object, "name", &path, non_blank_string)
                .unwrap_or_else(|| if is_folder { "Folder" } else { "File" }.to_string());
            let size = self
                .required(object, "size", &path, non_blank_string)
                .unwrap_or_else(|| if is_folder { "--" } else { "0 KB" }.to_string());
            let modified_at = self
                .required(object, "modifiedAt", &path, non_blank_string)
                .unwrap_or_else(|| "Unknown".to_string());
            let locked = object.get("locked").map(truthy).unwrap_or(false);
            files.push(FileItem {
                id,
                name,
                kind,
                size,
                modified_at,
                locked,
            });
        }
        if files.is_empty() {
            self.note("files", CorrectionAction::Reseeded);
            return initial_files();
        }
        files
    }

    fn notes(&mut self, value: Option<&Value>) -> String {
        match value {
            None => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(_) => {
                self.note("notes", CorrectionAction::Defaulted);
                String::new()
            }
        }
    }

    fn settings(&mut self, value: Option<&Value>) -> DesktopSettings {
        let defaults = DesktopSettings::default();
        let Some(object) = self.object(value, "settings") else {
            return defaults;
        };
        DesktopSettings {
            accent: self
                .required(&object, "accent", "settings", non_blank_string)
                .unwrap_or(defaults.accent),
            wallpaper: self
                .required(&object, "wallpaper", "settings", non_blank_string)
                .unwrap_or(defaults.wallpaper),
            reduce_motion: self
                .required(&object, "reduceMotion", "settings", Value::as_bool)
                .unwrap_or(defaults.reduce_motion),
            show_credit_line: self
                .required(&object, "showCreditLine", "settings", Value::as_bool)
                .unwrap_or(defaults.show_credit_line),
        }
    }

    fn desktop(&mut self, value: Option<&Value>) -> DesktopLayoutPrefs {
        let defaults = DesktopLayoutPrefs::default();
        let Some(object) = self.object(value, "desktop") else {
            return defaults;
        };
        let snap_to_grid = self
            .required(&object, "snapToGrid", "desktop", Value::as_bool)
            .unwrap_or(defaults.snap_to_grid);
        let icon_size = self
            .required(&object, "iconSize", "desktop", |value| {
                value.as_str().and_then(|raw| {
                    IconSizeTier::ALL
                        .into_iter()
                        .find(|tier| tier.as_str() == raw)
                })
            })
            .unwrap_or(defaults.icon_size);
        let mut icon_positions = BTreeMap::new();
        if let Some(positions) = self.field(&object, "iconPositions", "desktop", |value| {
            value.as_object().cloned()
        }) {
            for (key, entry) in &positions {
                let path = format!("desktop.iconPositions.{key}");
                let app_id = key.parse::<AppId>().ok();
                let position = entry.as_object().and_then(|position| {
                    Some(IconPosition {
                        x: position.get("x").and_then(as_i32)?,
                        y: position.get("y").and_then(as_i32)?,
                    })
                });
                match (app_id, position) {
                    (Some(app_id), Some(position)) => {
                        icon_positions.insert(app_id, position);
                    }
                    _ => self.note(path, CorrectionAction::Dropped),
                }
            }
        }
        DesktopLayoutPrefs {
            snap_to_grid,
            icon_size,
            icon_positions,
        }
    }

    fn sound(&mut self, value: Option<&Value>) -> SoundState {
        let defaults = SoundState::default();
        let Some(object) = self.object(value, "sound") else {
            return defaults;
        };
        self.sound_fields(&object, "sound", &defaults, true)
    }

    /// Shared by persisted load and config import: every field falls back to `current`.
    ///
    /// With `replace_maps`, a missing mapping/meta object yields an empty map; otherwise the
    /// current maps are kept unless the payload supplies an object.
    fn sound_fields(
        &mut self,
        object: &Map<String, Value>,
        path: &str,
        current: &SoundState,
        replace_maps: bool,
    ) -> SoundState {
        let pack_id = self
            .field(object, "packId", path, |value| {
                value.as_str().and_then(|raw| raw.parse::<SoundPackId>().ok())
            })
            .unwrap_or(current.pack_id);
        let volume = match self.field(object, "volume", path, |value| {
            value.as_f64().filter(|volume| volume.is_finite())
        }) {
            Some(volume) => {
                let clamped = clamp_unit(volume);
                if clamped != volume {
                    self.note(format!("{path}.volume"), CorrectionAction::Clamped);
                }
                clamped
            }
            None => current.volume,
        };
        let muted = self
            .field(object, "muted", path, Value::as_bool)
            .unwrap_or(current.muted);
        let click_soft_enabled = self
            .field(object, "clickSoftEnabled", path, Value::as_bool)
            .unwrap_or(current.click_soft_enabled);

        let mappings = match self.field(object, "mappings", path, |value| {
            value.as_object().cloned()
        }) {
            Some(raw) => self.mappings(&raw, path),
            None if replace_maps => BTreeMap::new(),
            None => current.mappings.clone(),
        };
        let custom_files_meta = match self.field(object, "customFilesMeta", path, |value| {
            value.as_object().cloned()
        }) {
            Some(raw) => self.custom_meta(&raw, path),
            None if replace_maps => BTreeMap::new(),
            None => current.custom_files_meta.clone(),
        };

        SoundState {
            pack_id,
            volume,
            muted,
            mappings,
            custom_files_meta,
            click_soft_enabled,
        }
    }

    fn mappings(&mut self, raw: &Map<String, Value>, path: &str) -> BTreeMap<SoundEvent, String> {
        let mut mappings = BTreeMap::new();
        for (key, value) in raw {
            match (key.parse::<SoundEvent>(), non_blank_string(value)) {
                (Ok(event), Some(source)) => {
                    mappings.insert(event, source);
                }
                _ => self.note(format!("{path}.mappings.{key}"), CorrectionAction::Dropped),
            }
        }
        mappings
    }

    fn custom_meta(
        &mut self,
        raw: &Map<String, Value>,
        path: &str,
    ) -> BTreeMap<SoundEvent, CustomSoundMeta> {
        let mut meta = BTreeMap::new();
        for (key, value) in raw {
            let entry_path = format!("{path}.customFilesMeta.{key}");
            let (Ok(event), Some(object)) = (key.parse::<SoundEvent>(), value.as_object()) else {
                self.note(entry_path, CorrectionAction::Dropped);
                continue;
            };
            let name = self
                .required(object, "name", &entry_path, |value| {
                    value.as_str().map(str::to_string)
                })
                .unwrap_or_else(|| format!("{event}.wav"));
            let mime_type = self
                .required(object, "type", &entry_path, |value| {
                    value.as_str().map(str::to_string)
                })
                .unwrap_or_else(|| "audio/wav".to_string());
            let byte_size = self
                .required(object, "size", &entry_path, as_timestamp)
                .unwrap_or(0);
            let updated_at = self
                .required(object, "updatedAt", &entry_path, as_timestamp)
                .unwrap_or(self.now_ms);
            meta.insert(
                event,
                CustomSoundMeta {
                    name,
                    mime_type,
                    byte_size,
                    updated_at,
                },
            );
        }
        meta
    }

    fn array<'v>(&mut self, value: Option<&'v Value>, path: &str) -> Option<&'v Vec<Value>> {
        let value = value?;
        let array = value.as_array();
        if array.is_none() && !value.is_null() {
            self.note(path, CorrectionAction::Defaulted);
        }
        array
    }

    fn object(&mut self, value: Option<&Value>, path: &str) -> Option<Map<String, Value>> {
        let value = value?;
        let object = value.as_object().cloned();
        if object.is_none() {
            self.note(path, CorrectionAction::Defaulted);
        }
        object
    }
}

fn non_blank_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn parse_app_id(value: &Value) -> Option<AppId> {
    value.as_str().and_then(|raw| raw.parse::<AppId>().ok())
}

fn as_i32(value: &Value) -> Option<i32> {
    let number = value.as_f64().filter(|number| number.is_finite())?;
    Some(number.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
}

fn as_timestamp(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|number| number.is_finite() && *number >= 0.0)
            .map(|number| number as u64)
    })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Heals a persisted payload. Non-object payloads decode to the default snapshot.
pub fn decode_snapshot(payload: &Value, now_ms: u64) -> DecodedSnapshot {
    let mut codec = Codec::new(now_ms);
    let Some(object) = payload.as_object() else {
        codec.note("$", CorrectionAction::Defaulted);
        return DecodedSnapshot {
            snapshot: DesktopSnapshot::default(),
            corrections: codec.corrections,
        };
    };

    let windows = codec.windows(object.get("windows"));
    let focused_window_id = codec.focused_window(object.get("focusedWindowId"), &windows);
    let snapshot = DesktopSnapshot {
        focused_window_id,
        recent_apps: codec.recent_apps(object.get("recentApps")),
        files: codec.files(object.get("files")),
        notes: codec.notes(object.get("notes")),
        notification_history: codec.history(object.get("notificationHistory")),
        settings: codec.settings(object.get("settings")),
        desktop: codec.desktop(object.get("desktop")),
        sound: codec.sound(object.get("sound")),
        windows,
    };
    DecodedSnapshot {
        snapshot,
        corrections: codec.corrections,
    }
}

/// Applies an imported sound-config document over `current`.
///
/// Returns `None` when the payload is not a JSON object. Valid fields replace the current value;
/// invalid ones keep it.
pub fn import_sound_config(
    current: &SoundState,
    payload: &Value,
    now_ms: u64,
) -> Option<(SoundState, Vec<Correction>)> {
    let object = payload.as_object()?;
    let mut codec = Codec::new(now_ms);
    let sound = codec.sound_fields(object, "soundConfig", current, false);
    Some((sound, codec.corrections))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::DesktopState;

    fn paths(corrections: &[Correction]) -> Vec<String> {
        corrections.iter().map(|c| c.path.clone()).collect()
    }

    #[test]
    fn clean_snapshot_round_trips_without_corrections() {
        let mut state = DesktopState::default();
        state.notes = "hello".to_string();
        state.recent_apps = vec![AppId::Notepad];
        state.sound.mappings.insert(SoundEvent::Boot, "data:x".to_string());
        state.sound.custom_files_meta.insert(
            SoundEvent::Boot,
            CustomSoundMeta {
                name: "boot.wav".to_string(),
                mime_type: "audio/wav".to_string(),
                byte_size: 3,
                updated_at: 9,
            },
        );
        state.desktop.icon_positions.insert(AppId::Explorer, IconPosition { x: 132, y: 28 });
        let snapshot = state.snapshot();

        let value = serde_json::to_value(&snapshot).expect("serialize");
        let decoded = decode_snapshot(&value, 1);
        assert_eq!(decoded.corrections, Vec::new());
        assert_eq!(decoded.snapshot, snapshot);
    }

    #[test]
    fn malformed_windows_are_healed_with_safe_defaults() {
        let payload = json!({
            "windows": [
                {"id": 4, "appId": "paint", "x": "left", "w": 100, "h": 50, "z": 3},
                "garbage",
                {"id": 4, "appId": "terminal", "title": "Shell", "x": 10, "y": 12, "w": 900, "h": 600, "z": 5, "minimized": true}
            ],
            "focusedWindowId": 5
        });
        let decoded = decode_snapshot(&payload, 1_000);
        let windows = &decoded.snapshot.windows;
        assert_eq!(windows.len(), 2);

        assert_eq!(windows[0].app_id, AppId::Explorer);
        assert_eq!(windows[0].title, "Explorer");
        assert_eq!(windows[0].rect, WindowRect { x: 72, y: 58, w: 320, h: 220 });
        assert_eq!(windows[0].z_index, 3);

        assert_eq!(windows[1].id, WindowId(5), "duplicate id regenerated");
        assert_eq!(windows[1].title, "Shell");
        assert!(windows[1].minimized);
        assert_eq!(decoded.snapshot.focused_window_id, None, "minimized window is never focused");

        let paths = paths(&decoded.corrections);
        assert!(paths.contains(&"windows[0].appId".to_string()));
        assert!(paths.contains(&"windows[0].w".to_string()));
        assert!(paths.contains(&"windows[1]".to_string()));
        assert!(paths.contains(&"windows[2].id".to_string()));
        assert!(paths.contains(&"focusedWindowId".to_string()));
    }

    #[test]
    fn extreme_ids_coordinates_and_z_are_brought_into_range() {
        let payload = json!({
            "windows": [
                {"id": u64::MAX, "appId": "notepad", "title": "Notepad", "x": i64::from(i32::MAX), "y": -900_000, "w": 700, "h": 520, "z": u32::MAX},
                {"id": 3, "appId": "terminal", "title": "Terminal", "x": 10, "y": 10, "w": 760, "h": 500, "z": 2}
            ],
            "focusedWindowId": 3
        });
        let decoded = decode_snapshot(&payload, 0);
        let windows = &decoded.snapshot.windows;

        assert_eq!(windows[0].id, WindowId(4), "out-of-range id regenerated");
        assert_eq!(windows[0].rect.x, 100_000);
        assert_eq!(windows[0].rect.y, -100_000);
        assert_eq!(windows[0].z_index, 2, "stack order kept after re-ranking");
        assert_eq!(windows[1].z_index, 1);
        assert_eq!(decoded.snapshot.focused_window_id, Some(WindowId(3)));

        let paths = paths(&decoded.corrections);
        assert!(paths.contains(&"windows[0].id".to_string()));
        assert!(paths.contains(&"windows[0].x".to_string()));
        assert!(paths.contains(&"windows.z".to_string()));
    }

    #[test]
    fn focus_survives_when_it_names_a_visible_window() {
        let payload = json!({
            "windows": [{"id": 2, "appId": "notepad", "title": "Notepad", "x": 0, "y": 0, "w": 700, "h": 520, "z": 1, "minimized": false, "maximized": false}],
            "focusedWindowId": 2
        });
        let decoded = decode_snapshot(&payload, 0);
        assert_eq!(decoded.snapshot.focused_window_id, Some(WindowId(2)));
    }

    #[test]
    fn history_entries_get_ids_and_levels() {
        let payload = json!({
            "notificationHistory": [
                {"title": "A", "message": "m", "createdAt": 5, "level": "warning", "appId": "paint"},
                {"id": "ntf-1", "title": "B", "message": "n", "createdAt": 6, "level": "error", "appId": "settings"},
                {"id": "ntf-1", "title": "dupe", "message": "", "createdAt": 7, "level": "info"}
            ]
        });
        let decoded = decode_snapshot(&payload, 77);
        let history = &decoded.snapshot.notification_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id.0, "ntf-77-1");
        assert_eq!(history[0].level, NotificationLevel::Info);
        assert_eq!(history[0].app_id, None);
        assert_eq!(history[1].level, NotificationLevel::Error);
        assert_eq!(history[1].app_id, Some(AppId::Settings));
    }

    #[test]
    fn oversized_history_is_trimmed() {
        let entries = (0..200)
            .map(|n| json!({"id": format!("n{n}"), "title": "t", "message": "m", "createdAt": n, "level": "info"}))
            .collect::<Vec<_>>();
        let decoded = decode_snapshot(&json!({ "notificationHistory": entries }), 0);
        assert_eq!(decoded.snapshot.notification_history.len(), MAX_HISTORY);
    }

    #[test]
    fn empty_or_invalid_files_reseed_the_catalog() {
        let decoded = decode_snapshot(&json!({"files": []}), 0);
        assert_eq!(decoded.snapshot.files, initial_files());
        let decoded = decode_snapshot(&json!({"files": "nope"}), 0);
        assert_eq!(decoded.snapshot.files, initial_files());
        assert!(paths(&decoded.corrections).contains(&"files".to_string()));
    }

    #[test]
    fn recent_apps_are_filtered_and_deduplicated() {
        let decoded = decode_snapshot(
            &json!({"recentApps": ["notepad", "paint", "notepad", 3, "terminal"]}),
            0,
        );
        assert_eq!(
            decoded.snapshot.recent_apps,
            vec![AppId::Notepad, AppId::Terminal]
        );
    }

    #[test]
    fn sound_state_is_filtered_to_known_events_and_packs() {
        let payload = json!({
            "sound": {
                "packId": "doesnotexist",
                "volume": 3.5,
                "muted": true,
                "mappings": {"boot": "data:a", "explode": "data:b", "lock": "  "},
                "customFilesMeta": {"boot": {"size": 10}, "explode": {}}
            }
        });
        let sound = decode_snapshot(&payload, 123).snapshot.sound;
        assert_eq!(sound.pack_id, SoundPackId::Purple);
        assert_eq!(sound.volume, 1.0);
        assert!(sound.muted);
        assert_eq!(
            sound.mappings,
            BTreeMap::from([(SoundEvent::Boot, "data:a".to_string())])
        );
        assert_eq!(
            sound.custom_files_meta[&SoundEvent::Boot],
            CustomSoundMeta {
                name: "boot.wav".to_string(),
                mime_type: "audio/wav".to_string(),
                byte_size: 10,
                updated_at: 123,
            }
        );
        assert_eq!(sound.custom_files_meta.len(), 1);
    }

    #[test]
    fn settings_and_desktop_default_per_field() {
        let payload = json!({
            "settings": {"accent": "", "wallpaper": "iris-bloom", "reduceMotion": "yes"},
            "desktop": {"iconSize": "huge", "iconPositions": {"explorer": {"x": 10, "y": 20}, "paint": {"x": 1, "y": 1}, "settings": {"x": "a"}}}
        });
        let snapshot = decode_snapshot(&payload, 0).snapshot;
        assert_eq!(snapshot.settings.accent, "#a855f7");
        assert_eq!(snapshot.settings.wallpaper, "iris-bloom");
        assert!(!snapshot.settings.reduce_motion);
        assert_eq!(snapshot.desktop.icon_size, IconSizeTier::Medium);
        assert!(snapshot.desktop.snap_to_grid);
        assert_eq!(
            snapshot.desktop.icon_positions,
            BTreeMap::from([(AppId::Explorer, IconPosition { x: 10, y: 20 })])
        );
    }

    #[test]
    fn non_object_payload_decodes_to_defaults() {
        let decoded = decode_snapshot(&json!([1, 2, 3]), 0);
        assert_eq!(decoded.snapshot, DesktopSnapshot::default());
        assert_eq!(paths(&decoded.corrections), vec!["$".to_string()]);
    }

    #[test]
    fn import_keeps_current_pack_for_unknown_id_but_applies_volume() {
        let mut current = SoundState::default();
        current.pack_id = SoundPackId::Aero;
        current.mappings.insert(SoundEvent::Lock, "data:lock".to_string());

        let (sound, corrections) =
            import_sound_config(&current, &json!({"packId": "doesnotexist", "volume": 0.3}), 0)
                .expect("object payload");
        assert_eq!(sound.pack_id, SoundPackId::Aero);
        assert_eq!(sound.volume, 0.3);
        assert_eq!(sound.mappings, current.mappings);
        assert_eq!(paths(&corrections), vec!["soundConfig.packId".to_string()]);
    }

    #[test]
    fn import_rejects_non_object_payloads() {
        assert!(import_sound_config(&SoundState::default(), &json!("nope"), 0).is_none());
    }

    #[test]
    fn exported_document_uses_camel_case_keys() {
        let document = SoundConfigDocument::from(&SoundState::default());
        let value = serde_json::to_value(&document).expect("serialize");
        assert_eq!(
            value,
            json!({
                "packId": "purple",
                "volume": 0.72,
                "muted": false,
                "clickSoftEnabled": true,
                "mappings": {},
                "customFilesMeta": {}
            })
        );
    }
}
