use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::sound::SoundState;

pub const DESKTOP_SNAPSHOT_SCHEMA_VERSION: u32 = 2;
/// Height kept free at the bottom of the viewport for the taskbar dock.
pub const TASKBAR_RESERVED_HEIGHT: i32 = 56;
/// Usable desktop height never drops below this, however small the viewport.
pub const MIN_USABLE_HEIGHT: i32 = 320;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppId {
    Settings,
    Soundboard,
    Explorer,
    Notepad,
    Terminal,
}

impl AppId {
    pub const ALL: [AppId; 5] = [
        Self::Settings,
        Self::Soundboard,
        Self::Explorer,
        Self::Notepad,
        Self::Terminal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Soundboard => "soundboard",
            Self::Explorer => "explorer",
            Self::Notepad => "notepad",
            Self::Terminal => "terminal",
        }
    }

    pub fn title(self) -> &'static str {
        crate::apps::app_definition(self).title
    }
}

impl FromStr for AppId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|app| app.as_str() == value)
            .ok_or_else(|| value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self
        }
    }

    pub fn clamped_min(self, min_w: i32, min_h: i32) -> Self {
        Self {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..self
        }
    }

    /// Overlays the fields present in `patch`.
    pub fn patched(self, patch: WindowBoundsPatch) -> Self {
        Self {
            x: patch.x.unwrap_or(self.x),
            y: patch.y.unwrap_or(self.y),
            w: patch.w.unwrap_or(self.w),
            h: patch.h.unwrap_or(self.h),
        }
    }
}

/// Partial geometry update committed at the end of a drag or resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowBoundsPatch {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub w: Option<i32>,
    pub h: Option<i32>,
}

impl WindowBoundsPatch {
    pub fn position(x: i32, y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn rect(rect: WindowRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            w: Some(rect.w),
            h: Some(rect.h),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRecord {
    pub id: WindowId,
    pub app_id: AppId,
    pub title: String,
    #[serde(flatten)]
    pub rect: WindowRect,
    #[serde(rename = "z")]
    pub z_index: u32,
    pub minimized: bool,
    pub maximized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapZone {
    Left,
    Right,
    Top,
}

/// Browser viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Viewport height minus the taskbar reservation.
    pub fn usable_height(self) -> i32 {
        (self.height - TASKBAR_RESERVED_HEIGHT).max(MIN_USABLE_HEIGHT)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Lock/login flow position. Never persisted; every process starts at [`SessionState::LockedClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Full-screen clock; a click moves to the login prompt.
    #[default]
    LockedClock,
    /// Credential-less login gate with power and restart controls.
    LoginPrompt,
    /// Desktop usable.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SidePanelTab {
    #[default]
    Notifications,
    QuickSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Error,
}

/// Identity and creation time handed to the reducer for a notification it may raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationStamp {
    pub id: NotificationId,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub created_at: u64,
    pub level: NotificationLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<AppId>,
}

impl NotificationRecord {
    pub fn new(
        stamp: NotificationStamp,
        title: impl Into<String>,
        message: impl Into<String>,
        level: NotificationLevel,
    ) -> Self {
        Self {
            id: stamp.id,
            title: title.into(),
            message: message.into(),
            created_at: stamp.created_at_ms,
            level,
            app_id: None,
        }
    }

    pub fn from_app(mut self, app_id: Option<AppId>) -> Self {
        self.app_id = app_id;
        self
    }
}

pub const DEFAULT_ACCENT: &str = "#a855f7";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopSettings {
    pub accent: String,
    pub wallpaper: String,
    pub reduce_motion: bool,
    pub show_credit_line: bool,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self {
            accent: DEFAULT_ACCENT.to_string(),
            wallpaper: crate::wallpaper::DEFAULT_WALLPAPER_ID.to_string(),
            reduce_motion: false,
            show_credit_line: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IconSizeTier {
    Small,
    #[default]
    Medium,
    Large,
}

impl IconSizeTier {
    pub const ALL: [IconSizeTier; 3] = [Self::Small, Self::Medium, Self::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopLayoutPrefs {
    pub snap_to_grid: bool,
    pub icon_size: IconSizeTier,
    pub icon_positions: BTreeMap<AppId, IconPosition>,
}

impl Default for DesktopLayoutPrefs {
    fn default() -> Self {
        Self {
            snap_to_grid: true,
            icon_size: IconSizeTier::Medium,
            icon_positions: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    File,
    Folder,
}

/// Entry in the simulated explorer listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub size: String,
    pub modified_at: String,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesktopState {
    pub next_window_id: u64,
    pub windows: Vec<WindowRecord>,
    pub focused_window_id: Option<WindowId>,
    pub recent_apps: Vec<AppId>,
    pub start_menu_open: bool,
    pub side_panel_open: bool,
    pub side_panel_tab: SidePanelTab,
    pub snap_preview: Option<SnapZone>,
    pub session: SessionState,
    pub toasts: Vec<NotificationRecord>,
    pub notification_history: Vec<NotificationRecord>,
    pub files: Vec<FileItem>,
    pub notes: String,
    pub settings: DesktopSettings,
    pub desktop: DesktopLayoutPrefs,
    pub sound: SoundState,
}

impl Default for DesktopState {
    fn default() -> Self {
        Self {
            next_window_id: 1,
            windows: Vec::new(),
            focused_window_id: None,
            recent_apps: Vec::new(),
            start_menu_open: false,
            side_panel_open: false,
            side_panel_tab: SidePanelTab::Notifications,
            snap_preview: None,
            session: SessionState::LockedClock,
            toasts: Vec::new(),
            notification_history: Vec::new(),
            files: crate::filesystem::initial_files(),
            notes: String::new(),
            settings: DesktopSettings::default(),
            desktop: DesktopLayoutPrefs::default(),
            sound: SoundState::default(),
        }
    }
}

impl DesktopState {
    pub fn window(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn focused_window(&self) -> Option<&WindowRecord> {
        self.focused_window_id.and_then(|id| self.window(id))
    }

    pub fn is_active(&self) -> bool {
        self.session == SessionState::Active
    }

    /// Durable part of the state. Menus, toasts, previews and the session are left out.
    pub fn snapshot(&self) -> DesktopSnapshot {
        DesktopSnapshot {
            windows: self.windows.clone(),
            focused_window_id: self.focused_window_id,
            recent_apps: self.recent_apps.clone(),
            files: self.files.clone(),
            notes: self.notes.clone(),
            notification_history: self.notification_history.clone(),
            settings: self.settings.clone(),
            desktop: self.desktop.clone(),
            sound: self.sound.clone(),
        }
    }

    /// Builds a fresh state around durable data. The session always starts locked.
    pub fn from_snapshot(snapshot: DesktopSnapshot) -> Self {
        let mut state = Self {
            windows: snapshot.windows,
            focused_window_id: snapshot.focused_window_id,
            recent_apps: snapshot.recent_apps,
            files: snapshot.files,
            notes: snapshot.notes,
            notification_history: snapshot.notification_history,
            settings: snapshot.settings,
            desktop: snapshot.desktop,
            sound: snapshot.sound,
            ..Self::default()
        };
        state.next_window_id = state
            .windows
            .iter()
            .map(|w| w.id.0)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        state
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopSnapshot {
    pub windows: Vec<WindowRecord>,
    pub focused_window_id: Option<WindowId>,
    pub recent_apps: Vec<AppId>,
    pub files: Vec<FileItem>,
    pub notes: String,
    pub notification_history: Vec<NotificationRecord>,
    pub settings: DesktopSettings,
    pub desktop: DesktopLayoutPrefs,
    pub sound: SoundState,
}

impl Default for DesktopSnapshot {
    fn default() -> Self {
        DesktopState::default().snapshot()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

/// In-flight window move. `current` is only committed to the window on release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
    pub current: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub window_id: WindowId,
    pub edge: ResizeEdge,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
    pub current: WindowRect,
}

/// In-flight desktop icon drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconDragSession {
    pub app_id: AppId,
    pub pointer_offset: (i32, i32),
    pub origin: IconPosition,
    pub current: IconPosition,
    pub moved: bool,
}

/// Pointer capture records. Held outside the durable state and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub dragging: Option<DragSession>,
    pub resizing: Option<ResizeSession>,
    pub icon_drag: Option<IconDragSession>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn app_ids_parse_from_registry_names() {
        assert_eq!("explorer".parse::<AppId>(), Ok(AppId::Explorer));
        assert_eq!("paint".parse::<AppId>(), Err("paint".to_string()));
    }

    #[test]
    fn window_record_serializes_flat_geometry() {
        let record = WindowRecord {
            id: WindowId(3),
            app_id: AppId::Notepad,
            title: "Notepad".to_string(),
            rect: WindowRect {
                x: 1,
                y: 2,
                w: 300,
                h: 400,
            },
            z_index: 7,
            minimized: false,
            maximized: true,
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": 3,
                "appId": "notepad",
                "title": "Notepad",
                "x": 1,
                "y": 2,
                "w": 300,
                "h": 400,
                "z": 7,
                "minimized": false,
                "maximized": true
            })
        );
    }

    #[test]
    fn from_snapshot_starts_locked_and_continues_window_ids() {
        let mut state = DesktopState::default();
        state.session = SessionState::Active;
        state.start_menu_open = true;
        state.windows.push(WindowRecord {
            id: WindowId(41),
            app_id: AppId::Terminal,
            title: "Terminal".to_string(),
            rect: WindowRect {
                x: 0,
                y: 0,
                w: 760,
                h: 500,
            },
            z_index: 1,
            minimized: false,
            maximized: false,
        });

        let restored = DesktopState::from_snapshot(state.snapshot());
        assert_eq!(restored.session, SessionState::LockedClock);
        assert!(!restored.start_menu_open);
        assert_eq!(restored.next_window_id, 42);
    }

    #[test]
    fn usable_height_reserves_taskbar_with_floor() {
        assert_eq!(Viewport::new(1000, 800).usable_height(), 744);
        assert_eq!(Viewport::new(1000, 200).usable_height(), 320);
    }
}
