//! Reducer actions, side-effect intents, and transition logic for the desktop store.

mod icons;
mod preferences;

use serde_json::Value;
use thiserror::Error;

use crate::{
    filesystem::initial_files,
    model::{
        AppId, DesktopSnapshot, DesktopState, DragSession, IconPosition, IconSizeTier,
        InteractionState, NotificationId, NotificationLevel, NotificationRecord, NotificationStamp,
        PointerPosition, ResizeEdge, ResizeSession, SidePanelTab, SnapZone, Viewport,
        WindowBoundsPatch, WindowId,
    },
    notifications::{self, ERROR_TITLE},
    session,
    sound::{CustomSoundMeta, CustomSoundUpload, SoundCue, SoundEvent, SoundPackId},
    window_manager::{
        allocate_window_id, apply_snap, clamp_resized_rect, detect_snap_zone, new_window, next_z,
        push_recent_app, raise_window, refocus_after_removal, resize_rect,
    },
};

const DELETE_FAILED_TITLE: &str = "Delete failed";

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Open a new window for an app. Always lands the session on the desktop.
    OpenApp {
        /// App to launch.
        app_id: AppId,
    },
    /// Close a window by id.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Minimize a window and hand focus to the next visible one.
    MinimizeWindow {
        /// Window to minimize.
        window_id: WindowId,
    },
    /// Flip the maximized flag, raising and focusing the window.
    ToggleMaximize {
        /// Window to toggle.
        window_id: WindowId,
    },
    /// Focus (and raise) a window by id.
    FocusWindow {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Bring a minimized window back.
    RestoreWindow {
        /// Window to restore.
        window_id: WindowId,
    },
    /// Merge a partial geometry patch into a window.
    UpdateWindowBounds {
        /// Window to update.
        window_id: WindowId,
        /// Fields to overwrite.
        patch: WindowBoundsPatch,
    },
    /// Show or clear the snap ghost outline.
    SetSnapPreview {
        /// Zone to preview, `None` to hide it.
        zone: Option<SnapZone>,
    },
    /// Force a window into a snap zone's geometry.
    ApplySnap {
        /// Window to snap.
        window_id: WindowId,
        /// Target zone.
        zone: SnapZone,
        /// Current viewport.
        viewport: Viewport,
    },
    /// Begin dragging a window.
    BeginMove {
        /// Window being dragged.
        window_id: WindowId,
        /// Pointer position at drag start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window drag and its snap preview.
    UpdateMove {
        /// Current pointer position.
        pointer: PointerPosition,
        /// Current viewport.
        viewport: Viewport,
    },
    /// Release the active window drag, committing a snap or the moved bounds.
    EndMove {
        /// Current viewport.
        viewport: Viewport,
    },
    /// Begin resizing a window.
    BeginResize {
        /// Window being resized.
        window_id: WindowId,
        /// Edge or corner being dragged.
        edge: ResizeEdge,
        /// Pointer position at resize start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window resize.
    UpdateResize {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// Release the active resize, committing the resized bounds.
    EndResize,
    /// Open or close the start menu. Opening closes the side panel.
    SetStartMenuOpen {
        /// Requested visibility.
        open: bool,
    },
    /// Toggle the start menu.
    ToggleStartMenu,
    /// Open the side panel on a tab.
    OpenSidePanel {
        /// Tab to show.
        tab: SidePanelTab,
    },
    /// Close the side panel.
    CloseSidePanel,
    /// Close the side panel if it shows `tab`, otherwise open it there.
    ToggleSidePanel {
        /// Tab to toggle.
        tab: SidePanelTab,
    },
    /// Switch the side panel tab, opening the panel.
    SetSidePanelTab {
        /// Tab to show.
        tab: SidePanelTab,
    },
    /// Show the lock clock.
    LockSystem,
    /// Leave the lock clock for the login prompt.
    UnlockSystem,
    /// Jump straight to the login prompt.
    ShowLoginView,
    /// Enter the desktop from the login prompt.
    LoginSession,
    /// Simulated reboot back to the lock clock.
    RestartSession,
    /// Push a notification to the toast queue and history.
    PushNotification {
        /// Notification to push.
        record: NotificationRecord,
        /// Whether to play the notify cue.
        play_sound: bool,
    },
    /// Push an error notification and play the error cue.
    RaiseError {
        /// Identity for the notification.
        stamp: NotificationStamp,
        /// Message body.
        message: String,
    },
    /// Hide a toast. History is kept.
    DismissToast {
        /// Notification to hide.
        id: NotificationId,
    },
    /// Remove a notification from history (and from the toasts).
    DismissHistory {
        /// Notification to remove.
        id: NotificationId,
    },
    /// Clear the history and every toast.
    ClearHistory,
    /// Delete an explorer item. Locked items raise a policy notification instead.
    DeleteFile {
        /// Item to delete.
        item_id: String,
        /// Identity for the notification raised when the item is locked.
        stamp: NotificationStamp,
    },
    /// Restore the seed explorer listing.
    ResetFileSystem,
    /// Replace the notes buffer.
    SetNotes {
        /// New text.
        text: String,
    },
    /// Set the accent color.
    SetAccent {
        /// CSS color value.
        accent: String,
    },
    /// Set the wallpaper id.
    SetWallpaper {
        /// Wallpaper id.
        wallpaper_id: String,
    },
    /// Toggle reduced-motion rendering.
    SetReducedMotion {
        /// Whether reduced motion is enabled.
        enabled: bool,
    },
    /// Toggle the lock-screen credit line.
    SetShowCreditLine {
        /// Whether the credit line is shown.
        enabled: bool,
    },
    /// Toggle desktop grid snapping.
    SetDesktopSnapToGrid {
        /// Whether icons snap to the grid.
        enabled: bool,
    },
    /// Change the desktop icon size tier.
    SetDesktopIconSize {
        /// New tier.
        size: IconSizeTier,
    },
    /// Persist an icon position verbatim.
    SetDesktopIconPosition {
        /// Icon owner.
        app_id: AppId,
        /// New position.
        position: IconPosition,
    },
    /// Forget every persisted icon position.
    ResetDesktopIconLayout,
    /// Press on a desktop icon.
    BeginIconDrag {
        /// Icon owner.
        app_id: AppId,
        /// Pointer position at press.
        pointer: PointerPosition,
        /// Current viewport.
        viewport: Viewport,
    },
    /// Move the pressed icon.
    UpdateIconDrag {
        /// Current pointer position.
        pointer: PointerPosition,
        /// Current viewport.
        viewport: Viewport,
    },
    /// Release (or cancel) the icon drag.
    EndIconDrag {
        /// Current viewport.
        viewport: Viewport,
    },
    /// Set the master volume (clamped to `[0, 1]`).
    SetVolume {
        /// Requested volume.
        volume: f64,
    },
    /// Flip the mute flag.
    ToggleMute,
    /// Select a sound pack.
    SetPack {
        /// Pack to use.
        pack_id: SoundPackId,
    },
    /// Map an event to a custom source. An empty source clears the mapping and its metadata.
    SetMapping {
        /// Event to map.
        event: SoundEvent,
        /// New source, `None` to clear.
        source: Option<String>,
        /// Advisory file metadata.
        meta: Option<CustomSoundMeta>,
    },
    /// Apply the result of reading an uploaded custom sound.
    ApplyCustomSound {
        /// Event the upload was meant for.
        event: SoundEvent,
        /// Read result, `None` when the file was missing or unreadable.
        upload: Option<CustomSoundUpload>,
    },
    /// Restore sound defaults, keeping the volume and unmuting.
    ResetSounds,
    /// Toggle the soft click cue.
    SetClickSoftEnabled {
        /// Whether click feedback plays.
        enabled: bool,
    },
    /// Apply an imported sound-config document.
    ImportSoundConfig {
        /// Parsed document.
        payload: Value,
        /// Name of the imported file, for the confirmation notification.
        file_name: String,
        /// Identity for the confirmation notification.
        stamp: NotificationStamp,
    },
    /// Replace durable state with a sanitized snapshot.
    HydrateSnapshot {
        /// Snapshot payload to restore.
        snapshot: DesktopSnapshot,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the store to execute.
pub enum RuntimeEffect {
    /// Play a sound cue.
    PlaySound(SoundCue),
    /// Durable state changed; persist the snapshot.
    PersistSnapshot,
    /// Start the auto-dismiss timer for a toast.
    ScheduleToastExpiry(NotificationId),
    /// Cancel a toast's auto-dismiss timer.
    CancelToastExpiry(NotificationId),
    /// Cancel every pending toast timer.
    CancelAllToastExpiries,
    /// Stop every running sound sequence.
    StopSoundSequences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a rejected action is surfaced to the user.
pub enum FeedbackPolicy {
    /// Nothing audible or visible.
    Silent,
    /// Error cue only.
    Cue,
    /// Error cue plus an error notification carrying the error message.
    CueAndNotify,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for rejected actions. State is never modified when one is returned.
pub enum ReducerError {
    /// The target window id was not found in the current state.
    #[error("window {0} not found")]
    WindowNotFound(WindowId),
    /// An app name outside the registry.
    #[error("unknown app `{0}`")]
    UnknownApp(String),
    /// The explorer item does not exist.
    #[error("file `{0}` not found")]
    FileNotFound(String),
    /// The desktop is behind the lock or login view.
    #[error("desktop session is not active")]
    SessionInactive,
    /// The imported sound config is not a JSON object.
    #[error("Sound config import failed: invalid JSON mapping.")]
    InvalidSoundConfig,
    /// An uploaded custom sound could not be read.
    #[error("Failed to map sound for {0}.")]
    CustomSoundRejected(&'static str),
}

impl ReducerError {
    pub fn feedback(&self) -> FeedbackPolicy {
        match self {
            Self::SessionInactive => FeedbackPolicy::Silent,
            Self::WindowNotFound(_) | Self::UnknownApp(_) | Self::FileNotFound(_) => {
                FeedbackPolicy::Cue
            }
            Self::InvalidSoundConfig | Self::CustomSoundRejected(_) => FeedbackPolicy::CueAndNotify,
        }
    }
}

/// Applies a [`DesktopAction`] to the desktop state and collects resulting side effects.
///
/// # Errors
///
/// Returns a [`ReducerError`] when the action is rejected. The state is left untouched in that
/// case; the caller decides how to surface the error from [`ReducerError::feedback`].
pub fn reduce_desktop(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    if requires_active_session(&action) && !state.is_active() {
        return Err(ReducerError::SessionInactive);
    }
    if preferences::reduce_preferences_action(state, &action, &mut effects)?
        || icons::reduce_icon_action(state, interaction, &action, &mut effects)?
    {
        return Ok(effects);
    }

    match action {
        DesktopAction::OpenApp { app_id } => {
            let window_id = allocate_window_id(state);
            let window = new_window(state, app_id, window_id);
            state.windows.push(window);
            state.focused_window_id = Some(window_id);
            push_recent_app(&mut state.recent_apps, app_id);
            state.start_menu_open = false;
            state.side_panel_open = false;
            state.snap_preview = None;
            session::force_active(state);
            effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::OpenWindow)));
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::CloseWindow { window_id } => {
            if state.window(window_id).is_none() {
                return Err(ReducerError::WindowNotFound(window_id));
            }
            state.windows.retain(|w| w.id != window_id);
            refocus_after_removal(state);
            state.snap_preview = None;
            release_window_capture(interaction, window_id);
            effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::CloseWindow)));
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::MinimizeWindow { window_id } => {
            let Some(window) = state.windows.iter_mut().find(|w| w.id == window_id) else {
                return Ok(effects);
            };
            window.minimized = true;
            refocus_after_removal(state);
            state.snap_preview = None;
            release_window_capture(interaction, window_id);
            effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::Minimize)));
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::ToggleMaximize { window_id } => {
            if state.window(window_id).is_none() {
                return Err(ReducerError::WindowNotFound(window_id));
            }
            let z_index = next_z(&mut state.windows);
            let window = state
                .windows
                .iter_mut()
                .find(|w| w.id == window_id)
                .ok_or(ReducerError::WindowNotFound(window_id))?;
            window.maximized = !window.maximized;
            window.minimized = false;
            window.z_index = z_index;
            let entered_maximized = window.maximized;
            state.focused_window_id = Some(window_id);
            state.snap_preview = None;
            if entered_maximized {
                effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::Maximize)));
            }
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::FocusWindow { window_id } | DesktopAction::RestoreWindow { window_id } => {
            if raise_window(state, window_id) {
                effects.push(RuntimeEffect::PersistSnapshot);
            }
        }
        DesktopAction::UpdateWindowBounds { window_id, patch } => {
            state.snap_preview = None;
            if let Some(window) = state.windows.iter_mut().find(|w| w.id == window_id) {
                window.rect = window.rect.patched(patch);
                effects.push(RuntimeEffect::PersistSnapshot);
            }
        }
        DesktopAction::SetSnapPreview { zone } => {
            state.snap_preview = zone;
        }
        DesktopAction::ApplySnap {
            window_id,
            zone,
            viewport,
        } => {
            if apply_snap(state, window_id, zone, viewport) {
                if zone == SnapZone::Top {
                    effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::Maximize)));
                }
                effects.push(RuntimeEffect::PersistSnapshot);
            }
        }
        DesktopAction::BeginMove { window_id, pointer } => {
            let Some(window) = state.window(window_id) else {
                return Ok(effects);
            };
            if window.maximized {
                return Ok(effects);
            }
            let rect_start = window.rect;
            raise_window(state, window_id);
            interaction.dragging = Some(DragSession {
                window_id,
                pointer_start: pointer,
                rect_start,
                current: rect_start,
            });
        }
        DesktopAction::UpdateMove { pointer, viewport } => {
            if let Some(session) = interaction.dragging.as_mut() {
                session.current = session.rect_start.offset(
                    pointer.x - session.pointer_start.x,
                    pointer.y - session.pointer_start.y,
                );
                state.snap_preview = detect_snap_zone(session.current, viewport);
            }
        }
        DesktopAction::EndMove { viewport } => {
            let Some(session) = interaction.dragging.take() else {
                return Ok(effects);
            };
            match state.snap_preview.take() {
                Some(zone) => {
                    if apply_snap(state, session.window_id, zone, viewport) && zone == SnapZone::Top
                    {
                        effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::Maximize)));
                    }
                }
                None => {
                    if let Some(window) = state
                        .windows
                        .iter_mut()
                        .find(|w| w.id == session.window_id)
                    {
                        window.rect = session.current;
                    }
                }
            }
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::BeginResize {
            window_id,
            edge,
            pointer,
        } => {
            let Some(window) = state.window(window_id) else {
                return Ok(effects);
            };
            if window.maximized {
                return Ok(effects);
            }
            let rect_start = window.rect;
            raise_window(state, window_id);
            interaction.resizing = Some(ResizeSession {
                window_id,
                edge,
                pointer_start: pointer,
                rect_start,
                current: rect_start,
            });
        }
        DesktopAction::UpdateResize { pointer } => {
            let Some(session) = interaction.resizing.as_mut() else {
                return Ok(effects);
            };
            let Some(app_id) = state.window(session.window_id).map(|w| w.app_id) else {
                interaction.resizing = None;
                return Ok(effects);
            };
            let resized = resize_rect(
                session.rect_start,
                session.edge,
                pointer.x - session.pointer_start.x,
                pointer.y - session.pointer_start.y,
            );
            session.current = clamp_resized_rect(session.rect_start, session.edge, resized, app_id);
        }
        DesktopAction::EndResize => {
            let Some(session) = interaction.resizing.take() else {
                return Ok(effects);
            };
            if let Some(window) = state
                .windows
                .iter_mut()
                .find(|w| w.id == session.window_id)
            {
                window.rect = session.current;
                effects.push(RuntimeEffect::PersistSnapshot);
            }
        }
        DesktopAction::SetStartMenuOpen { open } => {
            state.start_menu_open = open;
            if open {
                state.side_panel_open = false;
            }
        }
        DesktopAction::ToggleStartMenu => {
            state.start_menu_open = !state.start_menu_open;
            if state.start_menu_open {
                state.side_panel_open = false;
            }
        }
        DesktopAction::OpenSidePanel { tab } | DesktopAction::SetSidePanelTab { tab } => {
            state.side_panel_open = true;
            state.side_panel_tab = tab;
            state.start_menu_open = false;
        }
        DesktopAction::CloseSidePanel => {
            state.side_panel_open = false;
        }
        DesktopAction::ToggleSidePanel { tab } => {
            if state.side_panel_open && state.side_panel_tab == tab {
                state.side_panel_open = false;
            } else {
                state.side_panel_open = true;
                state.side_panel_tab = tab;
                state.start_menu_open = false;
            }
        }
        DesktopAction::LockSystem => {
            if let Some(cue) = session::lock(state) {
                *interaction = InteractionState::default();
                effects.push(RuntimeEffect::PlaySound(cue));
            }
        }
        DesktopAction::UnlockSystem => {
            if let Some(cue) = session::unlock(state) {
                effects.push(RuntimeEffect::PlaySound(cue));
            }
        }
        DesktopAction::ShowLoginView => {
            session::show_login_view(state);
            *interaction = InteractionState::default();
        }
        DesktopAction::LoginSession => {
            let cue = session::login(state);
            effects.push(RuntimeEffect::PlaySound(cue));
        }
        DesktopAction::RestartSession => {
            let cue = session::restart(state);
            *interaction = InteractionState::default();
            effects.push(RuntimeEffect::CancelAllToastExpiries);
            effects.push(RuntimeEffect::StopSoundSequences);
            effects.push(RuntimeEffect::PlaySound(cue));
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::PushNotification { record, play_sound } => {
            let id = record.id.clone();
            notifications::push(state, record);
            effects.push(RuntimeEffect::ScheduleToastExpiry(id));
            if play_sound {
                effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::Notify)));
            }
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::RaiseError { stamp, message } => {
            let record = NotificationRecord::new(stamp, ERROR_TITLE, message, NotificationLevel::Error);
            push_error(state, record, &mut effects);
        }
        DesktopAction::DismissToast { id } => {
            notifications::dismiss_toast(state, &id);
            effects.push(RuntimeEffect::CancelToastExpiry(id));
        }
        DesktopAction::DismissHistory { id } => {
            if notifications::dismiss_history(state, &id) {
                effects.push(RuntimeEffect::PersistSnapshot);
            }
            effects.push(RuntimeEffect::CancelToastExpiry(id));
        }
        DesktopAction::ClearHistory => {
            notifications::clear_all(state);
            effects.push(RuntimeEffect::CancelAllToastExpiries);
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::DeleteFile { item_id, stamp } => {
            let Some(index) = state.files.iter().position(|item| item.id == item_id) else {
                return Err(ReducerError::FileNotFound(item_id));
            };
            if state.files[index].locked {
                let message = format!("{} is protected by system policy.", state.files[index].name);
                let record =
                    NotificationRecord::new(stamp, DELETE_FAILED_TITLE, message, NotificationLevel::Error);
                push_error(state, record, &mut effects);
            } else {
                state.files.remove(index);
                effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::Recycle)));
                effects.push(RuntimeEffect::PersistSnapshot);
            }
        }
        DesktopAction::ResetFileSystem => {
            state.files = initial_files();
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::SetNotes { text } => {
            state.notes = text;
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::HydrateSnapshot { snapshot } => {
            *state = DesktopState::from_snapshot(snapshot);
            *interaction = InteractionState::default();
            effects.push(RuntimeEffect::CancelAllToastExpiries);
        }
        // Handled by the preference and icon sub-reducers above.
        _ => {}
    }

    Ok(effects)
}

fn push_error(
    state: &mut DesktopState,
    record: NotificationRecord,
    effects: &mut Vec<RuntimeEffect>,
) {
    let id = record.id.clone();
    notifications::push(state, record);
    effects.push(RuntimeEffect::ScheduleToastExpiry(id));
    effects.push(RuntimeEffect::PlaySound(SoundCue::new(SoundEvent::Error)));
    effects.push(RuntimeEffect::PersistSnapshot);
}

fn release_window_capture(interaction: &mut InteractionState, window_id: WindowId) {
    if interaction
        .dragging
        .as_ref()
        .is_some_and(|session| session.window_id == window_id)
    {
        interaction.dragging = None;
    }
    if interaction
        .resizing
        .as_ref()
        .is_some_and(|session| session.window_id == window_id)
    {
        interaction.resizing = None;
    }
}

/// Window, menu and icon-drag actions are only reachable from the desktop.
fn requires_active_session(action: &DesktopAction) -> bool {
    matches!(
        action,
        DesktopAction::CloseWindow { .. }
            | DesktopAction::MinimizeWindow { .. }
            | DesktopAction::ToggleMaximize { .. }
            | DesktopAction::FocusWindow { .. }
            | DesktopAction::RestoreWindow { .. }
            | DesktopAction::UpdateWindowBounds { .. }
            | DesktopAction::SetSnapPreview { .. }
            | DesktopAction::ApplySnap { .. }
            | DesktopAction::BeginMove { .. }
            | DesktopAction::BeginResize { .. }
            | DesktopAction::SetStartMenuOpen { open: true }
            | DesktopAction::ToggleStartMenu
            | DesktopAction::OpenSidePanel { .. }
            | DesktopAction::ToggleSidePanel { .. }
            | DesktopAction::SetSidePanelTab { .. }
            | DesktopAction::BeginIconDrag { .. }
    )
}
