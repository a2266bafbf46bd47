//! The desktop store: owns state, runs the reducer, executes effects and notifies subscribers.
//!
//! Every operation funnels through [`DesktopStore::dispatch`], so each call is one synchronous
//! transition followed by at most one sound. Persistence is deferred: transitions only mark the
//! snapshot dirty and [`DesktopStore::flush_persistence`] writes it.

use std::{collections::BTreeMap, rc::Rc};

use leptos::logging;
use platform_host::{Clock, UploadedFile};
use serde_json::Value;

use crate::{
    apps::DESKTOP_SHORTCUTS,
    codec::{Correction, CorrectionAction, SoundConfigDocument},
    host::DesktopHostContext,
    icon_layout::resolved_positions,
    model::{
        AppId, DesktopSnapshot, DesktopState, FileItem, IconPosition, IconSizeTier,
        InteractionState, NotificationId, NotificationLevel, NotificationRecord, NotificationStamp,
        PointerPosition, ResizeEdge, SidePanelTab, SnapZone, Viewport, WindowBoundsPatch,
        WindowId,
    },
    notifications::{notification_id, TOAST_LIFETIME_MS},
    persistence::{load_snapshot, save_snapshot, LoadOutcome, PersistenceError},
    reducer::{reduce_desktop, DesktopAction, FeedbackPolicy, ReducerError, RuntimeEffect},
    sound::{
        CustomSoundMeta, PlayOutcome, SoundCue, SoundEvent, SoundPackId, SoundRouter, SoundSequence,
    },
    timers::{TimerQueue, TimerTask},
    window_manager::peek_window_id,
};

/// Suggested file name for exported sound configurations.
pub const SOUND_CONFIG_EXPORT_FILE_NAME: &str = "purpleos-sound-config.json";

/// Handle returned by [`DesktopStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Rc<dyn Fn(&DesktopState)>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Options for [`DesktopStore::push_notification`].
pub struct NotifyOptions {
    pub level: NotificationLevel,
    pub app_id: Option<AppId>,
    pub play_sound: bool,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            level: NotificationLevel::Info,
            app_id: None,
            play_sound: true,
        }
    }
}

pub struct DesktopStore {
    state: DesktopState,
    interaction: InteractionState,
    host: DesktopHostContext,
    clock: Rc<dyn Clock>,
    sound: SoundRouter,
    timers: TimerQueue,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    notification_sequence: u64,
    persist_pending: bool,
}

impl DesktopStore {
    pub fn new(host: DesktopHostContext) -> Self {
        Self {
            state: DesktopState::default(),
            interaction: InteractionState::default(),
            clock: host.clock(),
            sound: host.sound_router(),
            host,
            timers: TimerQueue::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            notification_sequence: 0,
            persist_pending: false,
        }
    }

    pub fn state(&self) -> &DesktopState {
        &self.state
    }

    /// In-flight drag, resize and icon-drag records.
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn host(&self) -> &DesktopHostContext {
        &self.host
    }

    /// Registers `subscriber` to receive the state after every change.
    ///
    /// Subscribers run while the store is mutably borrowed and must not call back into it.
    pub fn subscribe(&mut self, subscriber: impl Fn(&DesktopState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Rc::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(entry, _)| *entry != id);
        self.subscribers.len() != before
    }

    /// Applies `action`, executes its effects and notifies subscribers on change.
    ///
    /// # Errors
    ///
    /// Returns the reducer's rejection after surfacing it as [`ReducerError::feedback`] asks.
    pub fn dispatch(&mut self, action: DesktopAction) -> Result<(), ReducerError> {
        let previous_state = self.state.clone();
        let previous_interaction = self.interaction.clone();
        match reduce_desktop(&mut self.state, &mut self.interaction, action) {
            Ok(effects) => {
                for effect in effects {
                    self.run_effect(effect);
                }
                if self.state != previous_state || self.interaction != previous_interaction {
                    self.notify_subscribers();
                }
                Ok(())
            }
            Err(err) => {
                self.reject(&err);
                Err(err)
            }
        }
    }

    fn reject(&mut self, err: &ReducerError) {
        logging::warn!("desktop action rejected: {err}");
        match err.feedback() {
            FeedbackPolicy::Silent => {}
            FeedbackPolicy::Cue => {
                self.sound
                    .play(&self.state.sound, SoundCue::new(SoundEvent::Error));
            }
            FeedbackPolicy::CueAndNotify => {
                let stamp = self.next_stamp();
                let _ = self.dispatch(DesktopAction::RaiseError {
                    stamp,
                    message: err.to_string(),
                });
            }
        }
    }

    fn run_effect(&mut self, effect: RuntimeEffect) {
        match effect {
            RuntimeEffect::PlaySound(cue) => {
                self.sound.play(&self.state.sound, cue);
            }
            RuntimeEffect::PersistSnapshot => self.persist_pending = true,
            RuntimeEffect::ScheduleToastExpiry(id) => {
                let due_at_ms = self.clock.now_ms() + TOAST_LIFETIME_MS;
                self.timers.schedule_toast_expiry(id, due_at_ms);
            }
            RuntimeEffect::CancelToastExpiry(id) => {
                self.timers.cancel_toast(&id);
            }
            RuntimeEffect::CancelAllToastExpiries => {
                self.timers.cancel_all_toasts();
            }
            RuntimeEffect::StopSoundSequences => {
                self.timers.cancel_all_sequences();
            }
        }
    }

    fn notify_subscribers(&self) {
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.state);
        }
    }

    fn next_stamp(&mut self) -> NotificationStamp {
        let created_at_ms = self.clock.now_ms();
        self.notification_sequence += 1;
        NotificationStamp {
            id: notification_id(created_at_ms, self.notification_sequence),
            created_at_ms,
        }
    }

    // Windows

    pub fn open_app(&mut self, app_id: AppId) -> WindowId {
        let window_id = peek_window_id(&self.state);
        // Opening is never gated and never rejected.
        let _ = self.dispatch(DesktopAction::OpenApp { app_id });
        window_id
    }

    /// Opens an app by its string id.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::UnknownApp`] (after playing the error cue) for ids outside the
    /// registry.
    pub fn open_app_named(&mut self, app_id: &str) -> Result<WindowId, ReducerError> {
        match app_id.parse::<AppId>() {
            Ok(app_id) => Ok(self.open_app(app_id)),
            Err(_) => {
                let err = ReducerError::UnknownApp(app_id.to_string());
                self.reject(&err);
                Err(err)
            }
        }
    }

    pub fn close_window(&mut self, window_id: WindowId) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::CloseWindow { window_id })
    }

    pub fn minimize_window(&mut self, window_id: WindowId) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::MinimizeWindow { window_id })
    }

    pub fn toggle_maximize(&mut self, window_id: WindowId) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ToggleMaximize { window_id })
    }

    pub fn focus_window(&mut self, window_id: WindowId) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::FocusWindow { window_id })
    }

    pub fn restore_window(&mut self, window_id: WindowId) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::RestoreWindow { window_id })
    }

    pub fn update_window_bounds(
        &mut self,
        window_id: WindowId,
        patch: WindowBoundsPatch,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::UpdateWindowBounds { window_id, patch })
    }

    pub fn set_snap_preview(&mut self, zone: Option<SnapZone>) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetSnapPreview { zone })
    }

    pub fn apply_snap(
        &mut self,
        window_id: WindowId,
        zone: SnapZone,
        viewport: Viewport,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ApplySnap {
            window_id,
            zone,
            viewport,
        })
    }

    pub fn begin_move(
        &mut self,
        window_id: WindowId,
        pointer: PointerPosition,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::BeginMove { window_id, pointer })
    }

    pub fn update_move(
        &mut self,
        pointer: PointerPosition,
        viewport: Viewport,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::UpdateMove { pointer, viewport })
    }

    pub fn end_move(&mut self, viewport: Viewport) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::EndMove { viewport })
    }

    pub fn begin_resize(
        &mut self,
        window_id: WindowId,
        edge: ResizeEdge,
        pointer: PointerPosition,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::BeginResize {
            window_id,
            edge,
            pointer,
        })
    }

    pub fn update_resize(&mut self, pointer: PointerPosition) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::UpdateResize { pointer })
    }

    pub fn end_resize(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::EndResize)
    }

    // Menus

    pub fn set_start_menu_open(&mut self, open: bool) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetStartMenuOpen { open })
    }

    pub fn toggle_start_menu(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ToggleStartMenu)
    }

    pub fn open_side_panel(&mut self, tab: SidePanelTab) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::OpenSidePanel { tab })
    }

    pub fn close_side_panel(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::CloseSidePanel)
    }

    pub fn toggle_side_panel(&mut self, tab: SidePanelTab) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ToggleSidePanel { tab })
    }

    pub fn set_side_panel_tab(&mut self, tab: SidePanelTab) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetSidePanelTab { tab })
    }

    // Session

    pub fn lock(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::LockSystem)
    }

    pub fn unlock(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::UnlockSystem)
    }

    pub fn show_login_view(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ShowLoginView)
    }

    pub fn login(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::LoginSession)
    }

    pub fn restart(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::RestartSession)
    }

    // Notifications

    pub fn push_notification(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        options: NotifyOptions,
    ) -> NotificationId {
        let stamp = self.next_stamp();
        let record = NotificationRecord::new(stamp, title, message, options.level)
            .from_app(options.app_id);
        let id = record.id.clone();
        let _ = self.dispatch(DesktopAction::PushNotification {
            record,
            play_sound: options.play_sound,
        });
        id
    }

    pub fn raise_error(&mut self, message: impl Into<String>) -> NotificationId {
        let stamp = self.next_stamp();
        let id = stamp.id.clone();
        let _ = self.dispatch(DesktopAction::RaiseError {
            stamp,
            message: message.into(),
        });
        id
    }

    pub fn dismiss_toast(&mut self, id: NotificationId) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::DismissToast { id })
    }

    pub fn dismiss_history(&mut self, id: NotificationId) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::DismissHistory { id })
    }

    pub fn clear_history(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ClearHistory)
    }

    // Files and notes

    pub fn delete_file(&mut self, item_id: impl Into<String>) -> Result<(), ReducerError> {
        let stamp = self.next_stamp();
        self.dispatch(DesktopAction::DeleteFile {
            item_id: item_id.into(),
            stamp,
        })
    }

    pub fn reset_file_system(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ResetFileSystem)
    }

    pub fn files(&self) -> &[FileItem] {
        &self.state.files
    }

    pub fn set_notes(&mut self, text: impl Into<String>) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetNotes { text: text.into() })
    }

    // Settings

    pub fn set_accent(&mut self, accent: impl Into<String>) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetAccent {
            accent: accent.into(),
        })
    }

    pub fn set_wallpaper(&mut self, wallpaper_id: impl Into<String>) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetWallpaper {
            wallpaper_id: wallpaper_id.into(),
        })
    }

    pub fn set_reduced_motion(&mut self, enabled: bool) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetReducedMotion { enabled })
    }

    pub fn set_show_credit_line(&mut self, enabled: bool) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetShowCreditLine { enabled })
    }

    // Desktop icons

    /// Where every desktop shortcut is drawn for `viewport`, including an active drag.
    pub fn icon_positions(&self, viewport: Viewport) -> BTreeMap<AppId, IconPosition> {
        resolved_positions(
            &DESKTOP_SHORTCUTS,
            &self.state.desktop,
            viewport,
            self.interaction.icon_drag.as_ref(),
        )
    }

    pub fn set_desktop_snap_to_grid(&mut self, enabled: bool) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetDesktopSnapToGrid { enabled })
    }

    pub fn set_desktop_icon_size(&mut self, size: IconSizeTier) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetDesktopIconSize { size })
    }

    pub fn set_desktop_icon_position(
        &mut self,
        app_id: AppId,
        position: IconPosition,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetDesktopIconPosition { app_id, position })
    }

    pub fn reset_desktop_icon_layout(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ResetDesktopIconLayout)
    }

    pub fn begin_icon_drag(
        &mut self,
        app_id: AppId,
        pointer: PointerPosition,
        viewport: Viewport,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::BeginIconDrag {
            app_id,
            pointer,
            viewport,
        })
    }

    pub fn update_icon_drag(
        &mut self,
        pointer: PointerPosition,
        viewport: Viewport,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::UpdateIconDrag { pointer, viewport })
    }

    /// Releases or cancels the icon drag.
    pub fn end_icon_drag(&mut self, viewport: Viewport) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::EndIconDrag { viewport })
    }

    // Sound

    pub fn set_volume(&mut self, volume: f64) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetVolume { volume })
    }

    pub fn toggle_mute(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ToggleMute)
    }

    pub fn set_pack(&mut self, pack_id: SoundPackId) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetPack { pack_id })
    }

    /// Selects a pack by its string id. Unknown ids are ignored.
    pub fn set_pack_named(&mut self, pack_id: &str) -> Result<(), ReducerError> {
        match pack_id.parse::<SoundPackId>() {
            Ok(pack_id) => self.set_pack(pack_id),
            Err(err) => {
                logging::warn!("ignoring sound pack: {err}");
                Ok(())
            }
        }
    }

    pub fn set_mapping(
        &mut self,
        event: SoundEvent,
        source: Option<String>,
        meta: Option<CustomSoundMeta>,
    ) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetMapping {
            event,
            source,
            meta,
        })
    }

    pub fn reset_sounds(&mut self) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::ResetSounds)
    }

    pub fn set_click_feedback_enabled(&mut self, enabled: bool) -> Result<(), ReducerError> {
        self.dispatch(DesktopAction::SetClickSoftEnabled { enabled })
    }

    /// Reads `file` and maps it to `event`.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::CustomSoundRejected`] (after raising an error notification) when no
    /// file was given or it could not be read.
    pub async fn set_custom_sound(
        &mut self,
        event: SoundEvent,
        file: Option<&dyn UploadedFile>,
    ) -> Result<(), ReducerError> {
        let upload = self.sound.create_custom_sound(file).await;
        self.dispatch(DesktopAction::ApplyCustomSound { event, upload })
    }

    /// Applies an already-parsed sound-config document.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::InvalidSoundConfig`] when `payload` is not a JSON object.
    pub fn import_sound_config(
        &mut self,
        file_name: &str,
        payload: Value,
    ) -> Result<(), ReducerError> {
        let stamp = self.next_stamp();
        self.dispatch(DesktopAction::ImportSoundConfig {
            payload,
            file_name: file_name.to_string(),
            stamp,
        })
    }

    /// Parses and applies sound-config text.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::InvalidSoundConfig`] when the text is not a JSON object.
    pub fn import_sound_config_text(
        &mut self,
        file_name: &str,
        text: &str,
    ) -> Result<(), ReducerError> {
        match serde_json::from_str::<Value>(text) {
            Ok(payload) => self.import_sound_config(file_name, payload),
            Err(parse_err) => {
                logging::warn!("sound config `{file_name}` is not JSON: {parse_err}");
                let err = ReducerError::InvalidSoundConfig;
                self.reject(&err);
                Err(err)
            }
        }
    }

    /// Reads an uploaded sound-config file and applies it.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::InvalidSoundConfig`] when the file cannot be read or parsed.
    pub async fn import_sound_config_file(
        &mut self,
        file: &dyn UploadedFile,
    ) -> Result<(), ReducerError> {
        match file.read_text().await {
            Ok(text) => self.import_sound_config_text(file.name(), &text),
            Err(read_err) => {
                logging::warn!("could not read sound config `{}`: {read_err}", file.name());
                let err = ReducerError::InvalidSoundConfig;
                self.reject(&err);
                Err(err)
            }
        }
    }

    /// Pretty JSON for the current sound configuration. Save it as
    /// [`SOUND_CONFIG_EXPORT_FILE_NAME`].
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_sound_config(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&SoundConfigDocument::from(&self.state.sound))
    }

    pub fn play_event(&self, event: SoundEvent, volume_multiplier: f64) -> PlayOutcome {
        self.sound
            .play(&self.state.sound, SoundCue::scaled(event, volume_multiplier))
    }

    pub fn play_click_feedback(&self) -> PlayOutcome {
        self.sound.play_click_feedback(&self.state.sound)
    }

    pub fn preload_sounds(&self) {
        self.sound.preload(&self.state.sound);
    }

    /// Host hook for playback that failed after it started.
    pub fn report_playback_failure(&self, cue: SoundCue) -> PlayOutcome {
        self.sound.report_playback_failure(&self.state.sound, cue)
    }

    /// Plays the boot chime once per host lifetime. Returns whether it started.
    pub fn run_boot_sequence(&mut self) -> bool {
        if self.host.has_booted() {
            return false;
        }
        self.host.mark_booted();
        self.timers.cancel_sequence(SoundSequence::BootChime);
        self.timers
            .schedule_sequence(SoundSequence::BootChime, self.clock.now_ms());
        self.advance_timers();
        true
    }

    /// Starts `sequence`, or stops it when it is already running. Returns whether it started.
    pub fn start_sound_sequence(&mut self, sequence: SoundSequence) -> bool {
        if self.timers.is_running(sequence) {
            self.timers.cancel_sequence(sequence);
            return false;
        }
        if sequence.refused_while_muted() && self.state.sound.muted {
            logging::log!("{sequence:?} skipped while muted");
            return false;
        }
        self.timers.schedule_sequence(sequence, self.clock.now_ms());
        self.advance_timers();
        true
    }

    pub fn stop_sound_sequence(&mut self, sequence: SoundSequence) -> bool {
        self.timers.cancel_sequence(sequence)
    }

    pub fn is_sequence_running(&self, sequence: SoundSequence) -> bool {
        self.timers.is_running(sequence)
    }

    /// Earliest pending timer deadline, for hosts that schedule their own wake-ups.
    pub fn next_timer_due_ms(&self) -> Option<u64> {
        self.timers.next_due_ms()
    }

    /// Runs every timer due at the current clock time. Returns how many fired.
    pub fn advance_timers(&mut self) -> usize {
        let due = self.timers.drain_due(self.clock.now_ms());
        let fired = due.len();
        for task in due {
            match task {
                TimerTask::DismissToast(id) => {
                    let _ = self.dispatch(DesktopAction::DismissToast { id });
                }
                TimerTask::PlayCue { cue, .. } => {
                    self.sound.play(&self.state.sound, cue);
                }
            }
        }
        fired
    }

    // Persistence

    /// Loads the persisted snapshot and replaces durable state with it.
    ///
    /// Returns the corrections applied while sanitizing. A discarded corrupt entry is reported as
    /// a single `$` correction.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the storage adapter fails; state is left untouched.
    pub async fn hydrate(&mut self) -> Result<Vec<Correction>, PersistenceError> {
        let storage = self.host.storage();
        let key = self.host.config().storage_key.clone();
        let outcome = load_snapshot(storage.as_ref(), &key, self.clock.now_ms())
            .await
            .map_err(|err| {
                logging::warn!("snapshot load failed: {err}");
                err
            })?;
        match outcome {
            LoadOutcome::Empty => Ok(Vec::new()),
            LoadOutcome::Discarded { .. } => Ok(vec![Correction {
                path: "$".to_string(),
                action: CorrectionAction::Dropped,
            }]),
            LoadOutcome::Restored(decoded) => {
                let _ = self.dispatch(DesktopAction::HydrateSnapshot {
                    snapshot: decoded.snapshot,
                });
                self.persist_pending = false;
                Ok(decoded.corrections)
            }
        }
    }

    /// Whether durable state changed since the last successful write.
    pub fn is_persist_pending(&self) -> bool {
        self.persist_pending
    }

    /// Takes the snapshot to write, clearing the pending flag. `None` when nothing changed.
    ///
    /// Hosts that write outside the store call [`DesktopStore::mark_persist_failed`] on failure.
    pub fn take_pending_snapshot(&mut self) -> Option<DesktopSnapshot> {
        if !self.persist_pending {
            return None;
        }
        self.persist_pending = false;
        Some(self.state.snapshot())
    }

    pub fn mark_persist_failed(&mut self) {
        self.persist_pending = true;
    }

    /// Writes the snapshot if durable state changed. Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails; the snapshot stays pending.
    pub async fn flush_persistence(&mut self) -> Result<bool, PersistenceError> {
        let Some(snapshot) = self.take_pending_snapshot() else {
            return Ok(false);
        };
        let storage = self.host.storage();
        let key = self.host.config().storage_key.clone();
        match save_snapshot(storage.as_ref(), &key, &snapshot, self.clock.now_ms()).await {
            Ok(()) => Ok(true),
            Err(err) => {
                logging::warn!("snapshot write failed: {err}");
                self.mark_persist_failed();
                Err(err)
            }
        }
    }
}
