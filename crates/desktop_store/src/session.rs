//! Lock / login / restart transitions.

use crate::{
    model::{DesktopState, SessionState, SidePanelTab},
    sound::{SoundCue, SoundEvent},
};

const LOGIN_CHIME_MULTIPLIER: f64 = 0.65;
const RESTART_CHIME_MULTIPLIER: f64 = 0.65;

/// Closes menus and clears the snap preview. Applied whenever the lock or login view appears.
pub fn close_shell_overlays(state: &mut DesktopState) {
    state.start_menu_open = false;
    state.side_panel_open = false;
    state.snap_preview = None;
}

/// `Active` to `LockedClock`. Silent no-op from the clock or the login prompt.
pub fn lock(state: &mut DesktopState) -> Option<SoundCue> {
    if state.session != SessionState::Active {
        return None;
    }
    state.session = SessionState::LockedClock;
    close_shell_overlays(state);
    Some(SoundCue::new(SoundEvent::Lock))
}

/// `LockedClock` to `LoginPrompt`.
///
/// Only the clock view unlocks. A repeated unlock while the login prompt is already up is ignored
/// and plays nothing, so the cue marks the one real transition.
pub fn unlock(state: &mut DesktopState) -> Option<SoundCue> {
    if state.session != SessionState::LockedClock {
        return None;
    }
    state.session = SessionState::LoginPrompt;
    close_shell_overlays(state);
    Some(SoundCue::new(SoundEvent::Unlock))
}

/// Jumps straight to the login prompt (power menu path). Silent.
pub fn show_login_view(state: &mut DesktopState) {
    state.session = SessionState::LoginPrompt;
    close_shell_overlays(state);
}

pub fn login(state: &mut DesktopState) -> SoundCue {
    state.session = SessionState::Active;
    close_shell_overlays(state);
    SoundCue::scaled(SoundEvent::Login, LOGIN_CHIME_MULTIPLIER)
}

/// Simulated reboot: windows, focus, notifications and menus are dropped; recent apps survive.
pub fn restart(state: &mut DesktopState) -> SoundCue {
    state.windows.clear();
    state.focused_window_id = None;
    state.toasts.clear();
    state.notification_history.clear();
    state.side_panel_tab = SidePanelTab::Notifications;
    state.session = SessionState::LockedClock;
    close_shell_overlays(state);
    SoundCue::scaled(SoundEvent::Boot, RESTART_CHIME_MULTIPLIER)
}

/// Opening an app always lands on the desktop, whatever the lock state was.
pub fn force_active(state: &mut DesktopState) {
    state.session = SessionState::Active;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AppId, SnapZone};

    #[test]
    fn unlock_then_login_reaches_active_with_menus_closed() {
        let mut state = DesktopState::default();
        state.start_menu_open = true;
        assert_eq!(unlock(&mut state).map(|cue| cue.event), Some(SoundEvent::Unlock));
        assert_eq!(state.session, SessionState::LoginPrompt);
        assert!(!state.start_menu_open);

        let cue = login(&mut state);
        assert_eq!(cue.event, SoundEvent::Login);
        assert_eq!(cue.volume_multiplier, 0.65);
        assert_eq!(state.session, SessionState::Active);
        assert!(!state.start_menu_open);
        assert!(!state.side_panel_open);
    }

    #[test]
    fn lock_is_silent_when_already_locked() {
        let mut state = DesktopState::default();
        assert_eq!(lock(&mut state), None);

        state.session = SessionState::Active;
        state.side_panel_open = true;
        state.snap_preview = Some(SnapZone::Left);
        assert_eq!(lock(&mut state).map(|cue| cue.event), Some(SoundEvent::Lock));
        assert!(!state.side_panel_open);
        assert_eq!(state.snap_preview, None);
    }

    #[test]
    fn lock_from_the_login_prompt_changes_nothing() {
        let mut state = DesktopState::default();
        state.session = SessionState::LoginPrompt;
        let before = state.clone();
        assert_eq!(lock(&mut state), None);
        assert_eq!(state, before);
    }

    #[test]
    fn unlock_is_ignored_outside_the_clock_view() {
        let mut state = DesktopState::default();
        state.session = SessionState::Active;
        assert_eq!(unlock(&mut state), None);
        assert_eq!(state.session, SessionState::Active);

        state.session = SessionState::LoginPrompt;
        assert_eq!(unlock(&mut state), None);
        assert_eq!(state.session, SessionState::LoginPrompt);
    }

    #[test]
    fn restart_keeps_recent_apps_only() {
        let mut state = DesktopState::default();
        state.session = SessionState::LoginPrompt;
        state.recent_apps = vec![AppId::Terminal];
        state.side_panel_tab = SidePanelTab::QuickSettings;
        let cue = restart(&mut state);
        assert_eq!(cue.event, SoundEvent::Boot);
        assert_eq!(state.session, SessionState::LockedClock);
        assert_eq!(state.recent_apps, vec![AppId::Terminal]);
        assert_eq!(state.side_panel_tab, SidePanelTab::Notifications);
    }
}
