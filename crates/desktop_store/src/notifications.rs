//! Bounded toast queue and notification history.

use crate::model::{DesktopState, NotificationId, NotificationRecord};

pub const MAX_TOASTS: usize = 6;
pub const MAX_HISTORY: usize = 120;
/// Toast lifetime before auto-dismissal.
pub const TOAST_LIFETIME_MS: u64 = 4_500;
pub const ERROR_TITLE: &str = "Error";

/// Formats a notification id from its creation time and a per-store sequence number.
pub fn notification_id(created_at_ms: u64, sequence: u64) -> NotificationId {
    NotificationId(format!("ntf-{created_at_ms}-{sequence:x}"))
}

/// Prepends `record`, dropping any older entry with the same id and trimming to `max`.
pub fn prepend_bounded(list: &mut Vec<NotificationRecord>, record: NotificationRecord, max: usize) {
    list.retain(|entry| entry.id != record.id);
    list.insert(0, record);
    list.truncate(max);
}

/// Adds `record` to both the toast queue and the history.
pub fn push(state: &mut DesktopState, record: NotificationRecord) {
    prepend_bounded(&mut state.toasts, record.clone(), MAX_TOASTS);
    prepend_bounded(&mut state.notification_history, record, MAX_HISTORY);
}

pub fn dismiss_toast(state: &mut DesktopState, id: &NotificationId) -> bool {
    let before = state.toasts.len();
    state.toasts.retain(|entry| &entry.id != id);
    state.toasts.len() != before
}

/// Removes `id` from the history and, if still shown, from the toasts.
pub fn dismiss_history(state: &mut DesktopState, id: &NotificationId) -> bool {
    let before = state.notification_history.len();
    state.notification_history.retain(|entry| &entry.id != id);
    let toast_removed = dismiss_toast(state, id);
    toast_removed || state.notification_history.len() != before
}

pub fn clear_all(state: &mut DesktopState) {
    state.toasts.clear();
    state.notification_history.clear();
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{NotificationLevel, NotificationStamp};

    fn record(n: u64) -> NotificationRecord {
        NotificationRecord::new(
            NotificationStamp {
                id: notification_id(1_000, n),
                created_at_ms: 1_000,
            },
            "Title",
            format!("message {n}"),
            NotificationLevel::Info,
        )
    }

    #[test]
    fn lists_stay_bounded_under_heavy_push_volume() {
        let mut state = DesktopState::default();
        for n in 0..500 {
            push(&mut state, record(n));
            assert!(state.toasts.len() <= MAX_TOASTS);
            assert!(state.notification_history.len() <= MAX_HISTORY);
        }
        assert_eq!(state.toasts.len(), MAX_TOASTS);
        assert_eq!(state.notification_history.len(), MAX_HISTORY);
        assert_eq!(state.toasts[0].message, "message 499");
    }

    #[test]
    fn pushing_an_existing_id_moves_it_to_the_front() {
        let mut state = DesktopState::default();
        push(&mut state, record(1));
        push(&mut state, record(2));
        push(&mut state, record(1));
        let ids = state
            .notification_history
            .iter()
            .map(|entry| entry.id.0.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["ntf-1000-1", "ntf-1000-2"]);
    }

    #[test]
    fn dismissing_history_also_drops_the_toast() {
        let mut state = DesktopState::default();
        push(&mut state, record(10));
        assert!(dismiss_history(&mut state, &notification_id(1_000, 10)));
        assert!(state.toasts.is_empty());
        assert!(state.notification_history.is_empty());
        assert!(!dismiss_history(&mut state, &notification_id(1_000, 10)));
    }

    #[test]
    fn dismissing_a_toast_keeps_history() {
        let mut state = DesktopState::default();
        push(&mut state, record(3));
        assert!(dismiss_toast(&mut state, &notification_id(1_000, 3)));
        assert_eq!(state.notification_history.len(), 1);
    }

    #[test]
    fn ids_use_hex_sequence() {
        assert_eq!(notification_id(5, 255).0, "ntf-5-ff");
    }
}
