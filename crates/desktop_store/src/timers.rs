//! Deadline queue for toast expiry and sound-sequence steps.
//!
//! The store owns one queue and drains it from [`crate::DesktopStore::advance_timers`]. Nothing
//! here reads a clock; callers pass timestamps in.

use crate::{
    model::NotificationId,
    sound::{SoundCue, SoundSequence},
};

#[derive(Debug, Clone, PartialEq)]
/// Work scheduled for later.
pub enum TimerTask {
    /// Hide a toast whose lifetime elapsed.
    DismissToast(NotificationId),
    /// Play one step of a running sequence.
    PlayCue {
        sequence: SoundSequence,
        cue: SoundCue,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct ScheduledTask {
    due_at_ms: u64,
    order: u64,
    task: TimerTask,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: Vec<ScheduledTask>,
    next_order: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_at_ms: u64, task: TimerTask) {
        let order = self.next_order;
        self.next_order += 1;
        self.entries.push(ScheduledTask {
            due_at_ms,
            order,
            task,
        });
    }

    /// Replaces any pending expiry for the same toast.
    pub fn schedule_toast_expiry(&mut self, id: NotificationId, due_at_ms: u64) {
        self.cancel_toast(&id);
        self.schedule(due_at_ms, TimerTask::DismissToast(id));
    }

    /// Schedules every step of `sequence` relative to `started_at_ms`.
    pub fn schedule_sequence(&mut self, sequence: SoundSequence, started_at_ms: u64) {
        for (offset_ms, cue) in sequence.steps() {
            self.schedule(
                started_at_ms + offset_ms,
                TimerTask::PlayCue { sequence, cue },
            );
        }
    }

    pub fn cancel_toast(&mut self, id: &NotificationId) -> bool {
        self.remove_where(|task| matches!(task, TimerTask::DismissToast(pending) if pending == id))
    }

    pub fn cancel_all_toasts(&mut self) -> bool {
        self.remove_where(|task| matches!(task, TimerTask::DismissToast(_)))
    }

    pub fn cancel_sequence(&mut self, sequence: SoundSequence) -> bool {
        self.remove_where(
            |task| matches!(task, TimerTask::PlayCue { sequence: pending, .. } if *pending == sequence),
        )
    }

    pub fn cancel_all_sequences(&mut self) -> bool {
        self.remove_where(|task| matches!(task, TimerTask::PlayCue { .. }))
    }

    /// Whether any step of `sequence` is still pending.
    pub fn is_running(&self, sequence: SoundSequence) -> bool {
        self.entries.iter().any(
            |entry| matches!(&entry.task, TimerTask::PlayCue { sequence: pending, .. } if *pending == sequence),
        )
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.entries.iter().map(|entry| entry.due_at_ms).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns every task due at or before `now_ms`, in deadline then insertion order.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<TimerTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.due_at_ms <= now_ms);
        self.entries = pending;
        due.sort_by_key(|entry| (entry.due_at_ms, entry.order));
        due.into_iter().map(|entry| entry.task).collect()
    }

    fn remove_where(&mut self, predicate: impl Fn(&TimerTask) -> bool) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| !predicate(&entry.task));
        self.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sound::SoundEvent;

    fn toast(n: &str) -> NotificationId {
        NotificationId(n.to_string())
    }

    #[test]
    fn drains_in_deadline_then_insertion_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(300, TimerTask::DismissToast(toast("c")));
        queue.schedule(100, TimerTask::DismissToast(toast("a")));
        queue.schedule(100, TimerTask::DismissToast(toast("b")));
        assert_eq!(queue.next_due_ms(), Some(100));

        assert_eq!(queue.drain_due(99), Vec::new());
        assert_eq!(
            queue.drain_due(200),
            vec![
                TimerTask::DismissToast(toast("a")),
                TimerTask::DismissToast(toast("b")),
            ]
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn rescheduling_a_toast_replaces_its_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule_toast_expiry(toast("a"), 100);
        queue.schedule_toast_expiry(toast("a"), 500);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_due(100), Vec::new());
        assert!(queue.cancel_toast(&toast("a")));
        assert!(queue.is_empty());
    }

    #[test]
    fn sequences_can_be_cancelled_independently() {
        let mut queue = TimerQueue::new();
        queue.schedule_sequence(SoundSequence::SoundboardDemo, 1_000);
        queue.schedule_sequence(SoundSequence::BootChime, 1_000);
        queue.schedule_toast_expiry(toast("t"), 5_000);
        assert!(queue.is_running(SoundSequence::SoundboardDemo));

        assert!(queue.cancel_sequence(SoundSequence::SoundboardDemo));
        assert!(!queue.is_running(SoundSequence::SoundboardDemo));
        assert!(queue.is_running(SoundSequence::BootChime));

        let first = queue.drain_due(1_000);
        assert_eq!(
            first,
            vec![TimerTask::PlayCue {
                sequence: SoundSequence::BootChime,
                cue: SoundCue::scaled(SoundEvent::Boot, 0.65),
            }]
        );
        queue.cancel_all_sequences();
        assert_eq!(queue.len(), 1, "toast expiry survives");
        assert!(queue.cancel_all_toasts());
        assert!(!queue.cancel_all_toasts());
    }
}
