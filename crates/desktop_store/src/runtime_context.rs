//! Leptos context wiring for the desktop store.
//!
//! The store stays a plain Rust value behind `Rc<RefCell<_>>`; this module republishes its state
//! into signals after every operation so views re-render from snapshots.
#![allow(clippy::clone_on_copy)]

use std::{cell::RefCell, rc::Rc};

use leptos::*;

use crate::{
    codec::Correction,
    host::DesktopHostContext,
    model::{DesktopState, InteractionState},
    persistence::{load_snapshot, save_snapshot, LoadOutcome, PersistenceError},
    reducer::{DesktopAction, ReducerError},
    store::DesktopStore,
};

#[derive(Clone, Copy)]
/// Leptos context for reading desktop state and driving the [`DesktopStore`].
pub struct DesktopRuntimeContext {
    /// Reactive desktop state signal.
    pub state: RwSignal<DesktopState>,
    /// Reactive pointer/drag/resize interaction state signal.
    pub interaction: RwSignal<InteractionState>,
    /// The store itself. Borrowed only inside [`DesktopRuntimeContext::update`].
    pub store: StoredValue<Rc<RefCell<DesktopStore>>>,
}

impl DesktopRuntimeContext {
    pub fn new(host: DesktopHostContext) -> Self {
        let store = DesktopStore::new(host);
        let state = create_rw_signal(store.state().clone());
        let interaction = create_rw_signal(store.interaction().clone());
        Self {
            state,
            interaction,
            store: store_value(Rc::new(RefCell::new(store))),
        }
    }

    /// Runs `f` against the store, then publishes whatever changed.
    ///
    /// Signals are written after the store borrow is released so effects that read the store
    /// from a signal subscription do not hit a double borrow.
    pub fn update<R>(&self, f: impl FnOnce(&mut DesktopStore) -> R) -> R {
        let store = self.store.get_value();
        let (result, state, interaction) = {
            let mut store = store.borrow_mut();
            let result = f(&mut store);
            (result, store.state().clone(), store.interaction().clone())
        };
        if self.state.with_untracked(|current| current != &state) {
            self.state.set(state);
        }
        if self.interaction.with_untracked(|current| current != &interaction) {
            self.interaction.set(interaction);
        }
        result
    }

    /// Dispatches an action through the store and publishes the result.
    ///
    /// # Errors
    ///
    /// Returns the store's rejection; feedback has already been played or shown.
    pub fn dispatch_action(&self, action: DesktopAction) -> Result<(), ReducerError> {
        self.update(|store| store.dispatch(action))
    }

    /// Writes the snapshot in the background when durable state changed.
    pub fn schedule_persistence(&self) {
        let store = self.store.get_value();
        let (pending, storage, key, saved_at_ms) = {
            let mut store = store.borrow_mut();
            let Some(snapshot) = store.take_pending_snapshot() else {
                return;
            };
            let host = store.host();
            (
                snapshot,
                host.storage(),
                host.config().storage_key.clone(),
                host.clock().now_ms(),
            )
        };
        spawn_local(async move {
            if let Err(err) = save_snapshot(storage.as_ref(), &key, &pending, saved_at_ms).await {
                logging::warn!("desktop snapshot persist failed: {err}");
                store.borrow_mut().mark_persist_failed();
            }
        });
    }

    /// Loads the persisted snapshot into the store and publishes it.
    pub fn install_boot_hydration(&self) {
        let runtime = *self;
        spawn_local(async move {
            let store = runtime.store.get_value();
            let host = store.borrow().host().clone();
            let key = host.config().storage_key.clone();
            let outcome =
                load_snapshot(host.storage().as_ref(), &key, host.clock().now_ms()).await;
            runtime.apply_boot_hydration(outcome);
        });
    }

    /// Publishes a finished snapshot load. Returns the repairs applied to a restored snapshot.
    ///
    /// The restored state is already durable, so it is not queued for another write.
    pub fn apply_boot_hydration(
        &self,
        outcome: Result<LoadOutcome, PersistenceError>,
    ) -> Vec<Correction> {
        match outcome {
            Ok(LoadOutcome::Restored(decoded)) => {
                for correction in &decoded.corrections {
                    logging::log!("boot hydration repaired {correction}");
                }
                if let Err(err) = self.dispatch_action(DesktopAction::HydrateSnapshot {
                    snapshot: decoded.snapshot,
                }) {
                    logging::warn!("boot hydration rejected: {err}");
                }
                self.update(|store| store.take_pending_snapshot());
                decoded.corrections
            }
            Ok(LoadOutcome::Discarded { reason }) => {
                logging::warn!("boot hydration discarded stored snapshot: {reason}");
                Vec::new()
            }
            Ok(LoadOutcome::Empty) => Vec::new(),
            Err(err) => {
                logging::warn!("desktop boot hydration failed: {err}");
                Vec::new()
            }
        }
    }
}

/// Creates a [`DesktopRuntimeContext`] and provides it to descendant components.
pub fn provide_desktop_runtime(host: DesktopHostContext) -> DesktopRuntimeContext {
    let runtime = DesktopRuntimeContext::new(host);
    provide_context(runtime);
    runtime
}

/// Returns the current [`DesktopRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside a scope where [`provide_desktop_runtime`] ran.
pub fn use_desktop_runtime() -> DesktopRuntimeContext {
    use_context::<DesktopRuntimeContext>().expect("DesktopRuntimeContext not provided")
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::MemoryKeyValueStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::RuntimeConfig,
        model::{AppId, SessionState},
        persistence::DEFAULT_STORAGE_KEY,
    };

    #[test]
    fn updates_publish_state_after_the_store_borrow_is_released() {
        let runtime = create_runtime();

        let context = DesktopRuntimeContext::new(DesktopHostContext::default());
        assert_eq!(context.state.get_untracked().session, SessionState::LockedClock);

        context.dispatch_action(DesktopAction::UnlockSystem).expect("unlock");
        assert_eq!(context.state.get_untracked().session, SessionState::LoginPrompt);

        let window_id = context.update(|store| store.open_app(AppId::Notepad));
        let published = context.state.get_untracked();
        assert_eq!(published.focused_window_id, Some(window_id));
        assert_eq!(published.session, SessionState::Active);

        runtime.dispose();
    }

    #[test]
    fn boot_hydration_publishes_repaired_state_without_queueing_a_write() {
        let runtime = create_runtime();

        let raw = serde_json::json!({
            "state": {"notes": "from last boot", "recentApps": ["terminal", "paint"]}
        })
        .to_string();
        let storage = MemoryKeyValueStore::with_entry(DEFAULT_STORAGE_KEY, raw);
        let context = DesktopRuntimeContext::new(
            DesktopHostContext::default()
                .with_storage(Rc::new(storage.clone()))
                .with_config(RuntimeConfig::default()),
        );
        let outcome = block_on(load_snapshot(&storage, DEFAULT_STORAGE_KEY, 0));
        let corrections = context.apply_boot_hydration(outcome);

        assert!(corrections.iter().any(|c| c.path == "recentApps[1]"));
        let published = context.state.get_untracked();
        assert_eq!(published.notes, "from last boot");
        assert_eq!(published.recent_apps, vec![AppId::Terminal]);
        assert_eq!(published.session, SessionState::LockedClock);
        assert!(!context.update(|store| store.is_persist_pending()));

        let failed = context.apply_boot_hydration(Err(PersistenceError::Storage {
            key: DEFAULT_STORAGE_KEY.to_string(),
            message: "quota".to_string(),
        }));
        assert_eq!(failed, Vec::new());
        assert_eq!(context.state.get_untracked().notes, "from last boot");

        runtime.dispose();
    }

    #[test]
    fn context_is_retrievable_after_provide() {
        let runtime = create_runtime();

        let provided = provide_desktop_runtime(DesktopHostContext::default());
        let used = use_desktop_runtime();
        used.dispatch_action(DesktopAction::UnlockSystem).expect("unlock");
        assert_eq!(
            provided.state.get_untracked().session,
            SessionState::LoginPrompt
        );

        runtime.dispose();
    }
}
