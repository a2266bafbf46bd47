//! State store for the PurpleOS simulated desktop: windows, session, notifications, desktop
//! icons, sounds and durable snapshots.

pub mod apps;
pub mod codec;
pub mod config;
pub mod filesystem;
pub mod host;
pub mod icon_layout;
pub mod model;
pub mod notifications;
pub mod persistence;
pub mod reducer;
pub mod runtime_context;
pub mod session;
pub mod sound;
pub mod store;
pub mod timers;
pub mod wallpaper;
pub mod window_manager;

pub use codec::{decode_snapshot, import_sound_config, Correction, CorrectionAction};
pub use config::RuntimeConfig;
pub use host::DesktopHostContext;
pub use model::*;
pub use persistence::{load_snapshot, save_snapshot, LoadOutcome, PersistenceError};
pub use reducer::{reduce_desktop, DesktopAction, FeedbackPolicy, ReducerError, RuntimeEffect};
pub use runtime_context::{provide_desktop_runtime, use_desktop_runtime, DesktopRuntimeContext};
pub use sound::{SoundCue, SoundEvent, SoundPackId, SoundSequence, SoundState};
pub use store::{DesktopStore, NotifyOptions, SubscriptionId, SOUND_CONFIG_EXPORT_FILE_NAME};
