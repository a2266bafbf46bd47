//! Typed host capability contracts used by the PurpleOS desktop store.
//!
//! The store never touches browser or OS APIs directly. Persistence, audio output, tone
//! synthesis, uploaded files and the wall clock are reached through the traits in this crate,
//! each with a no-op adapter for unsupported targets and an in-memory adapter for tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod audio;
pub mod storage;
pub mod time;
pub mod upload;

pub use audio::{
    AudioPlayback, NoopAudio, PlaybackRequest, RecordingAudio, ToneSpec, ToneSynth, Waveform,
};
pub use storage::{
    save_json_with, KeyValueFuture, KeyValueStore, MemoryKeyValueStore, NoopKeyValueStore,
};
pub use time::{unix_time_ms_now, Clock, ManualClock, SystemClock};
pub use upload::{MemoryUploadedFile, UploadFuture, UploadedFile};
