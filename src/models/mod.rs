//! Data models for the conversion engine.
//!
//! - [`JobConfig`]: Immutable per-run configuration snapshot (input selection,
//!   output template, format choices, numeric fields as entered)
//! - [`UpscaleState`] / [`RunPhase`]: Live state of the one in-flight run,
//!   wrapped by [`StateManager`](crate::state::StateManager) for thread-safe
//!   access
//!
//! # Architecture Note
//!
//! `JobConfig` derives `Serialize`/`Deserialize` so hosts can persist and
//! restore form snapshots; the engine itself never writes them to disk.
//! `UpscaleState` is mutated only through `StateManager::update()` so every
//! change is observable.

pub mod job_config;
pub mod job_state;

pub use job_config::{
    ImageFormat, InputMode, JobConfig, ARCHIVE_OUTPUT_EXTENSION, FILENAME_PLACEHOLDER,
};
pub use job_state::{RunPhase, UpscaleState};
