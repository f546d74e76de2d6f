// MangaJaNai conversion core - job validation and worker orchestration
//
// This library contains the engine behind the converter UI: it predicts and
// validates the work a configuration implies, launches the external upscale
// worker, and tracks its progress and output in real time. The presentation
// layer is a visual form over this crate.

pub mod console;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use console::ConsoleLogBuffer;
pub use models::{ImageFormat, InputMode, JobConfig, RunPhase, UpscaleState};
pub use services::{JobError, JobRunner, RunOutcome, ValidationResult, WorkPlan, WorkerSpec};
pub use state::{StateChange, StateManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
