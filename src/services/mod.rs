//! Services module - the engine's business logic, leaf-first.
//!
//! Everything here is **framework-agnostic**: no widgets, no dialogs, only
//! the computations and orchestration a presentation layer calls into.
//!
//! # Components
//!
//! - [`classify`](classify()): extension-based input classification
//! - [`plan`](plan()): work enumeration and executable-count prediction
//! - [`validate`](validate()): configuration-completeness rules combined
//!   with the work plan into a [`ValidationResult`]
//! - [`parse_line`](parse_line()): decoder for the worker's line-oriented
//!   stdout protocol
//! - [`JobRunner`]: run orchestration - command construction, worker spawn,
//!   output pumping, cancellation, terminal-state transitions
//!
//! # Data flow
//!
//! configuration → `validate` (uses `plan`, uses `classify`) → validity +
//! status text → `JobRunner::start` → worker stdout/stderr → `parse_line` →
//! progress counters and console buffer → observers.

pub mod classify;
pub mod planner;
pub mod protocol;
pub mod runner;
pub mod validation;

pub use classify::{classify, FileKind, ARCHIVE_EXTENSIONS, IMAGE_EXTENSIONS};
pub use planner::{plan, predicted_output_path, PlannedFile, WorkPlan};
pub use protocol::{parse_line, ProgressEvent};
pub use runner::{JobError, JobRunner, RunOutcome, WorkerExit, WorkerSpec};
pub use validation::{validate, validate_with_policy, UnknownFilePolicy, ValidationResult};
