// State management module
//
// Wraps UpscaleState with thread-safe access (Arc<RwLock<T>>) and emits
// change events over a broadcast channel so observers (the progress panel)
// never have to poll.

use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::models::{RunPhase, UpscaleState};

/// Change events emitted when run state is modified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateChange {
    /// The run entered a new lifecycle phase.
    PhaseChanged { phase: RunPhase },

    /// Whole-job progress moved.
    ProgressUpdated { current: usize, total: usize },

    /// Progress inside the current archive moved (or became visible).
    ArchiveProgressUpdated {
        current: usize,
        total: usize,
        visible: bool,
    },

    /// Cancellation was requested for the in-flight run.
    CancelRequested,
}

/// Thread-safe run-state holder with event emission.
///
/// Mutations go through [`update()`](Self::update), which compares the state
/// before and after and broadcasts the matching [`StateChange`] events.
/// Reads take a cheap snapshot; the run task is the only writer while a run
/// is in flight.
///
/// Cloning shares the underlying state and channel.
pub struct StateManager {
    state: Arc<RwLock<UpscaleState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(UpscaleState::default())),
            state_tx,
        }
    }

    /// A read-only copy of the current state.
    pub fn snapshot(&self) -> UpscaleState {
        self.state.read().unwrap().clone()
    }

    /// Run a closure with read access to the state.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&UpscaleState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Apply a mutation and broadcast the resulting change events.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut UpscaleState),
    {
        let mut state = self.state.write().unwrap();
        let old = state.clone();

        update_fn(&mut state);

        let changes = detect_changes(&old, &state);
        for change in &changes {
            // It's fine if nobody is listening.
            let _ = self.state_tx.send(change.clone());
        }
        changes
    }

    /// Subscribe to all future state change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    // Convenience mutators used by the run orchestration.

    /// Transition into Running and clear per-run progress.
    pub fn begin_run(&self) -> Vec<StateChange> {
        self.update(|state| state.begin_run())
    }

    /// Enter a terminal phase (Completed, Cancelled, or Failed).
    pub fn finish_run(&self, phase: RunPhase) -> Vec<StateChange> {
        debug_assert!(phase.is_terminal());
        self.update(|state| state.phase = phase)
    }

    /// Reset the progress bars from a freshly computed plan.
    pub fn apply_plan_totals(&self, total_files: usize) -> Vec<StateChange> {
        self.update(|state| state.apply_plan_total(total_files))
    }

    /// Mark cancellation as requested. Idempotent.
    pub fn request_cancel(&self) -> Vec<StateChange> {
        self.update(|state| state.cancel_requested = true)
    }

    /// One whole-job file finished.
    pub fn file_advanced(&self) -> Vec<StateChange> {
        self.update(|state| state.current_file += 1)
    }

    /// One entry inside the current archive finished.
    pub fn archive_entry_advanced(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.show_archive_progress = true;
            state.current_file_in_archive += 1;
        })
    }

    /// A new archive announced its entry count.
    pub fn archive_total(&self, total: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.show_archive_progress = true;
            state.current_file_in_archive = 0;
            state.total_files_in_archive = total;
        })
    }
}

fn detect_changes(old: &UpscaleState, new: &UpscaleState) -> Vec<StateChange> {
    let mut changes = Vec::new();

    if old.phase != new.phase {
        changes.push(StateChange::PhaseChanged { phase: new.phase });
    }

    if old.current_file != new.current_file || old.total_files != new.total_files {
        changes.push(StateChange::ProgressUpdated {
            current: new.current_file,
            total: new.total_files,
        });
    }

    if old.current_file_in_archive != new.current_file_in_archive
        || old.total_files_in_archive != new.total_files_in_archive
        || old.show_archive_progress != new.show_archive_progress
    {
        changes.push(StateChange::ArchiveProgressUpdated {
            current: new.current_file_in_archive,
            total: new.total_files_in_archive,
            visible: new.show_archive_progress,
        });
    }

    if !old.cancel_requested && new.cancel_requested {
        changes.push(StateChange::CancelRequested);
    }

    changes
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
