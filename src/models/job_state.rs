/// Lifecycle of a conversion run.
///
/// Exactly one run may be in [`RunPhase::Running`] at a time. Terminal
/// phases (`Completed`, `Cancelled`, `Failed`) persist until the next run
/// starts, so observers can render the outcome of the last run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunPhase {
    pub fn is_running(self) -> bool {
        self == RunPhase::Running
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunPhase::Completed | RunPhase::Cancelled | RunPhase::Failed
        )
    }
}

/// Mutable state of the one live conversion run.
///
/// Mirrors what the progress panel shows: two progress bars (whole job and
/// current archive) plus the running/cancel flags. All mutation during a run
/// happens on the run task via [`crate::state::StateManager`]; observers read
/// snapshots concurrently.
#[derive(Debug, Clone, Default)]
pub struct UpscaleState {
    pub phase: RunPhase,
    pub cancel_requested: bool,

    // Whole-job progress
    pub current_file: usize,
    pub total_files: usize,

    // Progress inside the archive currently being processed
    pub current_file_in_archive: usize,
    pub total_files_in_archive: usize,
    pub show_archive_progress: bool,
}

impl UpscaleState {
    /// Reset everything a new run must not inherit from the previous one.
    pub fn begin_run(&mut self) {
        self.phase = RunPhase::Running;
        self.cancel_requested = false;
        self.current_file = 0;
        self.current_file_in_archive = 0;
        self.total_files_in_archive = 0;
        self.show_archive_progress = false;
    }

    /// Reset the progress bars from a freshly computed plan total.
    pub fn apply_plan_total(&mut self, total_files: usize) {
        self.current_file = 0;
        self.total_files = total_files;
        self.current_file_in_archive = 0;
        self.total_files_in_archive = 0;
        self.show_archive_progress = false;
    }
}
