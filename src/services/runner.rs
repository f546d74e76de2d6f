//! Run orchestration: build the worker command line, spawn the worker,
//! pump its output through the progress decoder, and support cancellation.
//!
//! One [`JobRunner`] owns the lifecycle of conversion runs against a shared
//! [`StateManager`] and [`ConsoleLogBuffer`]. Exactly one run may be in
//! flight; a second `start` is rejected without touching the first.
//!
//! The worker itself is opaque: a command line goes in, UTF-8 lines come
//! out. Everything the worker reports arrives through stdout (structured
//! progress markers plus free-form chatter) and stderr (always chatter).

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::process::Stdio;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, BufReader, Lines};
use tokio::io::AsyncBufReadExt as _;
use tokio::process::{Child, Command};
use tokio::sync::watch;

use crate::console::ConsoleLogBuffer;
use crate::models::{InputMode, JobConfig, RunPhase};
use crate::services::protocol::{parse_line, ProgressEvent};
use crate::services::validation::{validate, ValidationResult};
use crate::state::StateManager;

/// Errors that can abort a run before or at worker launch.
///
/// Once the worker is running, nothing it prints or returns is an error at
/// this level; failure detail travels through the log stream.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("an upscale run is already in progress")]
    AlreadyRunning,

    #[error("configuration is not valid: {}", .0.join(" "))]
    InvalidConfiguration(Vec<String>),

    #[error("failed to launch upscale worker: {0}")]
    Launch(#[source] std::io::Error),
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The worker exited on its own. The configuration is re-validated
    /// because finished outputs change what already exists on disk.
    Completed {
        exit_code: Option<i32>,
        revalidation: ValidationResult,
    },
    /// Cancellation was requested and the worker was terminated.
    Cancelled,
}

/// How the worker process itself finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Exited { code: Option<i32> },
    Cancelled,
}

/// Launch parameters for the external upscale worker.
///
/// Tests substitute stub commands here to exercise the real
/// spawn/pump/kill path without the Python backend installed.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    /// Working directory the worker is spawned in (the backend install root).
    pub install_root: Utf8PathBuf,
    /// Interpreter executable, relative to `install_root`.
    pub python_exe: String,
    /// Upscale entry-point script, relative to `install_root`.
    pub upscale_script: String,
    /// Append-only error log, opened for the lifetime of each run.
    pub error_log: Utf8PathBuf,
}

impl Default for WorkerSpec {
    fn default() -> Self {
        Self {
            install_root: Utf8PathBuf::from("chaiNNer"),
            python_exe: r".\python\python.exe".to_string(),
            upscale_script: r".\backend\src\runmangajanaiconverterguiupscale.py".to_string(),
            error_log: Utf8PathBuf::from("error.log"),
        }
    }
}

/// Owns the lifecycle of conversion runs.
pub struct JobRunner {
    state: StateManager,
    console: ConsoleLogBuffer,
    worker: WorkerSpec,
    cancel_tx: watch::Sender<bool>,
}

impl JobRunner {
    pub fn new(state: StateManager, console: ConsoleLogBuffer, worker: WorkerSpec) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            state,
            console,
            worker,
            cancel_tx,
        }
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn console(&self) -> &ConsoleLogBuffer {
        &self.console
    }

    /// Build the worker argument line for a configuration.
    ///
    /// The argument order and quoting are part of the worker's contract:
    /// paths are always quoted, numeric fields are forwarded verbatim and
    /// unquoted, model paths are absolutized unless blank, and the boolean
    /// switches trail the positional options.
    pub fn build_upscale_command(&self, config: &JobConfig) -> String {
        let input_args = match config.input_mode {
            InputMode::SingleFile => {
                format!("--input-file-path \"{}\"", config.input_file_path)
            }
            InputMode::Folder => {
                format!("--input-folder-path \"{}\"", config.input_folder_path)
            }
        };

        let grayscale_model = absolute_model_path(&config.grayscale_model_path);
        let color_model = absolute_model_path(&config.color_model_path);

        let mut command = format!(
            "\"{python}\" \"{script}\" {input_args} \
             --output-folder-path \"{output_folder}\" \
             --output-filename \"{output_filename}\" \
             --resize-height-before-upscale {resize_height_before} \
             --resize-factor-before-upscale {resize_factor_before} \
             --grayscale-model-path \"{grayscale_model}\" \
             --color-model-path \"{color_model}\" \
             --image-format {image_format} \
             --lossy-compression-quality {quality} \
             --resize-height-after-upscale {resize_height_after} \
             --resize-factor-after-upscale {resize_factor_after}",
            python = self.worker.python_exe,
            script = self.worker.upscale_script,
            output_folder = config.output_folder_path,
            output_filename = config.output_filename,
            resize_height_before = config.resize_height_before_upscale,
            resize_factor_before = config.resize_factor_before_upscale,
            image_format = config.image_format.token(),
            quality = config.lossy_compression_quality,
            resize_height_after = config.resize_height_after_upscale,
            resize_factor_after = config.resize_factor_after_upscale,
        );

        for (enabled, switch) in [
            (config.upscale_archives, "--upscale-archives"),
            (config.upscale_images, "--upscale-images"),
            (config.overwrite_existing_files, "--overwrite-existing-files"),
            (config.auto_adjust_levels, "--auto-adjust-levels"),
            (config.use_lossless_compression, "--use-lossless-compression"),
        ] {
            if enabled {
                command.push(' ');
                command.push_str(switch);
            }
        }

        command
    }

    /// Run one conversion job to a terminal state.
    ///
    /// Preconditions: the configuration validates and no run is in flight.
    /// Suspends until the worker exits or cancellation is observed.
    pub async fn start(&self, config: &JobConfig) -> Result<RunOutcome, JobError> {
        let validation = validate(config);
        if !validation.valid {
            return Err(JobError::InvalidConfiguration(validation.reasons));
        }

        // Atomically claim the single run slot.
        let mut claimed = false;
        self.state.update(|state| {
            if !state.phase.is_running() {
                state.apply_plan_total(validation.plan.executable_total());
                state.begin_run();
                claimed = true;
            }
        });
        if !claimed {
            return Err(JobError::AlreadyRunning);
        }
        self.cancel_tx.send_replace(false);

        self.console.clear();
        let command = self.build_upscale_command(config);
        self.console
            .append(format!("Upscaling with command: {command}"));
        tracing::info!(total_files = validation.plan.executable_total(), "launching upscale worker");

        match self.execute_worker_command(&command).await {
            Ok(WorkerExit::Cancelled) => {
                self.state.finish_run(RunPhase::Cancelled);
                tracing::info!("upscale run cancelled");
                Ok(RunOutcome::Cancelled)
            }
            Ok(WorkerExit::Exited { code }) => {
                self.state.finish_run(RunPhase::Completed);
                tracing::info!(exit_code = ?code, "upscale worker exited");
                Ok(RunOutcome::Completed {
                    exit_code: code,
                    revalidation: validate(config),
                })
            }
            Err(err) => {
                self.state.finish_run(RunPhase::Failed);
                tracing::error!("upscale worker failed to launch: {err}");
                Err(err)
            }
        }
    }

    /// Request cancellation of the in-flight run.
    ///
    /// Idempotent and callable from any thread. A no-op when no run is
    /// active, including after natural completion.
    pub fn cancel(&self) {
        if !self.state.read(|state| state.phase.is_running()) {
            return;
        }
        self.state.request_cancel();
        let _ = self.cancel_tx.send(true);
        tracing::info!("cancellation requested");
    }

    /// Spawn the worker and pump its output until exit or cancellation.
    ///
    /// Public so the stream/cancellation machinery can be exercised against
    /// stub commands; [`start`](Self::start) is the normal entry point.
    pub async fn execute_worker_command(&self, command: &str) -> Result<WorkerExit, JobError> {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.current_dir(&self.worker.install_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(JobError::Launch)?;

        // Worker chatter is duplicated into a persistent error log. Failing
        // to open it degrades to console-only logging rather than aborting.
        let mut error_log = match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.worker.error_log)
        {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!("could not open {}: {err}", self.worker.error_log);
                None
            }
        };

        let mut stdout_lines = child
            .stdout
            .take()
            .map(|out| BufReader::new(out).lines());
        let mut stderr_lines = child
            .stderr
            .take()
            .map(|err| BufReader::new(err).lines());
        let mut stdout_done = stdout_lines.is_none();
        let mut stderr_done = stderr_lines.is_none();

        let mut cancel_rx = self.cancel_tx.subscribe();
        // A cancel may already have landed between claiming the run slot
        // and subscribing.
        let mut cancelled =
            *cancel_rx.borrow() || self.state.read(|state| state.cancel_requested);

        while !cancelled && !(stdout_done && stderr_done) {
            tokio::select! {
                line = next_line(&mut stdout_lines), if !stdout_done => match line {
                    Some(line) => self.apply_stdout_line(&line, &mut error_log),
                    None => stdout_done = true,
                },
                line = next_line(&mut stderr_lines), if !stderr_done => match line {
                    Some(line) => self.apply_stderr_line(&line, &mut error_log),
                    None => stderr_done = true,
                },
                changed = cancel_rx.changed() => {
                    if changed.is_ok() && *cancel_rx.borrow() {
                        cancelled = true;
                    }
                }
            }
        }

        if !cancelled {
            tokio::select! {
                status = child.wait() => {
                    let code = status.map_err(JobError::Launch)?.code();
                    return Ok(WorkerExit::Exited { code });
                }
                changed = cancel_rx.changed() => {
                    if changed.is_err() || !*cancel_rx.borrow() {
                        // Sender gone without a cancel; fall through and wait.
                        let code = child.wait().await.map_err(JobError::Launch)?.code();
                        return Ok(WorkerExit::Exited { code });
                    }
                }
            }
        }

        kill_worker_tree(&mut child).await;
        Ok(WorkerExit::Cancelled)
    }

    fn apply_stdout_line(&self, line: &str, error_log: &mut Option<File>) {
        match parse_line(line) {
            Some(ProgressEvent::FileAdvanced) => {
                self.state.file_advanced();
            }
            Some(ProgressEvent::ArchiveEntryAdvanced) => {
                self.state.archive_entry_advanced();
            }
            Some(ProgressEvent::ArchiveTotal(total)) => {
                self.state.archive_total(total);
            }
            Some(ProgressEvent::Log(line)) => {
                append_error_log(error_log, &line);
                self.console.append(line);
            }
            None => {}
        }
    }

    fn apply_stderr_line(&self, line: &str, error_log: &mut Option<File>) {
        // stderr carries no structured protocol; every line is chatter.
        if line.is_empty() {
            return;
        }
        append_error_log(error_log, line);
        self.console.append(line);
    }
}

async fn next_line<R>(lines: &mut Option<Lines<BufReader<R>>>) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    match lines.as_mut() {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => None,
    }
}

fn append_error_log(error_log: &mut Option<File>, line: &str) {
    if let Some(file) = error_log {
        let _ = writeln!(file, "{line}");
    }
}

/// Terminate the worker and any processes it spawned.
///
/// The worker does not implement graceful shutdown, so this is a hard kill.
/// Every step tolerates a process that already exited.
async fn kill_worker_tree(child: &mut Child) {
    if cfg!(target_os = "windows") {
        if let Some(pid) = child.id() {
            let _ = std::process::Command::new("taskkill")
                .args(["/PID", &pid.to_string(), "/T", "/F"])
                .output();
        }
    }
    let _ = child.start_kill();
    let _ = child.wait().await;
}

/// Absolutize a model path; blank stays blank so the worker sees an empty
/// argument rather than a bogus path.
fn absolute_model_path(path: &Utf8Path) -> Utf8PathBuf {
    if path.as_str().trim().is_empty() {
        return Utf8PathBuf::new();
    }
    if path.is_absolute() {
        return path.to_owned();
    }
    match std::env::current_dir().map(Utf8PathBuf::from_path_buf) {
        Ok(Ok(cwd)) => cwd.join(path),
        _ => path.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageFormat;

    fn runner() -> JobRunner {
        JobRunner::new(
            StateManager::new(),
            ConsoleLogBuffer::new(),
            WorkerSpec::default(),
        )
    }

    fn config() -> JobConfig {
        JobConfig {
            input_file_path: Utf8PathBuf::from("/in/v 1.cbz"),
            output_folder_path: Utf8PathBuf::from("/out dir"),
            ..JobConfig::default()
        }
    }

    #[test]
    fn test_command_quotes_paths_and_orders_arguments() {
        let cmd = runner().build_upscale_command(&config());

        assert!(cmd.starts_with("\".\\python\\python.exe\" \".\\backend\\src\\runmangajanaiconverterguiupscale.py\""));
        assert!(cmd.contains("--input-file-path \"/in/v 1.cbz\""));
        assert!(cmd.contains("--output-folder-path \"/out dir\""));
        assert!(cmd.contains("--output-filename \"%filename%-mangajanai\""));
        assert!(cmd.contains("--image-format webp"));
        assert!(cmd.contains("--lossy-compression-quality 80"));

        // Positional options precede the boolean switches.
        let format_at = cmd.find("--image-format").unwrap();
        let archives_at = cmd.find("--upscale-archives").unwrap();
        assert!(format_at < archives_at);
    }

    #[test]
    fn test_command_switches_follow_flags() {
        let mut cfg = config();
        cfg.upscale_images = true;
        cfg.overwrite_existing_files = true;
        cfg.auto_adjust_levels = true;
        cfg.use_lossless_compression = true;

        let cmd = runner().build_upscale_command(&cfg);
        for switch in [
            "--upscale-archives",
            "--upscale-images",
            "--overwrite-existing-files",
            "--auto-adjust-levels",
            "--use-lossless-compression",
        ] {
            assert!(cmd.contains(switch), "missing {switch}");
        }

        cfg.upscale_archives = false;
        cfg.upscale_images = false;
        cfg.overwrite_existing_files = false;
        cfg.auto_adjust_levels = false;
        cfg.use_lossless_compression = false;
        let cmd = runner().build_upscale_command(&cfg);
        assert!(!cmd.contains("--upscale-archives"));
        assert!(!cmd.contains("--upscale-images"));
        assert!(!cmd.contains("--overwrite-existing-files"));
        assert!(!cmd.contains("--auto-adjust-levels"));
        assert!(!cmd.contains("--use-lossless-compression"));
    }

    #[test]
    fn test_command_folder_mode_uses_folder_switch() {
        let mut cfg = config();
        cfg.input_mode = InputMode::Folder;
        cfg.input_folder_path = Utf8PathBuf::from("/library");

        let cmd = runner().build_upscale_command(&cfg);
        assert!(cmd.contains("--input-folder-path \"/library\""));
        assert!(!cmd.contains("--input-file-path"));
    }

    #[test]
    fn test_command_forwards_numeric_fields_verbatim() {
        let mut cfg = config();
        cfg.resize_factor_after_upscale = "not-a-number".to_string();

        // Malformed numerics are the validator's problem; the builder must
        // not panic or repair them.
        let cmd = runner().build_upscale_command(&cfg);
        assert!(cmd.contains("--resize-factor-after-upscale not-a-number"));
    }

    #[test]
    fn test_blank_model_paths_stay_blank() {
        let cmd = runner().build_upscale_command(&config());
        assert!(cmd.contains("--grayscale-model-path \"\""));
        assert!(cmd.contains("--color-model-path \"\""));
    }

    #[test]
    fn test_absolute_model_paths_pass_through() {
        let mut cfg = config();
        cfg.color_model_path = Utf8PathBuf::from("/models/color.pth");
        let cmd = runner().build_upscale_command(&cfg);
        assert!(cmd.contains("--color-model-path \"/models/color.pth\""));
    }

    #[test]
    fn test_relative_model_path_is_absolutized() {
        let mut cfg = config();
        cfg.grayscale_model_path = Utf8PathBuf::from("models/gray.pth");
        let cmd = runner().build_upscale_command(&cfg);
        assert!(!cmd.contains("--grayscale-model-path \"models/gray.pth\""));
        assert!(cmd.contains("gray.pth"));
    }

    #[test]
    fn test_jpeg_format_token() {
        let mut cfg = config();
        cfg.image_format = ImageFormat::Jpeg;
        let cmd = runner().build_upscale_command(&cfg);
        assert!(cmd.contains("--image-format jpg"));
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let r = runner();
        r.cancel();
        let state = r.state().snapshot();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(!state.cancel_requested);
    }
}
