//! Work planning: enumerate candidate inputs, predict their output paths,
//! and compute how much of the job is actually executable.
//!
//! A [`WorkPlan`] is recomputed synchronously whenever any configuration
//! field changes and is never persisted. Planning touches the filesystem
//! only to check which predicted outputs already exist; a missing input
//! folder yields an empty plan rather than an error (the validator reports
//! the missing folder separately).

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use crate::models::{InputMode, JobConfig, ARCHIVE_OUTPUT_EXTENSION, FILENAME_PLACEHOLDER};
use crate::services::classify::{classify, FileKind};

/// One discovered input and its predicted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub kind: FileKind,
    pub output_exists: bool,
}

/// The computed enumeration of files to process for one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkPlan {
    /// Discovered candidates, images before archives, each in path order.
    pub files: Vec<PlannedFile>,

    /// Candidates that will actually be (re)written, per category.
    pub executable_images: usize,
    pub executable_archives: usize,

    /// Candidates whose predicted output already exists, per category.
    pub existing_images: usize,
    pub existing_archives: usize,

    /// Files seen during enumeration that classify as neither image nor
    /// archive. Skipped from all counts; surfacing them is the validator's
    /// policy decision.
    pub unknown_files: usize,

    /// Human-readable summary, e.g. `"3 images (1 image already exists and
    /// will be skipped) and 2 archives (0 archives already exist and will be
    /// skipped)"`.
    pub status: String,
}

impl WorkPlan {
    /// Total files that will actually be processed.
    pub fn executable_total(&self) -> usize {
        self.executable_images + self.executable_archives
    }

    /// Total predicted outputs that already exist on disk.
    pub fn existing_total(&self) -> usize {
        self.existing_images + self.existing_archives
    }

    pub fn total_candidates(&self) -> usize {
        self.files.len()
    }
}

/// Predict the output path for one input: substitute the placeholder in the
/// filename template, join onto the output folder, and force the extension
/// to the target format (image-format token for images, `cbz` for archives).
pub fn predicted_output_path(config: &JobConfig, input: &Utf8Path, kind: FileKind) -> Utf8PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let name = config.output_filename.replace(FILENAME_PLACEHOLDER, stem);
    let mut output = config.output_folder_path.join(name);

    let extension = match kind {
        FileKind::Image => config.image_format.token(),
        FileKind::Archive => ARCHIVE_OUTPUT_EXTENSION,
        FileKind::Unknown => return output,
    };
    output.set_extension(extension);
    output
}

/// Compute the [`WorkPlan`] for a configuration.
pub fn plan(config: &JobConfig) -> WorkPlan {
    match config.input_mode {
        InputMode::SingleFile => plan_single_file(config),
        InputMode::Folder => plan_folder(config),
    }
}

fn plan_single_file(config: &JobConfig) -> WorkPlan {
    let mut plan = WorkPlan::default();
    let input = &config.input_file_path;
    let kind = classify(input);

    if kind == FileKind::Unknown {
        plan.unknown_files = usize::from(!input.as_str().is_empty());
        plan.status = "0 files".to_string();
        return plan;
    }

    let output = predicted_output_path(config, input, kind);
    let output_exists = output.exists();
    let skipped = output_exists && !config.overwrite_existing_files;

    match kind {
        FileKind::Image => {
            plan.existing_images = usize::from(output_exists);
            plan.executable_images = usize::from(!skipped);
        }
        FileKind::Archive => {
            plan.existing_archives = usize::from(output_exists);
            plan.executable_archives = usize::from(!skipped);
        }
        FileKind::Unknown => unreachable!(),
    }

    let noun = match kind {
        FileKind::Image => "image",
        _ => "archive",
    };
    let count = usize::from(!skipped);
    let s = if skipped { "s" } else { "" };
    let mut status = format!("{count} {noun}{s}");
    if output_exists {
        status.push_str(&format!(
            " (1 {noun} already exists and will be {})",
            overwrite_text(config)
        ));
    }
    plan.status = status;

    plan.files.push(PlannedFile {
        input: input.clone(),
        output,
        kind,
        output_exists,
    });
    plan
}

fn plan_folder(config: &JobConfig) -> WorkPlan {
    let mut plan = WorkPlan::default();
    let mut images = Vec::new();
    let mut archives = Vec::new();

    // A missing or unreadable folder enumerates as empty; the validator
    // reports the missing folder on its own.
    for entry in WalkDir::new(&config.input_folder_path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
            continue;
        };
        match classify(&path) {
            FileKind::Image if config.upscale_images => images.push(path),
            FileKind::Archive if config.upscale_archives => archives.push(path),
            FileKind::Unknown => plan.unknown_files += 1,
            // Category disabled: not a candidate, not an unknown.
            _ => {}
        }
    }

    let mut statuses = Vec::new();

    if config.upscale_images {
        let (executable, existing) =
            plan_category(config, &images, FileKind::Image, &mut plan.files);
        plan.executable_images = executable;
        plan.existing_images = existing;
        statuses.push(category_status(config, "image", executable, existing));
    }

    if config.upscale_archives {
        let (executable, existing) =
            plan_category(config, &archives, FileKind::Archive, &mut plan.files);
        plan.executable_archives = executable;
        plan.existing_archives = existing;
        statuses.push(category_status(config, "archive", executable, existing));
    }

    plan.status = if statuses.is_empty() {
        "0 files".to_string()
    } else {
        statuses.join(" and ")
    };
    plan
}

fn plan_category(
    config: &JobConfig,
    inputs: &[Utf8PathBuf],
    kind: FileKind,
    files: &mut Vec<PlannedFile>,
) -> (usize, usize) {
    let mut executable = 0;
    let mut existing = 0;

    for input in inputs {
        let output = predicted_output_path(config, input, kind);
        let output_exists = output.exists();

        if output_exists {
            existing += 1;
        }
        if !output_exists || config.overwrite_existing_files {
            executable += 1;
        }

        files.push(PlannedFile {
            input: input.clone(),
            output,
            kind,
            output_exists,
        });
    }

    (executable, existing)
}

fn category_status(config: &JobConfig, noun: &str, executable: usize, existing: usize) -> String {
    let s = plural(executable);
    let exist_s = plural(existing);
    format!(
        "{executable} {noun}{s} ({existing} {noun}{exist_s} already exist and will be {})",
        overwrite_text(config)
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn overwrite_text(config: &JobConfig) -> &'static str {
    if config.overwrite_existing_files {
        "overwritten"
    } else {
        "skipped"
    }
}
