//! Configuration validation.
//!
//! Every rule is evaluated independently and all failures are reported at
//! once; validity is the conjunction. Validation is pure computation over
//! the configuration and its [`WorkPlan`], so callers re-run it on every
//! configuration change (and after a run completes, since finished outputs
//! change what already exists on disk).

use crate::models::{InputMode, JobConfig, FILENAME_PLACEHOLDER};
use crate::services::planner::{plan, WorkPlan};

/// What to do about inputs that classify as neither image nor archive.
///
/// The conversion pipeline cannot process them either way; the policy only
/// controls whether the user is told about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFilePolicy {
    /// Unknown files silently contribute zero to all counts.
    #[default]
    SilentSkip,
    /// Surface a non-gating warning naming how many files were ignored.
    Warn,
}

/// Outcome of validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    /// Failure reasons in rule order; empty when valid.
    pub reasons: Vec<String>,
    /// Non-gating notices (see [`UnknownFilePolicy`]).
    pub warnings: Vec<String>,
    /// The work plan the executable-count rule was judged against.
    pub plan: WorkPlan,
}

impl ValidationResult {
    /// The one-line status shown next to the run button: the joined failure
    /// reasons when invalid, otherwise the plan summary.
    pub fn display_status(&self) -> String {
        if self.valid {
            format!("{} selected for upscaling.", self.plan.status)
        } else {
            self.reasons.join(" ")
        }
    }
}

/// Validate with the default [`UnknownFilePolicy`].
pub fn validate(config: &JobConfig) -> ValidationResult {
    validate_with_policy(config, UnknownFilePolicy::default())
}

/// Apply all validation rules to a configuration.
pub fn validate_with_policy(config: &JobConfig, policy: UnknownFilePolicy) -> ValidationResult {
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();

    match config.input_mode {
        InputMode::SingleFile => {
            if is_blank(config.input_file_path.as_str()) {
                reasons.push("Input File is required.".to_string());
            } else if !config.input_file_path.is_file() {
                reasons.push("Input File does not exist.".to_string());
            }
        }
        InputMode::Folder => {
            if is_blank(config.input_folder_path.as_str()) {
                reasons.push("Input Folder is required.".to_string());
            } else if !config.input_folder_path.is_dir() {
                reasons.push("Input Folder does not exist.".to_string());
            }
        }
    }

    if is_blank(&config.output_filename) {
        reasons.push("Output Filename is required.".to_string());
    } else if config.input_mode == InputMode::Folder
        && !config.output_filename.contains(FILENAME_PLACEHOLDER)
    {
        // A static template would write every file of the batch to the same
        // output path.
        reasons.push(format!(
            "Output Filename must contain {FILENAME_PLACEHOLDER} when upscaling a folder."
        ));
    }

    if is_blank(config.output_folder_path.as_str()) {
        reasons.push("Output Folder is required.".to_string());
    }

    check_quality(&config.lossy_compression_quality, &mut reasons);
    for (label, value) in [
        ("Resize Height Before Upscale", &config.resize_height_before_upscale),
        ("Resize Factor Before Upscale", &config.resize_factor_before_upscale),
        ("Resize Height After Upscale", &config.resize_height_after_upscale),
        ("Resize Factor After Upscale", &config.resize_factor_after_upscale),
    ] {
        check_non_negative(label, value, &mut reasons);
    }

    let plan = plan(config);

    if plan.executable_total() == 0 {
        reasons.push(format!(
            "{} selected for upscaling. At least one file must be selected.",
            plan.status
        ));
    }

    if policy == UnknownFilePolicy::Warn && plan.unknown_files > 0 {
        let s = if plan.unknown_files == 1 { "" } else { "s" };
        warnings.push(format!(
            "{} file{s} ignored (unsupported extension).",
            plan.unknown_files
        ));
    }

    ValidationResult {
        valid: reasons.is_empty(),
        reasons,
        warnings,
        plan,
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_quality(value: &str, reasons: &mut Vec<String>) {
    match value.trim().parse::<u32>() {
        Ok(q) if (1..=100).contains(&q) => {}
        _ => reasons.push(
            "Lossy Compression Quality must be a whole number from 1 to 100.".to_string(),
        ),
    }
}

fn check_non_negative(label: &str, value: &str, reasons: &mut Vec<String>) {
    match value.trim().parse::<f64>() {
        Ok(n) if n >= 0.0 => {}
        _ => reasons.push(format!("{label} must be a non-negative number.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn folder_config() -> JobConfig {
        JobConfig {
            input_mode: InputMode::Folder,
            input_folder_path: Utf8PathBuf::from("/missing/input"),
            output_folder_path: Utf8PathBuf::from("/out"),
            upscale_images: true,
            ..JobConfig::default()
        }
    }

    #[test]
    fn test_empty_input_file_reported() {
        let config = JobConfig {
            output_folder_path: Utf8PathBuf::from("/out"),
            ..JobConfig::default()
        };

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.reasons.contains(&"Input File is required.".to_string()));
    }

    #[test]
    fn test_empty_input_folder_reported() {
        let mut config = folder_config();
        config.input_folder_path = Utf8PathBuf::new();

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.reasons.contains(&"Input Folder is required.".to_string()));
    }

    #[test]
    fn test_missing_folder_reported_alongside_zero_files() {
        let result = validate(&folder_config());
        assert!(!result.valid);
        assert!(result.reasons.contains(&"Input Folder does not exist.".to_string()));
        // Rule 4 fires independently.
        assert!(result
            .reasons
            .iter()
            .any(|r| r.ends_with("At least one file must be selected.")));
    }

    #[test]
    fn test_all_failing_rules_reported_not_just_first() {
        let config = JobConfig {
            input_mode: InputMode::Folder,
            output_filename: String::new(),
            lossy_compression_quality: "bogus".to_string(),
            ..JobConfig::default()
        };

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.reasons.len() >= 4);
        assert!(result.reasons.contains(&"Input Folder is required.".to_string()));
        assert!(result.reasons.contains(&"Output Filename is required.".to_string()));
        assert!(result.reasons.contains(&"Output Folder is required.".to_string()));
    }

    #[test]
    fn test_static_template_rejected_in_folder_mode() {
        let mut config = folder_config();
        config.output_filename = "always-the-same-name".to_string();

        let result = validate(&config);
        assert!(result
            .reasons
            .contains(&"Output Filename must contain %filename% when upscaling a folder.".to_string()));
    }

    #[test]
    fn test_static_template_allowed_in_single_file_mode() {
        let config = JobConfig {
            input_file_path: Utf8PathBuf::from("/missing/page.png"),
            output_folder_path: Utf8PathBuf::from("/out"),
            output_filename: "fixed-name".to_string(),
            ..JobConfig::default()
        };

        let result = validate(&config);
        assert!(!result
            .reasons
            .iter()
            .any(|r| r.contains("must contain %filename%")));
    }

    #[test]
    fn test_quality_bounds() {
        let mut config = folder_config();
        for bad in ["0", "101", "-1", "80.5", "abc", ""] {
            config.lossy_compression_quality = bad.to_string();
            let result = validate(&config);
            assert!(
                result
                    .reasons
                    .iter()
                    .any(|r| r.starts_with("Lossy Compression Quality")),
                "quality {bad:?} should be rejected"
            );
        }

        config.lossy_compression_quality = "80".to_string();
        let result = validate(&config);
        assert!(!result
            .reasons
            .iter()
            .any(|r| r.starts_with("Lossy Compression Quality")));
    }

    #[test]
    fn test_resize_fields_must_be_non_negative_numbers() {
        let mut config = folder_config();
        config.resize_factor_after_upscale = "-5".to_string();
        config.resize_height_before_upscale = "tall".to_string();

        let result = validate(&config);
        assert!(result
            .reasons
            .contains(&"Resize Factor After Upscale must be a non-negative number.".to_string()));
        assert!(result
            .reasons
            .contains(&"Resize Height Before Upscale must be a non-negative number.".to_string()));
        // Fractional factors are fine.
        config.resize_factor_after_upscale = "12.5".to_string();
        config.resize_height_before_upscale = "0".to_string();
        let result = validate(&config);
        assert!(!result.reasons.iter().any(|r| r.contains("Resize")));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let config = folder_config();
        assert_eq!(validate(&config), validate(&config));
    }

    #[test]
    fn test_display_status_joins_reasons_when_invalid() {
        let mut config = folder_config();
        config.output_folder_path = Utf8PathBuf::new();

        let result = validate(&config);
        let status = result.display_status();
        for reason in &result.reasons {
            assert!(status.contains(reason));
        }
        assert!(!status.contains('\n'));
    }
}
