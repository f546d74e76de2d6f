use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Placeholder in the output filename template replaced by each input's stem.
pub const FILENAME_PLACEHOLDER: &str = "%filename%";

/// Container extension used for all upscaled archives.
pub const ARCHIVE_OUTPUT_EXTENSION: &str = "cbz";

/// Which input selector is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    SingleFile,
    Folder,
}

/// Output image format selection.
///
/// WebP doubles as two of the four effective formats: combined with
/// [`JobConfig::use_lossless_compression`] it is either lossless or lossy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Webp,
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Format token passed on the worker command line and used as the
    /// predicted output extension.
    pub fn token(self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Immutable configuration snapshot for one conversion run.
///
/// Numeric fields (quality, resize heights/factors) are stored as the raw
/// text the user typed. The validator parses them and gates the run on
/// well-formedness; the runner forwards them verbatim and never re-parses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub input_mode: InputMode,
    pub input_file_path: Utf8PathBuf,
    pub input_folder_path: Utf8PathBuf,

    pub output_folder_path: Utf8PathBuf,
    /// Output filename template containing [`FILENAME_PLACEHOLDER`].
    pub output_filename: String,
    pub overwrite_existing_files: bool,

    pub upscale_images: bool,
    pub upscale_archives: bool,

    pub image_format: ImageFormat,
    pub use_lossless_compression: bool,
    pub lossy_compression_quality: String,

    pub resize_height_before_upscale: String,
    pub resize_factor_before_upscale: String,
    pub resize_height_after_upscale: String,
    pub resize_factor_after_upscale: String,

    pub grayscale_model_path: Utf8PathBuf,
    pub color_model_path: Utf8PathBuf,
    pub auto_adjust_levels: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            input_mode: InputMode::SingleFile,
            input_file_path: Utf8PathBuf::new(),
            input_folder_path: Utf8PathBuf::new(),
            output_folder_path: Utf8PathBuf::new(),
            output_filename: format!("{FILENAME_PLACEHOLDER}-mangajanai"),
            overwrite_existing_files: false,
            upscale_images: false,
            upscale_archives: true,
            image_format: ImageFormat::Webp,
            use_lossless_compression: false,
            lossy_compression_quality: "80".to_string(),
            resize_height_before_upscale: "0".to_string(),
            resize_factor_before_upscale: "100".to_string(),
            resize_height_after_upscale: "0".to_string(),
            resize_factor_after_upscale: "100".to_string(),
            grayscale_model_path: Utf8PathBuf::new(),
            color_model_path: Utf8PathBuf::new(),
            auto_adjust_levels: false,
        }
    }
}

impl JobConfig {
    /// The input path that matters for the active mode.
    pub fn active_input(&self) -> &Utf8Path {
        match self.input_mode {
            InputMode::SingleFile => &self.input_file_path,
            InputMode::Folder => &self.input_folder_path,
        }
    }

    /// Whether the lossless-compression toggle applies (WebP only).
    pub fn offers_lossless_compression(&self) -> bool {
        self.image_format == ImageFormat::Webp
    }

    /// Whether the lossy quality setting has any effect.
    pub fn uses_lossy_quality(&self) -> bool {
        match self.image_format {
            ImageFormat::Jpeg => true,
            ImageFormat::Webp => !self.use_lossless_compression,
            ImageFormat::Png => false,
        }
    }
}
