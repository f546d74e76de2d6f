use camino::Utf8Path;

/// File extensions treated as standalone images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// File extensions treated as image archives.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "cbz", "rar", "cbr"];

/// Classification of an input path by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Archive,
    Unknown,
}

/// Classify a path as image, archive, or unknown by case-insensitive
/// extension match.
///
/// Pure function: no filesystem access, no errors. Paths without an
/// extension, or with an extension outside the fixed sets, classify as
/// [`FileKind::Unknown`].
pub fn classify(path: &Utf8Path) -> FileKind {
    let Some(ext) = path.extension() else {
        return FileKind::Unknown;
    };

    if IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        FileKind::Image
    } else if ARCHIVE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        FileKind::Archive
    } else {
        FileKind::Unknown
    }
}
