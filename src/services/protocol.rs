//! Decoder for the worker's line-oriented stdout protocol.
//!
//! The upscale worker reports progress over stdout using plain-text markers:
//!
//! - `PROGRESS=<id>` - one whole-job file finished; if `<id>` contains the
//!   `_zip_image` marker it instead counts one entry inside the archive
//!   currently being processed.
//! - `TOTALZIP=<n>` - announces how many entries the current archive holds.
//! - anything else is ordinary log output.
//!
//! The decoder is stateless and tolerant: a `TOTALZIP=` line whose payload
//! is not an integer is demoted to a log line rather than rejected, so no
//! worker output is ever lost.

/// Prefix for per-file and per-archive-entry progress ticks.
const PROGRESS_PREFIX: &str = "PROGRESS=";

/// Prefix announcing the entry count of the current archive.
const TOTAL_ZIP_PREFIX: &str = "TOTALZIP=";

/// Marker distinguishing an archive-entry tick from a whole-file tick.
const ZIP_IMAGE_MARKER: &str = "_zip_image";

/// A decoded worker stdout line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// One input file (image or archive) finished processing.
    FileAdvanced,
    /// One image inside the current archive finished processing.
    ArchiveEntryAdvanced,
    /// The current archive holds this many entries; resets the entry counter.
    ArchiveTotal(usize),
    /// Ordinary log output, passed through verbatim.
    Log(String),
}

/// Decode a single stdout line. Empty lines decode to `None`.
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    if line.is_empty() {
        return None;
    }

    if let Some(payload) = line.strip_prefix(TOTAL_ZIP_PREFIX) {
        // Malformed totals fall through to the log so nothing is dropped.
        if let Ok(total) = payload.trim().parse::<usize>() {
            return Some(ProgressEvent::ArchiveTotal(total));
        }
        return Some(ProgressEvent::Log(line.to_string()));
    }

    if let Some(payload) = line.strip_prefix(PROGRESS_PREFIX) {
        if payload.contains(ZIP_IMAGE_MARKER) {
            return Some(ProgressEvent::ArchiveEntryAdvanced);
        }
        return Some(ProgressEvent::FileAdvanced);
    }

    Some(ProgressEvent::Log(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_total() {
        assert_eq!(parse_line("TOTALZIP=5"), Some(ProgressEvent::ArchiveTotal(5)));
        assert_eq!(parse_line("TOTALZIP=0"), Some(ProgressEvent::ArchiveTotal(0)));
    }

    #[test]
    fn test_archive_total_malformed_is_log() {
        assert_eq!(
            parse_line("TOTALZIP=abc"),
            Some(ProgressEvent::Log("TOTALZIP=abc".to_string()))
        );
        assert_eq!(
            parse_line("TOTALZIP=-3"),
            Some(ProgressEvent::Log("TOTALZIP=-3".to_string()))
        );
    }

    #[test]
    fn test_archive_entry_tick() {
        assert_eq!(
            parse_line("PROGRESS=volume01_zip_image_3"),
            Some(ProgressEvent::ArchiveEntryAdvanced)
        );
    }

    #[test]
    fn test_file_tick() {
        assert_eq!(parse_line("PROGRESS=plain"), Some(ProgressEvent::FileAdvanced));
        assert_eq!(parse_line("PROGRESS="), Some(ProgressEvent::FileAdvanced));
    }

    #[test]
    fn test_plain_log_line() {
        assert_eq!(
            parse_line("hello world"),
            Some(ProgressEvent::Log("hello world".to_string()))
        );
    }

    #[test]
    fn test_prefix_must_be_at_line_start() {
        assert_eq!(
            parse_line("note: PROGRESS=1 was emitted"),
            Some(ProgressEvent::Log("note: PROGRESS=1 was emitted".to_string()))
        );
    }

    #[test]
    fn test_empty_line_is_ignored() {
        assert_eq!(parse_line(""), None);
    }
}
