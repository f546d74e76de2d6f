// Property tests for the worker output decoder.
//
// The protocol must be total: whatever the worker prints, every non-empty
// line decodes to exactly one event and nothing is ever dropped or panics.

use mangajanai_core::services::{parse_line, ProgressEvent};
use proptest::prelude::*;

proptest! {
    #[test]
    fn every_nonempty_line_decodes(line in ".*") {
        let event = parse_line(&line);
        prop_assert_eq!(event.is_none(), line.is_empty());
    }

    #[test]
    fn progress_lines_never_become_logs(payload in "[^\n]*") {
        let line = format!("PROGRESS={payload}");
        let expected = if payload.contains("_zip_image") {
            ProgressEvent::ArchiveEntryAdvanced
        } else {
            ProgressEvent::FileAdvanced
        };
        prop_assert_eq!(parse_line(&line), Some(expected));
    }

    #[test]
    fn totalzip_decodes_integer_or_falls_back_to_log(n in 0usize..1_000_000) {
        let line = format!("TOTALZIP={n}");
        prop_assert_eq!(parse_line(&line), Some(ProgressEvent::ArchiveTotal(n)));
    }

    #[test]
    fn log_lines_round_trip_verbatim(line in "[^\n]+") {
        prop_assume!(!line.starts_with("PROGRESS=") && !line.starts_with("TOTALZIP="));
        prop_assert_eq!(parse_line(&line), Some(ProgressEvent::Log(line.clone())));
    }
}
