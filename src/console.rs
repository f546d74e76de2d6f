// Console log buffer shared between the run task (writer) and the display
// layer (reader).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default number of retained console lines.
pub const CONSOLE_CAPACITY: usize = 1000;

/// Bounded, ordered log sink with drop-oldest eviction.
///
/// Worker chatter is appended at the tail; once the buffer exceeds its
/// capacity the oldest lines are evicted from the head. There is a single
/// writer per run (the stream pump), but snapshots may be taken from any
/// thread at any time, so the backing deque sits behind a mutex.
///
/// Cloning is cheap and shares the underlying buffer.
#[derive(Clone)]
pub struct ConsoleLogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl ConsoleLogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(CONSOLE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append a line at the tail, evicting from the head while over capacity.
    pub fn append(&self, line: impl Into<String>) {
        let mut lines = self.lines.lock().unwrap();
        lines.push_back(line.into());
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }

    /// Drop all retained lines.
    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }

    /// Ordered copy of the retained lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().unwrap().iter().cloned().collect()
    }

    /// The joined text view rendered by the console widget.
    pub fn text(&self) -> String {
        self.snapshot().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().unwrap().is_empty()
    }
}

impl Default for ConsoleLogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_text() {
        let console = ConsoleLogBuffer::new();
        console.append("first");
        console.append("second");

        assert_eq!(console.len(), 2);
        assert_eq!(console.text(), "first\nsecond");
    }

    #[test]
    fn test_eviction_keeps_newest_in_order() {
        let console = ConsoleLogBuffer::with_capacity(3);
        for i in 0..7 {
            console.append(format!("line {i}"));
        }

        assert_eq!(console.snapshot(), vec!["line 4", "line 5", "line 6"]);
    }

    #[test]
    fn test_clear() {
        let console = ConsoleLogBuffer::new();
        console.append("x");
        console.clear();

        assert!(console.is_empty());
        assert_eq!(console.text(), "");
    }

    #[test]
    fn test_shared_between_clones() {
        let console = ConsoleLogBuffer::new();
        let writer = console.clone();

        writer.append("from writer");
        assert_eq!(console.snapshot(), vec!["from writer"]);
    }
}
