//! Output and environment collaborators.
//!
//! All help text and diagnostics go through a [`LineSink`]. The default
//! [`StdoutSink`] writes to standard output; [`CaptureSink`] collects
//! everything into a string, which is how tests observe dispatcher output.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// Destination for formatted output fragments.
///
/// Fragments carry their own line breaks.
pub trait LineSink {
    fn print(&self, text: &str);
}

/// Writes to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn print(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout leaves nothing useful to report to.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Collects output in memory. Clones share the same buffer.
///
/// ```rust
/// use commandeer::{CaptureSink, LineSink};
///
/// let sink = CaptureSink::new();
/// let handle = sink.clone();
/// sink.print("Usage: app run\n");
/// assert_eq!(handle.contents(), "Usage: app run\n");
/// ```
#[derive(Clone, Default)]
pub struct CaptureSink {
    buffer: Rc<RefCell<String>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything printed so far.
    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }

    /// Returns the captured text and empties the buffer.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.borrow_mut())
    }
}

impl LineSink for CaptureSink {
    fn print(&self, text: &str) {
        self.buffer.borrow_mut().push_str(text);
    }
}

impl fmt::Debug for CaptureSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSink")
            .field("len", &self.buffer.borrow().len())
            .finish()
    }
}

/// Base name of the running executable, or an empty string if it cannot be
/// determined.
pub fn resolve_executable_name() -> String {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink_shares_buffer() {
        let sink = CaptureSink::new();
        let other = sink.clone();
        sink.print("one\n");
        other.print("two\n");
        assert_eq!(sink.contents(), "one\ntwo\n");
    }

    #[test]
    fn test_capture_sink_take() {
        let sink = CaptureSink::new();
        sink.print("hello");
        assert_eq!(sink.take(), "hello");
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn test_resolve_executable_name_is_base_name() {
        let name = resolve_executable_name();
        assert!(!name.contains('/'));
    }
}
