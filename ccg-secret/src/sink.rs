//! Operator log sink.

/// Receives one human-readable line per pipeline event.
///
/// The broker picks the implementation once the plugin input is parsed (a
/// file when `logFile` is set, [`NullLog`] otherwise) and hands the same sink
/// to every component it builds for that call.
///
/// Implementations must not fail the caller: a line that cannot be written is
/// dropped, not raised. Lines are passed whole and must not be interleaved
/// with lines from other callers.
pub trait LogSink: Send + Sync {
    /// Record one line.
    fn line(&self, entry: &str);
}

/// Discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl LogSink for NullLog {
    fn line(&self, _entry: &str) {}
}

/// Replace every character of `value` with `*`, keeping its length.
pub fn mask(value: &str) -> String {
    "*".repeat(value.chars().count())
}
