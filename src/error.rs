//! Fatal failures and advisory diagnostics.
//!
//! The scanner recognizes exactly one fatal condition — an I/O failure on
//! the underlying byte stream, modeled as [`ScanError`]. Every other
//! malformed-markup or encoding condition is advisory and flows through an
//! [`ErrorReporter`] instead of `Result`, matching the "warn, don't halt"
//! diagnostic style already used elsewhere in this codebase.

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

/// The scanner's only fatal error.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The underlying byte or character stream failed to produce input.
    #[error("I/O failure reading input: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable, opaque diagnostic code. New codes may be added; existing codes
/// must never change meaning once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ErrorCode {
    /// No BOM and no usable declared encoding; falling back to the default.
    #[strum(serialize = "HTML1000")]
    UnknownEncoding,
    /// A declared encoding label has no supported decoder.
    #[strum(serialize = "HTML1001")]
    UnsupportedEncodingMapping,
    /// Input ended inside a construct that expected more bytes.
    #[strum(serialize = "HTML1007")]
    UnexpectedEndOfStream,
    /// `<!DOCTYPE>` with no name.
    #[strum(serialize = "HTML1014")]
    MissingDoctypeName,
    /// `change_encoding` found the declared encoding round-trip-incompatible.
    #[strum(serialize = "HTML1015")]
    IncompatibleEncodingSwitch,
    /// A comment was not closed before end of input.
    #[strum(serialize = "HTML1020")]
    UnterminatedComment,
    /// An attribute name or value could not be scanned as written.
    #[strum(serialize = "HTML1021")]
    MalformedAttribute,
    /// `&name;`/`&name` did not match any known character reference.
    #[strum(serialize = "HTML1022")]
    UnrecognizedEntity,
    /// A numeric character reference decoded to an invalid code point.
    #[strum(serialize = "HTML1023")]
    InvalidCodePoint,
}

/// One advisory condition raised while scanning, already formatted.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The stable code identifying this condition.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
    /// `true` for errors, `false` for warnings. Neither halts scanning.
    pub is_error: bool,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Consumer-supplied sink for advisory diagnostics.
///
/// Never invoked for [`ScanError`]; that surfaces through `Result` from the
/// scan loop directly.
pub trait ErrorReporter {
    /// Builds the human-readable text for a code given formatting args.
    fn format_message(&self, code: ErrorCode, args: &[&str]) -> String {
        if args.is_empty() {
            code.to_string()
        } else {
            format!("{code}: {}", args.join(", "))
        }
    }

    /// Reports a non-fatal warning.
    fn report_warning(&self, code: ErrorCode, args: &[&str]);

    /// Reports a non-fatal error. Still advisory: scanning continues.
    fn report_error(&self, code: ErrorCode, args: &[&str]);
}

/// Default reporter: writes deduplicated diagnostics to stderr, remembering
/// which `(code, message)` pairs it has already printed for this instance.
#[derive(Debug, Default)]
pub struct ConsoleErrorReporter {
    seen: Mutex<HashSet<String>>,
}

impl ConsoleErrorReporter {
    /// Creates an empty reporter with no diagnostics seen yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&self, prefix: &str, code: ErrorCode, text: &str) {
        let key = format!("{code}:{text}");
        let mut seen = self.seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if seen.insert(key) {
            eprintln!("[htmlscan] {prefix} {text}");
        }
    }
}

impl ErrorReporter for ConsoleErrorReporter {
    fn report_warning(&self, code: ErrorCode, args: &[&str]) {
        let text = self.format_message(code, args);
        self.emit("warning:", code, &text);
    }

    fn report_error(&self, code: ErrorCode, args: &[&str]) {
        let text = self.format_message(code, args);
        self.emit("error:", code, &text);
    }
}

/// Reporter that drops every diagnostic; useful for tests asserting only on
/// the event stream.
#[derive(Debug, Default)]
pub struct SilentErrorReporter;

impl ErrorReporter for SilentErrorReporter {
    fn report_warning(&self, _code: ErrorCode, _args: &[&str]) {}
    fn report_error(&self, _code: ErrorCode, _args: &[&str]) {}
}

/// Reporter that records every diagnostic in order, for test assertions.
#[derive(Debug, Default)]
pub struct CollectingErrorReporter {
    /// Diagnostics reported so far, in order.
    pub diagnostics: Mutex<Vec<Diagnostic>>,
}

impl ErrorReporter for CollectingErrorReporter {
    fn report_warning(&self, code: ErrorCode, args: &[&str]) {
        let message = self.format_message(code, args);
        self.diagnostics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(Diagnostic { code, message, is_error: false });
    }

    fn report_error(&self, code: ErrorCode, args: &[&str]) {
        let message = self.format_message(code, args);
        self.diagnostics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(Diagnostic { code, message, is_error: true });
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectingErrorReporter, ErrorCode, ErrorReporter};

    #[test]
    fn collects_in_order() {
        let reporter = CollectingErrorReporter::default();
        reporter.report_warning(ErrorCode::UnrecognizedEntity, &["foo"]);
        reporter.report_error(ErrorCode::MissingDoctypeName, &[]);
        let diags = reporter.diagnostics.lock().unwrap();
        assert_eq!(diags.len(), 2);
        assert!(!diags[0].is_error);
        assert!(diags[1].is_error);
    }
}
