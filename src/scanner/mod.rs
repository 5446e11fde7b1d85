//! Scanner dispatcher: owns the entity stack, the current scanner mode and
//! kind, and drives the pull-based `scan` loop.

pub mod content;
pub mod plaintext;
pub mod special;

use crate::byte_source::{detect_encoding, PlaybackBuffer};
use crate::entity::{CurrentEntity, EntityStack};
use crate::error::{ErrorCode, ErrorReporter, ScanError};
use crate::event::{Event, EventSink};
use crate::options::ScannerOptions;
use crate::recognizer::EntityRecognizer;
use std::io::Read;

/// The scanner's coarse-grained mode, independent of which scanner kind is
/// currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ScannerMode {
    /// Emits `startDocument` once, then switches to `Content`.
    StartDocument,
    /// The steady-state mode; delegates to the active `ScannerKind`.
    Content,
    /// Emits `endDocument` and terminates.
    EndDocument,
}

/// Which sub-scanner is currently consuming input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerKind {
    /// Ordinary markup recognition.
    Content,
    /// Raw-text mode for one tag (`script`, `style`, `title`, ...).
    Special {
        /// Lowercased name of the tag whose content is being consumed.
        tag_name: String,
        /// Whether entities are decoded (RCDATA) and whether the nested
        /// HTML-comment escape applies (`script`).
        content_kind: crate::options::SpecialContent,
    },
    /// Terminal mode: the rest of input is one character run.
    PlainText,
}

/// What the caller should do after one `scan` call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// At least one event was emitted (or a mode transition occurred);
    /// call `scan` again to continue.
    MoreToDo,
    /// `endDocument` was emitted; no further `scan` calls are useful.
    Done,
}

/// Context a character reference is being scanned in, controlling the
/// WHATWG ambiguous-ampersand attribute fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefContext {
    /// Plain character data.
    Content,
    /// Inside an attribute value.
    Attribute,
}

/// Owns all mutable scanning state for one document.
pub struct Scanner<R> {
    entities: EntityStack<R>,
    mode: ScannerMode,
    kind: ScannerKind,
    options: ScannerOptions,
    reporter: Box<dyn ErrorReporter>,
    recognizer: EntityRecognizer,
    /// Set by `change_encoding` to the character offset reached at switch
    /// time. Events are suppressed while replaying the redecoded stream
    /// back up to this offset, since that span was already reported once
    /// under the old encoding.
    suppress_until_offset: Option<u64>,
    doctype_emitted: bool,
    /// Notification name recorded by the most recent `scan_entity_reference`
    /// call, if the configured `notify-*-refs` option calls for bracketing
    /// that reference with `startGeneralEntity`/`endGeneralEntity` events.
    /// Only ever set for `RefContext::Content`.
    last_entity_notify: Option<String>,
}

impl<R: Read> Scanner<R> {
    /// Builds a scanner over `root`, already decoding with the detected or
    /// default encoding.
    #[must_use]
    pub fn new(root: CurrentEntity<R>, options: ScannerOptions, reporter: Box<dyn ErrorReporter>) -> Self {
        let fix_mswindows_refs = options.fix_mswindows_refs;
        Self {
            entities: EntityStack::new(root),
            mode: ScannerMode::StartDocument,
            kind: ScannerKind::Content,
            options,
            reporter,
            recognizer: EntityRecognizer::new(fix_mswindows_refs),
            suppress_until_offset: None,
            doctype_emitted: false,
            last_entity_notify: None,
        }
    }

    /// Opens `source` for scanning, detecting a leading BOM and falling
    /// back to `options.default_encoding` when none is present.
    ///
    /// # Errors
    /// Returns an error if probing `source` for a BOM fails.
    pub fn open(source: R, options: ScannerOptions, reporter: Box<dyn ErrorReporter>) -> std::io::Result<Self> {
        let mut playback = PlaybackBuffer::new(source);
        let encoding = detect_encoding(&mut playback, &options.default_encoding)?;
        let root = CurrentEntity::new(playback, encoding);
        Ok(Self::new(root, options, reporter))
    }

    #[must_use]
    pub const fn options(&self) -> &ScannerOptions {
        &self.options
    }

    pub(crate) fn report_warning(&self, code: ErrorCode, args: &[&str]) {
        if self.options.report_errors {
            self.reporter.report_warning(code, args);
        }
    }

    pub(crate) fn report_error(&self, code: ErrorCode, args: &[&str]) {
        if self.options.report_errors {
            self.reporter.report_error(code, args);
        }
    }

    pub(crate) fn next_char(&mut self) -> std::io::Result<Option<char>> {
        self.entities.top_mut().next_char()
    }

    pub(crate) fn peek_char(&mut self, ahead: usize) -> std::io::Result<Option<char>> {
        self.entities.top_mut().peek_char(ahead)
    }

    pub(crate) fn rewind(&mut self, n: usize) {
        self.entities.top_mut().rewind(n);
    }

    /// Stacks a nested input source (e.g. script-generated output) and
    /// resumes decoding it; the previous frame resumes automatically once
    /// this one is exhausted.
    pub fn push_input_source(&mut self, source: CurrentEntity<R>) {
        self.entities.push_input_source(source);
    }

    /// Releases every entity frame; `close_all` also drops the root frame.
    pub fn cleanup(&mut self, close_all: bool) {
        self.entities.cleanup(close_all);
    }

    /// Runs the scan loop. When `complete` is `false`, returns after the
    /// first step that emits at least one event or changes `mode`. When
    /// `true`, runs until `endDocument`.
    pub fn scan<S: EventSink>(&mut self, sink: &mut S, complete: bool) -> Result<ScanOutcome, ScanError> {
        loop {
            match self.mode {
                ScannerMode::StartDocument => {
                    let encoding = self.entities.top().encoding.clone();
                    sink.event(Event::StartDocument { encoding, location: self.location_if_enabled() });
                    if let Some((name, public_id, system_id)) = self.options.insert_doctype.clone() {
                        sink.event(Event::DoctypeDecl {
                            root: name,
                            public_id,
                            system_id,
                            location: self.location_if_enabled(),
                        });
                        self.doctype_emitted = true;
                    }
                    self.mode = ScannerMode::Content;
                    if !complete {
                        return Ok(ScanOutcome::MoreToDo);
                    }
                }
                ScannerMode::Content => {
                    let emitted = match &self.kind {
                        ScannerKind::Content => content::step(self, sink)?,
                        ScannerKind::Special { .. } => special::step(self, sink)?,
                        ScannerKind::PlainText => plaintext::step(self, sink)?,
                    };
                    if self.entities.top().at_eof() {
                        if self.entities.pop_if_exhausted() {
                            // resumed the outer frame; keep scanning
                        } else {
                            self.mode = ScannerMode::EndDocument;
                        }
                    }
                    if !complete && emitted {
                        return Ok(ScanOutcome::MoreToDo);
                    }
                }
                ScannerMode::EndDocument => {
                    sink.event(Event::EndDocument { location: self.location_if_enabled() });
                    return Ok(ScanOutcome::Done);
                }
            }
        }
    }

    fn location_if_enabled(&self) -> Option<crate::location::LocationItem> {
        if self.options.augmentations {
            let loc = self.entities.top().location();
            let here = loc.snapshot();
            Some(loc.item_from(here))
        } else {
            None
        }
    }

    pub(crate) fn begin_location(&self) -> (u32, u32, u64) {
        self.entities.top().location().snapshot()
    }

    pub(crate) fn end_location(&self, start: (u32, u32, u64)) -> Option<crate::location::LocationItem> {
        if self.options.augmentations {
            Some(self.entities.top().location().item_from(start))
        } else {
            None
        }
    }

    pub(crate) fn switch_kind(&mut self, kind: ScannerKind) {
        self.kind = kind;
    }

    pub(crate) fn kind(&self) -> &ScannerKind {
        &self.kind
    }

    pub(crate) fn doctype_emitted(&self) -> bool {
        self.doctype_emitted
    }

    pub(crate) fn mark_doctype_emitted(&mut self) {
        self.doctype_emitted = true;
    }

    pub(crate) fn release_byte_source_if_body(&mut self, element_name: &str) {
        if element_name.eq_ignore_ascii_case("body") && !self.entities.top().byte_source_released() {
            self.entities.top_mut().byte_source_mut().clear();
        }
    }

    /// Character offset reached so far in the current entity frame.
    pub(crate) fn current_offset(&self) -> u64 {
        self.entities.top().location().offset()
    }

    /// Suppresses re-emission of already-reported events while replaying
    /// the redecoded stream back up to the offset recorded at an encoding
    /// switch. Offsets are monotonic within a freshly redecoded frame, so
    /// this clears itself permanently once the replay catches back up;
    /// no explicit reset is needed.
    pub(crate) fn should_suppress(&self) -> bool {
        self.suppress_until_offset.is_some_and(|o| self.current_offset() < o)
    }

    /// Implements the `<meta charset>` encoding-switch algorithm from the
    /// content scanner: round-trip-checks `new_encoding` against the
    /// current one, then, if compatible, switches the current frame to
    /// replay its playback buffer under the new encoding.
    pub(crate) fn change_encoding(&mut self, new_encoding: &str) {
        if self.options.ignore_specified_charset {
            return;
        }
        let current_encoding = self.entities.top().encoding.clone();
        if self.entities.top().byte_source_released() || current_encoding.eq_ignore_ascii_case(new_encoding) {
            return;
        }
        if !round_trip_compatible(&current_encoding, new_encoding) {
            self.report_error(ErrorCode::IncompatibleEncodingSwitch, &[&current_encoding, new_encoding]);
            return;
        }
        let switch_offset = self.current_offset();
        self.entities.top_mut().byte_source_mut().playback();
        self.entities.redecode_top(new_encoding);
        self.suppress_until_offset = Some(switch_offset);
    }

    /// Scans one `&...` character reference starting right after `&` has
    /// been consumed. Returns the text to append to the current run
    /// (replacement text, or `"&"` followed by nothing if the reference
    /// does not apply and its characters were pushed back for normal
    /// re-scanning).
    pub(crate) fn scan_entity_reference(&mut self, context: RefContext) -> std::io::Result<String> {
        self.last_entity_notify = None;
        match self.peek_char(0)? {
            Some('#') => self.scan_numeric_reference(context),
            Some(c) if c.is_ascii_alphanumeric() => self.scan_named_reference(context),
            _ => Ok("&".to_string()),
        }
    }

    /// Returns and clears the notification name recorded by the most
    /// recent `scan_entity_reference` call, if any. Content-character
    /// scanning calls this after expanding a reference to decide whether
    /// to bracket it with `StartGeneralEntity`/`EndGeneralEntity` instead
    /// of folding its replacement into the surrounding character run.
    pub(crate) fn take_entity_notify(&mut self) -> Option<String> {
        self.last_entity_notify.take()
    }

    fn scan_numeric_reference(&mut self, context: RefContext) -> std::io::Result<String> {
        let _ = self.next_char()?; // '#'
        let hex = matches!(self.peek_char(0)?, Some('x' | 'X'));
        if hex {
            let _ = self.next_char()?;
        }
        self.recognizer.reset_numeric(hex);
        loop {
            match self.next_char()? {
                Some(c) => {
                    if !self.recognizer.parse_numeric(c) {
                        if c != ';' {
                            self.rewind(1);
                        }
                        break;
                    }
                }
                None => break,
            }
        }
        match self.recognizer.get_match() {
            Some(replacement) => {
                if context == RefContext::Content && self.options.notify_char_refs {
                    self.last_entity_notify = self.recognizer.get_match_name();
                }
                Ok(replacement)
            }
            None => {
                self.report_warning(ErrorCode::InvalidCodePoint, &[]);
                Ok(if hex { "&#x".to_string() } else { "&#".to_string() })
            }
        }
    }

    fn scan_named_reference(&mut self, context: RefContext) -> std::io::Result<String> {
        self.recognizer.reset_named();
        let mut consumed = 0usize;
        loop {
            match self.next_char()? {
                Some(c) => {
                    consumed += 1;
                    if !self.recognizer.parse(c) {
                        break;
                    }
                }
                None => break,
            }
        }
        match self.recognizer.get_match() {
            Some(replacement) => {
                let rewind = self.recognizer.get_rewind_count();
                if rewind > 0 {
                    self.rewind(rewind);
                }
                // Ambiguous ampersand: a legacy no-semicolon match inside an
                // attribute value is discarded (and fully rewound) if
                // immediately followed by '=' or an alphanumeric, per the
                // WHATWG attribute-value character-reference rule.
                if context == RefContext::Attribute
                    && !self.recognizer.ends_with_semicolon()
                    && self.peek_char(0)?.is_some_and(|c| c == '=' || c.is_ascii_alphanumeric())
                {
                    self.rewind(consumed - rewind);
                    return Ok("&".to_string());
                }
                if context == RefContext::Content {
                    if let Some(name) = self.recognizer.get_match_name() {
                        let xml_builtin = matches!(name.as_str(), "amp" | "lt" | "gt" | "apos" | "quot");
                        if (xml_builtin && self.options.notify_xml_builtin_refs) || self.options.notify_html_builtin_refs {
                            self.last_entity_notify = Some(name);
                        }
                    }
                }
                Ok(replacement)
            }
            None => {
                self.report_warning(ErrorCode::UnrecognizedEntity, &[]);
                self.rewind(consumed);
                Ok("&".to_string())
            }
        }
    }
}

/// Checks whether encoding bytes as `from` and decoding them as `to`
/// round-trips a reference ASCII string unchanged. A coarse but adequate
/// compatibility check for the encodings this crate supports: any two of
/// `{utf-8, windows-1252}` round-trip ASCII identically; UTF-16 variants
/// are only compatible with themselves.
fn round_trip_compatible(from: &str, to: &str) -> bool {
    let ascii_safe = |label: &str| matches!(label.to_ascii_lowercase().as_str(), "utf-8" | "utf8" | "windows-1252" | "cp1252");
    if ascii_safe(from) && ascii_safe(to) {
        return true;
    }
    from.eq_ignore_ascii_case(to)
}
