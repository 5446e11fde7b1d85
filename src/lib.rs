//! Streaming, error-tolerant HTML scanner.
//!
//! # Scope
//!
//! This crate implements:
//! - A scanner state machine over content, special raw-text/RCDATA, and
//!   PLAINTEXT regions ([`scanner`])
//! - A named/numeric character-reference recognizer
//!   ([`recognizer`])
//! - An encoding-switch playback buffer that detects a leading BOM and
//!   rewinds/redecodes when `<meta charset>` or `<?xml encoding?>` names a
//!   different, compatible encoding ([`byte_source`])
//!
//! Scanning produces a flat stream of [`Event`]s through an [`EventSink`];
//! tree construction, namespace binding, and DOM mutation are a downstream
//! concern, not this crate's.
//!
//! # Not in scope
//!
//! - Tree construction and namespace binding
//! - XNI/SAX/XPath/DTD processing
//! - URI resolution beyond what the scanner itself needs
//! - A CLI or config-file loader for [`ScannerOptions`]

/// Byte-level decoding: per-encoding character decoders and Windows-1252
/// fix-up tables.
pub mod decode;
/// Fatal I/O failures and the advisory diagnostic reporter.
pub mod error;
/// Document events and the sink interface downstream consumers implement.
pub mod event;
/// Decoding frames and the stack of nested input sources.
pub mod entity;
/// Byte source with BOM detection and an encoding-switch playback buffer.
pub mod byte_source;
/// Line/column/offset tracking for event locations.
pub mod location;
/// Scanner configuration.
pub mod options;
/// Named and numeric character-reference recognition.
pub mod recognizer;
/// The scanner state machine.
pub mod scanner;
/// Windows-1252 byte-to-codepoint fix-up table.
pub mod windows1252;

pub use entity::CurrentEntity;
pub use error::{CollectingErrorReporter, ConsoleErrorReporter, ErrorCode, ErrorReporter, ScanError, SilentErrorReporter};
pub use event::{Attribute, AttributeList, Event, EventSink, PassThroughSink, QualifiedName, RecordingSink};
pub use options::{CaseFolding, ScannerOptions, SpecialContent};
pub use scanner::{ScanOutcome, Scanner};
