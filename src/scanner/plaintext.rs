//! The terminal `PLAINTEXT` scanner: once entered, every remaining byte of
//! the document is one character run and no markup is ever recognized
//! again.

use super::Scanner;
use crate::error::ScanError;
use crate::event::{Event, EventSink};
use std::io::Read;

pub(super) fn step<R: Read, S: EventSink>(scanner: &mut Scanner<R>, sink: &mut S) -> Result<bool, ScanError> {
    let start = scanner.begin_location();
    let mut text = String::new();
    while let Some(c) = scanner.next_char()? {
        text.push(c);
    }
    if text.is_empty() {
        return Ok(false);
    }
    sink.event(Event::Characters { text, location: scanner.end_location(start) });
    Ok(true)
}
