//! Decoding frames and the stack of nested input sources.
//!
//! "Entity" here means a source-side decoding frame — unrelated to HTML
//! character entities (the named/numeric `&...;` references handled in
//! [`crate::recognizer`]).

use crate::byte_source::PlaybackBuffer;
use crate::decode::{decoder_for, ByteReader, CharDecoder};
use crate::location::LocationTracker;
use std::io::{self, Read};

const DEFAULT_CAPACITY: usize = 2048;
const GROWTH_FACTOR: f64 = 1.25;

/// A growable lookahead buffer of already-decoded characters, with
/// `offset`/`length` bookkeeping so the entity recognizer can extend it
/// without invalidating positions a caller may still rewind to.
#[derive(Debug, Default)]
pub struct CharBuffer {
    chars: Vec<char>,
    offset: usize,
}

impl CharBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self { chars: Vec::with_capacity(DEFAULT_CAPACITY), offset: 0 }
    }

    /// Appends a character, growing by [`GROWTH_FACTOR`] as a geometric
    /// series rather than one at a time (the `Vec` itself already
    /// amortizes this; the explicit capacity hint mirrors the source
    /// buffer's stated growth policy).
    pub fn push(&mut self, ch: char) {
        if self.chars.len() == self.chars.capacity() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let grown = ((self.chars.capacity().max(1) as f64) * GROWTH_FACTOR) as usize;
            self.chars.reserve(grown.saturating_sub(self.chars.capacity()));
        }
        self.chars.push(ch);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Advances the read offset by one, returning the character just
    /// consumed.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.offset).copied();
        if ch.is_some() {
            self.offset += 1;
        }
        ch
    }

    #[must_use]
    pub fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.offset + ahead).copied()
    }

    /// Rewinds the read offset by `n` characters. Never rewinds past the
    /// start of the buffer.
    pub fn rewind(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    /// Drops every character already consumed, keeping only the
    /// unconsumed tail at the start of the buffer. Mirrors the
    /// `load(remain)` pre-copy used when a scan spans a buffer boundary.
    pub fn compact(&mut self) {
        if self.offset > 0 {
            self.chars.drain(0..self.offset);
            self.offset = 0;
        }
    }
}

/// A decoding frame: the state needed to pull characters from one input
/// source (the top-level document, or one `push_input_source`-injected
/// stream).
pub struct CurrentEntity<R> {
    buffer: CharBuffer,
    decoder: Box<dyn CharDecoder>,
    source: PlaybackBuffer<R>,
    at_eof: bool,
    /// One-character pushback slot, used only to look one character past a
    /// decoded `\r` to decide whether it starts a `\r\n` pair.
    pending: Option<char>,
    location: LocationTracker,
    /// IANA label this frame is currently decoding with.
    pub encoding: String,
    /// Public identifier of this entity's input source, if supplied.
    pub public_id: Option<String>,
    /// Base system identifier, if supplied.
    pub base_system_id: Option<String>,
    /// Literal system identifier exactly as supplied.
    pub literal_system_id: Option<String>,
    /// System identifier resolved against the base, if applicable.
    pub expanded_system_id: Option<String>,
}

impl<R: Read> CurrentEntity<R> {
    /// Creates a frame decoding `source` with the given encoding label.
    #[must_use]
    pub fn new(source: PlaybackBuffer<R>, encoding: String) -> Self {
        Self {
            buffer: CharBuffer::new(),
            decoder: decoder_for(&encoding),
            source,
            at_eof: false,
            pending: None,
            location: LocationTracker::new(),
            encoding,
            public_id: None,
            base_system_id: None,
            literal_system_id: None,
            expanded_system_id: None,
        }
    }

    #[must_use]
    pub const fn location(&self) -> &LocationTracker {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut LocationTracker {
        &mut self.location
    }

    #[must_use]
    pub const fn at_eof(&self) -> bool {
        self.at_eof
    }

    /// Fills the buffer from the underlying decoder until at least one
    /// more character is available or the source is exhausted. Returns
    /// the number of characters read, or 0 at end of stream.
    ///
    /// Collapses `\r\n` and a lone `\r` to a single `\n`, so the buffer
    /// (and therefore every `next_char`/`peek_char` caller) only ever sees
    /// normalized newlines.
    fn load_more(&mut self) -> io::Result<usize> {
        let next = match self.pending.take() {
            Some(ch) => Some(ch),
            None => self.decoder.next_char(&mut self.source as &mut dyn ByteReader)?,
        };
        match next {
            Some('\r') => {
                match self.decoder.next_char(&mut self.source as &mut dyn ByteReader)? {
                    Some('\n') => {}
                    other => self.pending = other,
                }
                self.buffer.push('\n');
                Ok(1)
            }
            Some(ch) => {
                self.buffer.push(ch);
                Ok(1)
            }
            None => {
                self.at_eof = true;
                Ok(0)
            }
        }
    }

    /// Consumes and returns the next character, decoding more input if
    /// the lookahead buffer is exhausted.
    pub fn next_char(&mut self) -> io::Result<Option<char>> {
        if self.buffer.peek(0).is_none() && !self.at_eof {
            self.load_more()?;
        }
        let ch = self.buffer.advance();
        if let Some(c) = ch {
            self.location.advance(c);
        }
        Ok(ch)
    }

    /// Looks ahead `n` characters without consuming, decoding more input
    /// as needed.
    pub fn peek_char(&mut self, n: usize) -> io::Result<Option<char>> {
        while self.buffer.peek(n).is_none() && !self.at_eof {
            self.load_more()?;
        }
        Ok(self.buffer.peek(n))
    }

    /// Rewinds `n` characters, restoring both the lookahead buffer and the
    /// line/column/offset tracker. Callers must not rewind across a
    /// newline without also restoring a saved `LocationTracker` snapshot
    /// (see [`LocationTracker::rewind_one`]).
    pub fn rewind(&mut self, n: usize) {
        self.buffer.rewind(n);
        for _ in 0..n {
            self.location.rewind_one();
        }
    }

    /// Drops consumed characters from the buffer, keeping memory bounded
    /// for long documents.
    pub fn compact(&mut self) {
        self.buffer.compact();
    }

    /// `true` once the underlying playback buffer can no longer replay.
    #[must_use]
    pub fn byte_source_released(&self) -> bool {
        self.source.is_released()
    }

    pub fn byte_source_mut(&mut self) -> &mut PlaybackBuffer<R> {
        &mut self.source
    }

    /// Rebuilds this frame to decode its existing byte source under a new
    /// encoding, discarding any buffered-but-unconsumed characters. Call
    /// only after switching the byte source itself into `playback` mode.
    #[must_use]
    pub fn redecode(self, new_encoding: String) -> Self {
        Self {
            buffer: CharBuffer::new(),
            decoder: decoder_for(&new_encoding),
            source: self.source,
            at_eof: false,
            location: LocationTracker::new(),
            encoding: new_encoding,
            public_id: self.public_id,
            base_system_id: self.base_system_id,
            literal_system_id: self.literal_system_id,
            expanded_system_id: self.expanded_system_id,
        }
    }
}

/// An ordered stack of decoding frames. The top frame is active; popping
/// on end-of-stream transparently resumes the caller's frame.
pub struct EntityStack<R> {
    frames: Vec<CurrentEntity<R>>,
}

impl<R: Read> EntityStack<R> {
    #[must_use]
    pub fn new(root: CurrentEntity<R>) -> Self {
        Self { frames: vec![root] }
    }

    #[must_use]
    pub fn top(&self) -> &CurrentEntity<R> {
        self.frames.last().expect("entity stack is never empty while scanning")
    }

    pub fn top_mut(&mut self) -> &mut CurrentEntity<R> {
        self.frames.last_mut().expect("entity stack is never empty while scanning")
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Stacks a new frame and starts decoding from it. The previous top
    /// frame resumes automatically once this one is exhausted and popped.
    pub fn push_input_source(&mut self, frame: CurrentEntity<R>) {
        self.frames.push(frame);
    }

    /// Pops the top frame if it is at end of stream and more than one
    /// frame remains. Returns `true` if a frame was popped.
    pub fn pop_if_exhausted(&mut self) -> bool {
        if self.frames.len() > 1 && self.frames.last().is_some_and(CurrentEntity::at_eof) {
            let _ = self.frames.pop();
            true
        } else {
            false
        }
    }

    /// Releases every frame. `close_all` additionally drops the
    /// originally supplied root stream (dropping the `EntityStack` itself
    /// already does this; kept as an explicit, documented operation
    /// mirroring `cleanup(closeAll)`).
    pub fn cleanup(&mut self, close_all: bool) {
        if close_all {
            self.frames.clear();
        } else {
            self.frames.truncate(1);
        }
    }

    /// Rebuilds the top frame to decode under `new_encoding`. The caller
    /// must have already switched that frame's byte source to `playback`.
    ///
    /// # Panics
    /// Panics if the stack is empty (never true while scanning).
    pub fn redecode_top(&mut self, new_encoding: &str) {
        let top = self.frames.pop().expect("entity stack is never empty while scanning");
        self.frames.push(top.redecode(new_encoding.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::{CharBuffer, CurrentEntity, EntityStack};
    use crate::byte_source::PlaybackBuffer;
    use std::io::Cursor;

    #[test]
    fn char_buffer_advance_and_rewind() {
        let mut buf = CharBuffer::new();
        for c in "abc".chars() {
            buf.push(c);
        }
        assert_eq!(buf.advance(), Some('a'));
        assert_eq!(buf.advance(), Some('b'));
        buf.rewind(1);
        assert_eq!(buf.advance(), Some('b'));
        assert_eq!(buf.advance(), Some('c'));
        assert_eq!(buf.advance(), None);
    }

    #[test]
    fn current_entity_decodes_utf8() {
        let source = PlaybackBuffer::new(Cursor::new("hi".as_bytes().to_vec()));
        let mut entity = CurrentEntity::new(source, "utf-8".to_string());
        assert_eq!(entity.next_char().unwrap(), Some('h'));
        assert_eq!(entity.next_char().unwrap(), Some('i'));
        assert_eq!(entity.next_char().unwrap(), None);
        assert!(entity.at_eof());
    }

    #[test]
    fn push_and_pop_nested_source() {
        let root = CurrentEntity::new(
            PlaybackBuffer::new(Cursor::new("A".as_bytes().to_vec())),
            "utf-8".to_string(),
        );
        let mut stack = EntityStack::new(root);
        assert_eq!(stack.top_mut().next_char().unwrap(), Some('A'));
        assert_eq!(stack.top_mut().next_char().unwrap(), None);

        let nested = CurrentEntity::new(
            PlaybackBuffer::new(Cursor::new("BC".as_bytes().to_vec())),
            "utf-8".to_string(),
        );
        stack.push_input_source(nested);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top_mut().next_char().unwrap(), Some('B'));
        assert_eq!(stack.top_mut().next_char().unwrap(), Some('C'));
        assert_eq!(stack.top_mut().next_char().unwrap(), None);
        assert!(stack.pop_if_exhausted());
        assert_eq!(stack.depth(), 1);
    }
}
