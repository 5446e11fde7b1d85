//! Byte source with BOM detection and an encoding-switch playback buffer.
//!
//! [PlaybackBuffer] sits between the raw [`std::io::Read`] stream and the
//! character decoder. It remembers every byte it has served so that, if a
//! `<meta charset>` declaration later names a different (compatible)
//! encoding, the scanner can rewind to byte zero and redecode without
//! re-reading the underlying stream.

use std::collections::VecDeque;
use std::io::{self, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
enum BufferState {
    Buffering,
    Playback,
    Cleared,
}

/// A byte source with three disjoint buffering states. See the module docs.
pub struct PlaybackBuffer<R> {
    inner: R,
    state: BufferState,
    buffer: Vec<u8>,
    playback_pos: usize,
    pushback: VecDeque<u8>,
}

impl<R: Read> PlaybackBuffer<R> {
    /// Wraps `inner`, starting in the `buffering` state.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: BufferState::Buffering,
            buffer: Vec::new(),
            playback_pos: 0,
            pushback: VecDeque::new(),
        }
    }

    /// Reads the next byte, or `None` at end of stream.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pushback.pop_front() {
            return Ok(Some(b));
        }
        match self.state {
            BufferState::Playback => {
                if self.playback_pos < self.buffer.len() {
                    let b = self.buffer[self.playback_pos];
                    self.playback_pos += 1;
                    Ok(Some(b))
                } else {
                    self.state = BufferState::Cleared;
                    self.buffer.clear();
                    self.read_from_inner()
                }
            }
            BufferState::Buffering => match self.read_from_inner()? {
                Some(b) => {
                    self.buffer.push(b);
                    Ok(Some(b))
                }
                None => Ok(None),
            },
            BufferState::Cleared => self.read_from_inner(),
        }
    }

    fn read_from_inner(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Pushes a byte back so the next `read_byte` returns it. Used to
    /// un-consume bytes probed during BOM detection.
    pub fn unread(&mut self, byte: u8) {
        self.pushback.push_front(byte);
    }

    /// Switches from `buffering` to `playback`, replaying from offset zero.
    /// A no-op if already in `playback` or `cleared`.
    pub fn playback(&mut self) {
        if self.state == BufferState::Buffering {
            self.state = BufferState::Playback;
            self.playback_pos = 0;
        }
    }

    /// Discards the internal buffer. Ignored while `playback` is in
    /// progress; the buffer auto-clears once playback is exhausted. After
    /// `clear`, this source never buffers again.
    pub fn clear(&mut self) {
        if self.state != BufferState::Playback {
            self.state = BufferState::Cleared;
            self.buffer.clear();
        }
    }

    /// `true` once this buffer can no longer be replayed (playback done
    /// or explicitly cleared).
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.state == BufferState::Cleared
    }
}

/// Recognized byte-order marks and their implied encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedBom {
    /// `EF BB BF`.
    Utf8,
    /// `FF FE`.
    Utf16Le,
    /// `FE FF`.
    Utf16Be,
    /// No recognized BOM; the configured default applies.
    None,
}

/// Probes up to three leading bytes for a BOM, consuming it if found and
/// pushing back any probed-but-unconsumed bytes otherwise. Returns the
/// resolved IANA encoding label.
pub fn detect_encoding<R: Read>(
    source: &mut PlaybackBuffer<R>,
    default_label: &str,
) -> io::Result<String> {
    let mut probe = Vec::with_capacity(3);
    for _ in 0..3 {
        match source.read_byte()? {
            Some(b) => probe.push(b),
            None => break,
        }
    }

    let bom = if probe.starts_with(&[0xEF, 0xBB, 0xBF]) {
        DetectedBom::Utf8
    } else if probe.starts_with(&[0xFF, 0xFE]) {
        DetectedBom::Utf16Le
    } else if probe.starts_with(&[0xFE, 0xFF]) {
        DetectedBom::Utf16Be
    } else {
        DetectedBom::None
    };

    match bom {
        DetectedBom::Utf8 => Ok("utf-8".to_string()),
        DetectedBom::Utf16Le | DetectedBom::Utf16Be => {
            if probe.len() == 3 {
                source.unread(probe[2]);
            }
            Ok(if bom == DetectedBom::Utf16Le { "utf-16le" } else { "utf-16be" }.to_string())
        }
        DetectedBom::None => {
            for &b in probe.iter().rev() {
                source.unread(b);
            }
            Ok(default_label.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{detect_encoding, PlaybackBuffer};
    use std::io::Cursor;

    #[test]
    fn detects_utf8_bom_and_consumes_it() {
        let mut buf = PlaybackBuffer::new(Cursor::new(vec![0xEF, 0xBB, 0xBF, b'x']));
        let label = detect_encoding(&mut buf, "windows-1252").unwrap();
        assert_eq!(label, "utf-8");
        assert_eq!(buf.read_byte().unwrap(), Some(b'x'));
    }

    #[test]
    fn no_bom_pushes_probed_bytes_back_in_order() {
        let mut buf = PlaybackBuffer::new(Cursor::new(vec![b'a', b'b', b'c', b'd']));
        let label = detect_encoding(&mut buf, "windows-1252").unwrap();
        assert_eq!(label, "windows-1252");
        assert_eq!(buf.read_byte().unwrap(), Some(b'a'));
        assert_eq!(buf.read_byte().unwrap(), Some(b'b'));
        assert_eq!(buf.read_byte().unwrap(), Some(b'c'));
        assert_eq!(buf.read_byte().unwrap(), Some(b'd'));
    }

    #[test]
    fn playback_replays_then_falls_through() {
        let mut buf = PlaybackBuffer::new(Cursor::new(vec![1, 2, 3, 4]));
        assert_eq!(buf.read_byte().unwrap(), Some(1));
        assert_eq!(buf.read_byte().unwrap(), Some(2));
        buf.playback();
        assert_eq!(buf.read_byte().unwrap(), Some(1));
        assert_eq!(buf.read_byte().unwrap(), Some(2));
        assert_eq!(buf.read_byte().unwrap(), Some(3));
        assert_eq!(buf.read_byte().unwrap(), Some(4));
        assert!(buf.is_released());
    }

    #[test]
    fn clear_discards_buffer() {
        let mut buf = PlaybackBuffer::new(Cursor::new(vec![1, 2, 3]));
        assert_eq!(buf.read_byte().unwrap(), Some(1));
        buf.clear();
        assert!(buf.is_released());
        assert_eq!(buf.read_byte().unwrap(), Some(2));
    }
}
