//! Byte-to-character decoding for the handful of encodings this scanner
//! supports out of the box (`utf-8`, `utf-16le`, `utf-16be`,
//! `windows-1252`). A richer codec table is an external concern; this
//! crate only needs enough decoding to drive its own tests and the
//! `<meta charset>` round-trip check in [`crate::scanner::content`].

use crate::byte_source::PlaybackBuffer;
use crate::windows1252;
use std::io::{self, Read};

/// Builds the decoder matching an IANA label, falling back to
/// Windows-1252 for anything unrecognized (the caller is responsible for
/// reporting `HTML1001` in that case).
#[must_use]
pub fn decoder_for(label: &str) -> Box<dyn CharDecoder> {
    match label.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => Box::new(Utf8Decoder),
        "utf-16le" | "utf16le" => Box::new(Utf16Decoder { big_endian: false }),
        "utf-16be" | "utf16be" => Box::new(Utf16Decoder { big_endian: true }),
        _ => Box::new(Windows1252Decoder),
    }
}

/// Decodes one character at a time from an object-safe byte source, so
/// `decoder_for` can return a trait object over any [`PlaybackBuffer<R>`].
pub trait CharDecoder {
    /// Reads and decodes the next character, or `None` at end of stream.
    /// Invalid byte sequences decode to `U+FFFD`.
    fn next_char(&mut self, source: &mut dyn ByteReader) -> io::Result<Option<char>>;
}

/// Object-safe byte source, implemented for any [`PlaybackBuffer<R>`].
pub trait ByteReader {
    /// See [`PlaybackBuffer::read_byte`].
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<R: Read> ByteReader for PlaybackBuffer<R> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.read_byte()
    }
}

struct Utf8Decoder;

impl CharDecoder for Utf8Decoder {
    fn next_char(&mut self, source: &mut dyn ByteReader) -> io::Result<Option<char>> {
        let Some(first) = source.read_byte()? else {
            return Ok(None);
        };
        let extra = if first < 0x80 {
            return Ok(Some(first as char));
        } else if first & 0xE0 == 0xC0 {
            1
        } else if first & 0xF0 == 0xE0 {
            2
        } else if first & 0xF8 == 0xF0 {
            3
        } else {
            return Ok(Some('\u{FFFD}'));
        };

        let mut value = u32::from(first & (0x7F >> extra));
        for _ in 0..extra {
            match source.read_byte()? {
                Some(b) if b & 0xC0 == 0x80 => value = (value << 6) | u32::from(b & 0x3F),
                _ => return Ok(Some('\u{FFFD}')),
            }
        }
        Ok(Some(char::from_u32(value).unwrap_or('\u{FFFD}')))
    }
}

struct Utf16Decoder {
    big_endian: bool,
}

impl Utf16Decoder {
    fn read_unit(&self, source: &mut dyn ByteReader) -> io::Result<Option<u16>> {
        let Some(a) = source.read_byte()? else {
            return Ok(None);
        };
        let Some(b) = source.read_byte()? else {
            return Ok(Some(u16::from(a)));
        };
        Ok(Some(if self.big_endian {
            (u16::from(a) << 8) | u16::from(b)
        } else {
            (u16::from(b) << 8) | u16::from(a)
        }))
    }
}

impl CharDecoder for Utf16Decoder {
    fn next_char(&mut self, source: &mut dyn ByteReader) -> io::Result<Option<char>> {
        let Some(unit) = self.read_unit(source)? else {
            return Ok(None);
        };
        if (0xD800..=0xDBFF).contains(&unit) {
            let Some(low) = self.read_unit(source)? else {
                return Ok(Some('\u{FFFD}'));
            };
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Ok(Some('\u{FFFD}'));
            }
            let high = u32::from(unit - 0xD800);
            let low = u32::from(low - 0xDC00);
            let code_point = 0x10000 + (high << 10) + low;
            return Ok(Some(char::from_u32(code_point).unwrap_or('\u{FFFD}')));
        }
        Ok(Some(char::from_u32(u32::from(unit)).unwrap_or('\u{FFFD}')))
    }
}

struct Windows1252Decoder;

impl CharDecoder for Windows1252Decoder {
    fn next_char(&mut self, source: &mut dyn ByteReader) -> io::Result<Option<char>> {
        let Some(byte) = source.read_byte()? else {
            return Ok(None);
        };
        Ok(Some(char::from_u32(windows1252::decode_byte(byte)).unwrap_or('\u{FFFD}')))
    }
}

#[cfg(test)]
mod tests {
    use super::{decoder_for, ByteReader};
    use crate::byte_source::PlaybackBuffer;
    use std::io::Cursor;

    #[test]
    fn decodes_utf8_multibyte() {
        let mut buf = PlaybackBuffer::new(Cursor::new("€".as_bytes().to_vec()));
        let mut decoder = decoder_for("utf-8");
        let ch = decoder.next_char(&mut buf as &mut dyn ByteReader).unwrap();
        assert_eq!(ch, Some('€'));
    }

    #[test]
    fn decodes_windows1252_smart_quote() {
        let mut buf = PlaybackBuffer::new(Cursor::new(vec![0x93]));
        let mut decoder = decoder_for("windows-1252");
        let ch = decoder.next_char(&mut buf as &mut dyn ByteReader).unwrap();
        assert_eq!(ch, Some('\u{201C}'));
    }

    #[test]
    fn unknown_label_falls_back_to_windows1252() {
        let mut buf = PlaybackBuffer::new(Cursor::new(vec![b'A']));
        let mut decoder = decoder_for("bogus-encoding");
        let ch = decoder.next_char(&mut buf as &mut dyn ByteReader).unwrap();
        assert_eq!(ch, Some('A'));
    }
}
