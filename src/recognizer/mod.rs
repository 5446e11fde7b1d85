//! The named/numeric character-reference recognizer.
//!
//! Named-reference matching mirrors the WHATWG longest-prefix algorithm
//! via [`named::any_entity_has_prefix`]/[`named::lookup_entity`]: rather
//! than a literal generated transition table, prefix membership is
//! checked against the static entity map, which is equivalent to walking
//! a DFA over that same key set one character at a time.

pub mod named;

use crate::windows1252;

/// One character-reference recognition attempt. Reset with
/// [`EntityRecognizer::reset_named`] or [`EntityRecognizer::reset_numeric`]
/// before each new `&...` sequence.
#[derive(Debug)]
pub struct EntityRecognizer {
    fix_mswindows_refs: bool,
    mode: Mode,
}

#[derive(Debug)]
enum Mode {
    Idle,
    Named {
        consumed: String,
        best_replacement: Option<&'static str>,
        best_len: usize,
        best_semicolon: bool,
    },
    Numeric {
        hex: bool,
        value: u32,
        digits: u32,
        overflowed: bool,
        semicolon: bool,
    },
}

impl EntityRecognizer {
    /// `fix_mswindows_refs` controls whether numeric references in
    /// `0x80..=0x9F` are remapped per the Windows-1252 fix-up table.
    #[must_use]
    pub const fn new(fix_mswindows_refs: bool) -> Self {
        Self { fix_mswindows_refs, mode: Mode::Idle }
    }

    /// Begins a named-reference attempt (the scanner has just consumed
    /// `&`, not followed by `#`).
    pub fn reset_named(&mut self) {
        self.mode = Mode::Named {
            consumed: String::new(),
            best_replacement: None,
            best_len: 0,
            best_semicolon: false,
        };
    }

    /// Begins a numeric-reference attempt; `hex` is `true` for `&#x...`/
    /// `&#X...`, `false` for plain `&#...`. The scanner has already
    /// consumed `#` and any `x`/`X` marker before calling this.
    pub fn reset_numeric(&mut self, hex: bool) {
        self.mode = Mode::Numeric { hex, value: 0, digits: 0, overflowed: false, semicolon: false };
    }

    /// Feeds one character of a named-reference attempt. Returns `true`
    /// to keep feeding characters, `false` once no further extension of
    /// the current prefix can possibly match.
    ///
    /// # Panics
    /// Panics if called while not in a named-reference attempt.
    pub fn parse(&mut self, ch: char) -> bool {
        let Mode::Named { consumed, best_replacement, best_len, best_semicolon } = &mut self.mode
        else {
            panic!("parse() called outside a named-reference attempt");
        };
        consumed.push(ch);
        if let Some(replacement) = named::lookup_entity(consumed) {
            *best_replacement = Some(replacement);
            *best_len = consumed.chars().count();
            *best_semicolon = ch == ';';
        }
        named::any_entity_has_prefix(consumed)
    }

    /// Feeds one character of a numeric-reference attempt. Returns `true`
    /// while `ch` is a valid digit for the current radix; `false` once a
    /// non-digit (the terminator, not consumed into the match) is seen.
    ///
    /// # Panics
    /// Panics if called while not in a numeric-reference attempt.
    pub fn parse_numeric(&mut self, ch: char) -> bool {
        let Mode::Numeric { hex, value, digits, overflowed, semicolon } = &mut self.mode else {
            panic!("parse_numeric() called outside a numeric-reference attempt");
        };
        let radix = if *hex { 16 } else { 10 };
        match ch.to_digit(radix) {
            Some(d) => {
                *value = match value.checked_mul(radix).and_then(|v| v.checked_add(d)) {
                    Some(v) => v,
                    None => {
                        *overflowed = true;
                        *value
                    }
                };
                *digits += 1;
                true
            }
            None => {
                if ch == ';' {
                    *semicolon = true;
                }
                false
            }
        }
    }

    /// The decoded replacement text, if any reference matched.
    #[must_use]
    pub fn get_match(&self) -> Option<String> {
        match &self.mode {
            Mode::Idle => None,
            Mode::Named { best_replacement, .. } => best_replacement.map(ToString::to_string),
            Mode::Numeric { digits, value, overflowed, .. } => {
                if *digits == 0 {
                    return None;
                }
                let code_point = if *overflowed { 0xFFFD } else { *value };
                let code_point = if self.fix_mswindows_refs {
                    windows1252::remap_numeric_reference(code_point)
                } else {
                    code_point
                };
                let ch = char::from_u32(code_point)
                    .filter(|_| !is_surrogate(code_point))
                    .unwrap_or('\u{FFFD}');
                Some(ch.to_string())
            }
        }
    }

    /// The matched reference's name, for `startGeneralEntity`/
    /// `endGeneralEntity` notifications: the bare entity name (no `&`/`;`)
    /// for a named reference, or `#<codepoint>` for a numeric one. `None`
    /// if nothing matched.
    #[must_use]
    pub fn get_match_name(&self) -> Option<String> {
        match &self.mode {
            Mode::Idle => None,
            Mode::Named { consumed, best_replacement, best_len, best_semicolon } => best_replacement.map(|_| {
                let len = if *best_semicolon { best_len - 1 } else { *best_len };
                consumed.chars().take(len).collect()
            }),
            Mode::Numeric { digits, value, overflowed, .. } => {
                if *digits == 0 {
                    return None;
                }
                let code_point = if *overflowed { 0xFFFD } else { *value };
                Some(format!("#{code_point}"))
            }
        }
    }

    /// Number of input characters read past the matched prefix that the
    /// caller must push back onto the character entity. Always `0` for
    /// numeric references: the terminator is simply not consumed.
    #[must_use]
    pub fn get_rewind_count(&self) -> usize {
        match &self.mode {
            Mode::Idle | Mode::Numeric { .. } => 0,
            Mode::Named { consumed, best_len, .. } => consumed.chars().count() - best_len,
        }
    }

    /// `true` if the matched reference ended with `;`.
    #[must_use]
    pub const fn ends_with_semicolon(&self) -> bool {
        match &self.mode {
            Mode::Idle => false,
            Mode::Named { best_semicolon, .. } => *best_semicolon,
            Mode::Numeric { semicolon, .. } => *semicolon,
        }
    }

    /// Length of the matched reference token, including the leading `&`
    /// but, for numeric references, excluding the `#`/`x` marker the
    /// caller already consumed before calling [`Self::reset_numeric`].
    #[must_use]
    pub fn get_match_length(&self) -> usize {
        match &self.mode {
            Mode::Idle => 0,
            Mode::Named { best_len, .. } => best_len + 1,
            Mode::Numeric { digits, .. } => (*digits as usize) + 1,
        }
    }
}

fn is_surrogate(code_point: u32) -> bool {
    (0xD800..=0xDFFF).contains(&code_point)
}

#[cfg(test)]
mod tests {
    use super::EntityRecognizer;

    #[test]
    fn named_semicolon_terminated_has_zero_rewind() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_named();
        for ch in "nbsp;".chars() {
            if !rec.parse(ch) {
                break;
            }
        }
        assert_eq!(rec.get_match().as_deref(), Some("\u{00A0}"));
        assert_eq!(rec.get_rewind_count(), 0);
        assert!(rec.ends_with_semicolon());
    }

    #[test]
    fn named_unknown_has_no_match() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_named();
        for ch in "foo;".chars() {
            if !rec.parse(ch) {
                break;
            }
        }
        assert_eq!(rec.get_match(), None);
    }

    #[test]
    fn legacy_amp_matches_without_semicolon_then_stops() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_named();
        // Feed "amp" then a space: "ampX" has no entity with that prefix
        // once a non-entity-continuing char arrives, so the recognizer
        // must report dead and fall back to the "amp" (no `;`) match.
        assert!(rec.parse('a'));
        assert!(rec.parse('m'));
        assert!(rec.parse('p'));
        assert!(!rec.parse(' '));
        assert_eq!(rec.get_match().as_deref(), Some("&"));
        assert!(!rec.ends_with_semicolon());
        assert_eq!(rec.get_rewind_count(), 1);
    }

    #[test]
    fn numeric_decimal_reference() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_numeric(false);
        for ch in "65".chars() {
            rec.parse_numeric(ch);
        }
        assert_eq!(rec.get_match().as_deref(), Some("A"));
    }

    #[test]
    fn numeric_windows1252_fixup() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_numeric(false);
        for ch in "147".chars() {
            rec.parse_numeric(ch);
        }
        assert_eq!(rec.get_match().as_deref(), Some("\u{201C}"));
    }

    #[test]
    fn numeric_hex_reference() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_numeric(true);
        for ch in "41".chars() {
            rec.parse_numeric(ch);
        }
        assert_eq!(rec.get_match().as_deref(), Some("A"));
    }

    #[test]
    fn named_match_name_strips_semicolon() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_named();
        for ch in "nbsp;".chars() {
            if !rec.parse(ch) {
                break;
            }
        }
        assert_eq!(rec.get_match_name().as_deref(), Some("nbsp"));
    }

    #[test]
    fn legacy_named_match_name_has_no_semicolon_to_strip() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_named();
        assert!(rec.parse('a'));
        assert!(rec.parse('m'));
        assert!(rec.parse('p'));
        assert!(!rec.parse(' '));
        assert_eq!(rec.get_match_name().as_deref(), Some("amp"));
    }

    #[test]
    fn numeric_match_name_is_hash_codepoint() {
        let mut rec = EntityRecognizer::new(true);
        rec.reset_numeric(false);
        for ch in "65".chars() {
            rec.parse_numeric(ch);
        }
        assert_eq!(rec.get_match_name().as_deref(), Some("#65"));
    }
}
