//! Named character reference lookup table.
//!
//! Maps entity names (without the leading `&`) to their replacement
//! strings. Some legacy entities match without their trailing semicolon
//! (e.g. `&amp` as well as `&amp;`); those are present under both keys.
//! The full HTML5 list defines 2,231 entities; this table implements the
//! common subset needed to exercise the recognizer end to end.

use std::collections::HashMap;
use std::sync::LazyLock;

static NAMED_ENTITIES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Required for basic HTML.
        ("amp;", "&"),
        ("amp", "&"), // legacy
        ("lt;", "<"),
        ("lt", "<"), // legacy
        ("gt;", ">"),
        ("gt", ">"), // legacy
        ("quot;", "\""),
        ("quot", "\""), // legacy
        ("apos;", "'"),
        ("nbsp;", "\u{00A0}"),
        ("nbsp", "\u{00A0}"), // legacy
        // Punctuation and symbols.
        ("copy;", "\u{00A9}"),
        ("copy", "\u{00A9}"), // legacy
        ("reg;", "\u{00AE}"),
        ("reg", "\u{00AE}"), // legacy
        ("trade;", "\u{2122}"),
        ("mdash;", "\u{2014}"),
        ("ndash;", "\u{2013}"),
        ("hellip;", "\u{2026}"),
        ("bull;", "\u{2022}"),
        ("middot;", "\u{00B7}"),
        ("middot", "\u{00B7}"), // legacy
        ("lsquo;", "\u{2018}"),
        ("rsquo;", "\u{2019}"),
        ("ldquo;", "\u{201C}"),
        ("rdquo;", "\u{201D}"),
        ("laquo;", "\u{00AB}"),
        ("laquo", "\u{00AB}"), // legacy
        ("raquo;", "\u{00BB}"),
        ("raquo", "\u{00BB}"), // legacy
        ("sect;", "\u{00A7}"),
        ("sect", "\u{00A7}"), // legacy
        ("para;", "\u{00B6}"),
        ("para", "\u{00B6}"), // legacy
        // Currency.
        ("cent;", "\u{00A2}"),
        ("cent", "\u{00A2}"), // legacy
        ("pound;", "\u{00A3}"),
        ("pound", "\u{00A3}"), // legacy
        ("euro;", "\u{20AC}"),
        ("yen;", "\u{00A5}"),
        ("yen", "\u{00A5}"), // legacy
        // Math symbols.
        ("times;", "\u{00D7}"),
        ("times", "\u{00D7}"), // legacy
        ("divide;", "\u{00F7}"),
        ("divide", "\u{00F7}"), // legacy
        ("plusmn;", "\u{00B1}"),
        ("plusmn", "\u{00B1}"), // legacy
        ("ne;", "\u{2260}"),
        ("le;", "\u{2264}"),
        ("ge;", "\u{2265}"),
        ("deg;", "\u{00B0}"),
        ("deg", "\u{00B0}"), // legacy
        ("frac12;", "\u{00BD}"),
        ("frac12", "\u{00BD}"), // legacy
        ("frac14;", "\u{00BC}"),
        ("frac14", "\u{00BC}"), // legacy
        ("frac34;", "\u{00BE}"),
        ("frac34", "\u{00BE}"), // legacy
        // Arrows.
        ("larr;", "\u{2190}"),
        ("rarr;", "\u{2192}"),
        ("uarr;", "\u{2191}"),
        ("darr;", "\u{2193}"),
        // Common Greek letters.
        ("alpha;", "\u{03B1}"),
        ("beta;", "\u{03B2}"),
        ("gamma;", "\u{03B3}"),
        ("delta;", "\u{03B4}"),
        ("pi;", "\u{03C0}"),
        ("sigma;", "\u{03C3}"),
        ("omega;", "\u{03C9}"),
        // Accented Latin-1 letters (common).
        ("Agrave;", "\u{00C0}"),
        ("Agrave", "\u{00C0}"), // legacy
        ("Aacute;", "\u{00C1}"),
        ("Aacute", "\u{00C1}"), // legacy
        ("Acirc;", "\u{00C2}"),
        ("Acirc", "\u{00C2}"), // legacy
        ("Atilde;", "\u{00C3}"),
        ("Atilde", "\u{00C3}"), // legacy
        ("Auml;", "\u{00C4}"),
        ("Auml", "\u{00C4}"), // legacy
        ("agrave;", "\u{00E0}"),
        ("agrave", "\u{00E0}"), // legacy
        ("aacute;", "\u{00E1}"),
        ("aacute", "\u{00E1}"), // legacy
        ("acirc;", "\u{00E2}"),
        ("acirc", "\u{00E2}"), // legacy
        ("atilde;", "\u{00E3}"),
        ("atilde", "\u{00E3}"), // legacy
        ("auml;", "\u{00E4}"),
        ("auml", "\u{00E4}"), // legacy
        ("Egrave;", "\u{00C8}"),
        ("Egrave", "\u{00C8}"), // legacy
        ("Eacute;", "\u{00C9}"),
        ("Eacute", "\u{00C9}"), // legacy
        ("egrave;", "\u{00E8}"),
        ("egrave", "\u{00E8}"), // legacy
        ("eacute;", "\u{00E9}"),
        ("eacute", "\u{00E9}"), // legacy
        ("Igrave;", "\u{00CC}"),
        ("Iacute;", "\u{00CD}"),
        ("igrave;", "\u{00EC}"),
        ("iacute;", "\u{00ED}"),
        ("Ograve;", "\u{00D2}"),
        ("Oacute;", "\u{00D3}"),
        ("ograve;", "\u{00F2}"),
        ("oacute;", "\u{00F3}"),
        ("Ugrave;", "\u{00D9}"),
        ("Uacute;", "\u{00DA}"),
        ("ugrave;", "\u{00F9}"),
        ("uacute;", "\u{00FA}"),
        ("ntilde;", "\u{00F1}"),
        ("ntilde", "\u{00F1}"), // legacy
        ("Ntilde;", "\u{00D1}"),
        ("Ntilde", "\u{00D1}"), // legacy
        ("ccedil;", "\u{00E7}"),
        ("ccedil", "\u{00E7}"), // legacy
        ("Ccedil;", "\u{00C7}"),
        ("Ccedil", "\u{00C7}"), // legacy
        // Multi-character replacement, to exercise non-single-char matches.
        ("fjlig;", "fj"),
    ])
});

/// Looks up a named character reference. `name` excludes the leading `&`.
#[must_use]
pub fn lookup_entity(name: &str) -> Option<&'static str> {
    NAMED_ENTITIES.get(name).copied()
}

/// `true` if some entity name in the table starts with `prefix`. Used to
/// decide whether to keep extending a longest-match attempt.
#[must_use]
pub fn any_entity_has_prefix(prefix: &str) -> bool {
    NAMED_ENTITIES.keys().any(|name| name.starts_with(prefix))
}

/// `true` if `name` (without trailing `;`) is also registered without a
/// semicolon, i.e. it is one of the legacy entities the WHATWG list
/// grandfathers in for backward compatibility.
#[must_use]
pub fn is_legacy_without_semicolon(name_no_semicolon: &str) -> bool {
    NAMED_ENTITIES.contains_key(name_no_semicolon)
}

#[cfg(test)]
mod tests {
    use super::{any_entity_has_prefix, is_legacy_without_semicolon, lookup_entity};

    #[test]
    fn looks_up_common_entities() {
        assert_eq!(lookup_entity("amp;"), Some("&"));
        assert_eq!(lookup_entity("nbsp;"), Some("\u{00A0}"));
        assert_eq!(lookup_entity("notarealentity;"), None);
    }

    #[test]
    fn legacy_entities_match_without_semicolon() {
        assert_eq!(lookup_entity("amp"), Some("&"));
        assert!(is_legacy_without_semicolon("amp"));
        assert!(!is_legacy_without_semicolon("euro"));
    }

    #[test]
    fn prefix_matching() {
        assert!(any_entity_has_prefix("a"));
        assert!(any_entity_has_prefix("amp"));
        assert!(!any_entity_has_prefix("ampx"));
    }
}
