//! Configurable scanner options.
//!
//! A plain in-process struct; loading these from a CLI or config file is a
//! concern of a downstream consumer, not this crate.

/// Case-folding applied to element or attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFolding {
    /// Preserve names exactly as scanned.
    #[default]
    Default,
    /// Fold to uppercase.
    Upper,
    /// Fold to lowercase.
    Lower,
}

impl CaseFolding {
    /// Applies this folding to a scanned name.
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Default => name.to_string(),
            Self::Upper => name.to_uppercase(),
            Self::Lower => name.to_lowercase(),
        }
    }
}

/// All scanner-wide configurable options, with [`Default`] producing
/// WHATWG-conformant defaults.
#[derive(Debug, Clone)]
pub struct ScannerOptions {
    /// Attach a `LocationItem` to each emitted event.
    pub augmentations: bool,
    /// Invoke the error reporter; if false, scanning is silent.
    pub report_errors: bool,
    /// Emit start/end-general-entity notifications around `&#...`.
    pub notify_char_refs: bool,
    /// Emit start/end-general-entity notifications for the five XML
    /// built-in named references (`amp`, `lt`, `gt`, `apos`, `quot`).
    pub notify_xml_builtin_refs: bool,
    /// Emit start/end-general-entity notifications for all HTML named
    /// references.
    pub notify_html_builtin_refs: bool,
    /// Remap numeric references in `0x80..=0x9F` to their Windows-1252
    /// "smart quote" code points.
    pub fix_mswindows_refs: bool,
    /// Strip the enclosing `<!-- -->` from `<script>`/`<style>` raw text.
    pub strip_comment_delims: bool,
    /// Strip the enclosing `<![CDATA[ ]]>` from `<script>`/`<style>` raw text.
    pub strip_cdata_delims: bool,
    /// Ignore `<meta charset>` / `<?xml encoding?>` declarations entirely.
    pub ignore_specified_charset: bool,
    /// Report CDATA sections as `startCDATA`/`endCDATA` events (else as
    /// plain characters or a comment, depending on caller preference).
    pub cdata_sections: bool,
    /// Replace any scanned DOCTYPE public/system IDs with configured ones.
    pub override_doctype: Option<(Option<String>, Option<String>)>,
    /// Emit a synthesized doctype before the first element if none was
    /// scanned.
    pub insert_doctype: Option<(String, Option<String>, Option<String>)>,
    /// Treat `<noscript>` content as ordinary markup instead of raw text.
    pub parse_noscript_content: bool,
    /// Accept `<iframe/>` as self-closing.
    pub allow_selfclosing_iframe: bool,
    /// Accept `<div/>`-style self-closing on ordinary elements, without
    /// entering raw-text mode for special elements written that way.
    pub allow_selfclosing_tags: bool,
    /// Case folding applied to element names.
    pub names_elems: CaseFolding,
    /// Case folding applied to attribute names.
    pub names_attrs: CaseFolding,
    /// IANA label used when no BOM and no declared encoding are present.
    pub default_encoding: String,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            augmentations: false,
            report_errors: true,
            notify_char_refs: false,
            notify_xml_builtin_refs: false,
            notify_html_builtin_refs: false,
            fix_mswindows_refs: true,
            strip_comment_delims: false,
            strip_cdata_delims: false,
            ignore_specified_charset: false,
            cdata_sections: false,
            override_doctype: None,
            insert_doctype: None,
            parse_noscript_content: false,
            allow_selfclosing_iframe: false,
            allow_selfclosing_tags: false,
            names_elems: CaseFolding::Default,
            names_attrs: CaseFolding::Default,
            default_encoding: "windows-1252".to_string(),
        }
    }
}

/// The element-metadata table the content scanner consults to decide
/// whether a start tag switches the scanner into raw-text/RCDATA/PLAINTEXT
/// mode. Preserved verbatim as the special-element list this implementation
/// settled on (see the open question in the design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialContent {
    /// `title`, `textarea`: entities are still decoded.
    Rcdata,
    /// `script`: raw text with the nested HTML-comment escape.
    ScriptRawtext,
    /// `style`, `iframe`, `noembed`, `noframes`, and `noscript` (unless
    /// `parse_noscript_content` is set): raw text without the comment
    /// escape.
    PlainRawtext,
    /// `plaintext`: the terminal scanner; nothing ever closes it.
    Plaintext,
}

/// Looks up the special-content kind for a (lowercased) element name.
#[must_use]
pub fn special_content_for(name: &str, parse_noscript_content: bool) -> Option<SpecialContent> {
    match name {
        "title" | "textarea" => Some(SpecialContent::Rcdata),
        "script" => Some(SpecialContent::ScriptRawtext),
        "style" | "iframe" | "noembed" | "noframes" => Some(SpecialContent::PlainRawtext),
        "noscript" if !parse_noscript_content => Some(SpecialContent::PlainRawtext),
        "plaintext" => Some(SpecialContent::Plaintext),
        _ => None,
    }
}
