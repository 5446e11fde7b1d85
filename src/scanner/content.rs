//! The content scanner: ordinary markup recognition (tags, attributes,
//! DOCTYPE, processing instructions, comments, CDATA) plus `<meta
//! charset>` encoding-switch detection.

use super::{RefContext, Scanner, ScannerKind};
use crate::error::ErrorCode;
use crate::event::{Attribute, AttributeList, Event, EventSink, QualifiedName};
use crate::options::{special_content_for, SpecialContent};
use std::io::Read;

/// Runs one step of the content scanner. Returns `true` if at least one
/// event was emitted.
pub(super) fn step<R: Read, S: EventSink>(scanner: &mut Scanner<R>, sink: &mut S) -> Result<bool, crate::error::ScanError> {
    let start = scanner.begin_location();
    let Some(ch) = scanner.next_char()? else {
        return Ok(false);
    };

    if ch == '<' {
        return scan_markup(scanner, sink, start);
    }

    let mut text = String::new();
    let mut run_start = start;
    if ch == '&' {
        handle_content_entity(scanner, sink, &mut text, &mut run_start)?;
    } else {
        text.push(ch);
    }
    scan_plain_characters(scanner, sink, &mut text, &mut run_start)?;
    emit_characters(scanner, sink, text, run_start);
    Ok(true)
}

/// Reads plain character data up to (but not including) the next `<`,
/// expanding further entity references inline into `text` so a single
/// `characters` event covers the whole run — unless a reference is
/// notified, in which case it interrupts the run (see
/// `handle_content_entity`).
fn scan_plain_characters<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    text: &mut String,
    run_start: &mut (u32, u32, u64),
) -> Result<(), crate::error::ScanError> {
    loop {
        match scanner.peek_char(0)? {
            Some('<') | None => break,
            Some('&') => {
                let _ = scanner.next_char()?;
                handle_content_entity(scanner, sink, text, run_start)?;
            }
            Some(_) => {
                let c = scanner.next_char()?.expect("peeked Some above");
                text.push(c);
            }
        }
    }
    Ok(())
}

/// Expands one `&...` reference, right after `&` has been consumed, into
/// `text`. When the configured `notify-*-refs` option calls for it,
/// flushes `text` as a `characters` event first and brackets the
/// reference's own replacement text with `startGeneralEntity`/
/// `endGeneralEntity` instead of folding it into the surrounding run;
/// `run_start` is reset so the remainder of the run gets its own span.
fn handle_content_entity<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    text: &mut String,
    run_start: &mut (u32, u32, u64),
) -> Result<(), crate::error::ScanError> {
    let ref_start = scanner.begin_location();
    let replacement = scanner.scan_entity_reference(RefContext::Content)?;
    match scanner.take_entity_notify() {
        Some(name) => {
            emit_characters(scanner, sink, std::mem::take(text), *run_start);
            if !scanner.should_suppress() {
                sink.event(Event::StartGeneralEntity { name: name.clone(), location: scanner.end_location(ref_start) });
            }
            emit_characters(scanner, sink, replacement, ref_start);
            if !scanner.should_suppress() {
                sink.event(Event::EndGeneralEntity { name, location: scanner.end_location(ref_start) });
            }
            *run_start = scanner.begin_location();
        }
        None => text.push_str(&replacement),
    }
    Ok(())
}

fn emit_characters<R: Read, S: EventSink>(scanner: &mut Scanner<R>, sink: &mut S, text: String, start: (u32, u32, u64)) {
    if text.is_empty() || scanner.should_suppress() {
        return;
    }
    sink.event(Event::Characters { text, location: scanner.end_location(start) });
}

fn scan_markup<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    start: (u32, u32, u64),
) -> Result<bool, crate::error::ScanError> {
    match scanner.peek_char(0)? {
        None => {
            emit_characters(scanner, sink, "<".to_string(), start);
            Ok(true)
        }
        Some('!') => {
            let _ = scanner.next_char()?;
            scan_markup_declaration(scanner, sink, start)
        }
        Some('?') => {
            let _ = scanner.next_char()?;
            scan_processing_instruction(scanner, sink, start)
        }
        Some('/') => {
            let _ = scanner.next_char()?;
            scan_end_element(scanner, sink, start)
        }
        Some(c) if c.is_ascii_alphabetic() => scan_start_element(scanner, sink, start),
        Some(_) => {
            emit_characters(scanner, sink, "<".to_string(), start);
            Ok(true)
        }
    }
}

fn scan_markup_declaration<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    start: (u32, u32, u64),
) -> Result<bool, crate::error::ScanError> {
    if consume_if_matches(scanner, "--")? {
        scan_comment(scanner, sink, start)
    } else if consume_if_matches(scanner, "[CDATA[")? {
        scan_cdata(scanner, sink, start)
    } else if consume_if_matches_ci(scanner, "DOCTYPE")? {
        scan_doctype(scanner, sink, start)
    } else {
        // Bogus declaration: consume to '>' and report it as an empty comment,
        // matching the abrupt forms `<!->`, `<!>` etc.
        let mut depth_guard = 0usize;
        while let Some(c) = scanner.next_char()? {
            depth_guard += 1;
            if c == '>' || depth_guard > 1_000_000 {
                break;
            }
        }
        scanner.report_error(ErrorCode::MalformedAttribute, &["bogus markup declaration"]);
        emit_comment(scanner, sink, String::new(), start);
        Ok(true)
    }
}

fn consume_if_matches<R: Read>(scanner: &mut Scanner<R>, literal: &str) -> std::io::Result<bool> {
    for (i, expected) in literal.chars().enumerate() {
        if scanner.peek_char(i)? != Some(expected) {
            return Ok(false);
        }
    }
    for _ in 0..literal.chars().count() {
        let _ = scanner.next_char()?;
    }
    Ok(true)
}

fn consume_if_matches_ci<R: Read>(scanner: &mut Scanner<R>, literal: &str) -> std::io::Result<bool> {
    for (i, expected) in literal.chars().enumerate() {
        match scanner.peek_char(i)? {
            Some(c) if c.eq_ignore_ascii_case(&expected) => {}
            _ => return Ok(false),
        }
    }
    for _ in 0..literal.chars().count() {
        let _ = scanner.next_char()?;
    }
    Ok(true)
}

fn scan_comment<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    start: (u32, u32, u64),
) -> Result<bool, crate::error::ScanError> {
    // Abrupt-closing-of-empty-comment shortcuts: `<!-->` and `<!--->`.
    match scanner.peek_char(0)? {
        Some('>') => {
            let _ = scanner.next_char()?;
            emit_comment(scanner, sink, String::new(), start);
            return Ok(true);
        }
        Some('-') if scanner.peek_char(1)? == Some('>') => {
            let _ = scanner.next_char()?;
            let _ = scanner.next_char()?;
            emit_comment(scanner, sink, String::new(), start);
            return Ok(true);
        }
        _ => {}
    }

    let mut text = String::new();
    loop {
        match scanner.next_char()? {
            None => {
                scanner.report_error(ErrorCode::UnterminatedComment, &[]);
                break;
            }
            Some('-') => {
                if scanner.peek_char(0)? == Some('-') {
                    match scanner.peek_char(1)? {
                        Some('>') => {
                            let _ = scanner.next_char()?;
                            let _ = scanner.next_char()?;
                            break;
                        }
                        Some('!') if scanner.peek_char(2)? == Some('>') => {
                            let _ = scanner.next_char()?;
                            let _ = scanner.next_char()?;
                            let _ = scanner.next_char()?;
                            break;
                        }
                        _ => {
                            let _ = scanner.next_char()?;
                            text.push('-');
                            text.push('-');
                        }
                    }
                } else {
                    text.push('-');
                }
            }
            Some(c) => text.push(c),
        }
    }
    emit_comment(scanner, sink, text, start);
    Ok(true)
}

fn emit_comment<R: Read, S: EventSink>(scanner: &mut Scanner<R>, sink: &mut S, text: String, start: (u32, u32, u64)) {
    if scanner.should_suppress() {
        return;
    }
    sink.event(Event::Comment { text, location: scanner.end_location(start) });
}

fn scan_cdata<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    start: (u32, u32, u64),
) -> Result<bool, crate::error::ScanError> {
    let mut text = String::new();
    loop {
        match scanner.next_char()? {
            None => {
                scanner.report_error(ErrorCode::UnexpectedEndOfStream, &["CDATA section"]);
                break;
            }
            Some(']') if scanner.peek_char(0)? == Some(']') && scanner.peek_char(1)? == Some('>') => {
                let _ = scanner.next_char()?;
                let _ = scanner.next_char()?;
                break;
            }
            Some(c) => text.push(c),
        }
    }
    if scanner.should_suppress() {
        return Ok(true);
    }
    if scanner.options().cdata_sections {
        sink.event(Event::StartCdata { location: scanner.end_location(start) });
        sink.event(Event::Characters { text, location: scanner.end_location(start) });
        sink.event(Event::EndCdata { location: scanner.end_location(start) });
    } else {
        sink.event(Event::Characters { text, location: scanner.end_location(start) });
    }
    Ok(true)
}

fn scan_doctype<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    start: (u32, u32, u64),
) -> Result<bool, crate::error::ScanError> {
    skip_whitespace(scanner)?;
    let name = scan_until_whitespace_or(scanner, &['>'])?;
    if name.is_empty() {
        scanner.report_error(ErrorCode::MissingDoctypeName, &[]);
    }
    skip_whitespace(scanner)?;

    let mut public_id = None;
    let mut system_id = None;
    if consume_if_matches_ci(scanner, "PUBLIC")? {
        skip_whitespace(scanner)?;
        public_id = scan_quoted_literal(scanner)?;
        skip_whitespace(scanner)?;
        system_id = scan_quoted_literal(scanner)?;
    } else if consume_if_matches_ci(scanner, "SYSTEM")? {
        skip_whitespace(scanner)?;
        system_id = scan_quoted_literal(scanner)?;
    }

    while let Some(c) = scanner.next_char()? {
        if c == '>' {
            break;
        }
    }

    let (public_id, system_id) = if let Some((override_public, override_system)) = &scanner.options().override_doctype {
        (override_public.clone(), override_system.clone())
    } else {
        (public_id, system_id)
    };

    // `insert_doctype` may already have synthesized one in `startDocument`;
    // a real `<!DOCTYPE>` found later in the stream does not get a second
    // `doctypeDecl` event on top of it.
    if !scanner.doctype_emitted() && !scanner.should_suppress() {
        sink.event(Event::DoctypeDecl { root: name, public_id, system_id, location: scanner.end_location(start) });
    }
    scanner.mark_doctype_emitted();
    Ok(true)
}

fn scan_quoted_literal<R: Read>(scanner: &mut Scanner<R>) -> std::io::Result<Option<String>> {
    match scanner.peek_char(0)? {
        Some(q @ ('"' | '\'')) => {
            let _ = scanner.next_char()?;
            let mut text = String::new();
            loop {
                match scanner.next_char()? {
                    Some(c) if c == q => break,
                    Some(c) => text.push(c),
                    None => break,
                }
            }
            Ok(Some(text))
        }
        _ => Ok(None),
    }
}

fn scan_processing_instruction<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    start: (u32, u32, u64),
) -> Result<bool, crate::error::ScanError> {
    let target = scan_until_whitespace_or(scanner, &['?', '>'])?;
    skip_whitespace(scanner)?;
    let mut data = String::new();
    loop {
        match scanner.next_char()? {
            None => {
                scanner.report_error(ErrorCode::UnexpectedEndOfStream, &["processing instruction"]);
                break;
            }
            Some('?') if scanner.peek_char(0)? == Some('>') => {
                let _ = scanner.next_char()?;
                break;
            }
            Some('>') => break,
            Some(c) => data.push(c),
        }
    }

    if target.eq_ignore_ascii_case("xml") {
        let version = extract_pseudo_attribute(&data, "version");
        let encoding = extract_pseudo_attribute(&data, "encoding");
        let standalone = extract_pseudo_attribute(&data, "standalone").map(|s| s.eq_ignore_ascii_case("yes"));
        if let Some(enc) = &encoding {
            scanner.change_encoding(enc);
        }
        if !scanner.should_suppress() {
            sink.event(Event::XmlDecl { version, encoding, standalone, location: scanner.end_location(start) });
        }
    } else if !scanner.should_suppress() {
        sink.event(Event::ProcessingInstruction { target, data, location: scanner.end_location(start) });
    }
    Ok(true)
}

fn extract_pseudo_attribute(data: &str, key: &str) -> Option<String> {
    let idx = data.to_ascii_lowercase().find(key)?;
    let rest = &data[idx + key.len()..];
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

fn scan_end_element<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    start: (u32, u32, u64),
) -> Result<bool, crate::error::ScanError> {
    let raw_name = scan_until_whitespace_or(scanner, &['>'])?;
    skip_whitespace(scanner)?;
    while let Some(c) = scanner.next_char()? {
        if c == '>' {
            break;
        }
    }
    if raw_name.is_empty() {
        return Ok(false);
    }
    if !scanner.should_suppress() {
        let name = scanner.options().names_elems.apply(&raw_name);
        sink.event(Event::EndElement { name: QualifiedName::from_raw(&name), location: scanner.end_location(start) });
    }
    Ok(true)
}

fn scan_start_element<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    start: (u32, u32, u64),
) -> Result<bool, crate::error::ScanError> {
    let raw_name = scan_until_whitespace_or(scanner, &['/', '>'])?;
    let lower_name = raw_name.to_ascii_lowercase();

    let mut attributes: AttributeList = Vec::new();
    let mut self_closing = false;
    loop {
        skip_whitespace(scanner)?;
        match scanner.peek_char(0)? {
            None => {
                scanner.report_warning(ErrorCode::UnexpectedEndOfStream, &["start tag"]);
                break;
            }
            Some('>') => {
                let _ = scanner.next_char()?;
                break;
            }
            Some('/') => {
                let _ = scanner.next_char()?;
                if scanner.peek_char(0)? == Some('>') {
                    let _ = scanner.next_char()?;
                    self_closing = true;
                    break;
                }
            }
            Some(_) => {
                let attr_start = scanner.begin_location();
                if let Some(attr) = scan_attribute(scanner, attr_start)? {
                    if attributes.iter().any(|a: &Attribute| a.name.raw == attr.name.raw) {
                        scanner.report_error(ErrorCode::MalformedAttribute, &["duplicate attribute", &attr.name.raw]);
                    } else {
                        attributes.push(attr);
                    }
                }
            }
        }
    }

    if lower_name == "meta" {
        if let Some(charset) = meta_charset(&attributes) {
            scanner.change_encoding(&charset);
        }
    }

    let name = scanner.options().names_elems.apply(&raw_name);
    let qname = QualifiedName::from_raw(&name);
    let content_kind = special_content_for(&lower_name, scanner.options().parse_noscript_content);

    // Self-closing syntax is always honored on ordinary elements. On a
    // special (raw-text/RCDATA) element it is ignored by default — the
    // element still opens its raw-text content — unless `allow-
    // selfclosing-tags` opts in generally, or `allow-selfclosing-iframe`
    // opts in for `iframe` specifically.
    let honor_self_closing = self_closing
        && (content_kind.is_none()
            || scanner.options().allow_selfclosing_tags
            || (lower_name == "iframe" && scanner.options().allow_selfclosing_iframe));

    if honor_self_closing {
        if !scanner.should_suppress() {
            sink.event(Event::EmptyElement { name: qname, attributes, location: scanner.end_location(start) });
        }
        return Ok(true);
    }

    if let Some(content_kind) = content_kind {
        if !scanner.should_suppress() {
            sink.event(Event::StartElement { name: qname, attributes, location: scanner.end_location(start) });
        }
        match content_kind {
            SpecialContent::Plaintext => scanner.switch_kind(ScannerKind::PlainText),
            other => scanner.switch_kind(ScannerKind::Special { tag_name: lower_name, content_kind: other }),
        }
        return Ok(true);
    }

    scanner.release_byte_source_if_body(&lower_name);
    if !scanner.should_suppress() {
        sink.event(Event::StartElement { name: qname, attributes, location: scanner.end_location(start) });
    }
    Ok(true)
}

fn meta_charset(attributes: &[Attribute]) -> Option<String> {
    if let Some(attr) = attributes.iter().find(|a| a.name.local.eq_ignore_ascii_case("charset")) {
        return Some(attr.value.clone());
    }
    let http_equiv = attributes.iter().find(|a| a.name.local.eq_ignore_ascii_case("http-equiv"))?;
    if !http_equiv.value.eq_ignore_ascii_case("content-type") {
        return None;
    }
    let content = attributes.iter().find(|a| a.name.local.eq_ignore_ascii_case("content"))?;
    let lower = content.value.to_ascii_lowercase();
    let idx = lower.find("charset=")?;
    let rest = &content.value[idx + "charset=".len()..];
    Some(rest.trim_matches(|c: char| c == '"' || c == '\'').to_string())
}

fn scan_attribute<R: Read>(scanner: &mut Scanner<R>, start: (u32, u32, u64)) -> std::io::Result<Option<Attribute>> {
    let raw_name = scan_until_whitespace_or(scanner, &['=', '/', '>'])?;
    if raw_name.is_empty() {
        let _ = scanner.next_char()?;
        return Ok(None);
    }
    skip_whitespace(scanner)?;

    let mut non_normalized_value = String::new();
    if scanner.peek_char(0)? == Some('=') {
        let _ = scanner.next_char()?;
        skip_whitespace(scanner)?;
        match scanner.peek_char(0)? {
            Some(q @ ('"' | '\'')) => {
                let _ = scanner.next_char()?;
                loop {
                    match scanner.next_char()? {
                        Some(c) if c == q => break,
                        Some('&') => non_normalized_value.push_str(&scanner.scan_entity_reference(RefContext::Attribute)?),
                        Some(c) => non_normalized_value.push(c),
                        None => break,
                    }
                }
            }
            _ => loop {
                match scanner.peek_char(0)? {
                    Some(c) if c.is_whitespace() || c == '>' => break,
                    Some('&') => {
                        let _ = scanner.next_char()?;
                        non_normalized_value.push_str(&scanner.scan_entity_reference(RefContext::Attribute)?);
                    }
                    Some(_) => non_normalized_value.push(scanner.next_char()?.expect("peeked Some above")),
                    None => break,
                }
            },
        }
    }

    let name = scanner.options().names_attrs.apply(&raw_name);
    let value = normalize_whitespace(&non_normalized_value);
    Ok(Some(Attribute {
        name: QualifiedName::from_raw(&name),
        value,
        non_normalized_value,
        specified: true,
        location: scanner.end_location(start),
    }))
}

fn normalize_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_was_space = false;
    for c in value.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim_end().to_string()
}

fn skip_whitespace<R: Read>(scanner: &mut Scanner<R>) -> std::io::Result<()> {
    while matches!(scanner.peek_char(0)?, Some(c) if c.is_whitespace()) {
        let _ = scanner.next_char()?;
    }
    Ok(())
}

fn scan_until_whitespace_or<R: Read>(scanner: &mut Scanner<R>, stop: &[char]) -> std::io::Result<String> {
    let mut text = String::new();
    loop {
        match scanner.peek_char(0)? {
            Some(c) if c.is_whitespace() || stop.contains(&c) => break,
            Some(_) => text.push(scanner.next_char()?.expect("peeked Some above")),
            None => break,
        }
    }
    Ok(text)
}
