//! Raw-text and RCDATA scanning for `script`, `style`, `title`, and the
//! other special elements that suspend ordinary markup recognition until
//! their matching end tag.

use super::{RefContext, Scanner, ScannerKind};
use crate::error::ScanError;
use crate::event::{Event, EventSink, QualifiedName};
use crate::options::SpecialContent;
use std::io::Read;

pub(super) fn step<R: Read, S: EventSink>(scanner: &mut Scanner<R>, sink: &mut S) -> Result<bool, ScanError> {
    let ScannerKind::Special { tag_name, content_kind } = scanner.kind().clone() else {
        unreachable!("special::step only runs while ScannerKind::Special is active")
    };

    let start = scanner.begin_location();
    let mut run_start = start;
    let mut text = String::new();
    let mut in_comment_escape = false;

    loop {
        if !in_comment_escape && matches_end_tag(scanner, &tag_name)? {
            break;
        }
        match scanner.next_char()? {
            None => {
                emit_text(scanner, sink, &content_kind, text, run_start);
                return Ok(true);
            }
            Some('&') if content_kind == SpecialContent::Rcdata => {
                let ref_start = scanner.begin_location();
                let replacement = scanner.scan_entity_reference(RefContext::Content)?;
                match scanner.take_entity_notify() {
                    Some(name) => {
                        emit_text(scanner, sink, &content_kind, std::mem::take(&mut text), run_start);
                        if !scanner.should_suppress() {
                            sink.event(Event::StartGeneralEntity {
                                name: name.clone(),
                                location: scanner.end_location(ref_start),
                            });
                        }
                        emit_text(scanner, sink, &content_kind, replacement, ref_start);
                        if !scanner.should_suppress() {
                            sink.event(Event::EndGeneralEntity { name, location: scanner.end_location(ref_start) });
                        }
                        run_start = scanner.begin_location();
                    }
                    None => text.push_str(&replacement),
                }
            }
            Some(c) => {
                text.push(c);
                if content_kind == SpecialContent::ScriptRawtext {
                    if !in_comment_escape && text.ends_with("<!--") {
                        in_comment_escape = true;
                    } else if in_comment_escape && (text.ends_with("-->") || text.ends_with("--!>")) {
                        in_comment_escape = false;
                    }
                }
            }
        }
    }

    emit_text(scanner, sink, &content_kind, text, run_start);
    consume_end_tag(scanner, &tag_name)?;
    scanner.switch_kind(ScannerKind::Content);
    if !scanner.should_suppress() {
        let name = scanner.options().names_elems.apply(&tag_name);
        sink.event(Event::EndElement { name: QualifiedName::from_raw(&name), location: scanner.end_location(start) });
    }
    Ok(true)
}

fn emit_text<R: Read, S: EventSink>(
    scanner: &mut Scanner<R>,
    sink: &mut S,
    content_kind: &SpecialContent,
    text: String,
    start: (u32, u32, u64),
) {
    if text.is_empty() || scanner.should_suppress() {
        return;
    }
    let text = match content_kind {
        SpecialContent::ScriptRawtext if scanner.options().strip_comment_delims => strip_comment_delims(&text),
        _ if scanner.options().strip_cdata_delims => strip_cdata_delims(&text),
        _ => text,
    };
    sink.event(Event::Characters { text, location: scanner.end_location(start) });
}

fn strip_comment_delims(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->").or_else(|| rest.strip_suffix("--!>")))
        .unwrap_or(text)
        .to_string()
}

fn strip_cdata_delims(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
        .unwrap_or(text)
        .to_string()
}

/// `true` if the scanner is positioned right before `</tag_name` followed
/// by `>`, `/`, whitespace, or end of input. Does not consume anything.
fn matches_end_tag<R: Read>(scanner: &mut Scanner<R>, tag_name: &str) -> std::io::Result<bool> {
    if scanner.peek_char(0)? != Some('<') || scanner.peek_char(1)? != Some('/') {
        return Ok(false);
    }
    let mut offset = 2;
    for expected in tag_name.chars() {
        match scanner.peek_char(offset)? {
            Some(c) if c.eq_ignore_ascii_case(&expected) => offset += 1,
            _ => return Ok(false),
        }
    }
    match scanner.peek_char(offset)? {
        None => Ok(true),
        Some(c) => Ok(c == '>' || c == '/' || c.is_whitespace()),
    }
}

/// Consumes `</tag_name` plus any trailing junk up to and including `>`.
fn consume_end_tag<R: Read>(scanner: &mut Scanner<R>, tag_name: &str) -> std::io::Result<()> {
    for _ in 0..(2 + tag_name.chars().count()) {
        let _ = scanner.next_char()?;
    }
    while let Some(c) = scanner.next_char()? {
        if c == '>' {
            break;
        }
    }
    Ok(())
}
