//! Integration tests for the HTML scanner end to end.

use htmlscan::{Event, RecordingSink, ScanOutcome, ScannerOptions, SilentErrorReporter};
use std::io::Cursor;

fn scan(input: &str) -> Vec<Event> {
    scan_with(input, ScannerOptions::default())
}

fn scan_with(input: &str, options: ScannerOptions) -> Vec<Event> {
    let mut scanner =
        htmlscan::Scanner::open(Cursor::new(input.as_bytes().to_vec()), options, Box::new(SilentErrorReporter))
            .expect("open never fails on an in-memory cursor");
    let mut sink = RecordingSink::default();
    loop {
        match scanner.scan(&mut sink, true).expect("scanning an in-memory document never errors") {
            ScanOutcome::Done => break,
            ScanOutcome::MoreToDo => {}
        }
    }
    sink.events
}

fn characters(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Characters { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn plain_text_becomes_one_characters_event_per_run() {
    let events = scan("Hello");
    assert_eq!(characters(&events), "Hello");
}

#[test]
fn doctype_reports_name() {
    let events = scan("<!DOCTYPE html>");
    assert!(events.iter().any(|e| matches!(e, Event::DoctypeDecl { root, .. } if root == "html")));
}

#[test]
fn start_and_end_tag_preserve_case() {
    let events = scan("<DIV><Span></Span></DIV>");
    let names: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::StartElement { name, .. } | Event::EndElement { name, .. } => Some(name.raw.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["DIV", "Span", "Span", "DIV"]);
}

#[test]
fn self_closing_tag_is_reported_as_empty_element() {
    let events = scan("<br/>");
    assert!(matches!(&events[1], Event::EmptyElement { name, .. } if name.raw == "br"));
}

#[test]
fn comment_delimiters_are_stripped() {
    let events = scan("<!-- hello -->");
    assert!(events.iter().any(|e| matches!(e, Event::Comment { text, .. } if text == " hello ")));
}

#[test]
fn abrupt_empty_comment_shortcuts_are_accepted() {
    let events = scan("<!--> <!---> <!-- a -- b -->");
    let comments: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Comment { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(comments, vec!["".to_string(), "".to_string(), " a -- b ".to_string()]);
}

#[test]
fn double_quoted_attribute_value() {
    let events = scan(r#"<div class="foo">"#);
    match &events[1] {
        Event::StartElement { attributes, .. } => {
            assert_eq!(attributes.len(), 1);
            assert_eq!(attributes[0].name.raw, "class");
            assert_eq!(attributes[0].value, "foo");
        }
        other => panic!("expected StartElement, got {other:?}"),
    }
}

#[test]
fn unquoted_and_boolean_attributes() {
    let events = scan("<input type=text disabled>");
    match &events[1] {
        Event::StartElement { attributes, .. } => {
            assert_eq!(attributes[0].value, "text");
            assert_eq!(attributes[1].name.raw, "disabled");
            assert_eq!(attributes[1].value, "");
        }
        other => panic!("expected StartElement, got {other:?}"),
    }
}

#[test]
fn style_element_content_is_raw_text() {
    let events = scan("<style><div>not a tag</div></style>");
    assert_eq!(characters(&events), "<div>not a tag</div>");
    assert!(events.iter().any(|e| matches!(e, Event::EndElement { name, .. } if name.raw == "style")));
}

#[test]
fn style_wrong_end_tag_does_not_close_element() {
    let events = scan("<style>a</notastyle>b</style>");
    assert_eq!(characters(&events), "a</notastyle>b");
}

#[test]
fn script_comment_escape_suppresses_end_tag_recognition() {
    let events = scan("<script>var x = '<!-- </script> -->';</script>");
    assert_eq!(characters(&events), "var x = '<!-- </script> -->';");
}

#[test]
fn textarea_is_rcdata_and_expands_entities() {
    let events = scan("<textarea>&lt;b&gt;</textarea>");
    assert_eq!(characters(&events), "<b>");
}

#[test]
fn plaintext_never_recognizes_markup_again() {
    let events = scan("<plaintext></div> <p>");
    assert_eq!(characters(&events), "</div> <p>");
}

#[test]
fn ambiguous_ampersand_example() {
    // `&nbsp;` is a full match, `&foo;` is unknown and rewound verbatim,
    // and `&amp` (legacy, no semicolon) matches and stops before the space.
    let events = scan("&nbsp;x&foo;y&amp z");
    assert_eq!(characters(&events), "\u{00A0}x&foo;y& z");
}

#[test]
fn entity_reference_in_attribute_value() {
    let events = scan(r#"<a href="?a=1&amp;b=2">"#);
    match &events[1] {
        Event::StartElement { attributes, .. } => {
            assert_eq!(attributes[0].value, "?a=1&b=2");
        }
        other => panic!("expected StartElement, got {other:?}"),
    }
}

#[test]
fn ambiguous_ampersand_in_attribute_is_not_expanded() {
    // A legacy no-semicolon match followed by '=' or an alphanumeric is an
    // ambiguous ampersand inside an attribute value: left as literal text.
    let events = scan(r#"<a href="?a=1&ampb=2">"#);
    match &events[1] {
        Event::StartElement { attributes, .. } => {
            assert_eq!(attributes[0].value, "?a=1&ampb=2");
        }
        other => panic!("expected StartElement, got {other:?}"),
    }
}

#[test]
fn meta_charset_switches_windows1252_document_to_utf8() {
    // No BOM, so the scanner starts decoding as windows-1252 by default.
    // The meta tag itself is pure ASCII (round-trips identically either
    // way); the "café" that follows it is UTF-8-encoded and only decodes
    // correctly once the switch rewinds and redecodes from byte zero.
    let mut bytes = b"<meta charset=\"utf-8\">caf".to_vec();
    bytes.extend_from_slice("é".as_bytes());
    let mut options = ScannerOptions::default();
    options.default_encoding = "windows-1252".to_string();
    let mut scanner =
        htmlscan::Scanner::open(Cursor::new(bytes), options, Box::new(SilentErrorReporter)).unwrap();
    let mut sink = RecordingSink::default();
    loop {
        match scanner.scan(&mut sink, true).unwrap() {
            ScanOutcome::Done => break,
            ScanOutcome::MoreToDo => {}
        }
    }
    assert_eq!(characters(&sink.events), "café");
}

#[test]
fn cdata_section_reported_as_characters_by_default() {
    let events = scan("<![CDATA[x < y]]>");
    assert_eq!(characters(&events), "x < y");
    assert!(!events.iter().any(|e| matches!(e, Event::StartCdata { .. })));
}

#[test]
fn cdata_section_reported_as_events_when_enabled() {
    let mut options = ScannerOptions::default();
    options.cdata_sections = true;
    let events = scan_with("<![CDATA[x]]>", options);
    assert!(matches!(events[1], Event::StartCdata { .. }));
    assert!(matches!(events[3], Event::EndCdata { .. }));
}

#[test]
fn processing_instruction_target_xml_becomes_xml_decl() {
    let events = scan(r#"<?xml version="1.0" encoding="UTF-8"?><root/>"#);
    assert!(events.iter().any(
        |e| matches!(e, Event::XmlDecl { version, encoding, .. } if version.as_deref() == Some("1.0") && encoding.as_deref() == Some("UTF-8"))
    ));
}

#[test]
fn other_processing_instruction_target_is_passed_through() {
    let events = scan("<?xml-stylesheet href=\"a.xsl\"?>");
    assert!(
        events.iter().any(|e| matches!(e, Event::ProcessingInstruction { target, .. } if target == "xml-stylesheet"))
    );
}

#[test]
fn document_always_starts_and_ends_with_the_right_events() {
    let events = scan("<p>hi</p>");
    assert!(matches!(events.first(), Some(Event::StartDocument { .. })));
    assert!(matches!(events.last(), Some(Event::EndDocument { .. })));
}

#[test]
fn push_input_source_interleaves_a_nested_stream() {
    use htmlscan::{CurrentEntity, ScanOutcome as Outcome};
    let mut scanner = htmlscan::Scanner::open(
        Cursor::new(b"<p>a".to_vec()),
        ScannerOptions::default(),
        Box::new(SilentErrorReporter),
    )
    .unwrap();
    let mut sink = RecordingSink::default();
    loop {
        match scanner.scan(&mut sink, false).unwrap() {
            Outcome::Done => break,
            Outcome::MoreToDo => {
                if characters(&sink.events) == "a" {
                    let nested = CurrentEntity::new(
                        htmlscan::byte_source::PlaybackBuffer::new(Cursor::new(b"B".to_vec())),
                        "utf-8".to_string(),
                    );
                    scanner.push_input_source(nested);
                }
            }
        }
    }
    assert_eq!(characters(&sink.events), "aB");
}

#[test]
fn crlf_and_lone_cr_collapse_to_a_single_newline() {
    let events = scan("a\r\nb\rc\nd");
    assert_eq!(characters(&events), "a\nb\nc\nd");
}

#[test]
fn rewound_entity_scan_does_not_inflate_location_offset() {
    let mut options = ScannerOptions::default();
    options.augmentations = true;
    let events = scan_with("&foo;bar", options);
    let text_event = events
        .iter()
        .find(|e| matches!(e, Event::Characters { .. }))
        .expect("one characters event covering the whole run");
    match text_event {
        Event::Characters { text, location } => {
            assert_eq!(text, "&foo;bar");
            let loc = location.expect("augmentations enabled");
            assert_eq!(loc.begin_offset, 0);
            assert_eq!(loc.end_offset, 8);
        }
        other => panic!("expected Characters, got {other:?}"),
    }
}

#[test]
fn selfclosing_script_is_ignored_by_default() {
    let events = scan("<script/>foo</script>");
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::StartElement { name, .. } if name.raw == "script")));
    assert_eq!(characters(&events), "foo");
}

#[test]
fn allow_selfclosing_tags_still_emits_ordinary_start_element() {
    let mut options = ScannerOptions::default();
    options.allow_selfclosing_tags = true;
    let events = scan_with("<div>", options);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::StartElement { name, .. } if name.raw == "div")));
}

#[test]
fn allow_selfclosing_iframe_honors_self_closing() {
    let mut options = ScannerOptions::default();
    options.allow_selfclosing_iframe = true;
    let events = scan_with("<iframe/>", options);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::EmptyElement { name, .. } if name.raw == "iframe")));
}

#[test]
fn notify_char_refs_brackets_numeric_reference() {
    let mut options = ScannerOptions::default();
    options.notify_char_refs = true;
    let events = scan_with("&#65;", options);
    let names: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::StartGeneralEntity { name, .. } => Some(("start", name.as_str())),
            Event::EndGeneralEntity { name, .. } => Some(("end", name.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec![("start", "#65"), ("end", "#65")]);
    assert_eq!(characters(&events), "A");
}

#[test]
fn notify_html_builtin_refs_brackets_named_reference() {
    let mut options = ScannerOptions::default();
    options.notify_html_builtin_refs = true;
    let events = scan_with("&nbsp;", options);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::StartGeneralEntity { name, .. } if name == "nbsp")));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::EndGeneralEntity { name, .. } if name == "nbsp")));
}

#[test]
fn notifications_do_not_apply_inside_attribute_values() {
    let mut options = ScannerOptions::default();
    options.notify_html_builtin_refs = true;
    options.notify_char_refs = true;
    let events = scan_with(r#"<a href="?x=1&amp;y=2">"#, options);
    assert!(!events.iter().any(|e| matches!(e, Event::StartGeneralEntity { .. })));
}

#[test]
fn scanner_is_incremental_with_complete_false() {
    let mut scanner = htmlscan::Scanner::open(
        Cursor::new(b"<p>hi</p>".to_vec()),
        ScannerOptions::default(),
        Box::new(SilentErrorReporter),
    )
    .unwrap();
    let mut sink = RecordingSink::default();
    let mut steps = 0;
    loop {
        match scanner.scan(&mut sink, false).unwrap() {
            ScanOutcome::Done => break,
            ScanOutcome::MoreToDo => steps += 1,
        }
        assert!(steps < 1000, "scan loop did not terminate");
    }
    assert!(steps > 1);
    assert_eq!(characters(&sink.events), "hi");
}
