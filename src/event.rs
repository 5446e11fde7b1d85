//! Document events and the sink interface downstream consumers implement.
//!
//! Tree construction, namespace binding, and DOM mutation all live on the
//! other side of [`EventSink`]; this crate only produces the flat event
//! stream.

use crate::location::LocationItem;

/// `(prefix, local, raw, uri)`. Only `raw` is produced by the scanner;
/// prefix/local splitting and URI binding are an external concern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QualifiedName {
    /// Namespace prefix, if the raw name contained a `:`.
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local: String,
    /// The name exactly as scanned, including any prefix.
    pub raw: String,
    /// Namespace URI; always `None` from this scanner.
    pub uri: Option<String>,
}

impl QualifiedName {
    /// Builds a `QualifiedName` from raw scanned text, splitting on the
    /// first `:` if present.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local)) => Self {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
                raw: raw.to_string(),
                uri: None,
            },
            None => Self {
                prefix: None,
                local: raw.to_string(),
                raw: raw.to_string(),
                uri: None,
            },
        }
    }
}

/// One scanned attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute's name.
    pub name: QualifiedName,
    /// Entity-expanded, normalized value.
    pub value: String,
    /// Value exactly as scanned, before entity expansion or whitespace
    /// normalization.
    pub non_normalized_value: String,
    /// `false` for attributes synthesized by a consumer rather than
    /// scanned from input; always `true` from this scanner.
    pub specified: bool,
    /// Location of this attribute, when augmentations are enabled.
    pub location: Option<LocationItem>,
}

/// Ordered list of attributes; left-to-right scan order, duplicates
/// preserved since the sink may need to see them.
pub type AttributeList = Vec<Attribute>;

/// One document-level event, in the order the scanner produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The first event of any document.
    StartDocument {
        /// Encoding label the scanner ultimately decoded with.
        encoding: String,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// Emitted only when a processing instruction's target is `xml`.
    XmlDecl {
        /// XML version string, if present.
        version: Option<String>,
        /// Declared encoding, if present.
        encoding: Option<String>,
        /// `standalone` value, if present.
        standalone: Option<bool>,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// `<!DOCTYPE ...>`.
    DoctypeDecl {
        /// The root element name.
        root: String,
        /// Public identifier, if any.
        public_id: Option<String>,
        /// System identifier, if any.
        system_id: Option<String>,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// `<!-- ... -->`, with delimiters already stripped.
    Comment {
        /// Comment text.
        text: String,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// `<?target data?>` where target is not `xml`.
    ProcessingInstruction {
        /// PI target.
        target: String,
        /// PI data.
        data: String,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// A non-self-closing, non-empty start tag.
    StartElement {
        /// Element name.
        name: QualifiedName,
        /// Scanned attributes, in document order.
        attributes: AttributeList,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// A self-closing tag (`<br/>`) reported instead of a
    /// start/end pair.
    EmptyElement {
        /// Element name.
        name: QualifiedName,
        /// Scanned attributes, in document order.
        attributes: AttributeList,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// Character data, already entity-decoded.
    Characters {
        /// The decoded text.
        text: String,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// Brackets a general entity reference's replacement text; only
    /// emitted when the corresponding `notify-*-refs` option is enabled.
    /// The replacement itself arrives as an ordinary `Characters` event
    /// between this and the matching `EndGeneralEntity`.
    StartGeneralEntity {
        /// The reference's name: the bare entity name for a named
        /// reference (no `&`/`;`), or `#<codepoint>` for a numeric one.
        name: String,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// Matching close for a `StartGeneralEntity`.
    EndGeneralEntity {
        /// The reference's name, same as the paired `StartGeneralEntity`.
        name: String,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// Start of a `<![CDATA[` section; only emitted when `cdata_sections`
    /// is enabled.
    StartCdata {
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// End of a `<![CDATA[ ... ]]>` section; only emitted when
    /// `cdata_sections` is enabled.
    EndCdata {
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// Matching end tag for a `StartElement`.
    EndElement {
        /// Element name.
        name: QualifiedName,
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
    /// The final event of any document.
    EndDocument {
        /// Location, when augmentations are enabled.
        location: Option<LocationItem>,
    },
}

/// Pure callback contract the scanner drives synchronously from its own
/// stack. Implementations must not retain references into any borrowed
/// buffers passed alongside events (there are none in this event model:
/// every payload is already owned).
pub trait EventSink {
    /// Receives one event, in document order.
    fn event(&mut self, event: Event);
}

/// An `EventSink` that forwards every event to a wrapped sink unchanged.
/// Concrete filters wrap this helper and override only the events they
/// care about, rather than re-implementing pass-through for the rest.
pub struct PassThroughSink<'a> {
    inner: &'a mut dyn EventSink,
}

impl<'a> PassThroughSink<'a> {
    /// Wraps `inner`, forwarding every event to it by default.
    pub fn new(inner: &'a mut dyn EventSink) -> Self {
        Self { inner }
    }

    /// Forwards `event` to the wrapped sink.
    pub fn forward(&mut self, event: Event) {
        self.inner.event(event);
    }
}

/// A sink that records every event it receives, for test assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Events received so far, in order.
    pub events: Vec<Event>,
}

impl EventSink for RecordingSink {
    fn event(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::QualifiedName;

    #[test]
    fn splits_prefix() {
        let q = QualifiedName::from_raw("xlink:href");
        assert_eq!(q.prefix.as_deref(), Some("xlink"));
        assert_eq!(q.local, "href");
        assert_eq!(q.raw, "xlink:href");
    }

    #[test]
    fn no_prefix() {
        let q = QualifiedName::from_raw("div");
        assert_eq!(q.prefix, None);
        assert_eq!(q.local, "div");
    }
}
