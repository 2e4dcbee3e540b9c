//! Event types for the SAX-style scanner.

use std::borrow::Cow;
use std::fmt;

/// Events emitted by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaxEvent<'src> {
    /// A namespace declaration (`xmlns:prefix="uri"`).
    ///
    /// Emitted before the `StartElement` of the element carrying the
    /// declaration. The default namespace (`xmlns="uri"`) is reported with an
    /// empty prefix.
    StartPrefixMapping {
        /// Declared prefix, empty for the default namespace.
        prefix: Cow<'src, str>,
        /// Namespace URI the prefix is bound to.
        uri: Cow<'src, str>,
    },

    /// Start of an element.
    StartElement {
        /// Local name (never includes the prefix).
        name: Cow<'src, str>,
        /// Namespace URI the element resolved to, if any.
        namespace_uri: Option<Cow<'src, str>>,
        /// Attributes in document order, namespace declarations excluded.
        attributes: Vec<Attribute<'src>>,
    },

    /// Character data directly inside the open element.
    ///
    /// A single run of text may arrive as several consecutive fragments.
    Characters(Cow<'src, str>),

    /// End of an element.
    EndElement {
        /// Local name.
        name: Cow<'src, str>,
        /// Namespace URI the element resolved to, if any.
        namespace_uri: Option<Cow<'src, str>>,
    },

    /// The scanner hit a syntax error. No further events follow.
    Error(ScanError),
}

impl<'src> SaxEvent<'src> {
    /// Shorthand for a start event without namespace or attributes.
    pub fn start(name: impl Into<Cow<'src, str>>) -> Self {
        SaxEvent::StartElement {
            name: name.into(),
            namespace_uri: None,
            attributes: Vec::new(),
        }
    }

    /// Shorthand for an end event without namespace.
    pub fn end(name: impl Into<Cow<'src, str>>) -> Self {
        SaxEvent::EndElement {
            name: name.into(),
            namespace_uri: None,
        }
    }

    /// Shorthand for a character data fragment.
    pub fn text(text: impl Into<Cow<'src, str>>) -> Self {
        SaxEvent::Characters(text.into())
    }

    /// Convert into an event that owns all of its data.
    pub fn into_owned(self) -> SaxEvent<'static> {
        match self {
            SaxEvent::StartPrefixMapping { prefix, uri } => SaxEvent::StartPrefixMapping {
                prefix: Cow::Owned(prefix.into_owned()),
                uri: Cow::Owned(uri.into_owned()),
            },
            SaxEvent::StartElement {
                name,
                namespace_uri,
                attributes,
            } => SaxEvent::StartElement {
                name: Cow::Owned(name.into_owned()),
                namespace_uri: namespace_uri.map(|uri| Cow::Owned(uri.into_owned())),
                attributes: attributes.into_iter().map(Attribute::into_owned).collect(),
            },
            SaxEvent::Characters(text) => SaxEvent::Characters(Cow::Owned(text.into_owned())),
            SaxEvent::EndElement {
                name,
                namespace_uri,
            } => SaxEvent::EndElement {
                name: Cow::Owned(name.into_owned()),
                namespace_uri: namespace_uri.map(|uri| Cow::Owned(uri.into_owned())),
            },
            SaxEvent::Error(err) => SaxEvent::Error(err),
        }
    }
}

/// An attribute on a start element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'src> {
    /// Qualified name as written (`href`, `xml:lang`).
    pub name: Cow<'src, str>,
    /// Value after entity unescaping.
    pub value: Cow<'src, str>,
}

impl<'src> Attribute<'src> {
    /// Create a new attribute.
    pub fn new(name: impl Into<Cow<'src, str>>, value: impl Into<Cow<'src, str>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn into_owned(self) -> Attribute<'static> {
        Attribute {
            name: Cow::Owned(self.name.into_owned()),
            value: Cow::Owned(self.value.into_owned()),
        }
    }
}

/// A syntax error reported by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// Human readable description from the underlying reader.
    pub message: String,
    /// Byte offset in the source where the error was detected.
    pub offset: u64,
}

impl ScanError {
    /// Create a new scan error.
    pub fn new(message: impl Into<String>, offset: u64) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for ScanError {}
