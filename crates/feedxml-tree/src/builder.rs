//! Tree builder from SAX events.

use std::collections::HashMap;

use feedxml_sax::{SaxEvent, SaxHandler, ScanError};

use crate::Tag;
#[allow(unused_imports)]
use crate::trace;

/// Error during tree building.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The input was not well-formed XML.
    Malformed {
        /// What went wrong.
        reason: String,
        /// The scanner error that ended the stream, if any.
        source: Option<ScanError>,
    },
    /// The stream ended with elements still open.
    Unclosed {
        /// How many elements were open.
        open: usize,
    },
    /// Elements nested deeper than the builder's limit.
    TooDeep {
        /// The limit that was exceeded.
        limit: usize,
    },
    /// The stream held no element at all.
    EmptyDocument,
}

impl BuildError {
    /// Byte offset of the underlying scanner error, if there was one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            BuildError::Malformed { source, .. } => source.as_ref().map(|s| s.offset),
            _ => None,
        }
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Malformed {
                reason,
                source: Some(source),
            } => write!(f, "malformed document: {reason}: {source}"),
            BuildError::Malformed {
                reason,
                source: None,
            } => write!(f, "malformed document: {reason}"),
            BuildError::Unclosed { open } => write!(
                f,
                "malformed document: {open} element(s) still open at end of input"
            ),
            BuildError::TooDeep { limit } => write!(
                f,
                "malformed document: elements nested deeper than {limit} levels"
            ),
            BuildError::EmptyDocument => {
                write!(f, "malformed document: document has no root element")
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Malformed { source, .. } => source
                .as_ref()
                .map(|s| s as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

/// Builder that constructs a [`Tag`] tree from SAX events.
///
/// The node being filled by the most recent start event is `current`. Opening
/// a child parks `current` on the stack; closing an element attaches it to
/// the stack top, or makes it the root once the stack is empty.
#[derive(Debug)]
pub struct TreeBuilder {
    stack: Vec<Tag>,
    current: Option<Tag>,
    root: Option<Tag>,
    /// Namespace URI to declared prefix.
    namespaces: HashMap<String, String>,
    max_depth: usize,
    error: Option<BuildError>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            stack: Vec::new(),
            current: None,
            root: None,
            namespaces: HashMap::new(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
            error: None,
        }
    }
}

impl TreeBuilder {
    /// Nesting limit used unless [`with_max_depth`](Self::with_max_depth)
    /// says otherwise.
    pub const DEFAULT_MAX_DEPTH: usize = 512;

    /// Create a new tree builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject documents whose elements nest deeper than `max_depth`.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of elements currently open.
    fn depth(&self) -> usize {
        self.stack.len() + usize::from(self.current.is_some())
    }

    /// Build a tree from a complete event stream.
    pub fn build<'src, I>(events: I) -> Result<Tag, BuildError>
    where
        I: IntoIterator<Item = SaxEvent<'src>>,
    {
        let mut builder = Self::new();
        for event in events {
            if !builder.event(event) {
                break;
            }
        }
        builder.finish()
    }

    /// Finish building and return the root element.
    pub fn finish(self) -> Result<Tag, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let open = self.depth();
        if open > 0 {
            return Err(BuildError::Unclosed { open });
        }

        self.root.ok_or(BuildError::EmptyDocument)
    }

    /// Attach a closed element to its parent, or keep it as the root.
    fn attach(&mut self, tag: Tag) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(tag),
            None => {
                if self.root.is_none() {
                    self.root = Some(tag);
                }
            }
        }
    }
}

impl<'src> SaxHandler<'src> for TreeBuilder {
    fn event(&mut self, event: SaxEvent<'src>) -> bool {
        match event {
            SaxEvent::StartPrefixMapping { prefix, uri } => {
                trace!(prefix = %prefix, uri = %uri, "prefix mapping");
                if !prefix.is_empty() {
                    self.namespaces.insert(uri.into_owned(), prefix.into_owned());
                }
            }

            SaxEvent::StartElement {
                name,
                namespace_uri,
                attributes,
            } => {
                trace!(name = %name, depth = self.stack.len(), "start element");
                if self.depth() >= self.max_depth {
                    self.error = Some(BuildError::TooDeep {
                        limit: self.max_depth,
                    });
                    return false;
                }
                let prefix = namespace_uri
                    .as_deref()
                    .and_then(|uri| self.namespaces.get(uri))
                    .cloned();
                let tag = Tag {
                    name: name.into_owned(),
                    prefix,
                    attributes: attributes
                        .into_iter()
                        .map(|a| (a.name.into_owned(), a.value.into_owned()))
                        .collect(),
                    value: None,
                    children: Vec::new(),
                };
                if let Some(parent) = self.current.take() {
                    self.stack.push(parent);
                }
                self.current = Some(tag);
            }

            SaxEvent::Characters(text) => {
                trace!(len = text.len(), "characters");
                if let Some(current) = self.current.as_mut() {
                    current.append_text(&text);
                } else if let Some(open) = self.stack.last_mut() {
                    open.append_text(&text);
                }
            }

            SaxEvent::EndElement { name, .. } => {
                trace!(name = %name, depth = self.stack.len(), "end element");
                if let Some(tag) = self.current.take() {
                    self.attach(tag);
                } else if let Some(tag) = self.stack.pop() {
                    self.attach(tag);
                }
            }

            SaxEvent::Error(error) => {
                trace!(error = %error, "scanner error");
                if self.error.is_none() {
                    self.error = Some(BuildError::Malformed {
                        reason: "scanner reported an error".to_string(),
                        source: Some(error),
                    });
                }
                return false;
            }
        }
        true
    }
}
