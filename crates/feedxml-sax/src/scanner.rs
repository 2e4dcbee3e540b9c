//! Host scanner adapter over `quick-xml`'s namespace-aware reader.

use std::borrow::Cow;
use std::collections::VecDeque;

use quick_xml::NsReader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use tracing::trace;

use crate::{Attribute, SaxEvent, SaxHandler, ScanError};

/// Pull-style scanner producing [`SaxEvent`]s from an XML document.
pub struct Scanner<'src> {
    reader: NsReader<&'src [u8]>,
    /// One reader event can expand into several SAX events.
    queue: VecDeque<SaxEvent<'src>>,
    done: bool,
}

impl<'src> Scanner<'src> {
    /// Create a scanner for the given source.
    pub fn new(source: &'src str) -> Self {
        let mut reader = NsReader::from_str(source);
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = true;
        Self {
            reader,
            queue: VecDeque::new(),
            done: false,
        }
    }

    /// Scan the whole document, pushing events into `handler`.
    ///
    /// Stops early when the handler returns `false` or after an
    /// [`SaxEvent::Error`] has been delivered.
    pub fn parse<H: SaxHandler<'src>>(mut self, handler: &mut H) {
        while let Some(event) = self.next_event() {
            if !handler.event(event) {
                return;
            }
        }
    }

    /// Convenience: scan and collect all events.
    pub fn collect_events(self) -> Vec<SaxEvent<'src>> {
        let mut events = Vec::new();
        self.parse(&mut events);
        events
    }

    /// Get the next event, or `None` once the document is exhausted.
    pub fn next_event(&mut self) -> Option<SaxEvent<'src>> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(event);
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fill() {
                trace!(message = %err.message, offset = err.offset, "scan error");
                self.done = true;
                self.queue.clear();
                return Some(SaxEvent::Error(err));
            }
        }
    }

    fn offset(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    fn error(&self, message: impl Into<String>) -> ScanError {
        ScanError::new(message, self.offset())
    }

    /// Read one reader event and queue whatever it expands into.
    fn fill(&mut self) -> Result<(), ScanError> {
        let read = self
            .reader
            .read_resolved_event()
            .map(|(resolved, event)| (resolve(resolved), event));
        let (namespace_uri, event) = match read {
            Ok(read) => read,
            Err(err) => return Err(self.error(err.to_string())),
        };

        match event {
            Event::Start(start) => {
                let namespace_uri = namespace_uri.map_err(|m| self.error(m))?;
                self.queue_start(&start, namespace_uri)?;
            }
            Event::End(end) => {
                let namespace_uri = namespace_uri.map_err(|m| self.error(m))?;
                let name = std::str::from_utf8(end.local_name().as_ref())
                    .map_err(|err| self.error(err.to_string()))?
                    .to_string();
                trace!(name = %name, "end element");
                self.queue.push_back(SaxEvent::EndElement {
                    name: Cow::Owned(name),
                    namespace_uri: namespace_uri.map(Cow::Owned),
                });
            }
            Event::Text(text) => {
                let text = decode_text(text.into_inner(), true).map_err(|m| self.error(m))?;
                if !text.is_empty() {
                    self.queue.push_back(SaxEvent::Characters(text));
                }
            }
            Event::CData(data) => {
                let text = decode_text(data.into_inner(), false).map_err(|m| self.error(m))?;
                if !text.is_empty() {
                    self.queue.push_back(SaxEvent::Characters(text));
                }
            }
            Event::Eof => {
                self.done = true;
            }
            // Declarations, comments, processing instructions and doctypes
            // carry nothing for the tree. Empty elements arrive as Start/End
            // pairs since the reader expands them.
            _ => {}
        }
        Ok(())
    }

    fn queue_start(
        &mut self,
        start: &BytesStart<'_>,
        namespace_uri: Option<String>,
    ) -> Result<(), ScanError> {
        let name = local_name(start).map_err(|m| self.error(m))?;
        let mut attributes = Vec::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|err| self.error(err.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| self.error(err.to_string()))?;
            let raw = std::str::from_utf8(&attr.value).map_err(|err| self.error(err.to_string()))?;
            let value = unescape(raw)
                .map_err(|err| self.error(err.to_string()))?
                .into_owned();

            if key == "xmlns" {
                self.queue.push_back(SaxEvent::StartPrefixMapping {
                    prefix: Cow::Borrowed(""),
                    uri: Cow::Owned(value),
                });
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                self.queue.push_back(SaxEvent::StartPrefixMapping {
                    prefix: Cow::Owned(prefix.to_string()),
                    uri: Cow::Owned(value),
                });
            } else {
                attributes.push(Attribute::new(key.to_string(), value));
            }
        }

        trace!(name = %name, namespace = ?namespace_uri, attributes = attributes.len(), "start element");
        self.queue.push_back(SaxEvent::StartElement {
            name: Cow::Owned(name),
            namespace_uri: namespace_uri.map(Cow::Owned),
            attributes,
        });
        Ok(())
    }
}

impl<'src> Iterator for Scanner<'src> {
    type Item = SaxEvent<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

/// Turn the reader's namespace resolution into an owned URI.
///
/// An undeclared prefix is an error in a namespace-aware document.
fn resolve(resolved: ResolveResult<'_>) -> Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(namespace) => std::str::from_utf8(namespace.as_ref())
            .map(|uri| Some(uri.to_string()))
            .map_err(|err| err.to_string()),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(format!(
            "undeclared namespace prefix `{}`",
            String::from_utf8_lossy(&prefix)
        )),
    }
}

fn local_name(start: &BytesStart<'_>) -> Result<String, String> {
    std::str::from_utf8(start.local_name().as_ref())
        .map(str::to_string)
        .map_err(|err| err.to_string())
}

/// Decode raw character data, keeping the borrow from the source when the
/// text has no entities to expand.
fn decode_text(raw: Cow<'_, [u8]>, escaped: bool) -> Result<Cow<'_, str>, String> {
    match raw {
        Cow::Borrowed(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|err| err.to_string())?;
            if escaped {
                unescape(text).map_err(|err| err.to_string())
            } else {
                Ok(Cow::Borrowed(text))
            }
        }
        Cow::Owned(bytes) => {
            let text = String::from_utf8(bytes).map_err(|err| err.to_string())?;
            if escaped {
                let unescaped = unescape(&text).map_err(|err| err.to_string())?;
                Ok(Cow::Owned(unescaped.into_owned()))
            } else {
                Ok(Cow::Owned(text))
            }
        }
    }
}
