//! Namespace-aware element tree for feed documents.
//!
//! This crate folds the flat event stream of [`feedxml_sax`] into a [`Tag`]
//! tree, resolving each element's namespace URI to the prefix the document
//! declared for it.

mod tracing_macros;
use tracing_macros::trace;

mod builder;
mod diagnostic;
mod tag;

pub use builder::{BuildError, TreeBuilder};
pub use feedxml_sax::{Attribute, SaxEvent, SaxHandler, ScanError, Scanner};
pub use tag::Tag;

/// Parse an XML document into a tree.
///
/// Elements may nest up to [`TreeBuilder::DEFAULT_MAX_DEPTH`] levels.
pub fn parse(source: &str) -> Result<Tag, BuildError> {
    parse_with_max_depth(source, TreeBuilder::DEFAULT_MAX_DEPTH)
}

/// Like [`parse`], rejecting elements nested deeper than `max_depth`.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Tag, BuildError> {
    let mut scanner = Scanner::new(source);
    let mut builder = TreeBuilder::new().with_max_depth(max_depth);
    while let Some(event) = scanner.next_event() {
        if !builder.event(event) {
            break;
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests;
