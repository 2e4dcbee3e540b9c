//! SAX-style event stream for feed documents.
//!
//! [`Scanner`] turns an XML document into a flat sequence of [`SaxEvent`]s:
//! prefix mappings, element starts and ends, and character data. Consumers
//! either pull events through the iterator API or implement [`SaxHandler`]
//! and let the scanner push them.

mod callback;
pub use callback::SaxHandler;

mod event;
pub use event::{Attribute, SaxEvent, ScanError};

mod scanner;
pub use scanner::Scanner;
