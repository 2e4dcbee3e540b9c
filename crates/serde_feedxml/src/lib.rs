//! Serde support for RSS, Atom and other XML feed documents.
//!
//! Documents are parsed into a [`Tag`] tree first and records are decoded
//! from the tree. Element text, attributes and namespaced children all look
//! like keys of a map:
//!
//! - attributes and children are found by name, attributes first
//! - a key that matches nothing falls back to the element's own text
//! - a namespace prefix such as `media` is a key whose value is the element
//!   restricted to children carrying that prefix
//! - a `Vec` field collects every child with the field's name
//!
//! # Example
//!
//! ```
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Item {
//!     title: String,
//!     #[serde(rename = "category")]
//!     categories: Vec<String>,
//! }
//!
//! let xml = "<item><title>Hello</title><category>rust</category><category>xml</category></item>";
//! let item: Item = serde_feedxml::from_str(xml).unwrap();
//! assert_eq!(item.title, "Hello");
//! assert_eq!(item.categories, ["rust", "xml"]);
//! ```

mod tracing_macros;
use tracing_macros::trace;

mod access;
mod coerce;
mod de;
mod error;
mod options;
mod path;
mod types;

pub use access::{Decoder, KeyedAccess, OrderedAccess};
pub use coerce::ScalarAccess;
pub use error::{Error, ErrorKind, Result};
pub use feedxml_tree::{BuildError, Tag};
pub use options::{DataFn, DataStrategy, DateFn, DateStrategy, DecodeOptions};
pub use path::{CodingPath, PathSegment};
pub use types::{Data, Date, Decimal, Url};

use feedxml_tree::ScanError;
use serde::de::{Deserialize, DeserializeOwned};

/// Deserialize a value from an XML document.
///
/// The tree only lives for the duration of the call, so the value cannot
/// borrow from it. Use [`from_tag`] to decode borrowed strings.
pub fn from_str<T>(source: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_str_with_options(source, &DecodeOptions::default())
}

/// Like [`from_str`], with explicit options.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use serde_feedxml::{Date, DateStrategy, DecodeOptions};
///
/// #[derive(Deserialize)]
/// struct Item {
///     #[serde(rename = "pubDate")]
///     pub_date: Date,
/// }
///
/// let options = DecodeOptions::new().date_strategy(DateStrategy::Rfc2822);
/// let xml = "<item><pubDate>Tue, 10 Jun 2003 04:00:00 GMT</pubDate></item>";
/// let item: Item = serde_feedxml::from_str_with_options(xml, &options).unwrap();
/// assert_eq!(item.pub_date.to_string(), "2003-06-10T04:00:00Z");
/// ```
pub fn from_str_with_options<T>(source: &str, options: &DecodeOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    let tag = feedxml_tree::parse(source)?;
    from_tag_with_options(&tag, options)
}

/// Deserialize a value from UTF-8 bytes.
pub fn from_slice<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice_with_options(bytes, &DecodeOptions::default())
}

/// Like [`from_slice`], with explicit options.
pub fn from_slice_with_options<T>(bytes: &[u8], options: &DecodeOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    let source = std::str::from_utf8(bytes).map_err(|err| BuildError::Malformed {
        reason: "document is not valid UTF-8".to_string(),
        source: Some(ScanError::new(err.to_string(), err.valid_up_to() as u64)),
    })?;
    from_str_with_options(source, options)
}

/// Deserialize a value from an already parsed tree.
pub fn from_tag<'de, T>(tag: &'de Tag) -> Result<T>
where
    T: Deserialize<'de>,
{
    from_tag_with_options(tag, &DecodeOptions::default())
}

/// Like [`from_tag`], with explicit options.
pub fn from_tag_with_options<'de, T>(tag: &'de Tag, options: &DecodeOptions) -> Result<T>
where
    T: Deserialize<'de>,
{
    Decoder::new(tag, options).decode()
}
