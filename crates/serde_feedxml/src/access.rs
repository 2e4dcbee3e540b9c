//! Keyed and ordered views over the tree.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use feedxml_tree::Tag;
use rust_decimal::Decimal;
use serde::de::{Deserialize, DeserializeSeed};

use crate::coerce::ScalarAccess;
use crate::de::FieldDeserializer;
use crate::error::{Error, Result};
use crate::options::DecodeOptions;
use crate::path::{self, PathSegment};
#[allow(unused_imports)]
use crate::trace;

/// A position in the tree from which values can be decoded.
///
/// The decoder is cheap to build and is rebuilt for every nested descent.
#[derive(Debug, Clone)]
pub struct Decoder<'de, 'o> {
    pub(crate) tag: &'de Tag,
    pub(crate) namespace: Option<String>,
    pub(crate) path: Vec<PathSegment>,
    pub(crate) options: &'o DecodeOptions,
    /// Set for sequence slots, which read missing text as empty.
    pub(crate) in_sequence: bool,
}

impl<'de, 'o> Decoder<'de, 'o> {
    /// Create a decoder for the root of a tree.
    pub fn new(tag: &'de Tag, options: &'o DecodeOptions) -> Self {
        Self::at(tag, Vec::new(), options)
    }

    pub(crate) fn at(tag: &'de Tag, path: Vec<PathSegment>, options: &'o DecodeOptions) -> Self {
        Self {
            tag,
            namespace: None,
            path,
            options,
            in_sequence: false,
        }
    }

    /// The element this decoder reads from.
    pub fn tag(&self) -> &'de Tag {
        self.tag
    }

    /// The namespace prefix the keyed and ordered views are restricted to.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Keys taken to get here.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Options in effect.
    pub fn options(&self) -> &'o DecodeOptions {
        self.options
    }

    /// The element's own text.
    pub fn scalar(&self) -> ScalarAccess<'de, 'o> {
        ScalarAccess::new(self.tag.value.as_deref(), self.path.clone(), self.options)
            .absent_as_empty(self.in_sequence)
    }

    /// Map-like view over attributes, children and namespaces.
    pub fn keyed(&self) -> KeyedAccess<'de, 'o> {
        KeyedAccess::new(self.clone())
    }

    /// Sequence-like view over the children selected by the namespace filter,
    /// or by the last key of the path.
    pub fn ordered(&self) -> Result<OrderedAccess<'de, 'o>> {
        let elements: Vec<&'de Tag> = if let Some(prefix) = &self.namespace {
            self.tag.children_with_prefix(prefix).collect()
        } else if let Some(name) = self.path.last().and_then(PathSegment::as_field) {
            self.tag.children_named(name).collect()
        } else {
            return Err(Error::value_not_found(
                &self.path,
                "cannot form a sequence without a field name or namespace",
            ));
        };

        trace!(count = elements.len(), path = ?self.path, "ordered view");
        Ok(OrderedAccess {
            elements,
            path: self.path.clone(),
            options: self.options,
            index: 0,
        })
    }

    /// Decode any deserializable type from this position.
    pub fn decode<T: Deserialize<'de>>(self) -> Result<T> {
        let path = self.path.clone();
        T::deserialize(self).map_err(|err| err.at(&path))
    }
}

/// Map-like access to an element.
///
/// Keys are attribute names, the names of direct children and the namespace
/// prefixes found among direct children. When several children share a name
/// only the first one is reachable here; use
/// [`nested_sequence`](Self::nested_sequence) to see all of them.
pub struct KeyedAccess<'de, 'o> {
    decoder: Decoder<'de, 'o>,
    /// Uniquely named children in document order.
    elements: Vec<(&'de str, &'de Tag)>,
    namespaces: BTreeSet<&'de str>,
}

macro_rules! keyed_scalars {
    ($($method:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Read the value for `key` as `", stringify!($ty), "`.")]
            pub fn $method(&self, key: &str) -> Result<$ty> {
                self.scalar(key)?.$method()
            }
        )*
    };
}

impl<'de, 'o> KeyedAccess<'de, 'o> {
    fn new(decoder: Decoder<'de, 'o>) -> Self {
        let tag: &'de Tag = decoder.tag;
        let prefix = decoder.namespace.as_deref();
        let mut elements: Vec<(&'de str, &'de Tag)> = Vec::new();
        for child in &tag.children {
            if prefix.is_some_and(|p| child.prefix.as_deref() != Some(p)) {
                continue;
            }
            if !elements.iter().any(|(name, _)| *name == child.name) {
                elements.push((child.name.as_str(), child));
            }
        }

        Self {
            namespaces: tag.namespaces(),
            elements,
            decoder,
        }
    }

    /// The decoder this view was built from.
    pub fn decoder(&self) -> &Decoder<'de, 'o> {
        &self.decoder
    }

    /// Keys taken to get here.
    pub fn path(&self) -> &[PathSegment] {
        &self.decoder.path
    }

    pub(crate) fn element(&self, key: &str) -> Option<&'de Tag> {
        self.elements
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, tag)| *tag)
    }

    pub(crate) fn is_namespace(&self, key: &str) -> bool {
        self.namespaces.contains(key)
    }

    /// Attribute names, then child names, then namespace prefixes.
    pub fn all_keys(&self) -> Vec<&'de str> {
        let tag: &'de Tag = self.decoder.tag;
        tag.attributes
            .keys()
            .map(String::as_str)
            .chain(self.elements.iter().map(|(name, _)| *name))
            .chain(self.namespaces.iter().copied())
            .collect()
    }

    /// Whether `key` names an attribute, a child, a namespace prefix or the
    /// element itself.
    pub fn contains(&self, key: &str) -> bool {
        self.element(key).is_some()
            || self.decoder.tag.attributes.contains_key(key)
            || self.is_namespace(key)
            || self.decoder.tag.name == key
    }

    /// Text for `key`: the attribute, else the child's text, else the
    /// element's own text.
    pub fn get(&self, key: &str) -> Result<&'de str> {
        let tag: &'de Tag = self.decoder.tag;
        if let Some(value) = tag.attributes.get(key) {
            return Ok(value.as_str());
        }
        if let Some(value) = self.element(key).and_then(|c| c.value.as_deref()) {
            return Ok(value);
        }
        tag.value
            .as_deref()
            .ok_or_else(|| Error::key_not_found(&self.decoder.path, key))
    }

    /// Whether the text for `key` is empty.
    pub fn decode_nil(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_empty())
    }

    /// Scalar access to the text for `key`.
    pub fn scalar(&self, key: &str) -> Result<ScalarAccess<'de, 'o>> {
        let value = self.get(key)?;
        Ok(ScalarAccess::new(
            Some(value),
            path::extend(&self.decoder.path, key),
            self.decoder.options,
        ))
    }

    keyed_scalars! {
        decode_bool => bool,
        decode_i8 => i8,
        decode_i16 => i16,
        decode_i32 => i32,
        decode_i64 => i64,
        decode_u8 => u8,
        decode_u16 => u16,
        decode_u32 => u32,
        decode_u64 => u64,
        decode_f32 => f32,
        decode_f64 => f64,
        decode_string => String,
        decode_date => DateTime<Utc>,
        decode_data => Vec<u8>,
        decode_url => url::Url,
        decode_decimal => Decimal,
    }

    /// Read the value for `key` as text.
    pub fn decode_str(&self, key: &str) -> Result<&'de str> {
        self.get(key)
    }

    /// Decode any deserializable type stored under `key`.
    pub fn decode<T: Deserialize<'de>>(&self, key: &str) -> Result<T> {
        let path = path::extend(&self.decoder.path, key);
        T::deserialize(FieldDeserializer::new(self, key)).map_err(|err| err.at(&path))
    }

    /// Descend into the child named `key`, or into this element restricted to
    /// the namespace `key`.
    pub fn nested(&self, key: &str) -> Result<Decoder<'de, 'o>> {
        let path = path::extend(&self.decoder.path, key);

        if let Some(child) = self.element(key) {
            trace!(key, "nested element");
            return Ok(Decoder::at(child, path, self.decoder.options));
        }

        if self.is_namespace(key) {
            trace!(key, "nested namespace");
            let mut decoder = Decoder::at(self.decoder.tag, path, self.decoder.options);
            decoder.namespace = Some(key.to_string());
            return Ok(decoder);
        }

        Err(Error::key_not_found(&self.decoder.path, key))
    }

    /// Keyed view of [`nested`](Self::nested).
    pub fn nested_keyed(&self, key: &str) -> Result<KeyedAccess<'de, 'o>> {
        Ok(self.nested(key)?.keyed())
    }

    /// All children named `key`, as a sequence.
    pub fn nested_sequence(&self, key: &str) -> OrderedAccess<'de, 'o> {
        let path = path::extend(&self.decoder.path, key);
        let elements: Vec<&'de Tag> = self.decoder.tag.children_named(key).collect();
        trace!(key, count = elements.len(), "nested sequence");
        OrderedAccess {
            elements,
            path,
            options: self.decoder.options,
            index: 0,
        }
    }
}

/// Sequence access with a cursor.
///
/// The cursor only moves when decoding the element under it succeeds, so a
/// failed attempt can be retried as another type.
pub struct OrderedAccess<'de, 'o> {
    elements: Vec<&'de Tag>,
    path: Vec<PathSegment>,
    options: &'o DecodeOptions,
    index: usize,
}

impl<'de, 'o> OrderedAccess<'de, 'o> {
    /// Number of elements.
    pub fn count(&self) -> usize {
        self.elements.len()
    }

    /// Whether every element has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.index >= self.elements.len()
    }

    /// Position of the cursor.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Path of the sequence itself.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Decoder for the element under the cursor, without advancing.
    fn peek(&self) -> Result<Decoder<'de, 'o>> {
        let path = path::extend(&self.path, self.index);
        let Some(&tag) = self.elements.get(self.index) else {
            return Err(Error::value_not_found(&path, "sequence is at end"));
        };
        let mut decoder = Decoder::at(tag, path, self.options);
        decoder.in_sequence = true;
        Ok(decoder)
    }

    /// Whether the element under the cursor has no text.
    pub fn decode_nil(&self) -> Result<bool> {
        Ok(self.peek()?.tag.value.is_none())
    }

    /// Decode the element under the cursor, advancing on success.
    pub fn next<T: Deserialize<'de>>(&mut self) -> Result<T> {
        self.next_seed(PhantomData)
    }

    /// Seeded form of [`next`](Self::next).
    pub fn next_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value> {
        let decoder = self.peek()?;
        let path = decoder.path.clone();
        let value = seed.deserialize(decoder).map_err(|err| err.at(&path))?;
        self.index += 1;
        Ok(value)
    }

    /// Decoder for the element under the cursor, advancing.
    pub fn next_decoder(&mut self) -> Result<Decoder<'de, 'o>> {
        let decoder = self.peek()?;
        self.index += 1;
        Ok(decoder)
    }

    /// Keyed view of the element under the cursor, advancing.
    pub fn next_keyed(&mut self) -> Result<KeyedAccess<'de, 'o>> {
        Ok(self.next_decoder()?.keyed())
    }

    /// Ordered view of the element under the cursor, advancing on success.
    pub fn next_ordered(&mut self) -> Result<OrderedAccess<'de, 'o>> {
        let ordered = self.peek()?.ordered()?;
        self.index += 1;
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn item() -> Tag {
        feedxml_tree::parse(
            r#"<item xmlns:media="http://search.yahoo.com/mrss/" id="42">own<title>Hello</title><category term="a">first</category><category term="b">second</category><media:title>Media</media:title><media:rating>5</media:rating><link href="http://x/"/></item>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_all_keys_order() {
        let tag = item();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        assert_eq!(
            keyed.all_keys(),
            ["id", "title", "category", "rating", "link", "media"]
        );
    }

    #[test]
    fn test_contains() {
        let tag = item();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        assert!(keyed.contains("id"));
        assert!(keyed.contains("category"));
        assert!(keyed.contains("media"));
        assert!(keyed.contains("item"));
        assert!(!keyed.contains("author"));
    }

    #[test]
    fn test_get_precedence() {
        let tag = item();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        assert_eq!(keyed.get("id").unwrap(), "42");
        assert_eq!(keyed.get("title").unwrap(), "Hello");
        // duplicate children: the first one shadows the rest
        assert_eq!(keyed.get("category").unwrap(), "first");
        // a childless, attribute-only child falls through to the own text
        assert_eq!(keyed.get("link").unwrap(), "own");
        assert_eq!(keyed.get("missing").unwrap(), "own");
    }

    #[test]
    fn test_get_key_not_found_without_own_text() {
        let tag = feedxml_tree::parse("<item><title>t</title></item>").unwrap();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        let err = keyed.get("author").unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::KeyNotFound {
                key: "author".to_string()
            }
        );
    }

    #[test]
    fn test_attribute_beats_child() {
        let tag = feedxml_tree::parse(r#"<item title="attr"><title>child</title></item>"#).unwrap();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        assert_eq!(keyed.get("title").unwrap(), "attr");
    }

    #[test]
    fn test_decode_nil() {
        let tag = feedxml_tree::parse("<item><a></a><b>x</b></item>").unwrap();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        // <a></a> has no text, so the lookup falls back to the item, which
        // has none either
        assert!(keyed.decode_nil("a").is_err());
        assert!(!keyed.decode_nil("b").unwrap());

        let tag = feedxml_tree::parse(r#"<item empty=""/>"#).unwrap();
        let keyed = Decoder::new(&tag, &options).keyed();
        assert!(keyed.decode_nil("empty").unwrap());
    }

    #[test]
    fn test_namespace_scoping() {
        let tag = item();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();

        let media = keyed.nested_keyed("media").unwrap();
        assert_eq!(media.decoder().namespace(), Some("media"));
        assert_eq!(media.get("title").unwrap(), "Media");
        assert_eq!(media.decode_u8("rating").unwrap(), 5);
        assert!(!media.contains("category"));
        assert_eq!(media.path(), [PathSegment::from("media")]);

        let mut ordered = keyed.nested("media").unwrap().ordered().unwrap();
        assert_eq!(ordered.count(), 2);
        assert_eq!(ordered.next::<String>().unwrap(), "Media");
    }

    #[test]
    fn test_nested_key_not_found() {
        let tag = item();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        assert!(matches!(
            keyed.nested("author").unwrap_err().kind(),
            ErrorKind::KeyNotFound { .. }
        ));
    }

    #[test]
    fn test_nested_sequence_sees_duplicates() {
        let tag = item();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        let mut categories = keyed.nested_sequence("category");
        assert_eq!(categories.count(), 2);

        let first = categories.next_keyed().unwrap();
        assert_eq!(first.get("term").unwrap(), "a");
        assert_eq!(first.path(), [PathSegment::from("category"), PathSegment::Index(0)]);
        assert_eq!(categories.next::<String>().unwrap(), "second");
        assert!(categories.is_at_end());

        let err = categories.next::<String>().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValueNotFound);
    }

    #[test]
    fn test_cursor_does_not_advance_on_failure() {
        let tag = feedxml_tree::parse("<list><n>abc</n><n>2</n></list>").unwrap();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        let mut numbers = keyed.nested_sequence("n");

        assert!(numbers.next::<i32>().is_err());
        assert_eq!(numbers.current_index(), 0);
        assert_eq!(numbers.next::<String>().unwrap(), "abc");
        assert_eq!(numbers.current_index(), 1);
        assert_eq!(numbers.next::<i32>().unwrap(), 2);
    }

    #[test]
    fn test_ordered_needs_context() {
        let tag = item();
        let options = DecodeOptions::default();
        let err = Decoder::new(&tag, &options).ordered().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValueNotFound);
    }

    #[test]
    fn test_sequence_slot_without_text() {
        let tag = feedxml_tree::parse("<list><s/><s>x</s></list>").unwrap();
        let options = DecodeOptions::default();
        let keyed = Decoder::new(&tag, &options).keyed();
        let mut slots = keyed.nested_sequence("s");
        assert!(slots.decode_nil().unwrap());
        assert_eq!(slots.next::<String>().unwrap(), "");
        assert!(!slots.decode_nil().unwrap());
    }
}
