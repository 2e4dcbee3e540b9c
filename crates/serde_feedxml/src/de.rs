//! Serde deserializer over the element tree.

use serde::de::{self, Deserializer as _, Visitor};

use crate::access::{Decoder, KeyedAccess, OrderedAccess};
use crate::coerce::ScalarAccess;
use crate::error::{Error, Result};
use crate::options::DataStrategy;
use crate::path;
#[allow(unused_imports)]
use crate::trace;
use crate::types::{DATA_TOKEN, DATE_TOKEN, DECIMAL_TOKEN, URL_TOKEN};

fn is_special(name: &str) -> bool {
    matches!(name, DATE_TOKEN | DATA_TOKEN | URL_TOKEN | DECIMAL_TOKEN)
}

/// Forward scalar requests to a [`ScalarAccess`] built by `$scalar`.
macro_rules! forward_to_scalar {
    ($scalar:ident: $($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                self.$scalar()?.$method(visitor)
            }
        )*
    };
}

impl<'de, 'o> Decoder<'de, 'o> {
    fn own_scalar(&self) -> Result<ScalarAccess<'de, 'o>> {
        Ok(self.scalar())
    }
}

impl<'de, 'o> de::Deserializer<'de> for Decoder<'de, 'o> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.tag.has_structure() || self.namespace.is_some() {
            return self.deserialize_map(visitor);
        }
        match self.tag.value.as_deref() {
            Some(text) => visitor.visit_borrowed_str(text),
            None => visitor.visit_unit(),
        }
    }

    forward_to_scalar! {
        own_scalar:
        deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64
        deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf
        deserialize_identifier
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.tag.value.is_none() && !self.tag.has_structure() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        let structured_data =
            name == DATA_TOKEN && matches!(self.options.data_strategy, DataStrategy::Default);
        if is_special(name) && !structured_data {
            self.scalar().deserialize_newtype_struct(name, visitor)
        } else {
            visitor.visit_newtype_struct(self)
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let ordered = self.ordered()?;
        visitor
            .visit_seq(SeqAccess { ordered })
            .map_err(|err| err.at(&self.path))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let keyed = self.keyed();
        let keys = keyed.all_keys();
        visitor
            .visit_map(MapAccess::new(keyed, keys))
            .map_err(|err| err.at(&self.path))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        trace!(name, path = ?self.path, "struct");
        let keyed = self.keyed();
        let keys = fields.to_vec();
        visitor
            .visit_map(MapAccess::new(keyed, keys))
            .map_err(|err| err.at(&self.path))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.scalar().deserialize_enum(name, variants, visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

/// The value half of a struct field or map entry.
///
/// Scalars come from the keyed lookup, structures from descending into the
/// child, and sequences from every child carrying the key's name.
///
/// A key that names nothing decodes as `None` or an empty sequence; anything
/// else asked of it is [`KeyNotFound`](crate::ErrorKind::KeyNotFound).
pub(crate) struct FieldDeserializer<'a, 'de, 'o> {
    keyed: &'a KeyedAccess<'de, 'o>,
    key: &'a str,
    present: bool,
}

impl<'a, 'de, 'o> FieldDeserializer<'a, 'de, 'o> {
    pub(crate) fn new(keyed: &'a KeyedAccess<'de, 'o>, key: &'a str) -> Self {
        Self {
            keyed,
            key,
            present: keyed.contains(key),
        }
    }

    fn missing(&self) -> Error {
        Error::key_not_found(self.keyed.path(), self.key)
    }

    fn scalar(&self) -> Result<ScalarAccess<'de, 'o>> {
        if !self.present {
            return Err(self.missing());
        }
        self.keyed.scalar(self.key)
    }

    /// Whether the key holds more than one text value: a child with its own
    /// structure, several children of that name, or a namespace.
    fn is_structured(&self) -> bool {
        let tag = self.keyed.decoder().tag();
        self.keyed
            .element(self.key)
            .is_some_and(|child| child.has_structure())
            || tag.children_named(self.key).nth(1).is_some()
            || self.keyed.is_namespace(self.key)
    }

    fn sequence(&self) -> Result<OrderedAccess<'de, 'o>> {
        if self.keyed.element(self.key).is_none() && self.keyed.is_namespace(self.key) {
            return self.keyed.nested(self.key)?.ordered();
        }
        Ok(self.keyed.nested_sequence(self.key))
    }
}

impl<'a, 'de, 'o> de::Deserializer<'de> for FieldDeserializer<'a, 'de, 'o> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if !self.present {
            return Err(self.missing());
        }
        let tag = self.keyed.decoder().tag();
        if tag.attributes.contains_key(self.key) {
            return self.scalar()?.deserialize_any(visitor);
        }
        if self.keyed.element(self.key).is_some() || self.keyed.is_namespace(self.key) {
            return self.keyed.nested(self.key)?.deserialize_any(visitor);
        }
        self.scalar()?.deserialize_any(visitor)
    }

    forward_to_scalar! {
        scalar:
        deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64
        deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf
        deserialize_identifier
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if !self.present {
            return visitor.visit_none();
        }
        let empty = self.keyed.get(self.key).map_or(true, str::is_empty);
        if empty && !self.is_structured() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        let structured_data = name == DATA_TOKEN
            && matches!(
                self.keyed.decoder().options().data_strategy,
                DataStrategy::Default
            );
        if is_special(name) && !self.present {
            return Err(self.missing());
        }
        if is_special(name) && !structured_data {
            self.scalar()?.deserialize_newtype_struct(name, visitor)
        } else {
            visitor.visit_newtype_struct(self)
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let ordered = self.sequence()?;
        let path = ordered.path().to_vec();
        visitor
            .visit_seq(SeqAccess { ordered })
            .map_err(|err| err.at(&path))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.keyed.nested(self.key)?.deserialize_map(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.keyed
            .nested(self.key)?
            .deserialize_struct(name, fields, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.scalar()?.deserialize_enum(name, variants, visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

/// Map access for serde, over a fixed list of keys.
struct MapAccess<'de, 'o> {
    keyed: KeyedAccess<'de, 'o>,
    keys: std::vec::IntoIter<&'de str>,
    current: Option<&'de str>,
}

impl<'de, 'o> MapAccess<'de, 'o> {
    fn new(keyed: KeyedAccess<'de, 'o>, keys: Vec<&'de str>) -> Self {
        Self {
            keyed,
            keys: keys.into_iter(),
            current: None,
        }
    }
}

impl<'de, 'o> de::MapAccess<'de> for MapAccess<'de, 'o> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        let Some(key) = self.keys.next() else {
            return Ok(None);
        };
        self.current = Some(key);
        seed.deserialize(de::value::BorrowedStrDeserializer::new(key))
            .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        let key = self
            .current
            .take()
            .ok_or_else(|| <Error as de::Error>::custom("value requested before key"))?;
        trace!(key, "field");
        seed.deserialize(FieldDeserializer::new(&self.keyed, key))
            .map_err(|err| err.at(&path::extend(self.keyed.path(), key)))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.keys.len())
    }
}

/// Sequence access for serde.
struct SeqAccess<'de, 'o> {
    ordered: OrderedAccess<'de, 'o>,
}

impl<'de, 'o> de::SeqAccess<'de> for SeqAccess<'de, 'o> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        if self.ordered.is_at_end() {
            return Ok(None);
        }
        self.ordered.next_seed(seed).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.ordered.count() - self.ordered.current_index())
    }
}
