//! Scalar access and text coercion.
//!
//! Every value in the tree is text. [`ScalarAccess`] turns one piece of text
//! into booleans, numbers, dates, binary data, URLs and decimals, following
//! the same rules whether the text came from an attribute, a child element or
//! the node itself.

use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Deserializer as _, IntoDeserializer, Visitor};

use crate::error::{Error, Result};
use crate::options::{DataStrategy, DateStrategy, DecodeOptions};
use crate::path::PathSegment;
#[allow(unused_imports)]
use crate::trace;
use crate::types::{DATA_TOKEN, DATE_TOKEN, DECIMAL_TOKEN, URL_TOKEN};

/// Access to a single text value.
pub struct ScalarAccess<'de, 'o> {
    value: Option<&'de str>,
    path: Vec<PathSegment>,
    options: &'o DecodeOptions,
    /// Sequence slots read missing text as an empty string.
    absent_as_empty: bool,
}

macro_rules! integer_decoders {
    ($($method:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Read the text as `", stringify!($ty), "`.")]
            pub fn $method(&self) -> Result<$ty> {
                self.decode_integer(stringify!($ty))
            }
        )*
    };
}

impl<'de, 'o> ScalarAccess<'de, 'o> {
    pub(crate) fn new(
        value: Option<&'de str>,
        path: Vec<PathSegment>,
        options: &'o DecodeOptions,
    ) -> Self {
        Self {
            value,
            path,
            options,
            absent_as_empty: false,
        }
    }

    pub(crate) fn absent_as_empty(mut self, yes: bool) -> Self {
        self.absent_as_empty = yes;
        self
    }

    /// The raw text, if any.
    pub fn value(&self) -> Option<&'de str> {
        self.value
    }

    /// Path of the value in the document.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Options in effect.
    pub fn options(&self) -> &'o DecodeOptions {
        self.options
    }

    /// Whether there is no text at all.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    fn require(&self) -> Result<&'de str> {
        self.value
            .ok_or_else(|| Error::value_not_found(&self.path, "found no value"))
    }

    /// Read `true` or `false`.
    pub fn decode_bool(&self) -> Result<bool> {
        let text = self.require()?;
        text.parse()
            .map_err(|_| Error::type_mismatch(&self.path, "bool", text))
    }

    /// Read the text as is.
    pub fn decode_str(&self) -> Result<&'de str> {
        match self.value {
            None if self.absent_as_empty => Ok(""),
            _ => self.require(),
        }
    }

    /// Read the text as an owned string.
    pub fn decode_string(&self) -> Result<String> {
        self.decode_str().map(str::to_string)
    }

    integer_decoders! {
        decode_i8 => i8,
        decode_i16 => i16,
        decode_i32 => i32,
        decode_i64 => i64,
        decode_u8 => u8,
        decode_u16 => u16,
        decode_u32 => u32,
        decode_u64 => u64,
    }

    /// Read a fixed-width integer.
    ///
    /// Text that is not a plain integer is given a second chance as a
    /// decimal, so `34.0` and `1e3` are accepted while `34.5` is not.
    fn decode_integer<T>(&self, expected: &str) -> Result<T>
    where
        T: FromStr + TryFrom<i128>,
    {
        let text = self.require()?;
        if text.is_empty() {
            return Err(Error::value_not_found(
                &self.path,
                format!("found empty text where {expected} was expected"),
            ));
        }

        if let Ok(n) = text.parse::<T>() {
            return Ok(n);
        }

        match parse_decimal(text) {
            Some(d) if d.fract().is_zero() => d
                .to_i128()
                .and_then(|n| T::try_from(n).ok())
                .ok_or_else(|| Error::type_mismatch(&self.path, expected, text)),
            Some(_) => Err(Error::type_mismatch(&self.path, expected, text)),
            None if text.parse::<f64>().is_ok_and(f64::is_finite) => Err(Error::data_corrupted(
                &self.path,
                format!("parsed number <{text}> does not fit in {expected}"),
            )),
            None => Err(Error::type_mismatch(&self.path, expected, text)),
        }
    }

    /// Read a finite `f32`.
    pub fn decode_f32(&self) -> Result<f32> {
        let text = self.require()?;
        text.parse::<f32>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| Error::type_mismatch(&self.path, "f32", text))
    }

    /// Read a finite `f64`.
    pub fn decode_f64(&self) -> Result<f64> {
        let text = self.require()?;
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| Error::type_mismatch(&self.path, "f64", text))
    }

    /// Read a timestamp using the configured [`DateStrategy`].
    pub fn decode_date(&self) -> Result<DateTime<Utc>> {
        match &self.options.date_strategy {
            DateStrategy::Default => {
                let text = self.require()?;
                text.parse::<DateTime<Utc>>()
                    .map_err(|_| Error::type_mismatch(&self.path, "date", text))
            }
            DateStrategy::SecondsSinceEpoch => self.date_since_epoch(self.decode_f64()?),
            DateStrategy::MillisecondsSinceEpoch => self.date_since_epoch(self.decode_f64()? / 1000.0),
            DateStrategy::Iso8601 => {
                let text = self.require()?;
                DateTime::parse_from_rfc3339(text)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|_| {
                        Error::data_corrupted(
                            &self.path,
                            "expected date string to be ISO8601-formatted",
                        )
                    })
            }
            DateStrategy::Rfc2822 => {
                let text = self.require()?;
                DateTime::parse_from_rfc2822(text)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|_| {
                        Error::data_corrupted(
                            &self.path,
                            "expected date string to be RFC 2822-formatted",
                        )
                    })
            }
            DateStrategy::Formatted(pattern) => {
                let text = self.require()?;
                parse_formatted(text, pattern).ok_or_else(|| {
                    Error::data_corrupted(
                        &self.path,
                        format!("date string does not match format `{pattern}`"),
                    )
                })
            }
            DateStrategy::Custom(f) => f(self),
        }
    }

    fn date_since_epoch(&self, seconds: f64) -> Result<DateTime<Utc>> {
        let mut whole = seconds.floor();
        let mut nanos = ((seconds - whole) * 1e9).round() as u32;
        if nanos >= 1_000_000_000 {
            whole += 1.0;
            nanos = 0;
        }
        let out_of_range = || {
            Error::data_corrupted(
                &self.path,
                format!("timestamp {seconds} is out of range"),
            )
        };
        if !(i64::MIN as f64..=i64::MAX as f64).contains(&whole) {
            return Err(out_of_range());
        }
        DateTime::from_timestamp(whole as i64, nanos).ok_or_else(out_of_range)
    }

    /// Read binary data using the configured [`DataStrategy`].
    ///
    /// The default strategy reads a sequence of elements, which a single
    /// text value cannot provide.
    pub fn decode_data(&self) -> Result<Vec<u8>> {
        match &self.options.data_strategy {
            DataStrategy::Base64 => {
                let text = self.require()?;
                let filtered: String = text
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
                    .collect();
                STANDARD
                    .decode(filtered)
                    .map_err(|_| Error::data_corrupted(&self.path, "could not decode base64 data"))
            }
            DataStrategy::Custom(f) => f(self),
            DataStrategy::Default => Err(Error::type_mismatch(
                &self.path,
                "a sequence of byte elements",
                self.value.unwrap_or_default(),
            )),
        }
    }

    /// Read a URL.
    pub fn decode_url(&self) -> Result<url::Url> {
        let text = self.require()?;
        url::Url::parse(text)
            .map_err(|err| Error::data_corrupted(&self.path, format!("could not decode URL: {err}")))
    }

    /// Read an arbitrary-precision decimal, in plain or scientific notation.
    pub fn decode_decimal(&self) -> Result<Decimal> {
        let text = self.require()?;
        parse_decimal(text).ok_or_else(|| {
            Error::data_corrupted(
                &self.path,
                format!("parsed number <{text}> does not fit in Decimal"),
            )
        })
    }

    /// Decode any deserializable type from this value.
    pub fn decode<T: de::Deserialize<'de>>(self) -> Result<T> {
        let path = self.path.clone();
        T::deserialize(self).map_err(|err| err.at(&path))
    }
}

pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn parse_formatted(text: &str, pattern: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_str(text, pattern) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(text, pattern) {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(text, pattern)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

pub(crate) fn canonical_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl<'de, 'o> ScalarAccess<'de, 'o> {
    fn special<V: Visitor<'de>>(self, name: &'static str, visitor: V) -> Result<V::Value> {
        trace!(name, path = ?self.path, "special scalar");
        let options = self.options;
        match name {
            DATE_TOKEN => {
                let date = self.decode_date()?;
                let text: de::value::StringDeserializer<Error> =
                    canonical_date(&date).into_deserializer();
                visitor.visit_newtype_struct(text)
            }
            DATA_TOKEN => match options.data_strategy {
                DataStrategy::Default => visitor.visit_newtype_struct(self),
                _ => visitor.visit_byte_buf(self.decode_data()?),
            },
            URL_TOKEN => {
                let url = self.decode_url()?;
                visitor.visit_str(url.as_str())
            }
            DECIMAL_TOKEN => {
                let decimal = self.decode_decimal()?;
                visitor.visit_string(decimal.to_string())
            }
            _ => visitor.visit_newtype_struct(self),
        }
    }
}

impl<'de, 'o> de::Deserializer<'de> for ScalarAccess<'de, 'o> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Some(text) => visitor.visit_borrowed_str(text),
            None => visitor.visit_unit(),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.decode_bool()?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.decode_i8()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.decode_i16()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.decode_i32()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.decode_i64()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.decode_u8()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.decode_u16()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.decode_u32()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.decode_u64()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(self.decode_f32()?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.decode_f64()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let text = self.require()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::type_mismatch(&self.path, "char", text)),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_str(self.decode_str()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_bytes(self.decode_str()?.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None | Some("") => visitor.visit_none(),
            Some(_) => visitor.visit_some(self),
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
        self.special(name, visitor)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::type_mismatch(
            &self.path,
            "a sequence",
            self.value.unwrap_or_default(),
        ))
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

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::type_mismatch(
            &self.path,
            "a map",
            self.value.unwrap_or_default(),
        ))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let text = self.require()?;
        visitor
            .visit_enum(de::value::BorrowedStrDeserializer::<Error>::new(text))
            .map_err(|err| err.at(&self.path))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}
