//! Value types with their own text conventions.
//!
//! Each wrapper asks the deserializer for a newtype struct under a private
//! name. The feed decoder recognizes those names and applies the matching
//! [`DecodeOptions`](crate::DecodeOptions) strategy; any other deserializer
//! sees an ordinary newtype and decodes the inner value as usual.

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserialize, Deserializer, Visitor};

use crate::coerce::parse_decimal;

pub(crate) const DATE_TOKEN: &str = "$feedxml::private::Date";
pub(crate) const DATA_TOKEN: &str = "$feedxml::private::Data";
pub(crate) const URL_TOKEN: &str = "$feedxml::private::Url";
pub(crate) const DECIMAL_TOKEN: &str = "$feedxml::private::Decimal";

/// A timestamp read with the configured [`DateStrategy`](crate::DateStrategy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(pub DateTime<Utc>);

/// Binary data read with the configured [`DataStrategy`](crate::DataStrategy).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Data(pub Vec<u8>);

/// An absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Url(pub url::Url);

/// An arbitrary-precision decimal, written in plain or scientific notation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(pub rust_decimal::Decimal);

macro_rules! wrapper_impls {
    ($($wrapper:ident($inner:ty)),* $(,)?) => {
        $(
            impl Deref for $wrapper {
                type Target = $inner;

                fn deref(&self) -> &$inner {
                    &self.0
                }
            }

            impl From<$inner> for $wrapper {
                fn from(inner: $inner) -> Self {
                    Self(inner)
                }
            }

            impl From<$wrapper> for $inner {
                fn from(wrapper: $wrapper) -> Self {
                    wrapper.0
                }
            }
        )*
    };
}

wrapper_impls! {
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    Url(url::Url),
    Decimal(rust_decimal::Decimal),
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::coerce::canonical_date(&self.0))
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(DATE_TOKEN, DateVisitor)
    }
}

struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
    type Value = Date;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a timestamp")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<Date, D::Error> {
        DateTime::<Utc>::deserialize(d).map(Date)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Date, E> {
        v.parse().map(Date).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(DATA_TOKEN, DataVisitor)
    }
}

struct DataVisitor;

impl<'de> Visitor<'de> for DataVisitor {
    type Value = Data;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("binary data")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<Data, D::Error> {
        Vec::<u8>::deserialize(d).map(Data)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Data, E> {
        Ok(Data(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Data, E> {
        Ok(Data(v))
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Data, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Ok(Data(bytes))
    }
}

impl<'de> Deserialize<'de> for Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(URL_TOKEN, UrlVisitor)
    }
}

struct UrlVisitor;

impl<'de> Visitor<'de> for UrlVisitor {
    type Value = Url;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an absolute URL")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<Url, D::Error> {
        let text = String::deserialize(d)?;
        self.visit_str(&text)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Url, E> {
        url::Url::parse(v)
            .map(Url)
            .map_err(|err| E::custom(format!("could not decode URL: {err}")))
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(DECIMAL_TOKEN, DecimalVisitor)
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<Decimal, D::Error> {
        d.deserialize_any(self)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        rust_decimal::Decimal::try_from(v)
            .map(Decimal)
            .map_err(|_| E::custom(format!("{v} does not fit in Decimal")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        parse_decimal(v)
            .map(Decimal)
            .ok_or_else(|| E::custom(format!("parsed number <{v}> does not fit in Decimal")))
    }
}
