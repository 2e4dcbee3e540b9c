//! Decoding options.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::coerce::ScalarAccess;
use crate::error::Result;

/// Caller-supplied date conversion.
pub type DateFn = Arc<dyn Fn(&ScalarAccess<'_, '_>) -> Result<DateTime<Utc>> + Send + Sync>;

/// Caller-supplied binary data conversion.
pub type DataFn = Arc<dyn Fn(&ScalarAccess<'_, '_>) -> Result<Vec<u8>> + Send + Sync>;

/// How [`Date`](crate::Date) values are read from text.
#[derive(Clone, Default)]
pub enum DateStrategy {
    /// Let `chrono` read the text itself (RFC 3339).
    #[default]
    Default,
    /// Fractional seconds since the Unix epoch.
    SecondsSinceEpoch,
    /// Fractional milliseconds since the Unix epoch.
    MillisecondsSinceEpoch,
    /// ISO 8601 / RFC 3339 timestamps.
    Iso8601,
    /// RFC 2822 timestamps, as used by RSS.
    Rfc2822,
    /// A `chrono` format string. Patterns without an offset are read as UTC.
    Formatted(String),
    /// A caller-supplied conversion.
    Custom(DateFn),
}

impl DateStrategy {
    /// Wrap a closure as a custom strategy.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ScalarAccess<'_, '_>) -> Result<DateTime<Utc>> + Send + Sync + 'static,
    {
        DateStrategy::Custom(Arc::new(f))
    }
}

impl fmt::Debug for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateStrategy::Default => f.write_str("Default"),
            DateStrategy::SecondsSinceEpoch => f.write_str("SecondsSinceEpoch"),
            DateStrategy::MillisecondsSinceEpoch => f.write_str("MillisecondsSinceEpoch"),
            DateStrategy::Iso8601 => f.write_str("Iso8601"),
            DateStrategy::Rfc2822 => f.write_str("Rfc2822"),
            DateStrategy::Formatted(pattern) => f.debug_tuple("Formatted").field(pattern).finish(),
            DateStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How [`Data`](crate::Data) values are read.
#[derive(Clone, Default)]
pub enum DataStrategy {
    /// A sequence of elements each holding one byte value.
    #[default]
    Default,
    /// Base64 text. Characters outside the alphabet are ignored.
    Base64,
    /// A caller-supplied conversion.
    Custom(DataFn),
}

impl DataStrategy {
    /// Wrap a closure as a custom strategy.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ScalarAccess<'_, '_>) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        DataStrategy::Custom(Arc::new(f))
    }
}

impl fmt::Debug for DataStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataStrategy::Default => f.write_str("Default"),
            DataStrategy::Base64 => f.write_str("Base64"),
            DataStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options for decoding.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Date conversion (default: [`DateStrategy::Default`])
    pub date_strategy: DateStrategy,

    /// Binary data conversion (default: [`DataStrategy::Default`])
    pub data_strategy: DataStrategy,
}

impl DecodeOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date strategy.
    pub fn date_strategy(mut self, strategy: DateStrategy) -> Self {
        self.date_strategy = strategy;
        self
    }

    /// Set the binary data strategy.
    pub fn data_strategy(mut self, strategy: DataStrategy) -> Self {
        self.data_strategy = strategy;
        self
    }
}
