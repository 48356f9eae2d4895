//! Analysis time windows.
//!
//! Timestamps are Unix milliseconds. A [`TimeRange`] is inclusive on both
//! ends and defaults to the widest representable range.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use time::macros::format_description;

use crate::error::{ConfigError, Result};

/// Inclusive time range `[from, to]` in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// First millisecond covered.
    pub from: i64,
    /// Last millisecond covered.
    pub to: i64,
}

impl TimeRange {
    /// Creates a range, rejecting one that ends before it starts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWindow`] if `from > to`.
    pub fn new(from: i64, to: i64) -> Result<Self> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    /// The widest representable range.
    pub const fn full() -> Self {
        Self {
            from: i64::MIN,
            to: i64::MAX,
        }
    }

    /// Checks that the range does not end before it starts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWindow`] if `from > to`.
    pub fn validate(&self) -> Result<()> {
        if self.from > self.to {
            return Err(ConfigError::InvalidWindow {
                from: self.from,
                to: self.to,
            }
            .into());
        }
        Ok(())
    }

    /// Whether `[start, end]` shares at least one millisecond with this range.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        start <= self.to && end >= self.from
    }

    /// Whether this range is [`TimeRange::full`].
    pub fn is_full(&self) -> bool {
        *self == Self::full()
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_bound(f, self.from, "earliest")?;
        f.write_str("..")?;
        write_bound(f, self.to, "latest")
    }
}

fn write_bound(f: &mut fmt::Formatter<'_>, ms: i64, unbounded: &str) -> fmt::Result {
    if ms == i64::MIN || ms == i64::MAX {
        f.write_str(unbounded)
    } else {
        write!(f, "{ms}")
    }
}

/// Parses `YYYY-MM-DD HH:MM:SS` (UTC) into Unix milliseconds.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTimestamp`] when the text does not match
/// the format or names an impossible date.
///
/// # Examples
///
/// ```rust
/// use shardstat::window::parse_timestamp;
///
/// assert_eq!(parse_timestamp("1970-01-01 00:00:01").unwrap(), 1_000);
/// assert!(parse_timestamp("yesterday").is_err());
/// ```
pub fn parse_timestamp(input: &str) -> Result<i64> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let parsed = PrimitiveDateTime::parse(input.trim(), format).map_err(|source| {
        ConfigError::InvalidTimestamp {
            input: input.to_string(),
            source,
        }
    })?;

    Ok(parsed.assume_utc().unix_timestamp() * 1_000)
}
