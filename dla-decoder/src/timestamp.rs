//! Fixed-point timestamp decoding
//!
//! Every log line carries a timestamp of the form `<seconds>.<fraction>` or
//! `<seconds>.<fraction>/<error>`, all three parts base-10. The fraction counts
//! 1/1024ths of a second.

use crate::types::{DecoderError, Result};
use std::fmt;

/// Denominator of the fraction and error fields
pub const TIMEBASE: u32 = 1024;

/// A decoded log timestamp (seconds since the logger started)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    seconds: u32,
    fraction: u32,
    error_fraction: Option<u32>,
}

impl Timestamp {
    /// Build a timestamp from already-decoded parts
    pub fn new(seconds: u32, fraction: u32, error_fraction: Option<u32>) -> Self {
        Self {
            seconds,
            fraction,
            error_fraction,
        }
    }

    /// Parse a timestamp token
    ///
    /// # Example
    /// ```
    /// use dla_decoder::Timestamp;
    ///
    /// let ts = Timestamp::parse("12.512/3").unwrap();
    /// assert_eq!(ts.value(), 12.5);
    /// assert_eq!(ts.error_fraction(), Some(3));
    /// ```
    pub fn parse(token: &str) -> Result<Self> {
        let (seconds, rest) = token.split_once('.').ok_or_else(|| {
            DecoderError::TimestampParse(format!("missing '.' in {:?}", token))
        })?;

        let (fraction, error_fraction) = match rest.split_once('/') {
            Some((fraction, error)) => (fraction, Some(error)),
            None => (rest, None),
        };

        Ok(Self {
            seconds: parse_decimal(seconds, token)?,
            fraction: parse_decimal(fraction, token)?,
            error_fraction: error_fraction
                .map(|e| parse_decimal(e, token))
                .transpose()?,
        })
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Numerator over [`TIMEBASE`]
    pub fn fraction(&self) -> u32 {
        self.fraction
    }

    /// Timestamp error in 1/1024ths of a second, if the logger reported one
    pub fn error_fraction(&self) -> Option<u32> {
        self.error_fraction
    }

    /// Seconds as a floating-point value; the error term is not included
    pub fn value(&self) -> f64 {
        self.seconds as f64 + self.fraction as f64 / TIMEBASE as f64
    }
}

/// Renders only the value. The error term is never printed, even when present.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value())
    }
}

fn parse_decimal(digits: &str, token: &str) -> Result<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecoderError::TimestampParse(format!(
            "{:?} is not a decimal number in {:?}",
            digits, token
        )));
    }
    digits.parse().map_err(|e| {
        DecoderError::TimestampParse(format!("{:?} in {:?}: {}", digits, token, e))
    })
}
