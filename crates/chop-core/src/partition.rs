//! Partition key derivation
//!
//! Generates Hive-style partition directories from the date in a record's first field:
//! `year={YYYY}/month={M}/day={D}`, with month and day left unpadded.

use std::fmt;
use std::iter;
use std::path::PathBuf;

use chrono::format::{parse, parse_and_remainder, Item, Numeric, Pad, Parsed, StrftimeItems};
use chrono::{Datelike, NaiveDate};

use crate::{layout, ChopError};

/// Calendar date a record is partitioned by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(NaiveDate);

impl PartitionKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Partition directory relative to the output root.
    ///
    /// The year is zero-padded to four digits; month and day are not padded.
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(format!("year={:04}", self.0.year()))
            .join(format!("month={}", self.0.month()))
            .join(format!("day={}", self.0.day()))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "year={:04}/month={}/day={}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

/// A row whose date field does not match the configured format
#[derive(Debug, thiserror::Error)]
#[error("invalid timestamp {value:?} for format {format:?}: {reason}")]
pub struct DateParseError {
    pub value: String,
    pub format: String,
    #[source]
    pub reason: DateParseReason,
}

/// Why a date field was rejected
#[derive(Debug, thiserror::Error)]
pub enum DateParseReason {
    #[error(transparent)]
    Format(#[from] chrono::ParseError),

    /// A zero-padded layout element was shorter or longer than its width
    #[error("expected {width} digits, found {found:?}")]
    Width { width: usize, found: String },
}

/// Compiled date format of the first column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    format: String,
    strftime: String,
    fixed_width: bool,
}

impl DatePattern {
    /// Compile `format`, translating a Go reference layout when it contains no `%`.
    pub fn new(format: &str) -> Result<Self, ChopError> {
        if format.is_empty() {
            return Err(ChopError::Config("date_format must not be empty".into()));
        }

        let fixed_width = !format.contains('%');
        let strftime = if fixed_width {
            layout::to_strftime(format)
        } else {
            format.to_string()
        };

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(ChopError::Config(format!(
                "unsupported date_format {format:?}"
            )));
        }

        Ok(Self {
            format: format.to_string(),
            strftime,
            fixed_width,
        })
    }

    /// The format as configured.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The strftime pattern actually used for parsing.
    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    /// Parse `value` and truncate it to its calendar date.
    ///
    /// Time-of-day and offset fields in the pattern are parsed but do not affect the key.
    /// For Go layouts, zero-padded elements such as `01` must match their full width.
    pub fn parse_key(&self, value: &str) -> Result<PartitionKey, DateParseError> {
        let fail = |reason: DateParseReason| DateParseError {
            value: value.to_string(),
            format: self.format.clone(),
            reason,
        };

        let mut parsed = Parsed::new();
        if self.fixed_width {
            let mut rest = value;
            for item in StrftimeItems::new(&self.strftime) {
                let tail = parse_and_remainder(&mut parsed, rest, iter::once(&item))
                    .map_err(|err| fail(err.into()))?;
                if let Item::Numeric(numeric, Pad::Zero) = &item {
                    if let Some(width) = padded_width(numeric) {
                        let consumed = &rest[..rest.len() - tail.len()];
                        if consumed.len() != width || !consumed.bytes().all(|b| b.is_ascii_digit()) {
                            return Err(fail(DateParseReason::Width {
                                width,
                                found: consumed.to_string(),
                            }));
                        }
                    }
                }
                rest = tail;
            }
            parse(&mut parsed, rest, iter::empty::<Item<'_>>()).map_err(|err| fail(err.into()))?;
        } else {
            parse(&mut parsed, value, StrftimeItems::new(&self.strftime))
                .map_err(|err| fail(err.into()))?;
        }

        parsed
            .to_naive_date()
            .map(PartitionKey::new)
            .map_err(|err| fail(err.into()))
    }
}

/// Digits a zero-padded numeric element must span.
fn padded_width(numeric: &Numeric) -> Option<usize> {
    match numeric {
        Numeric::Year => Some(4),
        Numeric::Ordinal => Some(3),
        Numeric::YearMod100
        | Numeric::Month
        | Numeric::Day
        | Numeric::Hour
        | Numeric::Hour12
        | Numeric::Minute
        | Numeric::Second => Some(2),
        _ => None,
    }
}
