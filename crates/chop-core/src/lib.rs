//! # chop-core - Core types for the chop-csv partitioner
//!
//! This crate provides the foundational types, traits, and configuration used to
//! split delimited text files into date-partitioned output streams. It defines the
//! record messages flowing from a source to a sink, the operator interfaces, the
//! error taxonomy, and the partition key / fingerprint rules shared by every sink.
//!
//! ## Key Components
//!
//! - **Message System**: [`Record`] and [`Message`] passed from a [`Source`] to a [`Sink`]
//! - **Operator Traits**: synchronous `Source` and `Sink` abstractions plus the [`pump`] driver
//! - **Configuration**: [`ChopConfig`], loadable from YAML and overridable from the CLI
//! - **Partitioning**: [`DatePattern`] and [`PartitionKey`] (`year=YYYY/month=M/day=D`)
//! - **Fingerprinting**: [`OutputIdentity`], the stable output file name of an input file
//! - **Error Handling**: [`ChopError`] covering every fatal and recoverable condition
//!
//! ## Example Usage
//!
//! ```rust
//! use chop_core::{ChopConfig, DatePattern};
//!
//! let config = ChopConfig::default();
//! let pattern = DatePattern::new(&config.date_format).unwrap();
//! let key = pattern.parse_key("20240305").unwrap();
//! assert_eq!(key.to_string(), "year=2024/month=3/day=5");
//! ```

use std::path::PathBuf;

use tracing::{debug, error, warn};

pub mod config;
pub mod fingerprint;
pub mod layout;
pub mod partition;

pub use config::{ChopConfig, TextEncoding};
pub use fingerprint::{OutputIdentity, OUTPUT_SUFFIX};
pub use partition::{DateParseError, DateParseReason, DatePattern, PartitionKey};

/// Boxed error used to carry reader and writer failures from the I/O crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One structural row of delimited text.
///
/// Field 0 holds the date string the row is partitioned by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line on which the row starts in its input file
    pub line: u64,

    /// Decoded field values in input order
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// The raw partition field, or an empty string for a field-less row.
    pub fn date_field(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }
}

/// Messages passed from a source to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A decoded row
    Record(Record),

    /// End-of-stream marker
    ///
    /// Signals that the input is exhausted and the sink may release its output.
    Eos,
}

/// Error types for chop operations
///
/// Everything except [`ChopError::FieldCount`] is fatal for the input file being
/// processed. Per-row date failures use [`DateParseError`] and never leave the sink.
#[derive(Debug, thiserror::Error)]
pub enum ChopError {
    /// An input file could not be opened or resolved
    #[error("failed to open input {}: {source}", .path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The decoded input does not parse as delimited rows
    #[error("malformed csv in {}: {source}", .path.display())]
    StructuralRead {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// A row with fewer fields than the first row; the row is skipped
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount { line: u64, expected: u64, found: u64 },

    /// An output directory or file could not be created
    #[error("failed to create output {}: {source}", .path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or finishing a compressed output stream failed
    #[error("failed to write output {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Invalid or unreadable configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ChopError {
    /// Whether processing of the current input may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ChopError::FieldCount { .. })
    }
}

/// Base trait for sources and sinks
pub trait Operator {
    /// Returns the identifier of this operator, used in log events.
    fn name(&self) -> &str;
}

/// Trait for record sources
///
/// A source yields a lazy, finite, non-restartable sequence of messages,
/// terminated by [`Message::Eos`].
pub trait Source: Operator {
    /// Read the next message.
    ///
    /// Recoverable per-row problems are reported as errors for which
    /// [`ChopError::is_recoverable`] holds; the caller may keep reading after them.
    fn read_message(&mut self) -> Result<Message, ChopError>;
}

/// Trait for record sinks
pub trait Sink: Operator {
    /// Route one record to its output.
    fn write(&mut self, record: Record) -> Result<(), ChopError>;

    /// Flush and release any open output. Closing an idle sink is a no-op.
    fn close(&mut self) -> Result<(), ChopError>;

    /// Dispatch a message to [`Sink::write`] or [`Sink::close`].
    fn consume(&mut self, message: Message) -> Result<(), ChopError> {
        match message {
            Message::Record(record) => self.write(record),
            Message::Eos => self.close(),
        }
    }
}

/// Counters collected by [`pump`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpStats {
    /// Records handed to the sink
    pub records: u64,

    /// Rows dropped because they had fewer fields than the first row
    pub skipped_field_count: u64,
}

/// Drive every message from `source` into `sink` until end of stream.
///
/// On a fatal read or write error the sink is closed before the error is
/// returned, so buffered output is flushed rather than lost.
pub fn pump<S, K>(source: &mut S, sink: &mut K) -> Result<PumpStats, ChopError>
where
    S: Source + ?Sized,
    K: Sink + ?Sized,
{
    let mut stats = PumpStats::default();

    loop {
        let message = match source.read_message() {
            Ok(message) => message,
            Err(ChopError::FieldCount {
                line,
                expected,
                found,
            }) => {
                warn!(
                    source = source.name(),
                    line, expected, found, "ignore row because it has too few fields"
                );
                stats.skipped_field_count += 1;
                continue;
            }
            Err(err) => {
                abort_sink(sink);
                return Err(err);
            }
        };

        let end = matches!(message, Message::Eos);
        if !end {
            stats.records += 1;
        }

        if let Err(err) = sink.consume(message) {
            if !end {
                abort_sink(sink);
            }
            return Err(err);
        }

        if end {
            debug!(source = source.name(), records = stats.records, "source finished");
            return Ok(stats);
        }
    }
}

fn abort_sink<K: Sink + ?Sized>(sink: &mut K) {
    if let Err(err) = sink.close() {
        error!(sink = sink.name(), error = %err, "failed to close sink after error");
    }
}
