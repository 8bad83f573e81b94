//! # chop-io - Source and Sink Implementations
//!
//! Concrete I/O for the chop-csv partitioner.
//!
//! ### Data Sources
//! - **CSV**: streaming row reader with optional Shift_JIS decoding
//!
//! ### Data Sinks
//! - **Partitioned**: routes rows to `year=/month=/day=` bzip2 CSV files, keeping
//!   at most one output stream open at a time
//!
//! ## Example Usage
//!
//! ```no_run
//! use chop_core::{ChopConfig, TextEncoding};
//! use chop_io::Chopper;
//!
//! let config = ChopConfig {
//!     encoding: TextEncoding::Utf8,
//!     ..ChopConfig::default()
//! };
//! let chopper = Chopper::new(config)?;
//! let stats = chopper.chop_file("data/2024.csv")?;
//! println!("{} rows written", stats.written);
//! # Ok::<(), chop_core::ChopError>(())
//! ```

/// Per-file driver wiring a source to a sink
pub mod chop;

/// Date-partitioned compressed sink
pub mod sink_partitioned;

/// CSV file source
pub mod source_csv;

/// bzip2-compressed CSV output stream
pub mod writer;

pub use chop::{ChopStats, Chopper};
pub use sink_partitioned::{PartitionedSink, SinkStats};
pub use source_csv::CsvSource;
pub use writer::CompressedCsvWriter;
