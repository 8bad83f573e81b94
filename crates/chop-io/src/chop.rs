use std::path::Path;

use chop_core::{pump, ChopConfig, ChopError, DatePattern, OutputIdentity};
use tracing::info;

use crate::sink_partitioned::PartitionedSink;
use crate::source_csv::CsvSource;

/// Summary of one chopped input file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChopStats {
    pub records: u64,
    pub written: u64,
    pub skipped_dates: u64,
    pub skipped_field_count: u64,
    pub streams_opened: u64,
}

/// Runs input files through a fresh source and sink each, sharing one
/// read-only configuration.
#[derive(Debug, Clone)]
pub struct Chopper {
    config: ChopConfig,
    pattern: DatePattern,
}

impl Chopper {
    pub fn new(config: ChopConfig) -> Result<Self, ChopError> {
        config.validate()?;
        let pattern = config.date_pattern()?;
        Ok(Self { config, pattern })
    }

    pub fn config(&self) -> &ChopConfig {
        &self.config
    }

    /// Partition one input file.
    ///
    /// Any error returned is fatal for the file; the open output stream has
    /// already been flushed and closed.
    pub fn chop_file(&self, input: impl AsRef<Path>) -> Result<ChopStats, ChopError> {
        let input = input.as_ref();
        let mut source = CsvSource::open(input, &self.config)?;
        let identity = OutputIdentity::for_input(input)?;
        let mut sink = PartitionedSink::new(identity, self.pattern.clone(), &self.config);

        let pumped = pump(&mut source, &mut sink)?;
        source.close();

        let sink_stats = sink.stats();
        let stats = ChopStats {
            records: pumped.records,
            written: sink_stats.written,
            skipped_dates: sink_stats.skipped_dates,
            skipped_field_count: pumped.skipped_field_count,
            streams_opened: sink_stats.streams_opened,
        };

        info!(
            path = %input.display(),
            fingerprint = %sink.identity(),
            records = stats.records,
            written = stats.written,
            skipped = stats.skipped_dates + stats.skipped_field_count,
            partitions_opened = stats.streams_opened,
            "finished input file"
        );
        Ok(stats)
    }
}
