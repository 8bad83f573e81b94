use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use chop_core::{
    ChopConfig, ChopError, DatePattern, Operator, OutputIdentity, PartitionKey, Record, Sink,
};
use tracing::{debug, info, warn};

use crate::writer::CompressedCsvWriter;

/// Counters for one [`PartitionedSink`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    /// Rows written to an output stream
    pub written: u64,

    /// Rows dropped because field 0 did not match the date format
    pub skipped_dates: u64,

    /// Output streams opened; equals the number of partitions for key-sorted input
    pub streams_opened: u64,
}

enum SinkState {
    Idle,
    Active(CompressedCsvWriter),
}

/// Routes the records of one input file to per-date compressed CSV files.
///
/// Output lands at `{output_dir}/year=YYYY/month=M/day=D/{fingerprint}.csv.bz2`.
/// At most one stream is open at a time: consecutive rows with the same date reuse
/// it, and a date change closes it before the next one is opened. A date that
/// reappears after a different one reopens its file with truncation, so only the
/// last contiguous run of that date survives.
pub struct PartitionedSink {
    id: String,
    output_dir: PathBuf,
    identity: OutputIdentity,
    pattern: DatePattern,
    compression_level: u32,
    state: SinkState,
    stats: SinkStats,
}

impl PartitionedSink {
    pub fn new(identity: OutputIdentity, pattern: DatePattern, config: &ChopConfig) -> Self {
        Self {
            id: identity.to_string(),
            output_dir: config.output_dir.clone(),
            identity,
            pattern,
            compression_level: config.compression_level,
            state: SinkState::Idle,
            stats: SinkStats::default(),
        }
    }

    pub fn identity(&self) -> &OutputIdentity {
        &self.identity
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Path of the currently open stream, if any.
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            SinkState::Idle => None,
            SinkState::Active(writer) => Some(writer.path()),
        }
    }

    pub fn target_path(&self, key: &PartitionKey) -> PathBuf {
        self.output_dir
            .join(key.relative_dir())
            .join(self.identity.file_name())
    }

    fn open(&mut self, target: PathBuf) -> Result<CompressedCsvWriter, ChopError> {
        info!(sink = %self.id, path = %target.display(), "write to output");

        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).map_err(|source| ChopError::OutputCreate {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let writer = CompressedCsvWriter::create(target, self.compression_level)?;
        self.stats.streams_opened += 1;
        Ok(writer)
    }

    fn release(&self, state: SinkState) -> Result<(), ChopError> {
        match state {
            SinkState::Idle => Ok(()),
            SinkState::Active(writer) => {
                debug!(sink = %self.id, path = %writer.path().display(), "close output");
                writer.finish()
            }
        }
    }
}

impl Operator for PartitionedSink {
    fn name(&self) -> &str {
        &self.id
    }
}

impl Sink for PartitionedSink {
    fn write(&mut self, record: Record) -> Result<(), ChopError> {
        let key = match self.pattern.parse_key(record.date_field()) {
            Ok(key) => key,
            Err(err) => {
                warn!(
                    sink = %self.id,
                    line = record.line,
                    value = %err.value,
                    error = %err.reason,
                    "ignore row because invalid timestamp"
                );
                self.stats.skipped_dates += 1;
                return Ok(());
            }
        };

        let target = self.target_path(&key);
        let mut writer = match mem::replace(&mut self.state, SinkState::Idle) {
            SinkState::Active(writer) if writer.path() == target => writer,
            previous => {
                self.release(previous)?;
                self.open(target)?
            }
        };

        let written = writer.write_fields(&record.fields);
        self.state = SinkState::Active(writer);
        written?;

        self.stats.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChopError> {
        let state = mem::replace(&mut self.state, SinkState::Idle);
        self.release(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chop_core::TextEncoding;

    fn sink(output_dir: &Path) -> PartitionedSink {
        let config = ChopConfig {
            output_dir: output_dir.to_path_buf(),
            encoding: TextEncoding::Utf8,
            ..ChopConfig::default()
        };
        PartitionedSink::new(
            OutputIdentity::from_absolute(Path::new("/input/a.csv")),
            config.date_pattern().unwrap(),
            &config,
        )
    }

    fn row(line: u64, date: &str) -> Record {
        Record::new(line, vec![date.to_string(), format!("v{line}")])
    }

    #[test]
    fn close_when_idle_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path());
        sink.close().unwrap();
        sink.close().unwrap();
        assert_eq!(sink.current_path(), None);
        assert_eq!(sink.stats(), SinkStats::default());
    }

    #[test]
    fn same_date_reuses_the_open_stream() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path());

        sink.write(row(1, "20240305")).unwrap();
        let first = sink.current_path().map(Path::to_path_buf);
        sink.write(row(2, "20240305")).unwrap();
        sink.write(row(3, "20240305")).unwrap();

        assert_eq!(sink.current_path().map(Path::to_path_buf), first);
        assert_eq!(sink.stats().streams_opened, 1);
        assert_eq!(sink.stats().written, 3);

        sink.close().unwrap();
        assert_eq!(sink.current_path(), None);
    }

    #[test]
    fn date_change_switches_stream() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path());

        sink.write(row(1, "20240305")).unwrap();
        sink.write(row(2, "20240306")).unwrap();

        let expected = dir
            .path()
            .join("year=2024")
            .join("month=3")
            .join("day=6")
            .join(sink.identity().file_name());
        assert_eq!(sink.current_path(), Some(expected.as_path()));
        assert_eq!(sink.stats().streams_opened, 2);
        sink.close().unwrap();
    }

    #[test]
    fn bad_date_is_skipped_without_touching_the_stream() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink(dir.path());

        sink.write(row(1, "20240305")).unwrap();
        sink.write(row(2, "not-a-date")).unwrap();
        sink.write(row(3, "20240305")).unwrap();
        sink.close().unwrap();

        let stats = sink.stats();
        assert_eq!(stats.skipped_dates, 1);
        assert_eq!(stats.written, 2);
        assert_eq!(stats.streams_opened, 1);
    }

    #[test]
    fn unwritable_output_root_is_output_create_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let mut sink = sink(&blocker);
        let err = sink.write(row(1, "20240305")).unwrap_err();
        assert!(matches!(err, ChopError::OutputCreate { .. }));
        assert_eq!(sink.current_path(), None);
    }
}
