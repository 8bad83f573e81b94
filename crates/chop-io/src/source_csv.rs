use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chop_core::{ChopConfig, ChopError, Message, Operator, Record, Source, TextEncoding};
use csv::{ErrorKind, ReaderBuilder, StringRecord};
use encoding_rs::SHIFT_JIS;
use encoding_rs_io::DecodeReaderBytesBuilder;
use tracing::{debug, info};

/// Streaming CSV reader producing one [`Record`] per row.
///
/// Rows are read on demand; the file handle stays open until the source is
/// closed or dropped.
pub struct CsvSource {
    id: String,
    path: PathBuf,
    reader: csv::Reader<Box<dyn Read>>,
    row: StringRecord,
}

impl CsvSource {
    pub fn open(path: impl AsRef<Path>, config: &ChopConfig) -> Result<Self, ChopError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| ChopError::InputOpen {
            path: path.clone(),
            source,
        })?;

        info!(
            path = %path.display(),
            encoding = config.encoding.label(),
            "open input file"
        );
        Ok(Self::from_reader(path, file, config))
    }

    /// Build a source over any byte stream; `path` is only used in diagnostics.
    pub fn from_reader<R: Read + 'static>(path: PathBuf, input: R, config: &ChopConfig) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(config.has_header)
            .flexible(false)
            .from_reader(decode(input, config.encoding));

        Self {
            id: path.display().to_string(),
            path,
            reader,
            row: StringRecord::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the underlying file.
    pub fn close(self) {
        debug!(path = %self.path.display(), "close input file");
    }

    /// Short rows are recoverable; every other reader error, longer rows included, is fatal.
    fn classify(&self, err: csv::Error) -> ChopError {
        let short_row = match err.kind() {
            ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } if len < expected_len => Some((
                pos.as_ref().map(|p| p.line()).unwrap_or(0),
                *expected_len,
                *len,
            )),
            _ => None,
        };

        match short_row {
            Some((line, expected, found)) => ChopError::FieldCount {
                line,
                expected,
                found,
            },
            None => ChopError::StructuralRead {
                path: self.path.clone(),
                source: Box::new(err),
            },
        }
    }
}

fn decode<R: Read + 'static>(input: R, encoding: TextEncoding) -> Box<dyn Read> {
    match encoding {
        TextEncoding::Utf8 => Box::new(input),
        TextEncoding::ShiftJis => Box::new(
            DecodeReaderBytesBuilder::new()
                .encoding(Some(SHIFT_JIS))
                .bom_sniffing(false)
                .build(input),
        ),
    }
}

impl Operator for CsvSource {
    fn name(&self) -> &str {
        &self.id
    }
}

impl Source for CsvSource {
    fn read_message(&mut self) -> Result<Message, ChopError> {
        match self.reader.read_record(&mut self.row) {
            Ok(false) => Ok(Message::Eos),
            Ok(true) => {
                let line = self.row.position().map(|p| p.line()).unwrap_or(0);
                let fields = self.row.iter().map(str::to_owned).collect();
                Ok(Message::Record(Record::new(line, fields)))
            }
            Err(err) => Err(self.classify(err)),
        }
    }
}
