use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use bzip2::Compression;
use chop_core::ChopError;
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// A bzip2-compressed CSV file bound to one output path.
///
/// Rows are quoted only when needed and terminated with `\n`. The file is
/// created or truncated on open; [`CompressedCsvWriter::finish`] must be called
/// to write the bzip2 trailer.
pub struct CompressedCsvWriter {
    path: PathBuf,
    inner: csv::Writer<BzEncoder<BufWriter<File>>>,
}

impl CompressedCsvWriter {
    pub fn create(path: PathBuf, level: u32) -> Result<Self, ChopError> {
        let file = File::create(&path).map_err(|source| ChopError::OutputCreate {
            path: path.clone(),
            source,
        })?;
        let encoder = BzEncoder::new(BufWriter::new(file), Compression::new(level));
        let inner = WriterBuilder::new()
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(encoder);

        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_fields<I, T>(&mut self, fields: I) -> Result<(), ChopError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.inner
            .write_record(fields)
            .map_err(|err| write_error(&self.path, err))
    }

    /// Flush buffered rows, finish the compressed stream and close the file.
    pub fn finish(mut self) -> Result<(), ChopError> {
        self.inner
            .flush()
            .map_err(|err| write_error(&self.path, err))?;

        let Self { path, inner } = self;
        let encoder = inner.into_inner().map_err(|err| {
            let cause = err.error();
            write_error(&path, io::Error::new(cause.kind(), cause.to_string()))
        })?;
        let mut file = encoder.finish().map_err(|err| write_error(&path, err))?;
        file.flush().map_err(|err| write_error(&path, err))
    }
}

fn write_error<E>(path: &Path, err: E) -> ChopError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ChopError::OutputWrite {
        path: path.to_path_buf(),
        source: Box::new(err),
    }
}
