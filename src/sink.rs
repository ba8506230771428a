use crate::error::{Result, SiftError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes extracted values as newline-separated plain text.
///
/// Values are separated by a single `\n`; no newline follows the last one.
pub struct LineSink<W: Write> {
    writer: W,
    target: String,
}

impl LineSink<BufWriter<File>> {
    /// Create (or truncate) a file to write into
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let target = path.display().to_string();
        let file = File::create(path).map_err(|source| SiftError::SinkWrite {
            target: target.clone(),
            source,
        })?;

        Ok(LineSink {
            writer: BufWriter::new(file),
            target,
        })
    }
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W, target: impl Into<String>) -> Self {
        LineSink {
            writer,
            target: target.into(),
        }
    }

    /// Write all values and flush
    pub fn write_lines(&mut self, values: &[String]) -> Result<()> {
        self.write_all(values).map_err(|source| SiftError::SinkWrite {
            target: self.target.clone(),
            source,
        })
    }

    fn write_all(&mut self, values: &[String]) -> std::io::Result<()> {
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                self.writer.write_all(b"\n")?;
            }
            self.writer.write_all(value.as_bytes())?;
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
