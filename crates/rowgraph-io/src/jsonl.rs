//! Streaming NDJSON reader/writer for records.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rowgraph_core::{Error, Record, Result};

/// Lazy reader: one JSON object per line, blank lines skipped.
pub struct JsonlReader<R: BufRead> {
    reader: R,
    line: u64,
}

impl JsonlReader<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(f)))
    }
}

impl<R: BufRead> JsonlReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { reader, line: 0 }
    }

    fn decode(&self, line: &str) -> Result<Record> {
        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| Error::Decode(format!("line {}: {}", self.line, e)))?;
        Record::try_from(value).map_err(|e| Error::Decode(format!("line {}: {}", self.line, e)))
    }
}

impl<R: BufRead> Iterator for JsonlReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = String::new();
            match self.reader.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let line = buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(self.decode(line));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Buffered writer: one compact JSON object per line.
pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
}

impl JsonlWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let line = serde_json::to_string(&serde_json::Value::from(record))?;
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    pub fn write_all<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
