//! FASTQ reading and writing, with gzip support and name canonicalization.

use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use needletail::{parse_fastx_file, FastxReader};
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::{Error, Result};

/// A single FASTQ record: name, sequence, and Phred+33 quality string.
#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub name: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl FastqRecord {
    pub fn new(name: String, seq: Vec<u8>, qual: Vec<u8>) -> Self {
        Self { name, seq, qual }
    }

    /// Extract the `[start, end)` subsequence, or `None` if out of bounds.
    pub fn subseq(&self, start: usize, end: usize) -> Option<&[u8]> {
        self.seq.get(start..end)
    }

    /// Extract the `[start, end)` quality substring, or `None` if out of
    /// bounds.
    pub fn subqual(&self, start: usize, end: usize) -> Option<&[u8]> {
        self.qual.get(start..end)
    }
}

/// Strip a trailing `/1` or `/2` mate suffix and any whitespace-delimited
/// comment from a raw read name, per spec §3.
pub fn canonicalize_name(raw: &str) -> String {
    let no_comment = raw.split_whitespace().next().unwrap_or("");
    match no_comment.rsplit_once('/') {
        Some((base, "1" | "2")) => base.to_string(),
        _ => no_comment.to_string(),
    }
}

/// A streaming FASTQ reader over plain or gzip-compressed input.
pub struct FastqReader {
    inner: Box<dyn FastxReader>,
}

impl FastqReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = parse_fastx_file(path.as_ref())
            .map_err(|e| Error::FastqParse(format!("failed to open FASTQ {:?}: {e}", path.as_ref())))?;
        Ok(Self { inner })
    }
}

impl Iterator for FastqReader {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|result| {
            result
                .map(|record| {
                    let name = canonicalize_name(&String::from_utf8_lossy(record.id()));
                    FastqRecord::new(
                        name,
                        record.seq().to_vec(),
                        record.qual().map(|q| q.to_vec()).unwrap_or_default(),
                    )
                })
                .map_err(|e| Error::FastqParse(format!("failed to read FASTQ record: {e}")))
        })
    }
}

/// Open a FASTQ file for reading, creating an empty placeholder first if
/// it does not exist (spec §7: "missing pre-clipped file... treat as
/// empty; the system creates an empty placeholder").
pub fn open_or_create_empty<P: AsRef<Path>>(path: P) -> Result<FastqReader> {
    let path = path.as_ref();
    if !path.exists() {
        let file = File::create(path)?;
        // An empty gzip member is itself a valid (empty) gzip stream.
        let encoder = GzEncoder::new(file, Compression::default());
        encoder.finish()?;
    }
    FastqReader::open(path)
}

/// A FASTQ writer, gzip-compressing when the path ends in `.gz`.
pub struct FastqWriter {
    inner: Box<dyn Write>,
}

impl FastqWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let inner: Box<dyn Write> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
        } else {
            Box::new(BufWriter::new(file))
        };
        Ok(Self { inner })
    }

    pub fn write_record(&mut self, record: &FastqRecord) -> Result<()> {
        writeln!(self.inner, "@{}", record.name)?;
        self.inner.write_all(&record.seq)?;
        writeln!(self.inner)?;
        writeln!(self.inner, "+")?;
        self.inner.write_all(&record.qual)?;
        writeln!(self.inner)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(Error::from)
    }
}

impl Drop for FastqWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn canonicalizes_mate_suffix_and_comment() {
        assert_eq!(canonicalize_name("read17/1"), "read17");
        assert_eq!(canonicalize_name("read17/2"), "read17");
        assert_eq!(canonicalize_name("read17 comment here"), "read17");
        assert_eq!(canonicalize_name("read17"), "read17");
    }

    #[test]
    fn write_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.fq");

        let record = FastqRecord::new("r1".to_string(), b"ACGT".to_vec(), b"IIII".to_vec());
        {
            let mut writer = FastqWriter::create(&path).unwrap();
            writer.write_record(&record).unwrap();
        }

        let reader = FastqReader::open(&path).unwrap();
        let records: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "r1");
        assert_eq!(records[0].seq, b"ACGT");
    }

    #[test]
    fn missing_preclipped_creates_empty_placeholder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.fq.gz");
        assert!(!path.exists());

        let reader = open_or_create_empty(&path).unwrap();
        let records: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();
        assert!(records.is_empty());
        assert!(path.exists());
    }
}
