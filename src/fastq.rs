use needletail::*;

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::errors::*;
use crate::read::*;

/// Bundles of reads from a FASTA or FASTQ source, shared between workers.
pub struct FastxReads<'reader> {
    reader: Mutex<Box<dyn FastxReader + 'reader>>,
    file: String,
    idx: AtomicUsize,
    chunk_size: usize,
}

impl<'reader> FastxReads<'reader> {
    /// Next bundle of at most `chunk_size` reads. Empty once the input is exhausted.
    pub fn next_chunk(&self) -> Result<Vec<Read>> {
        let mut res = Vec::with_capacity(self.chunk_size);
        let mut reader = self.reader.lock().unwrap();

        for _ in 0..self.chunk_size {
            let Some(record) = reader.next() else {
                break;
            };
            let record = record.map_err(|e| Error::ParseRecord {
                file: self.file.clone(),
                source: Box::new(e),
            })?;
            self.idx.fetch_add(1, Ordering::Relaxed);

            res.push(match record.qual() {
                Some(qual) => Read::from_fastq(record.id(), &record.seq(), qual),
                None => Read::from_fasta(record.id(), &record.seq()),
            });
        }

        Ok(res)
    }

    /// Number of records read so far.
    pub fn records_read(&self) -> usize {
        self.idx.load(Ordering::Relaxed)
    }

    pub fn read_all(&self) -> Result<Vec<Read>> {
        let mut res = Vec::new();

        loop {
            let reads = self.next_chunk()?;

            if reads.is_empty() {
                break;
            }

            res.extend(reads);
        }

        Ok(res)
    }
}

/// Gzip compressed inputs are detected by needletail.
pub fn iter_fastx(file: impl AsRef<str>, chunk_size: usize) -> Result<FastxReads<'static>> {
    let reader = parse_fastx_file(file.as_ref()).map_err(|e| Error::FileIo {
        file: file.as_ref().to_owned(),
        source: Box::new(e),
    })?;

    Ok(FastxReads {
        reader: Mutex::new(reader),
        file: file.as_ref().to_owned(),
        idx: AtomicUsize::new(0),
        chunk_size,
    })
}

pub fn iter_fastx_bytes(bytes: &[u8], chunk_size: usize) -> Result<FastxReads<'_>> {
    let reader = parse_fastx_reader(bytes).map_err(|e| Error::ParseRecord {
        file: "bytes".to_owned(),
        source: Box::new(e),
    })?;

    Ok(FastxReads {
        reader: Mutex::new(reader),
        file: "bytes".to_owned(),
        idx: AtomicUsize::new(0),
        chunk_size,
    })
}

pub fn write_fasta_record(writer: &mut (dyn Write + Send), read: &Read) -> io::Result<()> {
    writer.write_all(b">")?;
    writer.write_all(read.name())?;
    writer.write_all(b"\n")?;
    writer.write_all(read.seq())?;
    writer.write_all(b"\n")
}

/// Reads without quality scores are written as FASTA.
pub fn write_fastq_record(writer: &mut (dyn Write + Send), read: &Read) -> io::Result<()> {
    let Some(qual) = read.qual() else {
        return write_fasta_record(writer, read);
    };

    writer.write_all(b"@")?;
    writer.write_all(read.name())?;
    writer.write_all(b"\n")?;
    writer.write_all(read.seq())?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(qual)?;
    writer.write_all(b"\n")
}
