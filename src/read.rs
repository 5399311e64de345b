use std::fmt;

use crate::errors::utf8;

/// A single sequencing read.
///
/// Trimming always keeps the quality string (if any) in lockstep with the sequence
/// when `with_qual` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    name: Vec<u8>,
    seq: Vec<u8>,
    qual: Option<Vec<u8>>,
}

impl Read {
    pub fn from_fasta(name: &[u8], seq: &[u8]) -> Self {
        Self {
            name: name.to_owned(),
            seq: seq.to_owned(),
            qual: None,
        }
    }

    pub fn from_fastq(name: &[u8], seq: &[u8], qual: &[u8]) -> Self {
        assert_eq!(
            seq.len(),
            qual.len(),
            "Sequence and quality lengths differ for read {}",
            utf8(name)
        );

        Self {
            name: name.to_owned(),
            seq: seq.to_owned(),
            qual: Some(qual.to_owned()),
        }
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn qual(&self) -> Option<&[u8]> {
        self.qual.as_deref()
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn append_to_name(&mut self, tag: &[u8]) {
        self.name.extend_from_slice(tag);
    }

    /// Remove the first `len` bases, keeping the suffix.
    pub fn trim_prefix(&mut self, len: usize, with_qual: bool) {
        let len = len.min(self.seq.len());
        self.seq.drain(..len);

        if with_qual {
            if let Some(qual) = &mut self.qual {
                qual.drain(..len.min(qual.len()));
            }
        }
    }

    /// Remove everything from `pos` to the end, keeping the prefix.
    pub fn truncate(&mut self, pos: usize, with_qual: bool) {
        self.seq.truncate(pos);

        if with_qual {
            if let Some(qual) = &mut self.qual {
                qual.truncate(pos);
            }
        }
    }

    pub fn clear(&mut self, with_qual: bool) {
        self.truncate(0, with_qual);
    }
}

/// Two mates plus an optional separate barcode read.
///
/// `bar_id` and `bar_id2` hold the 1-based index of the assigned barcode, or 0 if
/// none was assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedRead {
    pub r1: Read,
    pub r2: Option<Read>,
    pub barcode: Option<Read>,
    pub bar_id: usize,
    pub bar_id2: usize,
}

impl PairedRead {
    pub fn new(r1: Read, r2: Option<Read>, barcode: Option<Read>) -> Self {
        Self {
            r1,
            r2,
            barcode,
            bar_id: 0,
            bar_id2: 0,
        }
    }
}

impl fmt::Display for Read {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{: <4} {}", "name", utf8(&self.name))?;
        writeln!(f, "{: <4} {}", "seq", utf8(&self.seq))?;

        if let Some(qual) = &self.qual {
            writeln!(f, "{: <4} {}", "qual", utf8(qual))?;
        }

        Ok(())
    }
}

impl fmt::Display for PairedRead {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "read1 (barcode {})\n{}", self.bar_id, self.r1)?;

        if let Some(r2) = &self.r2 {
            writeln!(f, "read2 (barcode {})\n{}", self.bar_id2, r2)?;
        }
        if let Some(b) = &self.barcode {
            writeln!(f, "barcode read\n{}", b)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_quality_in_lockstep() {
        let mut read = Read::from_fastq(b"r", b"AAACCGTT", b"01234567");

        read.trim_prefix(4, true);
        assert_eq!(read.seq(), b"CGTT");
        assert_eq!(read.qual(), Some(&b"4567"[..]));

        read.truncate(2, true);
        assert_eq!(read.seq(), b"CG");
        assert_eq!(read.qual(), Some(&b"45"[..]));
    }

    #[test]
    fn leaves_quality_alone_without_qual_trimming() {
        let mut read = Read::from_fastq(b"r", b"AAACCGTT", b"01234567");

        read.truncate(3, false);
        assert_eq!(read.seq(), b"AAA");
        assert_eq!(read.qual(), Some(&b"01234567"[..]));
    }

    #[test]
    fn trim_prefix_past_end_empties() {
        let mut read = Read::from_fasta(b"r", b"ACGT");
        read.trim_prefix(10, true);
        assert!(read.is_empty());
        assert_eq!(read.qual(), None);
    }
}
