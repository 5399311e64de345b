use flate2::write::GzEncoder;
use flate2::Compression;
use memchr::memmem;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::*;
use crate::fastq::*;
use crate::queries::REVCOMP_SUFFIX;
use crate::read::Read;
use crate::seq_align::REMOVAL_TAG;

/// Output files for reads split by which side their barcode was removed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutputs {
    pub left: PathBuf,
    pub right: PathBuf,
}

impl SplitOutputs {
    /// `<prefix>_left_tail_trimmed.fasta` and `<prefix>_right_tail_trimmed.fasta`.
    pub fn from_prefix(prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            left: PathBuf::from(format!("{prefix}_left_tail_trimmed.fasta")),
            right: PathBuf::from(format!("{prefix}_right_tail_trimmed.fasta")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitCounts {
    pub left: usize,
    pub right: usize,
    /// Records without a removal tag.
    pub skipped: usize,
}

/// Which output a tagged read goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Side of a read named by the aligner's removal tags, or `None` if nothing was removed.
pub fn removal_side(name: &[u8]) -> Option<Side> {
    // the marker is followed by the query id
    let marker = format!("{REMOVAL_TAG}_");

    if memmem::find(name, marker.as_bytes()).map_or(true, |pos| pos == 0) {
        return None;
    }

    if memmem::find(name, REVCOMP_SUFFIX.as_bytes()).is_some() {
        Some(Side::Right)
    } else {
        Some(Side::Left)
    }
}

/// Drop the leftover barcode bases plus one from the side opposite the removal.
pub fn clip_barcode(read: &mut Read, side: Side, barcode_len: usize) {
    let clip = barcode_len + 1;

    if barcode_len == 0 || read.len() <= clip {
        return;
    }

    match side {
        Side::Right => read.trim_prefix(clip, true),
        Side::Left => read.truncate(read.len() - clip, true),
    }
}

fn create(file: &Path) -> Result<Box<dyn Write + Send>> {
    let f = File::create(file).map_err(|e| Error::FileIo {
        file: file.display().to_string(),
        source: Box::new(e),
    })?;

    if file.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(GzEncoder::new(BufWriter::new(f), Compression::default())))
    } else {
        Ok(Box::new(BufWriter::new(f)))
    }
}

/// Split the tagged reads of `input` into left and right tail outputs.
///
/// Outputs ending in `.gz` are gzip compressed.
pub fn split_removed_reads(input: impl AsRef<str>, outputs: &SplitOutputs, barcode_len: usize) -> Result<SplitCounts> {
    let reads = iter_fastx(input.as_ref(), 1024)?;
    let mut left = create(&outputs.left)?;
    let mut right = create(&outputs.right)?;
    let mut counts = SplitCounts::default();

    let io_err = |file: &Path, e: std::io::Error| Error::FileIo {
        file: file.display().to_string(),
        source: Box::new(e),
    };

    loop {
        let chunk = reads.next_chunk()?;

        if chunk.is_empty() {
            break;
        }

        for mut read in chunk {
            let Some(side) = removal_side(read.name()) else {
                counts.skipped += 1;
                continue;
            };

            clip_barcode(&mut read, side, barcode_len);

            match side {
                Side::Left => {
                    write_fasta_record(left.as_mut(), &read).map_err(|e| io_err(outputs.left.as_path(), e))?;
                    counts.left += 1;
                }
                Side::Right => {
                    write_fasta_record(right.as_mut(), &read).map_err(|e| io_err(outputs.right.as_path(), e))?;
                    counts.right += 1;
                }
            }
        }
    }

    left.flush().map_err(|e| io_err(outputs.left.as_path(), e))?;
    right.flush().map_err(|e| io_err(outputs.right.as_path(), e))?;

    log::info!(
        "Split {} left tail and {} right tail reads, skipped {} untagged reads",
        counts.left,
        counts.right,
        counts.skipped
    );

    Ok(counts)
}
