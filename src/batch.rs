use std::fmt;
use std::ops::Range;

use crate::aligner::*;
use crate::errors::*;
use crate::options::ScoringScheme;
use crate::queries::QuerySet;

/// Phase of the stage, compute, extract cycle of one bundle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BatchPhase {
    Staging,
    Computed,
    Extracting,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BatchPhase::Staging => "staging",
            BatchPhase::Computed => "computed",
            BatchPhase::Extracting => "extracting",
        };
        f.write_str(s)
    }
}

/// One read window against one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentJob {
    pub read_idx: usize,
    pub query_idx: usize,
    /// Part of the read that is aligned, in read coordinates.
    pub window: Range<usize>,
    pub read_len: usize,
    slot: usize,
}

impl AlignmentJob {
    /// Whether the window is a strict part of the read.
    pub fn is_restricted(&self) -> bool {
        self.window.start > 0 || self.window.end < self.read_len
    }
}

/// Jobs staged for a bundle and their traces once computed.
///
/// Extraction must visit jobs in exactly the order they were staged. The cursor only moves
/// forward and is reset once per bundle by [`reset`](AlignmentBatch::reset).
pub struct AlignmentBatch {
    seqs: Vec<Vec<u8>>,
    jobs: Vec<AlignmentJob>,
    traces: Vec<AlignmentTrace>,
    phase: BatchPhase,
    cursor: usize,
}

impl AlignmentBatch {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(jobs: usize) -> Self {
        Self {
            seqs: Vec::new(),
            jobs: Vec::with_capacity(jobs),
            traces: Vec::with_capacity(jobs),
            phase: BatchPhase::Staging,
            cursor: 0,
        }
    }

    pub fn reset(&mut self) {
        self.seqs.clear();
        self.jobs.clear();
        self.traces.clear();
        self.phase = BatchPhase::Staging;
        self.cursor = 0;
    }

    /// Stage one job per `(query_idx, window)` for a read.
    pub fn stage<I>(&mut self, read_idx: usize, seq: &[u8], windows: I) -> Result<()>
    where
        I: IntoIterator<Item = (usize, Range<usize>)>,
    {
        self.expect_phase("stage jobs", BatchPhase::Staging)?;

        let slot = self.seqs.len();
        let read_len = seq.len();
        let before = self.jobs.len();

        self.jobs
            .extend(windows.into_iter().map(|(query_idx, window)| AlignmentJob {
                read_idx,
                query_idx,
                window,
                read_len,
                slot,
            }));

        if self.jobs.len() > before {
            self.seqs.push(seq.to_owned());
        }

        Ok(())
    }

    /// Compute every staged job in one call to the aligner.
    ///
    /// Fails without computing anything if a job names a query outside `queries`.
    pub fn compute<A: PairwiseAligner + ?Sized>(
        &mut self,
        aligner: &mut A,
        queries: &QuerySet,
        scoring: &ScoringScheme,
        end_gaps: EndGaps,
    ) -> Result<()> {
        self.expect_phase("compute", BatchPhase::Staging)?;

        let mut pairs = Vec::with_capacity(self.jobs.len());

        for (cursor, job) in self.jobs.iter().enumerate() {
            let query = queries.get(job.query_idx).ok_or(Error::BatchQuery {
                cursor,
                query_idx: job.query_idx,
                len: queries.len(),
            })?;
            pairs.push((&self.seqs[job.slot][job.window.clone()], query.seq()));
        }

        self.traces.clear();
        aligner.align_batch(&pairs, scoring, end_gaps, &mut self.traces);
        self.phase = BatchPhase::Computed;

        Ok(())
    }

    /// Take the job under the cursor, which must be for `read_idx` and `query_idx`.
    pub fn next(&mut self, read_idx: usize, query_idx: usize) -> Result<(&AlignmentJob, &AlignmentTrace)> {
        if self.phase == BatchPhase::Staging {
            return Err(Error::BatchPhase {
                operation: "extract results",
                phase: self.phase,
            });
        }
        self.phase = BatchPhase::Extracting;

        let cursor = self.cursor;
        let (Some(job), Some(trace)) = (self.jobs.get(cursor), self.traces.get(cursor)) else {
            return Err(Error::BatchCursor {
                cursor,
                len: self.jobs.len(),
            });
        };

        if job.read_idx != read_idx || job.query_idx != query_idx {
            return Err(Error::BatchDesync {
                cursor,
                expected_read: read_idx,
                expected_query: query_idx,
                found_read: job.read_idx,
                found_query: job.query_idx,
            });
        }

        self.cursor += 1;
        Ok((job, trace))
    }

    /// Check that every staged job was consumed.
    pub fn finish(&self) -> Result<()> {
        if self.phase == BatchPhase::Staging && !self.jobs.is_empty() {
            return Err(Error::BatchPhase {
                operation: "finish",
                phase: self.phase,
            });
        }

        if self.cursor != self.jobs.len() {
            return Err(Error::BatchIncomplete {
                consumed: self.cursor,
                len: self.jobs.len(),
            });
        }

        Ok(())
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn expect_phase(&self, operation: &'static str, phase: BatchPhase) -> Result<()> {
        if self.phase != phase {
            return Err(Error::BatchPhase {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }
}

impl Default for AlignmentBatch {
    fn default() -> Self {
        Self::new()
    }
}
