use bio::alignment::pairwise::{self, Aligner, Scoring};
use bio::alignment::Alignment;
use bio::alignment::AlignmentOperation::{Del, Ins, Match, Subst, Xclip, Yclip};

use std::fmt;

use crate::options::ScoringScheme;

pub const GAP: u8 = b'-';

/// Which unaligned sequence ends are free of gap penalties.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EndGaps {
    /// Read bases before the query starts.
    pub read_start: bool,
    /// Query bases before the read starts.
    pub query_start: bool,
    /// Query bases after the read ends.
    pub query_end: bool,
    /// Read bases after the query ends.
    pub read_end: bool,
}

impl EndGaps {
    pub fn free() -> Self {
        Self {
            read_start: true,
            query_start: true,
            query_end: true,
            read_end: true,
        }
    }

    pub fn global() -> Self {
        Self {
            read_start: false,
            query_start: false,
            query_end: false,
            read_end: false,
        }
    }
}

/// Gapped alignment rows of equal length, plus the alignment score.
///
/// Column `k` of the alignment is `(read_row[k], query_row[k])`; a [`GAP`] marks a gap in
/// that row. Positions into the rows are "view" coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlignmentTrace {
    pub score: i32,
    pub read_row: Vec<u8>,
    pub query_row: Vec<u8>,
}

impl AlignmentTrace {
    pub fn len(&self) -> usize {
        self.read_row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_row.is_empty()
    }

    /// View range `[start, end)` spanned by the read's bases.
    pub fn read_span(&self) -> (usize, usize) {
        row_span(&self.read_row)
    }

    /// View range `[start, end)` spanned by the query's bases.
    pub fn query_span(&self) -> (usize, usize) {
        row_span(&self.query_row)
    }
}

fn row_span(row: &[u8]) -> (usize, usize) {
    let start = row.iter().position(|&c| c != GAP);
    let end = row.iter().rposition(|&c| c != GAP);

    match (start, end) {
        (Some(s), Some(e)) => (s, e + 1),
        _ => (0, 0),
    }
}

impl fmt::Display for AlignmentTrace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const WIDTH: usize = 50;

        for start in (0..self.len()).step_by(WIDTH) {
            let end = (start + WIDTH).min(self.len());
            let read = &self.read_row[start..end];
            let query = &self.query_row[start..end];

            let bars = read
                .iter()
                .zip(query)
                .map(|(&r, &q)| {
                    if r != GAP && q != GAP && r.eq_ignore_ascii_case(&q) {
                        '|'
                    } else {
                        ' '
                    }
                })
                .collect::<String>();

            writeln!(f, "{: >7}    {}", start, String::from_utf8_lossy(read))?;
            writeln!(f, "{: >7}    {}", "", bars)?;
            writeln!(f, "{: >7}    {}", "", String::from_utf8_lossy(query))?;
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Pairwise alignment capability used by the batch cycle.
///
/// Implementations compute a global alignment of `read` against `query` where the ends
/// selected by `end_gaps` can be left unaligned at no cost.
pub trait PairwiseAligner {
    fn align(
        &mut self,
        read: &[u8],
        query: &[u8],
        scoring: &ScoringScheme,
        end_gaps: EndGaps,
    ) -> AlignmentTrace;

    /// Align every `(read, query)` pair, appending one trace per pair in order.
    fn align_batch(
        &mut self,
        pairs: &[(&[u8], &[u8])],
        scoring: &ScoringScheme,
        end_gaps: EndGaps,
        out: &mut Vec<AlignmentTrace>,
    ) {
        out.reserve(pairs.len());

        for &(read, query) in pairs {
            out.push(self.align(read, query, scoring, end_gaps));
        }
    }
}

/// Affine gap aligner with configurable free end gaps, backed by `bio`'s custom alignment.
///
/// A free end is a zero-cost clip. `bio` may clip the read and the query at the same end,
/// which no end-gap-free alignment does, so when both are free at one end each side is
/// tried alone and the best scoring alignment is kept.
#[derive(Default)]
pub struct SemiGlobalAligner;

impl SemiGlobalAligner {
    pub fn new() -> Self {
        Self
    }
}

fn clip(free: bool) -> i32 {
    if free {
        0
    } else {
        pairwise::MIN_SCORE
    }
}

// (read, query) choices for one end
fn end_choices(read_free: bool, query_free: bool) -> Vec<(bool, bool)> {
    if read_free && query_free {
        vec![(true, false), (false, true)]
    } else {
        vec![(read_free, query_free)]
    }
}

fn unaligned(read: &[u8], query: &[u8], score: i32) -> AlignmentTrace {
    let mut read_row = read.to_owned();
    read_row.resize(read.len() + query.len(), GAP);

    let mut query_row = vec![GAP; read.len()];
    query_row.extend_from_slice(query);

    AlignmentTrace {
        score,
        read_row,
        query_row,
    }
}

impl PairwiseAligner for SemiGlobalAligner {
    fn align(
        &mut self,
        read: &[u8],
        query: &[u8],
        scoring: &ScoringScheme,
        end_gaps: EndGaps,
    ) -> AlignmentTrace {
        if query.is_empty() {
            let free = end_gaps.read_start || end_gaps.read_end;
            return unaligned(read, query, if free { 0 } else { scoring.gap(read.len()) });
        }
        if read.is_empty() {
            let free = end_gaps.query_start || end_gaps.query_end;
            return unaligned(read, query, if free { 0 } else { scoring.gap(query.len()) });
        }

        // bio charges open + k * extend for a gap of length k
        let scheme = *scoring;
        let gap_open = (scheme.gap_open - scheme.gap_extend).min(0);
        let gap_extend = scheme.gap_extend.min(0);

        let mut best: Option<Alignment> = None;

        for (read_start, query_start) in end_choices(end_gaps.read_start, end_gaps.query_start) {
            for (read_end, query_end) in end_choices(end_gaps.read_end, end_gaps.query_end) {
                let clips = Scoring::new(gap_open, gap_extend, move |r: u8, q: u8| scheme.score(r, q))
                    .xclip_prefix(clip(read_start))
                    .xclip_suffix(clip(read_end))
                    .yclip_prefix(clip(query_start))
                    .yclip_suffix(clip(query_end));

                let alignment =
                    Aligner::with_capacity_and_scoring(read.len(), query.len(), clips).custom(read, query);

                if best.as_ref().map_or(true, |b| alignment.score > b.score) {
                    best = Some(alignment);
                }
            }
        }

        let Some(alignment) = best else {
            return unaligned(read, query, scoring.gap(read.len()) + scoring.gap(query.len()));
        };

        let mut read_row = Vec::with_capacity(read.len() + query.len());
        let mut query_row = Vec::with_capacity(read.len() + query.len());

        // clipped prefixes
        read_row.extend_from_slice(&read[..alignment.xstart]);
        query_row.resize(alignment.xstart, GAP);
        read_row.resize(read_row.len() + alignment.ystart, GAP);
        query_row.extend_from_slice(&query[..alignment.ystart]);

        let (mut x, mut y) = (alignment.xstart, alignment.ystart);

        for op in &alignment.operations {
            match *op {
                Match | Subst => {
                    read_row.push(read[x]);
                    query_row.push(query[y]);
                    x += 1;
                    y += 1;
                }
                Ins => {
                    read_row.push(read[x]);
                    query_row.push(GAP);
                    x += 1;
                }
                Del => {
                    read_row.push(GAP);
                    query_row.push(query[y]);
                    y += 1;
                }
                Xclip(_) | Yclip(_) => (),
            }
        }

        // clipped suffixes
        read_row.extend_from_slice(&read[x..]);
        query_row.resize(query_row.len() + (read.len() - x), GAP);
        read_row.resize(read_row.len() + (query.len() - y), GAP);
        query_row.extend_from_slice(&query[y..]);

        AlignmentTrace {
            score: alignment.score,
            read_row,
            query_row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn align(read: &[u8], query: &[u8], scoring: ScoringScheme, end_gaps: EndGaps) -> AlignmentTrace {
        SemiGlobalAligner::new().align(read, query, &scoring, end_gaps)
    }

    #[test]
    fn global_alignment_of_identical_sequences() {
        let trace = align(b"ACGTACGT", b"ACGTACGT", ScoringScheme::default(), EndGaps::global());

        assert_eq!(trace.score, 8);
        assert_eq!(trace.read_row, b"ACGTACGT");
        assert_eq!(trace.query_row, b"ACGTACGT");
    }

    #[test]
    fn free_leading_read_bases() {
        let end_gaps = EndGaps {
            read_start: true,
            query_start: false,
            query_end: true,
            read_end: true,
        };
        let trace = align(b"AAACCGTT", b"GTT", ScoringScheme::default(), end_gaps);

        assert_eq!(trace.score, 3);
        assert_eq!(trace.read_row, b"AAACCGTT");
        assert_eq!(trace.query_row, b"-----GTT");
        assert_eq!(trace.read_span(), (0, 8));
        assert_eq!(trace.query_span(), (5, 8));
    }

    #[test]
    fn query_overhangs_both_read_ends() {
        let trace = align(b"ACGT", b"TTACGTAA", ScoringScheme::default(), EndGaps::free());

        assert_eq!(trace.score, 4);
        assert_eq!(trace.read_row, b"--ACGT--");
        assert_eq!(trace.query_row, b"TTACGTAA");
    }

    #[test]
    fn opens_a_single_gap_for_an_inserted_base() {
        let trace = align(
            b"ACGTTACGT",
            b"ACGTACGT",
            ScoringScheme::simple(1, -1, -2),
            EndGaps::global(),
        );

        assert_eq!(trace.score, 6);
        assert_eq!(trace.len(), 9);
        assert_eq!(trace.query_row.iter().filter(|&&c| c == GAP).count(), 1);
        assert_eq!(trace.read_row, b"ACGTTACGT");
    }

    #[test]
    fn affine_gaps_prefer_one_long_gap() {
        let scoring = ScoringScheme {
            match_score: 2,
            mismatch_score: -3,
            gap_open: -5,
            gap_extend: -1,
        };
        let trace = align(b"ACGTAAAACGTA", b"ACGTCGTA", scoring, EndGaps::global());

        assert_eq!(trace.score, 16 - 5 - 3);
        assert_eq!(trace.query_row, b"ACGT----CGTA");
    }

    #[test]
    fn wildcard_query_bases_score_as_matches() {
        let trace = align(b"ACTTAAGT", b"ACNNNNGT", ScoringScheme::default(), EndGaps::global());
        assert_eq!(trace.score, 8);
    }

    #[test]
    fn never_clips_both_sequences_at_one_end() {
        let trace = align(b"GGACGT", b"TTACGT", ScoringScheme::default(), EndGaps::free());

        assert_eq!(trace.score, 2);
        assert_eq!(trace.read_row, b"GGACGT");
        assert_eq!(trace.query_row, b"TTACGT");
    }

    #[test]
    fn query_start_gaps_are_charged_unless_free() {
        let end_gaps = EndGaps {
            read_start: true,
            query_start: false,
            query_end: true,
            read_end: true,
        };
        let trace = align(b"GTTAAAAAAA", b"CCGTT", ScoringScheme::simple(1, -1, -1), end_gaps);

        assert_eq!(trace.score, 1);
        assert_eq!(trace.read_row, b"--GTTAAAAAAA");
        assert_eq!(trace.query_row, b"CCGTT-------");
    }

    #[test]
    fn empty_query_leaves_read_unaligned() {
        let trace = align(b"ACGT", b"", ScoringScheme::default(), EndGaps::free());

        assert_eq!(trace.score, 0);
        assert_eq!(trace.read_row, b"ACGT");
        assert_eq!(trace.query_span(), (0, 0));
    }
}
