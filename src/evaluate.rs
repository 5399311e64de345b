use crate::aligner::*;
use crate::batch::*;
use crate::errors::*;
use crate::options::{AlignOptions, NoLog};

/// Interpretation of one computed (read, query) alignment.
///
/// All positions are view coordinates into the gapped alignment rows. Ends are exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub score: i32,
    pub mismatches: usize,
    /// Gaps in the read row within the overlap.
    pub gaps_read: usize,
    /// Gaps in the query row within the overlap.
    pub gaps_query: usize,
    pub start_pos: usize,
    pub end_pos: usize,
    pub read_start: usize,
    pub read_end: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub overlap_length: usize,
    pub query_length: usize,
    /// Length of the tail window, or 0 if the whole read was aligned.
    pub tail_length: usize,
    /// Read coordinate of the first aligned base.
    pub window_offset: usize,
    pub allowed_errors: f32,
    pub rand_tag: Vec<u8>,
    /// Printed alignment. Empty unless alignments are logged.
    pub alignment: String,
}

impl AlignmentResult {
    pub fn errors(&self) -> usize {
        self.mismatches + self.gaps_read + self.gaps_query
    }

    pub fn within_error_budget(&self) -> bool {
        self.errors() as f32 <= self.allowed_errors
    }
}

pub struct AlignmentEvaluator {
    error_rate: f32,
    random_tags: bool,
    keep_alignment: bool,
}

impl AlignmentEvaluator {
    pub fn new(options: &AlignOptions) -> Self {
        Self {
            error_rate: options.error_rate,
            random_tags: options.random_tags,
            keep_alignment: options.log_align != NoLog,
        }
    }

    /// Consume the next job of `batch` and interpret it.
    ///
    /// Fails only if the batch cursor does not point at the job for `read_idx` and
    /// `query_idx`.
    pub fn evaluate(
        &self,
        batch: &mut AlignmentBatch,
        read_idx: usize,
        query_idx: usize,
    ) -> Result<AlignmentResult> {
        let (job, trace) = batch.next(read_idx, query_idx)?;
        Ok(self.interpret(job, trace))
    }

    pub fn interpret(&self, job: &AlignmentJob, trace: &AlignmentTrace) -> AlignmentResult {
        let (read_start, read_end) = trace.read_span();
        let (query_start, query_end) = trace.query_span();

        let start_pos = read_start.max(query_start);
        let end_pos = read_end.min(query_end);
        let overlap_length = end_pos.saturating_sub(start_pos);

        let mut mismatches = 0;
        let mut gaps_read = 0;
        let mut gaps_query = 0;
        let mut rand_tag = Vec::new();

        for k in start_pos..start_pos + overlap_length {
            let r = trace.read_row[k];
            let q = trace.query_row[k];

            if r == GAP {
                gaps_read += 1;
            } else if q == GAP {
                gaps_query += 1;
            } else if !r.eq_ignore_ascii_case(&q) && !q.eq_ignore_ascii_case(&b'N') {
                mismatches += 1;
            } else if self.random_tags && q.eq_ignore_ascii_case(&b'N') {
                rand_tag.push(r);
            }
        }

        AlignmentResult {
            score: trace.score,
            mismatches,
            gaps_read,
            gaps_query,
            start_pos,
            end_pos,
            read_start,
            read_end,
            query_start,
            query_end,
            overlap_length,
            query_length: trace.query_row.iter().filter(|&&c| c != GAP).count(),
            tail_length: if job.is_restricted() { job.window.len() } else { 0 },
            window_offset: job.window.start,
            allowed_errors: self.error_rate * overlap_length as f32 / 10.0,
            rand_tag,
            alignment: if self.keep_alignment {
                trace.to_string()
            } else {
                String::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::options::{ScoringScheme, Tab};
    use crate::queries::QuerySet;

    fn evaluate(read: &[u8], query: &[u8], options: &AlignOptions) -> AlignmentResult {
        let queries = QuerySet::new(vec![("q".to_owned(), query.to_vec())]).unwrap();
        let mut batch = AlignmentBatch::new();
        let mut aligner = SemiGlobalAligner::new();

        batch.stage(0, read, [(0, 0..read.len())]).unwrap();
        batch
            .compute(
                &mut aligner,
                &queries,
                &options.scoring,
                options.trim_end.end_gaps(),
            )
            .unwrap();

        AlignmentEvaluator::new(options).evaluate(&mut batch, 0, 0).unwrap()
    }

    #[test]
    fn overlap_of_right_anchored_match() {
        let res = evaluate(b"AAACCGTT", b"GTT", &AlignOptions::adapter());

        assert_eq!((res.read_start, res.read_end), (0, 8));
        assert_eq!((res.query_start, res.query_end), (5, 8));
        assert_eq!((res.start_pos, res.end_pos), (5, 8));
        assert_eq!(res.overlap_length, 3);
        assert_eq!(res.errors(), 0);
        assert_eq!(res.query_length, 3);
        assert!(res.alignment.is_empty());
    }

    #[test]
    fn counts_errors_only_inside_the_overlap() {
        let res = evaluate(
            b"CCCCCCCCACGTTGCAACGT",
            b"ACGTTGCAACGA",
            &AlignOptions {
                error_rate: 0.5,
                ..AlignOptions::adapter()
            },
        );

        assert_eq!(res.overlap_length, 12);
        assert_eq!(res.errors(), 1);
        assert!((res.allowed_errors - 0.6).abs() < 1e-6);
        assert!(!res.within_error_budget());
    }

    #[test]
    fn counts_gaps_by_row() {
        let options = AlignOptions {
            trim_end: crate::options::Any,
            scoring: ScoringScheme::simple(1, -1, -2),
            ..AlignOptions::adapter()
        };
        let res = evaluate(b"ACGTTACGT", b"ACGTACGT", &options);

        assert_eq!(res.gaps_query, 1);
        assert_eq!(res.gaps_read, 0);
        assert_eq!(res.mismatches, 0);
    }

    #[test]
    fn captures_random_tag_at_wildcards() {
        let options = AlignOptions {
            random_tags: true,
            log_align: Tab,
            ..AlignOptions::adapter()
        };
        let res = evaluate(b"CCCCCCCCACTTAAGT", b"ACNNNNGT", &options);

        assert_eq!(res.rand_tag, b"TTAA");
        assert_eq!(res.errors(), 0);
        assert!(!res.alignment.is_empty());
    }

    #[test]
    fn query_past_read_end_has_no_overlap() {
        let options = AlignOptions {
            trim_end: crate::options::RightTail,
            ..AlignOptions::adapter()
        };
        let res = evaluate(b"TTTTTT", b"CAGG", &options);

        assert_eq!(res.overlap_length, 0);
    }
}
