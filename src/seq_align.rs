use thread_local::*;

use std::cell::RefCell;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::align_log::AlignmentLog;
use crate::aligner::*;
use crate::batch::AlignmentBatch;
use crate::errors::*;
use crate::evaluate::*;
use crate::options::*;
use crate::queries::{QueryEntry, QuerySet};
use crate::read::Read;
use crate::stats::*;

/// Marker appended to the name of every read a query was removed from.
pub const REMOVAL_TAG: &str = "_Flexbar_removal";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueryKind {
    /// Barcodes must match over their full length unless a minimum overlap is set.
    Barcode,
    /// Reads shorter than the minimum read length are skipped.
    Adapter,
}

type AlignerFactory = Box<dyn Fn() -> Box<dyn PairwiseAligner + Send> + Send + Sync>;

/// Detects the best matching query in each read and trims the read accordingly.
///
/// Bundles of reads go through one cycle each: every (read, query) job is staged, all jobs
/// are computed together, and results are extracted per read in staging order. One
/// `SeqAligner` is shared by all worker threads; each thread gets its own aligner and batch.
pub struct SeqAligner {
    queries: Arc<QuerySet>,
    kind: QueryKind,
    options: AlignOptions,
    evaluator: AlignmentEvaluator,
    log: Option<Arc<AlignmentLog>>,
    n_pre_short: AtomicUsize,
    n_modified: AtomicUsize,
    n_unmatched: AtomicUsize,
    overlaps: OverlapHistogram,
    new_aligner: AlignerFactory,
    aligners: ThreadLocal<RefCell<Box<dyn PairwiseAligner + Send>>>,
    batches: ThreadLocal<RefCell<AlignmentBatch>>,
}

struct Candidate<'a> {
    idx: usize,
    query: &'a QueryEntry,
    res: AlignmentResult,
}

impl SeqAligner {
    /// Alignment records go to stdout if `options.log_align` asks for them.
    pub fn new(queries: Arc<QuerySet>, kind: QueryKind, options: &AlignOptions) -> Result<Self> {
        options.validate()?;

        let log = if options.log_align != NoLog {
            Some(Arc::new(AlignmentLog::stdout()))
        } else {
            None
        };

        Ok(Self {
            queries,
            kind,
            options: options.clone(),
            evaluator: AlignmentEvaluator::new(options),
            log,
            n_pre_short: AtomicUsize::new(0),
            n_modified: AtomicUsize::new(0),
            n_unmatched: AtomicUsize::new(0),
            overlaps: OverlapHistogram::new(),
            new_aligner: Box::new(|| Box::new(SemiGlobalAligner::new()) as Box<dyn PairwiseAligner + Send>),
            aligners: ThreadLocal::new(),
            batches: ThreadLocal::new(),
        })
    }

    pub fn with_log(mut self, log: Arc<AlignmentLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Use a different alignment primitive. `new_aligner` is called once per worker thread.
    pub fn with_aligner<F>(mut self, new_aligner: F) -> Self
    where
        F: Fn() -> Box<dyn PairwiseAligner + Send> + Send + Sync + 'static,
    {
        self.new_aligner = Box::new(new_aligner);
        self.aligners = ThreadLocal::new();
        self
    }

    pub fn queries(&self) -> &QuerySet {
        &self.queries
    }

    pub fn options(&self) -> &AlignOptions {
        &self.options
    }

    pub fn n_pre_short_reads(&self) -> usize {
        self.n_pre_short.load(Ordering::Relaxed)
    }

    pub fn n_modified_reads(&self) -> usize {
        self.n_modified.load(Ordering::Relaxed)
    }

    /// Reads that were aligned but had no valid match.
    pub fn n_unmatched_reads(&self) -> usize {
        self.n_unmatched.load(Ordering::Relaxed)
    }

    pub fn overlaps(&self) -> &OverlapHistogram {
        &self.overlaps
    }

    pub fn overlap_stats_string(&self) -> String {
        self.overlaps.summary().to_string()
    }

    fn is_pre_short(&self, read: &Read) -> bool {
        self.kind == QueryKind::Adapter && read.len() < self.options.min_read_length
    }

    /// Part of a read that is aligned against a query of length `query_len`.
    fn window(&self, read_len: usize, query_len: usize) -> Range<usize> {
        let tail = if self.options.tail_length > 0 {
            self.options.tail_length
        } else {
            query_len
        };

        match self.options.trim_end {
            LeftTail if tail < read_len => 0..tail,
            RightTail if tail < read_len => read_len - tail..read_len,
            _ => 0..read_len,
        }
    }

    /// Stage one job per query for `read`. Short adapter reads stage nothing.
    pub fn stage_read(&self, read_idx: usize, read: &Read, batch: &mut AlignmentBatch) -> Result<()> {
        if self.is_pre_short(read) {
            return Ok(());
        }

        let windows = self
            .queries
            .iter()
            .enumerate()
            .map(|(i, q)| (i, self.window(read.len(), q.len())));

        batch.stage(read_idx, read.seq(), windows)
    }

    /// Compute all staged jobs with this thread's aligner.
    pub fn compute_batch(&self, batch: &mut AlignmentBatch) -> Result<()> {
        let aligner = self
            .aligners
            .get_or(|| RefCell::new((self.new_aligner)()));
        let mut aligner = aligner.borrow_mut();

        batch.compute(
            &mut **aligner,
            &self.queries,
            &self.options.scoring,
            self.options.trim_end.end_gaps(),
        )
    }

    fn is_valid(&self, res: &AlignmentResult, query: &QueryEntry) -> bool {
        let min_overlap = if self.kind == QueryKind::Barcode && self.options.min_overlap == 0 {
            query.len()
        } else {
            self.options.min_overlap
        };

        let trim_end = self.options.trim_end;
        let outside_region = self.options.strict_region
            && ((trim_end.is_right_anchored() && res.query_start < res.read_start)
                || (trim_end.is_left_anchored() && res.query_end > res.read_end));

        res.overlap_length >= 1
            && !outside_region
            && res.within_error_budget()
            && res.overlap_length >= min_overlap
    }

    /// Extract the results for one staged read, select the best query and apply it.
    ///
    /// Returns the 1-based index of the selected query, or 0 if there is none.
    pub fn align_read(
        &self,
        read_idx: usize,
        read: &mut Read,
        remove: bool,
        batch: &mut AlignmentBatch,
    ) -> Result<usize> {
        if self.is_pre_short(read) {
            self.n_pre_short.fetch_add(1, Ordering::Relaxed);
            return Ok(0);
        }

        let mut best: Option<Candidate> = None;

        for (idx, query) in self.queries.iter().enumerate() {
            let res = self.evaluator.evaluate(batch, read_idx, idx)?;

            if !self.is_valid(&res, query) {
                continue;
            }

            // strictly greater, so the earliest query wins ties
            if best.as_ref().map_or(true, |b| res.score > b.res.score) {
                best = Some(Candidate { idx, query, res });
            }
        }

        let Some(Candidate { idx, query, res }) = best else {
            self.n_unmatched.fetch_add(1, Ordering::Relaxed);

            if self.options.log_align == All {
                self.write_log(&format!(
                    "No valid alignment:\nread tag  {}\nread seq  {}\n\n\n",
                    utf8(read.name()),
                    utf8(read.seq())
                ))?;
            }
            return Ok(0);
        };

        let full_log = self.options.log_align == All || (self.options.log_align == Mod && remove);
        let read_seq = if full_log { read.seq().to_owned() } else { Vec::new() };

        let removal = if remove {
            let removal = self
                .options
                .trim_end
                .resolve(res.read_start, res.read_end, res.query_start, res.query_end);
            self.trim(read, &res, removal);
            self.record_removal(read, query, &res);
            Some(removal)
        } else {
            None
        };

        if self.options.random_tags && !res.rand_tag.is_empty() {
            read.append_to_name(b"_");
            read.append_to_name(&res.rand_tag);
        }

        if full_log {
            self.write_log(&self.full_record(read, &read_seq, query, &res, removal))?;
        } else if self.options.log_align == Tab {
            self.write_log(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                utf8(read.name()),
                query.id(),
                res.query_start,
                res.query_end,
                res.overlap_length,
                res.mismatches,
                res.gaps_read + res.gaps_query,
                res.allowed_errors
            ))?;
        }

        Ok(idx + 1)
    }

    fn trim(&self, read: &mut Read, res: &AlignmentResult, removal: Removal) {
        let with_qual = self.options.trims_quality();
        let len = read.len();

        match removal {
            Removal::Everything => read.clear(with_qual),
            Removal::Left => {
                // view end to read coordinates, minus gaps the alignment put into the read
                let cut = (res.end_pos + res.window_offset)
                    .saturating_sub(res.read_start + res.gaps_read)
                    .min(len);
                read.trim_prefix(cut, with_qual);
            }
            Removal::Right => {
                let cut = (res.start_pos - res.read_start + res.window_offset).min(len);
                read.truncate(cut, with_qual);
            }
            Removal::Nothing => (),
        }
    }

    fn record_removal(&self, read: &mut Read, query: &QueryEntry, res: &AlignmentResult) {
        self.n_modified.fetch_add(1, Ordering::Relaxed);
        query.record_removal(res.overlap_length == res.query_length);

        if !self.overlaps.record(res.overlap_length) {
            log::warn!(
                "Overlap of {} bases is longer than the maximum read length {} and is left out of the overlap statistics",
                res.overlap_length,
                MAX_READ_LENGTH
            );
        }

        if self.options.removal_tags {
            read.append_to_name(REMOVAL_TAG.as_bytes());

            if self.kind == QueryKind::Adapter {
                read.append_to_name(b"_");
                read.append_to_name(query.id().as_bytes());
            }
        }
    }

    fn full_record(
        &self,
        read: &Read,
        read_seq: &[u8],
        query: &QueryEntry,
        res: &AlignmentResult,
        removal: Option<Removal>,
    ) -> String {
        let mut s = String::new();

        match removal {
            Some(Removal::Left) => s.push_str("Sequence removal:  left side\n"),
            Some(Removal::Right) => s.push_str("Sequence removal:  right side\n"),
            Some(_) => s.push_str("Sequence removal:  any side\n"),
            None => s.push_str("Sequence detection, no removal:\n"),
        }

        let _ = writeln!(s, "  query tag        {}", query.id());
        let _ = writeln!(s, "  read tag         {}", utf8(read.name()));
        let _ = writeln!(s, "  read seq         {}", utf8(read_seq));
        let _ = writeln!(s, "  read pos         {}-{}", res.read_start, res.read_end);
        let _ = writeln!(s, "  query pos        {}-{}", res.query_start, res.query_end);
        let _ = writeln!(s, "  score            {}", res.score);
        let _ = writeln!(s, "  overlap          {}", res.overlap_length);
        let _ = writeln!(s, "  errors           {}", res.errors());
        let _ = writeln!(s, "  allowed errors   {}", res.allowed_errors);

        if removal.is_some() {
            let _ = writeln!(s, "  remaining read   {}", utf8(read.seq()));

            if self.options.trims_quality() {
                let _ = writeln!(s, "  remaining qual   {}", utf8(read.qual().unwrap_or_default()));
            }
        }

        s.push_str("\n  Alignment:\n\n");
        s.push_str(&res.alignment);
        s
    }

    fn write_log(&self, record: &str) -> Result<()> {
        match &self.log {
            Some(log) => log.write_record(record),
            None => Ok(()),
        }
    }

    /// Run one full cycle over the reads picked out of `items` by `select`.
    ///
    /// `select` must pick the same reads when called twice on an unchanged item. Returns the
    /// match index per item, 0 for items without a selected read.
    pub fn align_selected<T, F>(&self, items: &mut [T], mut select: F, remove: bool) -> Result<Vec<usize>>
    where
        F: FnMut(&mut T) -> Option<&mut Read>,
    {
        let batch = self.batches.get_or(|| {
            RefCell::new(AlignmentBatch::with_capacity(
                self.options.bundle_size * self.queries.len(),
            ))
        });
        let mut batch = batch.borrow_mut();
        batch.reset();

        for (i, item) in items.iter_mut().enumerate() {
            if let Some(read) = select(item) {
                self.stage_read(i, read, &mut batch)?;
            }
        }

        self.compute_batch(&mut batch)?;

        let mut res = vec![0; items.len()];

        for (i, item) in items.iter_mut().enumerate() {
            if let Some(read) = select(item) {
                res[i] = self.align_read(i, read, remove, &mut batch)?;
            }
        }

        batch.finish()?;
        log::debug!("Aligned {} jobs for a bundle of {} reads", batch.len(), items.len());

        Ok(res)
    }

    pub fn align_bundle(&self, reads: &mut [Read], remove: bool) -> Result<Vec<usize>> {
        self.align_selected(reads, |r| Some(r), remove)
    }

    /// Split `reads` into bundles and align them on `threads` worker threads.
    pub fn align_with_threads(&self, reads: &mut [Read], remove: bool, threads: usize) -> Result<Vec<usize>> {
        let bundle_size = self.options.bundle_size;
        let n_reads = reads.len();
        let mut res = vec![0; n_reads];

        run_bundles(
            reads.chunks_mut(bundle_size).zip(res.chunks_mut(bundle_size)),
            threads,
            |(reads, out): (&mut [Read], &mut [usize])| {
                out.copy_from_slice(&self.align_bundle(reads, remove)?);
                Ok(())
            },
        )?;

        log::info!(
            "Aligned {} reads: {} modified, {} unmatched, {} too short",
            n_reads,
            self.n_modified_reads(),
            self.n_unmatched_reads(),
            self.n_pre_short_reads()
        );

        Ok(res)
    }
}

/// Hand out `bundles` to `threads` scoped workers until all are processed.
pub(crate) fn run_bundles<I, F>(bundles: I, threads: usize, f: F) -> Result<()>
where
    I: Iterator + Send,
    F: Fn(I::Item) -> Result<()> + Sync,
{
    assert!(threads >= 1, "Number of threads must be greater than zero");

    let bundles = Mutex::new(bundles);

    thread::scope(|s| {
        let handles = (0..threads)
            .map(|_| {
                s.spawn(|| -> Result<()> {
                    loop {
                        let next = bundles.lock().unwrap().next();
                        let Some(bundle) = next else {
                            return Ok(());
                        };

                        f(bundle)?;
                    }
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .try_for_each(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
    })
}
