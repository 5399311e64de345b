//! Rust library for detecting and removing barcodes and adapters from sequencing reads.
//!
//! # Overview
//! barcut aligns every read against a set of known sequences (barcodes or adapters),
//! picks the best valid match and trims the read according to a trim-end policy.
//!
//! This is useful for:
//! * Removing adapters before mapping or assembly
//! * Demultiplexing reads by barcode
//! * Capturing random tags (UMIs) that sit inside an adapter
//!
//! ## Bundles
//! Reads are processed in bundles. Each bundle goes through three phases:
//! 1. every (read, query) alignment job is staged,
//! 2. all jobs are computed with one call to the alignment primitive,
//! 3. results are extracted read by read, in staging order.
//!
//! Bundles are independent, so [`SeqAligner::align_with_threads()`] runs them on worker
//! threads while sharing statistics through atomic counters.
//!
//! ## Trim-end modes
//! The [`TrimEnd`] mode decides which end of the read the query is anchored to and which
//! side of the read is kept:
//! ```text
//! RIGHT   AAACC|GTT      keep the prefix, query at the right end
//! LEFT    AAAC|CGTT      keep the suffix, query at the left end
//! ANY     remove the side with the larger query overhang
//! ```
//! `LTAIL` and `RTAIL` behave like `LEFT` and `RIGHT` but only search the first or last
//! `tail_length` bases of the read.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use barcut::*;
//!
//! let adapters = "
//!     name: adapters
//!     patterns:
//!       - pattern: GTT
//!         id: adapter1
//! ";
//! let queries = Arc::new(QuerySet::from_yaml(adapters.as_bytes()).unwrap());
//! let options = AlignOptions {
//!     min_read_length: 0,
//!     ..AlignOptions::adapter()
//! };
//!
//! let aligner = SeqAligner::new(queries, QueryKind::Adapter, &options).unwrap();
//! let mut reads = vec![Read::from_fasta(b"read1", b"AAACCGTT")];
//!
//! assert_eq!(aligner.align_bundle(&mut reads, true).unwrap(), vec![1]);
//! assert_eq!(reads[0].seq(), b"AAACC");
//! ```

pub mod align_log;
pub mod aligner;
pub mod batch;
pub mod errors;
pub mod evaluate;
pub mod fastq;
pub mod filter;
pub mod options;
pub mod queries;
pub mod read;
pub mod seq_align;
pub mod split;
pub mod stats;

// commonly used functions and types

pub use crate::align_log::AlignmentLog;
pub use crate::aligner::{AlignmentTrace, EndGaps, PairwiseAligner, SemiGlobalAligner};
pub use crate::batch::{AlignmentBatch, BatchPhase};
pub use crate::errors::{Error, Result};
pub use crate::evaluate::{AlignmentEvaluator, AlignmentResult};
pub use crate::fastq::*;
pub use crate::filter::*;
pub use crate::options::*;
pub use crate::queries::{QueryEntry, QuerySet};
pub use crate::read::*;
pub use crate::seq_align::{QueryKind, SeqAligner};
pub use crate::split::{split_removed_reads, SplitCounts, SplitOutputs};
pub use crate::stats::{OverlapHistogram, OverlapSummary};
