use serde::Deserialize;

use std::fmt;
use std::str::FromStr;

use crate::aligner::EndGaps;
use crate::errors::*;

pub use FileFormat::*;
pub use LogAlign::*;
pub use TrimEnd::*;

/// Policy selecting which end of a read is anchored against the query and which
/// side of the read is kept after removal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum TrimEnd {
    /// Query may sit anywhere. The less affected side of the read is kept.
    #[serde(rename = "ANY")]
    Any,
    /// Query anchors at the left end, the suffix after it is kept.
    #[serde(rename = "LEFT")]
    Left,
    /// Query anchors at the right end, the prefix before it is kept.
    #[serde(rename = "RIGHT")]
    Right,
    /// Like `Left`, but only the first `tail_length` bases are searched.
    #[serde(rename = "LTAIL")]
    LeftTail,
    /// Like `Right`, but only the last `tail_length` bases are searched.
    #[serde(rename = "RTAIL")]
    RightTail,
    #[serde(rename = "WUN")]
    Wun,
    #[serde(rename = "LTAILS")]
    LeftTails,
}

/// Concrete removal chosen for one read after resolving the trim-end mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Removal {
    /// Erase everything before the cut (keep the suffix).
    Left,
    /// Erase everything from the cut to the end (keep the prefix).
    Right,
    /// The query covers the whole read.
    Everything,
    /// Matched, but the mode does not cut.
    Nothing,
}

impl TrimEnd {
    pub fn end_gaps(self) -> EndGaps {
        match self {
            Right | RightTail => EndGaps {
                read_start: true,
                query_start: false,
                query_end: true,
                read_end: true,
            },
            Left | LeftTail => EndGaps {
                read_start: true,
                query_start: true,
                query_end: false,
                read_end: true,
            },
            Any | Wun | LeftTails => EndGaps::free(),
        }
    }

    /// Modes that restrict the search to a window at one end of the read.
    pub fn is_tail(self) -> bool {
        matches!(self, LeftTail | RightTail)
    }

    pub fn is_left_anchored(self) -> bool {
        matches!(self, Left | LeftTail)
    }

    pub fn is_right_anchored(self) -> bool {
        matches!(self, Right | RightTail)
    }

    /// Resolve the mode to a concrete removal given where the query aligned in view
    /// coordinates.
    ///
    /// `Any` removes the whole read if the query spans it on both ends, otherwise the
    /// side with the larger query overhang.
    pub fn resolve(
        self,
        read_start: usize,
        read_end: usize,
        query_start: usize,
        query_end: usize,
    ) -> Removal {
        match self {
            Left | LeftTail => Removal::Left,
            Right | RightTail => Removal::Right,
            Wun | LeftTails => Removal::Nothing,
            Any => {
                if query_start <= read_start && read_end <= query_end {
                    Removal::Everything
                } else if query_start as isize - read_start as isize
                    >= read_end as isize - query_end as isize
                {
                    Removal::Right
                } else {
                    Removal::Left
                }
            }
        }
    }
}

impl FromStr for TrimEnd {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ANY" => Ok(Any),
            "LEFT" => Ok(Left),
            "RIGHT" => Ok(Right),
            "LTAIL" => Ok(LeftTail),
            "RTAIL" => Ok(RightTail),
            "WUN" => Ok(Wun),
            "LTAILS" => Ok(LeftTails),
            _ => Err(Error::InvalidConfig {
                field: "trim_end",
                reason: format!("unknown trim-end mode \"{s}\""),
            }),
        }
    }
}

impl fmt::Display for TrimEnd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Any => "ANY",
            Left => "LEFT",
            Right => "RIGHT",
            LeftTail => "LTAIL",
            RightTail => "RTAIL",
            Wun => "WUN",
            LeftTails => "LTAILS",
        };
        f.write_str(s)
    }
}

/// Which alignment records are written to the alignment log.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum LogAlign {
    #[serde(rename = "NONE")]
    NoLog,
    /// Full block for every detection or removal, and for reads without a match.
    #[serde(rename = "ALL")]
    All,
    /// One tab-separated row per valid alignment.
    #[serde(rename = "TAB")]
    Tab,
    /// Full block for removals only.
    #[serde(rename = "MOD")]
    Mod,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum FileFormat {
    #[serde(rename = "FASTA")]
    Fasta,
    #[serde(rename = "FASTQ")]
    Fastq,
}

/// Scores for the alignment primitive.
///
/// A gap of length `k` costs `gap_open + (k - 1) * gap_extend`. A query `N` scores as a
/// match against any read base.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoringScheme {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl ScoringScheme {
    /// Linear gap costs.
    pub fn simple(match_score: i32, mismatch_score: i32, gap: i32) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap_open: gap,
            gap_extend: gap,
        }
    }

    #[inline(always)]
    pub fn score(&self, read_base: u8, query_base: u8) -> i32 {
        if query_base.eq_ignore_ascii_case(&b'N') || read_base.eq_ignore_ascii_case(&query_base) {
            self.match_score
        } else {
            self.mismatch_score
        }
    }

    pub fn gap(&self, len: usize) -> i32 {
        if len == 0 {
            0
        } else {
            self.gap_open + (len as i32 - 1) * self.gap_extend
        }
    }
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self::simple(1, -1, -6)
    }
}

/// Read-only configuration shared by every worker.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    pub trim_end: TrimEnd,
    /// Alignments with more than `error_rate * overlap / 10` errors are rejected.
    pub error_rate: f32,
    /// 0 means unset. Barcodes then have to match over their full length.
    pub min_overlap: usize,
    /// 0 means the query length.
    pub tail_length: usize,
    pub scoring: ScoringScheme,
    pub min_read_length: usize,
    pub strict_region: bool,
    pub random_tags: bool,
    pub removal_tags: bool,
    pub log_align: LogAlign,
    pub format: FileFormat,
    pub bundle_size: usize,
}

impl AlignOptions {
    pub fn adapter() -> Self {
        Self::default()
    }

    pub fn barcode() -> Self {
        Self {
            trim_end: LeftTail,
            min_overlap: 0,
            scoring: ScoringScheme::simple(1, -1, -9),
            ..Self::default()
        }
    }

    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        let options: Self = serde_yaml::from_slice(yaml).map_err(|e| Error::ParseConfig {
            context: "alignment options",
            source: Box::new(e),
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.error_rate) {
            return Err(Error::InvalidConfig {
                field: "error_rate",
                reason: format!("{} is not in [0, 1)", self.error_rate),
            });
        }

        if self.bundle_size == 0 {
            return Err(Error::InvalidConfig {
                field: "bundle_size",
                reason: "must be at least 1".to_owned(),
            });
        }

        if self.scoring.gap_open > 0 || self.scoring.gap_extend > 0 {
            return Err(Error::InvalidConfig {
                field: "scoring",
                reason: "gap scores must not be positive".to_owned(),
            });
        }

        if self.scoring.gap_open > self.scoring.gap_extend {
            return Err(Error::InvalidConfig {
                field: "scoring",
                reason: "opening a gap must not score higher than extending one".to_owned(),
            });
        }

        Ok(())
    }

    pub fn trims_quality(&self) -> bool {
        self.format == Fastq
    }
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            trim_end: Right,
            error_rate: 0.1,
            min_overlap: 3,
            tail_length: 0,
            scoring: ScoringScheme::default(),
            min_read_length: 18,
            strict_region: true,
            random_tags: false,
            removal_tags: false,
            log_align: NoLog,
            format: Fasta,
            bundle_size: 256,
        }
    }
}
