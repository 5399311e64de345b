use lazy_static::lazy_static;
use needletail::parse_fastx_reader;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::*;

lazy_static! {
    pub static ref COMPLEMENT: [u8; 256] = {
        let mut comp = [0; 256];

        for (v, a) in comp.iter_mut().enumerate() {
            *a = v as u8;
        }

        // IUPAC DNA alphabet
        for (&a, &b) in b"AGCTYRWSKMDVHBN".iter().zip(b"TCGARYWSMKHBDVN".iter()) {
            comp[a as usize] = b; // upper case
            comp[a as usize + 32] = b + 32; // lower case
        }

        comp
    };
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&c| COMPLEMENT[c as usize]).collect()
}

pub const REVCOMP_SUFFIX: &str = " revcomp";

/// One barcode or adapter with its removal counters.
#[derive(Debug)]
pub struct QueryEntry {
    id: String,
    seq: Vec<u8>,
    removals: AtomicU64,
    full_removals: AtomicU64,
}

impl QueryEntry {
    fn new(id: String, seq: Vec<u8>) -> Self {
        Self {
            id,
            seq,
            removals: AtomicU64::new(0),
            full_removals: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Times this query was selected and removed.
    pub fn removals(&self) -> u64 {
        self.removals.load(Ordering::Relaxed)
    }

    /// Removals where the overlap spanned the whole query.
    pub fn full_removals(&self) -> u64 {
        self.full_removals.load(Ordering::Relaxed)
    }

    pub(crate) fn record_removal(&self, full_overlap: bool) {
        self.removals.fetch_add(1, Ordering::Relaxed);

        if full_overlap {
            self.full_removals.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Deserialize)]
struct QueryListYaml {
    patterns: Vec<QueryYaml>,
}

#[derive(Deserialize)]
struct QueryYaml {
    pattern: String,
    id: Option<String>,
}

/// Ordered set of queries. Order decides ties between equally scoring queries.
#[derive(Debug)]
pub struct QuerySet {
    entries: Vec<QueryEntry>,
    by_id: FxHashMap<String, usize>,
}

impl QuerySet {
    /// Sequences are uppercased.
    pub fn new(queries: Vec<(String, Vec<u8>)>) -> Result<Self> {
        if queries.is_empty() {
            return Err(Error::InvalidQuery {
                id: String::new(),
                reason: "query set is empty",
            });
        }

        let entries = queries
            .into_iter()
            .map(|(id, mut seq)| {
                if seq.is_empty() {
                    return Err(Error::InvalidQuery {
                        id,
                        reason: "sequence is empty",
                    });
                }

                seq.make_ascii_uppercase();
                Ok(QueryEntry::new(id, seq))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::index(entries))
    }

    // the first query with a given id wins lookups
    fn index(entries: Vec<QueryEntry>) -> Self {
        let mut by_id = FxHashMap::default();

        for (i, q) in entries.iter().enumerate() {
            by_id.entry(q.id.clone()).or_insert(i);
        }

        Self { entries, by_id }
    }

    /// Load a pattern list:
    /// ```yaml
    /// name: adapters
    /// patterns:
    ///   - pattern: AGATCGGAAGAGC
    ///     id: truseq
    ///   - pattern: CTGTCTCTTATA
    /// ```
    /// Patterns without an `id` are named by their sequence.
    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        let list: QueryListYaml = serde_yaml::from_slice(yaml).map_err(|e| Error::ParseConfig {
            context: "query list",
            source: Box::new(e),
        })?;

        Self::new(
            list.patterns
                .into_iter()
                .map(|p| (p.id.unwrap_or_else(|| p.pattern.clone()), p.pattern.into_bytes()))
                .collect(),
        )
    }

    /// Load queries from a FASTA or FASTQ file.
    pub fn from_fasta(file: impl AsRef<Path>) -> Result<Self> {
        let file = file.as_ref();
        let bytes = std::fs::read(file).map_err(|e| Error::FileIo {
            file: file.display().to_string(),
            source: Box::new(e),
        })?;

        Self::parse_fastx(&bytes, &file.display().to_string())
    }

    pub fn from_fasta_bytes(bytes: &[u8]) -> Result<Self> {
        Self::parse_fastx(bytes, "bytes")
    }

    fn parse_fastx(bytes: &[u8], file: &str) -> Result<Self> {
        let mut reader = parse_fastx_reader(Cursor::new(bytes.to_owned())).map_err(|e| Error::ParseRecord {
            file: file.to_owned(),
            source: Box::new(e),
        })?;

        let mut queries = Vec::new();

        while let Some(record) = reader.next() {
            let record = record.map_err(|e| Error::ParseRecord {
                file: file.to_owned(),
                source: Box::new(e),
            })?;
            queries.push((utf8(record.id()), record.seq().into_owned()));
        }

        Self::new(queries)
    }

    /// Append the reverse complement of every query, named `"<id> revcomp"`.
    pub fn with_reverse_complements(self) -> Self {
        let rc = self
            .entries
            .iter()
            .map(|q| QueryEntry::new(format!("{}{REVCOMP_SUFFIX}", q.id), revcomp(&q.seq)))
            .collect::<Vec<_>>();

        let mut entries = self.entries;
        entries.extend(rc);
        Self::index(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryEntry> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&QueryEntry> {
        self.entries.get(idx)
    }

    /// Index of the query named `id`, as used by [`QuerySet::get()`].
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Tab-separated removal counts per query, one line each.
    pub fn removal_table(&self) -> String {
        let mut res = String::from("id\tremoved\tfull_length\n");

        for q in &self.entries {
            let _ = writeln!(res, "{}\t{}\t{}", q.id, q.removals(), q.full_removals());
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_pattern_list() {
        let yaml = b"
            name: adapters
            patterns:
              - pattern: acgt
                id: first
              - pattern: TTGG
        ";
        let queries = QuerySet::from_yaml(yaml).unwrap();

        assert_eq!(queries.len(), 2);
        assert_eq!(queries.get(0).unwrap().id(), "first");
        assert_eq!(queries.get(0).unwrap().seq(), b"ACGT");
        assert_eq!(queries.get(1).unwrap().id(), "TTGG");
    }

    #[test]
    fn loads_fasta() {
        let queries = QuerySet::from_fasta_bytes(b">bc1\nACGT\n>bc2\nGGCC\n").unwrap();

        assert_eq!(queries.len(), 2);
        assert_eq!(queries.get(1).unwrap().id(), "bc2");
        assert_eq!(queries.get(1).unwrap().seq(), b"GGCC");
    }

    #[test]
    fn rejects_empty_queries() {
        assert!(QuerySet::new(Vec::new()).is_err());
        assert!(matches!(
            QuerySet::new(vec![("x".to_owned(), Vec::new())]),
            Err(Error::InvalidQuery { reason: "sequence is empty", .. })
        ));
    }

    #[test]
    fn appends_reverse_complements() {
        let queries = QuerySet::new(vec![("a".to_owned(), b"AACGN".to_vec())])
            .unwrap()
            .with_reverse_complements();

        assert_eq!(queries.len(), 2);
        assert_eq!(queries.get(1).unwrap().id(), "a revcomp");
        assert_eq!(queries.get(1).unwrap().seq(), b"NCGTT");
        assert_eq!(queries.position("a revcomp"), Some(1));
    }

    #[test]
    fn looks_up_by_id() {
        let queries = QuerySet::from_fasta_bytes(b">bc1\nACGT\n>bc2\nGGCC\n>bc1\nTTTT\n").unwrap();

        assert_eq!(queries.position("bc1"), Some(0));
        assert_eq!(queries.position("bc2"), Some(1));
        assert_eq!(queries.position("bc3"), None);
    }

    #[test]
    fn counts_removals() {
        let queries = QuerySet::new(vec![("a".to_owned(), b"ACGT".to_vec())]).unwrap();
        let q = queries.get(0).unwrap();

        q.record_removal(true);
        q.record_removal(false);

        assert_eq!(q.removals(), 2);
        assert_eq!(q.full_removals(), 1);
        assert_eq!(queries.removal_table(), "id\tremoved\tfull_length\na\t2\t1\n");
    }
}
