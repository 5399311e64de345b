use thiserror;

use crate::batch::BatchPhase;

pub type Result<T> = std::result::Result<T, Error>;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error reading or writing \"{file}\": {source}")]
    FileIo { file: String, source: BoxedError },

    #[error("Error parsing record in \"{file}\": {source}")]
    ParseRecord { file: String, source: BoxedError },

    #[error("Error parsing {context}: {source}")]
    ParseConfig {
        context: &'static str,
        source: BoxedError,
    },

    #[error("Invalid value for \"{field}\": {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Invalid query \"{id}\": {reason}")]
    InvalidQuery { id: String, reason: &'static str },

    #[error("Cannot {operation} while the alignment batch is {phase}")]
    BatchPhase {
        operation: &'static str,
        phase: BatchPhase,
    },

    #[error("Alignment batch cursor {cursor} is out of range for {len} staged jobs")]
    BatchCursor { cursor: usize, len: usize },

    #[error(
        "Alignment batch out of sync at job {cursor}: expected read {expected_read} and query {expected_query}, \
         found read {found_read} and query {found_query}"
    )]
    BatchDesync {
        cursor: usize,
        expected_read: usize,
        expected_query: usize,
        found_read: usize,
        found_query: usize,
    },

    #[error("Alignment job {cursor} refers to query {query_idx}, but only {len} queries are loaded")]
    BatchQuery {
        cursor: usize,
        query_idx: usize,
        len: usize,
    },

    #[error("Alignment batch finished with {consumed} of {len} jobs consumed")]
    BatchIncomplete { consumed: usize, len: usize },

    #[error("Error writing alignment log: {0}")]
    LogIo(#[source] std::io::Error),
}

pub fn utf8(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}
