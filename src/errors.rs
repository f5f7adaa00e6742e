use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a single engine operation.
///
/// Per-row patch conflicts are not errors; they are collected as
/// [`crate::patch::Conflict`] values and the run continues without those rows.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("dictionary {source_file} has {groups} duplicated key(s); see {}", report.display())]
    DuplicateDetected {
        source_file: PathBuf,
        groups: usize,
        report: PathBuf,
    },

    #[error("patch table {path} has {found} column(s), expected at least 3 (Offset, Value, Bytes)")]
    MissingColumn { path: PathBuf, found: usize },

    #[error("patch write [{offset}, {offset}+{len}) exceeds content of length {content_len}")]
    OutOfRange {
        offset: u64,
        len: usize,
        content_len: usize,
    },

    #[error("cannot decode {path} as {encoding}")]
    EncodingFailure { path: PathBuf, encoding: String },

    #[error("unknown text encoding label '{0}'")]
    UnknownEncoding(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("table error in {path}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no keyword matcher could be built: {0}")]
    Matcher(#[from] crate::substitute::MatcherError),

    #[error("no valid patch rows in {0}")]
    NoValidPatches(PathBuf),

    #[error("no data source found in {0} (expected dictionary.csv, dictionary.txt or patch_data.csv)")]
    NoDataSource(PathBuf),

    #[error("unsupported data source {0}: expected a .csv or .txt file")]
    UnsupportedSource(PathBuf),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn table(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        EngineError::Table {
            path: path.into(),
            source,
        }
    }

    /// True for the one failure a caller recovers from by fixing the source and retrying.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, EngineError::DuplicateDetected { .. })
    }
}
