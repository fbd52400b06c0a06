use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A catalog record that could not be read. The record is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line where the record starts.
    pub line: usize,
    pub reason: String,
    /// The record's lines as read, so the text is not lost.
    pub record: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("text at {path} is not valid {encoding}")]
    Decode { path: String, encoding: String },

    #[error("unknown encoding {0:?}")]
    UnknownEncoding(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {reason}", path.display())]
    Dump { path: PathBuf, reason: String },

    #[error("config: {0}")]
    Config(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
