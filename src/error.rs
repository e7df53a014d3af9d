use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every way extracting an interface can fail. None of them are retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("{file}:{line}:{column}: {message}")]
    Unsupported {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("{file}: imported package collision: {name:?} imported twice")]
    ImportCollision { file: String, name: String },

    #[error("not found interface {name}")]
    NotFound { name: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
