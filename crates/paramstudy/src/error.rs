use std::path::PathBuf;

use paramstudy_core::{CorruptStudyError, StudyError};

/// Errors raised while generating, reading or writing a parameter study
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Study(#[from] StudyError),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("previous study {} does not exist", .0.display())]
    MissingPreviousStudy(PathBuf),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<CorruptStudyError> for Error {
    fn from(err: CorruptStudyError) -> Self {
        Error::Study(err.into())
    }
}

impl From<paramstudy_core::SchemaError> for Error {
    fn from(err: paramstudy_core::SchemaError) -> Self {
        Error::Study(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
