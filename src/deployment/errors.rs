use crate::classifier::ClassLoadError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Deployment source not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid archive {path}: {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    #[error("Deployment {name} has no source location")]
    NoSource { name: String },

    #[error("Deployment {name} cannot {operation} while {phase}")]
    InvalidPhase {
        name: String,
        phase: String,
        operation: &'static str,
    },

    #[error("Deployment {name} is missing {missing:?}")]
    NotPrepared {
        name: String,
        missing: Vec<&'static str>,
    },

    #[error(transparent)]
    ClassLoad(#[from] ClassLoadError),
}

pub type DeploymentResult<T> = Result<T, DeploymentError>;
