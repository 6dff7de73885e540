use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("no identifier given")]
    Empty,

    #[error("`{0}` is not a valid email address")]
    NotAnEmail(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load {}", path.display())]
    Ingest {
        path: PathBuf,
        #[source]
        source: IngestError,
    },

    #[error("loader task failed")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
