use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data file not found: {0}")]
    NotFound(String),

    #[error("Invalid data file name: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Core(#[from] cograph_core::Error),

    #[error("Cache error: {0:#}")]
    Cache(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
