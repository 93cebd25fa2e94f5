use shared::MapFormatError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to load map {}: {source}", .path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: MapFormatError,
    },

    #[error("no maps configured")]
    NoMaps,

    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
