use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The engine executable could not be launched.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("engine executable not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to spawn engine {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SpawnError {
    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            SpawnError::NotFound { path }
        } else {
            SpawnError::Io { path, source }
        }
    }
}
