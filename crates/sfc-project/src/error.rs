use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by project loading and snapshot construction.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project configuration at {path}")]
    Config {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
