use thiserror::Error;

/// Why a page component could not load its content.
///
/// Every variant is recovered where it happens and shown inline; none of them
/// take the surrounding page down.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid content path: {0}")]
    InvalidPath(String),

    #[error("Failed to load {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load {path}: HTTP {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to load {path}: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
}
