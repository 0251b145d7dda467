//! Error types for the transcoder control plane

use thiserror::Error;

/// Main error type for the daemon
#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Control transport errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Socket bind failed: {0}")]
    BindFailed(String),
}

/// Per-stream resource errors
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("No vocoder channel available")]
    NoVocoderAvailable,

    #[error("Failed to bind stream port {port}: {reason}")]
    PortBindFailed { port: u16, reason: String },

    #[error("Failed to start stream worker: {0}")]
    WorkerSpawnFailed(String),
}

/// Result type alias for the daemon
pub type Result<T> = std::result::Result<T, Error>;
