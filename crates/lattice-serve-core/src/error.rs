//! Error types for the decoding service

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the decoding service
#[derive(Error, Debug)]
pub enum Error {
    // Model loading errors (fatal at startup)
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // Per-request decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    // Audio errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Model resource errors
///
/// Every variant is unrecoverable at startup: the service cannot run without
/// its core model artifacts.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Missing required model artifact: {0}")]
    MissingArtifact(String),

    #[error("Model load error: {0}")]
    Load(String),

    #[error("Symbol table error: {0}")]
    SymbolTable(String),
}

/// Per-request decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid session state: expected {expected}, was {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Failed to extract final lattice: {0}")]
    LatticeExtraction(String),

    #[error("Engine error: {0}")]
    Engine(String),
}

/// Audio sample errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Invalid PCM payload: {0}")]
    InvalidPcm(String),

    #[error("Unsupported sample rate: {0}")]
    UnsupportedSampleRate(u32),
}

impl Error {
    /// Create a generic error from a string
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
