use std::path::PathBuf;

use thiserror::Error;

/// Central error type for the vocal-midi crate.
#[derive(Debug, Error)]
pub enum TranscribeError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Pipeline-specific variants
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} reported success but its output is missing: {}", path.display())]
    MissingArtifact { stage: &'static str, path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Audio decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("WAV write error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("MIDI parse error: {0}")]
    Midi(#[from] midly::Error),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tempfile::PersistError> for TranscribeError {
    fn from(e: tempfile::PersistError) -> Self {
        TranscribeError::Io(e.error)
    }
}

pub type Result<T> = std::result::Result<T, TranscribeError>;
