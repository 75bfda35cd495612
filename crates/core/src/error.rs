use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LyricsyncError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Invalid duration {seconds}: must be finite and non-negative")]
    InvalidDuration { seconds: f64 },

    #[error("Malformed subtitle at line {line}: {reason}")]
    InvalidSubtitle { line: usize, reason: String },

    #[error("Transcription with {provider} failed: {reason}")]
    ProviderFailed {
        provider: &'static str,
        reason: String,
    },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Audio extraction failed for {audio_path}: {reason}")]
    AudioExtractionFailed { audio_path: PathBuf, reason: String },

    #[error("Model download failed for {url}: {reason}")]
    ModelDownloadFailed { url: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

impl LyricsyncError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn provider(provider: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ProviderFailed {
            provider,
            reason: err.to_string(),
        }
    }

    /// True for failures owned by the transcription collaborator, as opposed
    /// to malformed segment or lyric data.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderFailed { .. } | Self::MissingApiKey { .. } | Self::ApiError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LyricsyncError>;
