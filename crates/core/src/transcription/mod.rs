//! Transcription providers.
//!
//! Every backend turns an audio file into an ordered list of timed segments;
//! the aligner never needs to know which one produced them.

pub mod deepgram;
pub mod elevenlabs;
pub mod whisper;

use std::{path::Path, time::Duration};

use async_trait::async_trait;

use crate::{
    error::{LyricsyncError, Result},
    types::Transcript,
};

pub use deepgram::DeepgramProvider;
pub use elevenlabs::ElevenLabsProvider;
pub use whisper::WhisperProvider;

/// Optional recognition hints passed through to the backend.
#[derive(Debug, Clone, Default)]
pub struct TranscriptionHints {
    /// ISO-639-1 code such as `te` or `en`.
    pub language: Option<String>,
    /// Free text that primes the recognizer, e.g. the expected lyrics.
    pub prompt: Option<String>,
}

#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transcribe(&self, audio_path: &Path, hints: &TranscriptionHints)
    -> Result<Transcript>;
}

/// Upper bound for one hosted transcription request, upload included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

pub(crate) fn http_client(provider: &'static str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| LyricsyncError::provider(provider, e))
}

pub(crate) fn audio_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "opus" => "audio/ogg",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}
