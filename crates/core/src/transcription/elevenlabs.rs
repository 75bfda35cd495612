use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::fs;
use tracing::info;

use crate::{
    error::{LyricsyncError, Result},
    transcription::{TranscriptionHints, TranscriptionProvider, audio_mime_type, http_client},
    types::{Transcript, TranscriptSegment},
};

const NAME: &str = "ElevenLabs";

/// Silence between two words that starts a new segment.
pub const DEFAULT_PAUSE_SECS: f64 = 0.8;

/// ElevenLabs speech-to-text. The API reports word timestamps; words are
/// grouped into segments at pauses so that segments resemble sung lines.
pub struct ElevenLabsProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    pause_secs: f64,
}

#[derive(Debug, Deserialize)]
struct SpeechToTextResponse {
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(rename = "type", default = "default_word_kind")]
    pub kind: String,
}

fn default_word_kind() -> String {
    "word".to_string()
}

impl ElevenLabsProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(NAME)?,
            api_key: api_key.into(),
            api_url: api_url.into(),
            model: model.into(),
            pause_secs: DEFAULT_PAUSE_SECS,
        })
    }

    pub fn with_pause(mut self, pause_secs: f64) -> Self {
        self.pause_secs = pause_secs;
        self
    }
}

/// Merge consecutive spoken words into segments, splitting wherever the gap
/// to the previous word is at least `pause_secs`. Spacing and audio-event
/// entries are ignored.
pub fn group_words(words: &[Word], pause_secs: f64) -> Vec<TranscriptSegment> {
    let mut segments: Vec<TranscriptSegment> = Vec::new();

    for word in words.iter().filter(|w| w.kind == "word") {
        let text = word.text.trim();
        if text.is_empty() {
            continue;
        }

        match segments.last_mut() {
            Some(current) if word.start - current.end < pause_secs => {
                current.text.push(' ');
                current.text.push_str(text);
                current.end = current.end.max(word.end);
            }
            _ => segments.push(TranscriptSegment::new(word.start, word.end, text)),
        }
    }

    segments
}

#[async_trait]
impl TranscriptionProvider for ElevenLabsProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
        hints: &TranscriptionHints,
    ) -> Result<Transcript> {
        let audio = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        let file = Part::bytes(audio)
            .file_name(file_name)
            .mime_str(audio_mime_type(audio_path))
            .map_err(|e| LyricsyncError::provider(NAME, e))?;

        let mut form = Form::new()
            .text("model_id", self.model.clone())
            .text("timestamps_granularity", "word")
            .part("file", file);
        if let Some(language) = &hints.language {
            form = form.text("language_code", language.clone());
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LyricsyncError::provider(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LyricsyncError::provider(
                NAME,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let body: SpeechToTextResponse = response
            .json()
            .await
            .map_err(|e| LyricsyncError::provider(NAME, e))?;

        let segments = group_words(&body.words, self.pause_secs);
        let language = hints
            .language
            .clone()
            .or(body.language_code)
            .unwrap_or_else(|| "unknown".to_string());

        info!(
            words = body.words.len(),
            segments = segments.len(),
            %language,
            "elevenlabs transcription finished"
        );
        Ok(Transcript::from_segments(segments, language))
    }
}
