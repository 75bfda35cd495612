use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};

use crate::{
    error::{LyricsyncError, Result},
    transcription::{TranscriptionHints, TranscriptionProvider, audio_mime_type, http_client},
    types::{Transcript, TranscriptSegment},
};

const NAME: &str = "Deepgram";

/// Deepgram pre-recorded transcription; one segment per detected utterance.
pub struct DeepgramProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    utterances: Vec<Utterance>,
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Utterance {
    start: f64,
    end: f64,
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    detected_language: Option<String>,
}

impl DeepgramProvider {
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
        })
    }

    fn query(&self, hints: &TranscriptionHints) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("model", self.model.clone()),
            ("smart_format", "true".to_string()),
            ("utterances", "true".to_string()),
            ("punctuate", "true".to_string()),
        ];
        match &hints.language {
            Some(language) => query.push(("language", language.clone())),
            None => query.push(("detect_language", "true".to_string())),
        }
        query
    }
}

fn into_transcript(response: ListenResponse, hints: &TranscriptionHints) -> Transcript {
    let language = hints
        .language
        .clone()
        .or_else(|| {
            response
                .results
                .channels
                .iter()
                .find_map(|c| c.detected_language.clone())
        })
        .unwrap_or_else(|| "unknown".to_string());

    let segments = response
        .results
        .utterances
        .into_iter()
        .map(|u| TranscriptSegment::new(u.start, u.end, u.transcript))
        .collect();

    Transcript::from_segments(segments, language)
}

#[async_trait]
impl TranscriptionProvider for DeepgramProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
        hints: &TranscriptionHints,
    ) -> Result<Transcript> {
        let audio = fs::read(audio_path).await?;
        if hints.prompt.is_some() {
            debug!("deepgram does not take a free-text prompt, ignoring it");
        }

        let response = self
            .client
            .post(&self.api_url)
            .query(&self.query(hints))
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", audio_mime_type(audio_path))
            .body(audio)
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

        let body: ListenResponse = response
            .json()
            .await
            .map_err(|e| LyricsyncError::provider(NAME, e))?;

        let transcript = into_transcript(body, hints);
        info!(
            segments = transcript.segments.len(),
            language = %transcript.language,
            "deepgram transcription finished"
        );
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metadata": {"request_id": "abc"},
        "results": {
            "channels": [{"detected_language": "te", "alternatives": []}],
            "utterances": [
                {"start": 0.48, "end": 3.2, "confidence": 0.9, "channel": 0, "transcript": "first line", "words": []},
                {"start": 3.9, "end": 6.25, "confidence": 0.8, "channel": 0, "transcript": "second line", "words": []}
            ]
        }
    }"#;

    #[test]
    fn utterances_become_segments() {
        let response: ListenResponse = serde_json::from_str(SAMPLE).unwrap();

        let transcript = into_transcript(response, &TranscriptionHints::default());

        assert_eq!(transcript.language, "te");
        assert_eq!(
            transcript.segments,
            vec![
                TranscriptSegment::new(0.48, 3.2, "first line"),
                TranscriptSegment::new(3.9, 6.25, "second line"),
            ]
        );
        assert_eq!(transcript.text, "first line second line");
    }

    #[test]
    fn language_hint_wins_over_detection() {
        let response: ListenResponse = serde_json::from_str(SAMPLE).unwrap();
        let hints = TranscriptionHints {
            language: Some("en".into()),
            prompt: None,
        };

        assert_eq!(into_transcript(response, &hints).language, "en");
    }

    #[test]
    fn missing_utterances_yield_empty_transcript() {
        let response: ListenResponse = serde_json::from_str(r#"{"results": {}}"#).unwrap();

        let transcript = into_transcript(response, &TranscriptionHints::default());

        assert!(transcript.segments.is_empty());
        assert_eq!(transcript.language, "unknown");
    }

    #[test]
    fn query_requests_utterances() {
        let provider = DeepgramProvider::new("key", "http://localhost", "nova-3").unwrap();

        let query = provider.query(&TranscriptionHints::default());

        assert!(query.contains(&("utterances", "true".to_string())));
        assert!(query.contains(&("model", "nova-3".to_string())));
        assert!(query.contains(&("detect_language", "true".to_string())));
    }
}
