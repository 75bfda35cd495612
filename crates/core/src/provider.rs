use std::path::PathBuf;

use crate::{
    error::{LyricsyncError, Result},
    transcription::{
        DeepgramProvider, ElevenLabsProvider, TranscriptionProvider, WhisperProvider,
    },
};

/// Transcription backend selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Whisper,
    Deepgram,
    Elevenlabs,
}

pub struct BackendConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: Option<&'static str>,
}

impl Backend {
    pub fn config(&self) -> BackendConfig {
        match self {
            Backend::Whisper => BackendConfig {
                api_url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main",
                model: "ggml-medium-q5_0.bin",
                env_var: None,
            },
            Backend::Deepgram => BackendConfig {
                api_url: "https://api.deepgram.com/v1/listen",
                model: "nova-3",
                env_var: Some("DEEPGRAM_API_KEY"),
            },
            Backend::Elevenlabs => BackendConfig {
                api_url: "https://api.elevenlabs.io/v1/speech-to-text",
                model: "scribe_v1",
                env_var: Some("ELEVENLABS_API_KEY"),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Whisper => "Whisper",
            Backend::Deepgram => "Deepgram",
            Backend::Elevenlabs => "ElevenLabs",
        }
    }

    /// Short lowercase identifier used in cache file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Backend::Whisper => "whisper",
            Backend::Deepgram => "deepgram",
            Backend::Elevenlabs => "elevenlabs",
        }
    }

    /// Whether the backend wants 16 kHz mono WAV rather than the original file.
    pub fn needs_wav(&self) -> bool {
        matches!(self, Backend::Whisper)
    }

    /// Validate that the API key is set for this backend. Local backends
    /// need none and return `None`.
    pub fn validate_api_key(&self) -> Result<Option<String>> {
        let Some(env_var) = self.config().env_var else {
            return Ok(None);
        };
        std::env::var(env_var)
            .map(Some)
            .map_err(|_| LyricsyncError::MissingApiKey {
                env_var: env_var.to_string(),
            })
    }

    /// Build a provider. `model_path` is required for Whisper and ignored by
    /// the hosted backends.
    pub fn build(&self, model_path: Option<PathBuf>) -> Result<Box<dyn TranscriptionProvider>> {
        let config = self.config();
        match self {
            Backend::Whisper => {
                let model_path = model_path.ok_or_else(|| {
                    LyricsyncError::provider(self.name(), "no whisper model path given")
                })?;
                Ok(Box::new(WhisperProvider::new(model_path)))
            }
            Backend::Deepgram => {
                let api_key = self.validate_api_key()?.unwrap_or_default();
                Ok(Box::new(DeepgramProvider::new(api_key, config.api_url, config.model)?))
            }
            Backend::Elevenlabs => {
                let api_key = self.validate_api_key()?.unwrap_or_default();
                Ok(Box::new(ElevenLabsProvider::new(
                    api_key,
                    config.api_url,
                    config.model,
                )?))
            }
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = LyricsyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "whisper" => Ok(Backend::Whisper),
            "deepgram" => Ok(Backend::Deepgram),
            "elevenlabs" | "eleven-labs" => Ok(Backend::Elevenlabs),
            other => Err(LyricsyncError::invalid_input(format!(
                "unknown transcription backend {:?}",
                other
            ))),
        }
    }
}
