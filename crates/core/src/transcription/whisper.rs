use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::{
    error::{LyricsyncError, Result},
    transcription::{TranscriptionHints, TranscriptionProvider},
    types::{Transcript, TranscriptSegment},
};

const NAME: &str = "Whisper";
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Local whisper.cpp transcription. Expects 16 kHz mono 16-bit WAV input.
pub struct WhisperProvider {
    model_path: PathBuf,
}

impl WhisperProvider {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for WhisperProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
        hints: &TranscriptionHints,
    ) -> Result<Transcript> {
        let model_path = self.model_path.clone();
        let audio_path = audio_path.to_path_buf();
        let hints = hints.clone();

        // inference is CPU/GPU bound, keep it off the async workers
        tokio::task::spawn_blocking(move || run_whisper(&model_path, &audio_path, &hints))
            .await
            .map_err(|e| LyricsyncError::provider(NAME, e))?
    }
}

fn read_samples(audio_path: &Path) -> Result<Vec<f32>> {
    let mut reader =
        hound::WavReader::open(audio_path).map_err(|e| LyricsyncError::provider(NAME, e))?;

    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != SAMPLE_RATE_HZ || spec.bits_per_sample != 16 {
        return Err(LyricsyncError::provider(
            NAME,
            format!(
                "expected 16 kHz mono 16-bit WAV, got {} Hz, {} channel(s), {} bit",
                spec.sample_rate, spec.channels, spec.bits_per_sample
            ),
        ));
    }

    reader
        .samples::<i16>()
        .map(|s| s.map(|s| s as f32 / i16::MAX as f32))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| LyricsyncError::provider(NAME, e))
}

fn run_whisper(
    model_path: &Path,
    audio_path: &Path,
    hints: &TranscriptionHints,
) -> Result<Transcript> {
    let samples = read_samples(audio_path)?;
    debug!(samples = samples.len(), "loaded wav samples");

    let model_path_str = model_path
        .to_str()
        .ok_or_else(|| LyricsyncError::provider(NAME, "model path is not valid UTF-8"))?;

    let ctx_params = WhisperContextParameters {
        use_gpu: true,
        flash_attn: true,
        ..Default::default()
    };
    let ctx = WhisperContext::new_with_params(model_path_str, ctx_params)
        .map_err(|e| LyricsyncError::provider(NAME, e))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 5 });
    params.set_print_progress(false);
    params.set_print_realtime(false);
    if let Some(language) = hints.language.as_deref() {
        params.set_language(Some(language));
    }
    if let Some(prompt) = hints.prompt.as_deref() {
        params.set_initial_prompt(prompt);
    }

    let mut state = ctx
        .create_state()
        .map_err(|e| LyricsyncError::provider(NAME, e))?;
    state
        .full(params, &samples)
        .map_err(|e| LyricsyncError::provider(NAME, e))?;

    let mut segments: Vec<TranscriptSegment> = Vec::new();
    for segment in state.as_iter() {
        let seg_text = match segment.to_str() {
            Ok(s) => s,
            Err(_) => continue,
        };
        // whisper timestamps are in centiseconds
        segments.push(TranscriptSegment::new(
            segment.start_timestamp() as f64 / 100.0,
            segment.end_timestamp() as f64 / 100.0,
            seg_text,
        ));
    }

    let language = match hints.language.clone() {
        Some(language) => language,
        None => {
            let language_index = state.full_lang_id_from_state();
            whisper_rs::get_lang_str(language_index)
                .unwrap_or("unknown")
                .to_string()
        }
    };

    info!(segments = segments.len(), %language, "whisper transcription finished");
    Ok(Transcript::from_segments(segments, language))
}
