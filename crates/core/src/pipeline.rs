use std::path::{Path, PathBuf};

use tokio::{fs, process::Command};
use tracing::info;

use crate::{
    alignment::align,
    cache::get_model_dir,
    config::AlignConfig,
    error::{LyricsyncError, Result},
    provider::Backend,
    srt::render,
    transcription::{TranscriptionHints, TranscriptionProvider},
    types::{AlignedCue, LyricLine, Transcript},
};

/// Rendered subtitles together with the cues they came from.
#[derive(Debug, Clone)]
pub struct Subtitles {
    pub cues: Vec<AlignedCue>,
    pub text: String,
}

impl Subtitles {
    pub fn low_confidence_count(&self) -> usize {
        self.cues.iter().filter(|c| c.is_low_confidence()).count()
    }
}

/// Download a ggml whisper model into the cache unless it is already there.
pub async fn ensure_model(root_cache_dir: &Path, model_name: &str) -> Result<PathBuf> {
    let download_url = format!("{}/{}", Backend::Whisper.config().api_url, model_name);
    let model_dir = get_model_dir(root_cache_dir);

    if !model_dir.exists() {
        fs::create_dir_all(&model_dir).await?;
    }

    let model_path = model_dir.join(model_name);
    if !model_path.exists() {
        info!(url = %download_url, "downloading whisper model");
        let partial = model_dir.join(format!("{}.part", model_name));
        let output = Command::new("curl")
            .arg("-fL")
            .arg(&download_url)
            .arg("-o")
            .arg(&partial)
            .output()
            .await?;

        if !output.status.success() {
            let _ = fs::remove_file(&partial).await;
            return Err(LyricsyncError::ModelDownloadFailed {
                url: download_url,
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        fs::rename(&partial, &model_path).await?;
    }

    Ok(model_path)
}

/// Convert any audio ffmpeg understands to 16 kHz mono 16-bit PCM WAV
pub async fn extract_audio(input_path: &Path, wav_path: &Path) -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(input_path)
        .arg("-vn")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg(wav_path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(LyricsyncError::AudioExtractionFailed {
            audio_path: input_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Load a transcript from a cached file
pub async fn load_transcript(path: &Path) -> Result<Transcript> {
    let json_content = fs::read_to_string(path).await?;
    let transcript: Transcript = serde_json::from_str(&json_content)?;
    Ok(transcript)
}

/// Save a transcript to a file
pub async fn save_transcript(transcript: &Transcript, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let pretty_json = serde_json::to_string_pretty(transcript)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

/// Transcribe `audio_path`, reusing the transcript at `transcript_path` when
/// present and `force` is not set.
pub async fn transcribe_cached(
    provider: &dyn TranscriptionProvider,
    audio_path: &Path,
    transcript_path: &Path,
    hints: &TranscriptionHints,
    force: bool,
) -> Result<Transcript> {
    if !force && transcript_path.exists() {
        info!(path = %transcript_path.display(), "using cached transcript");
        return load_transcript(transcript_path).await;
    }

    info!(provider = provider.name(), audio = %audio_path.display(), "transcribing");
    let transcript = provider.transcribe(audio_path, hints).await?;
    save_transcript(&transcript, transcript_path).await?;
    Ok(transcript)
}

/// Align the transcript against the lyrics and render SubRip text.
pub fn build_subtitles(
    transcript: &Transcript,
    lyrics: &[LyricLine],
    config: &AlignConfig,
) -> Result<Subtitles> {
    let cues = align(&transcript.segments, lyrics, config)?;
    let text = render(&cues)?;
    Ok(Subtitles { cues, text })
}

/// Write rendered subtitles, creating the parent directory if needed.
pub async fn write_subtitles(subtitles: &Subtitles, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, &subtitles.text).await?;
    Ok(())
}
