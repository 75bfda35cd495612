use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use indicatif::ProgressBar;
use lyricsync_core::{
    AlignConfig, Backend, Result, Subtitles, TranscriptionHints, TranscriptionProvider,
    build_subtitles, cache::get_cache_dir_in, extract_audio, get_transcript_path, get_wav_path,
    read_lyrics, transcribe_cached, write_subtitles,
};
use tokio::fs;

/// One song to subtitle.
#[derive(Debug, Clone)]
pub struct SongJob {
    pub audio: PathBuf,
    pub lyrics: PathBuf,
    pub output: PathBuf,
    pub hints: TranscriptionHints,
    /// Prime the recognizer with the reference lyrics when no prompt is set.
    pub prompt_with_lyrics: bool,
}

/// Shared, read-only state for every job of a run.
pub struct JobContext {
    pub backend: Backend,
    /// Model the provider runs; part of the transcript cache key.
    pub model: String,
    pub provider: Arc<dyn TranscriptionProvider>,
    pub root_cache_dir: PathBuf,
    pub align: AlignConfig,
    pub force: bool,
}

pub fn default_output_path(audio: &Path) -> PathBuf {
    audio.with_extension("srt")
}

/// Transcribe (or reuse the cached transcript), align and write the SRT file.
pub async fn run_song(job: &SongJob, ctx: &JobContext, progress: &ProgressBar) -> Result<Subtitles> {
    let cache_dir = get_cache_dir_in(&ctx.root_cache_dir, &job.audio);
    fs::create_dir_all(&cache_dir).await?;

    progress.set_message(format!("{}: reading lyrics", job_label(job)));
    let lyrics = read_lyrics(&job.lyrics).await?;

    let mut hints = job.hints.clone();
    if job.prompt_with_lyrics && hints.prompt.is_none() {
        hints.prompt = Some(
            lyrics
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    let audio = if ctx.backend.needs_wav() {
        let wav_path = get_wav_path(&cache_dir);
        if ctx.force || !wav_path.exists() {
            progress.set_message(format!("{}: converting audio", job_label(job)));
            extract_audio(&job.audio, &wav_path).await?;
        }
        wav_path
    } else {
        job.audio.clone()
    };

    progress.set_message(format!(
        "{}: transcribing with {}",
        job_label(job),
        ctx.provider.name()
    ));
    let transcript_path = get_transcript_path(&cache_dir, &ctx.backend, &ctx.model, &hints);
    let transcript = transcribe_cached(
        ctx.provider.as_ref(),
        &audio,
        &transcript_path,
        &hints,
        ctx.force,
    )
    .await?;

    progress.set_message(format!("{}: aligning", job_label(job)));
    let subtitles = build_subtitles(&transcript, &lyrics, &ctx.align)?;
    write_subtitles(&subtitles, &job.output).await?;

    Ok(subtitles)
}

pub fn job_label(job: &SongJob) -> String {
    job.audio
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| job.audio.display().to_string())
}
