use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use lyricsync_core::{
    AlignConfig, Backend, Subtitles, TranscriptionHints, build_subtitles, ensure_model,
    format_alignment_summary, get_root_cache_dir, load_transcript, read_lyrics, write_subtitles,
};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    job::{JobContext, SongJob, default_output_path, job_label, run_song},
    manifest::Manifest,
};

mod job;
mod manifest;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Backend enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliBackend {
    #[default]
    Whisper,
    Deepgram,
    Elevenlabs,
}

impl From<CliBackend> for Backend {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Whisper => Backend::Whisper,
            CliBackend::Deepgram => Backend::Deepgram,
            CliBackend::Elevenlabs => Backend::Elevenlabs,
        }
    }
}

#[derive(Parser)]
#[command(name = "lyricsync")]
#[command(about = "Transcribe songs and align the timestamps with reference lyrics into SRT subtitles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe an audio file and align it with its lyrics
    Align {
        /// Audio file (anything ffmpeg can read)
        audio: PathBuf,

        /// Lyrics file, one line per subtitle
        lyrics: PathBuf,

        /// Output SRT path. Defaults to the audio path with an .srt extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        transcription: TranscriptionArgs,

        #[command(flatten)]
        align: AlignArgs,
    },

    /// Align an existing transcript JSON with lyrics, no transcription
    Realign {
        /// Transcript JSON as written to the cache
        transcript: PathBuf,

        /// Lyrics file, one line per subtitle
        lyrics: PathBuf,

        /// Output SRT path. Defaults to the transcript path with an .srt extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        align: AlignArgs,
    },

    /// Subtitle every song listed in a JSON manifest
    Batch {
        /// Manifest with a `songs` array of {audio, lyrics, output?, language?, prompt?}
        manifest: PathBuf,

        /// Songs processed at the same time
        #[arg(short, long, default_value_t = 2)]
        jobs: usize,

        #[command(flatten)]
        transcription: TranscriptionArgs,

        #[command(flatten)]
        align: AlignArgs,
    },
}

#[derive(Args, Clone)]
struct TranscriptionArgs {
    /// Transcription backend
    #[arg(short, long, default_value = "whisper")]
    backend: CliBackend,

    /// Spoken language (e.g., "te", "en"). Detected when omitted.
    #[arg(short, long)]
    lang: Option<String>,

    /// Free text to prime the recognizer with
    #[arg(long, conflicts_with = "prompt_with_lyrics")]
    prompt: Option<String>,

    /// Prime the recognizer with the reference lyrics
    #[arg(long)]
    prompt_with_lyrics: bool,

    /// Whisper ggml model file name
    #[arg(long, default_value = "ggml-medium-q5_0.bin")]
    model: String,

    /// Force re-processing even if cached files exist
    #[arg(short, long)]
    force: bool,
}

impl TranscriptionArgs {
    fn hints(&self) -> TranscriptionHints {
        TranscriptionHints {
            language: self.lang.clone(),
            prompt: self.prompt.clone(),
        }
    }
}

#[derive(Args, Clone)]
struct AlignArgs {
    /// Minimum similarity for a recovered match to be trusted
    #[arg(long)]
    threshold: Option<f64>,

    /// Largest segment/lyric count difference paired line-for-line
    #[arg(long)]
    tolerance: Option<usize>,

    /// Seconds given to synthetic cues and zero-length segments
    #[arg(long)]
    min_duration: Option<f64>,
}

impl AlignArgs {
    /// Flags given on the command line win over `base`.
    fn apply(&self, base: AlignConfig) -> Result<AlignConfig> {
        let config = AlignConfig {
            acceptance_threshold: self.threshold.unwrap_or(base.acceptance_threshold),
            count_tolerance: self.tolerance.unwrap_or(base.count_tolerance),
            min_duration: self.min_duration.unwrap_or(base.min_duration),
        };
        config.validate()?;
        Ok(config)
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

extern "C" fn whisper_log_callback(
    _level: u32,
    _message: *const std::ffi::c_char,
    _user_data: *mut std::ffi::c_void,
) {
    // silent
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lyricsync=warn,lyricsync_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_banner() {
    println!(
        "\n{}  {}\n",
        style("lyricsync").cyan().bold(),
        style("Lyrics Aligner").dim()
    );
}

fn print_result(subtitles: &Subtitles, output: &Path, elapsed: Duration) {
    let low = subtitles.low_confidence_count();
    let confidence = if low == 0 {
        style("all cues matched".to_string()).green()
    } else {
        style(format!("{} low-confidence", low)).yellow()
    };
    println!(
        "{} {} cues, {} {}",
        style("✓").green().bold(),
        subtitles.cues.len(),
        confidence,
        style(format!("[{}]", format_duration(elapsed))).dim()
    );
    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(output.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_alignment_summary(&subtitles.cues));
}

/// Resolve the whisper model when needed and build the transcription context.
async fn prepare_context(
    transcription: &TranscriptionArgs,
    align: AlignConfig,
) -> Result<JobContext> {
    let backend: Backend = transcription.backend.into();
    let root_cache_dir = get_root_cache_dir();

    let model_path = if backend == Backend::Whisper {
        unsafe {
            whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
        }
        println!("{} Checking model...", style("✓").green().bold());
        Some(ensure_model(&root_cache_dir, &transcription.model).await?)
    } else {
        None
    };

    let provider = backend.build(model_path)?;
    let model = match backend {
        Backend::Whisper => transcription.model.clone(),
        _ => backend.config().model.to_string(),
    };

    Ok(JobContext {
        backend,
        model,
        provider: Arc::from(provider),
        root_cache_dir,
        align,
        force: transcription.force,
    })
}

async fn run_align(
    audio: PathBuf,
    lyrics: PathBuf,
    output: Option<PathBuf>,
    transcription: TranscriptionArgs,
    align: AlignArgs,
) -> Result<()> {
    let config = align.apply(AlignConfig::default())?;
    print_banner();
    let ctx = prepare_context(&transcription, config).await?;
    println!("{}", style("─".repeat(60)).dim());

    let job = SongJob {
        output: output.unwrap_or_else(|| default_output_path(&audio)),
        audio,
        lyrics,
        hints: transcription.hints(),
        prompt_with_lyrics: transcription.prompt_with_lyrics,
    };

    let start = Instant::now();
    let spinner = create_spinner(&format!("{}: starting", job_label(&job)));
    let result = run_song(&job, &ctx, &spinner).await;
    spinner.finish_and_clear();

    let subtitles = result.with_context(|| format!("subtitling {}", job.audio.display()))?;
    print_result(&subtitles, &job.output, start.elapsed());
    Ok(())
}

async fn run_realign(
    transcript: PathBuf,
    lyrics: PathBuf,
    output: Option<PathBuf>,
    align: AlignArgs,
) -> Result<()> {
    let config = align.apply(AlignConfig::default())?;
    let start = Instant::now();

    let transcript_data = load_transcript(&transcript)
        .await
        .with_context(|| format!("loading transcript {}", transcript.display()))?;
    let lyric_lines = read_lyrics(&lyrics)
        .await
        .with_context(|| format!("reading lyrics {}", lyrics.display()))?;

    let subtitles = build_subtitles(&transcript_data, &lyric_lines, &config)?;
    let output = output.unwrap_or_else(|| transcript.with_extension("srt"));
    write_subtitles(&subtitles, &output).await?;

    print_result(&subtitles, &output, start.elapsed());
    Ok(())
}

async fn run_batch(
    manifest_path: PathBuf,
    jobs: usize,
    transcription: TranscriptionArgs,
    align: AlignArgs,
) -> Result<()> {
    let manifest = Manifest::load(&manifest_path).await?;
    let config = align.apply(manifest.align.clone().unwrap_or_default())?;
    let base_dir = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let songs = manifest.into_jobs(
        &base_dir,
        &transcription.hints(),
        transcription.prompt_with_lyrics,
    );

    print_banner();
    let ctx = Arc::new(prepare_context(&transcription, config).await?);
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();
    let limit = Arc::new(Semaphore::new(jobs.max(1)));
    let bars = MultiProgress::new();
    let mut set = JoinSet::new();

    for song in songs {
        let ctx = Arc::clone(&ctx);
        let limit = Arc::clone(&limit);
        let bar = bars.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        bar.set_message(format!("{}: queued", job_label(&song)));
        bar.enable_steady_tick(Duration::from_millis(80));

        set.spawn(async move {
            let _permit = limit.acquire_owned().await;
            let start = Instant::now();
            let result = run_song(&song, &ctx, &bar).await;
            match &result {
                Ok(subtitles) => bar.finish_with_message(format!(
                    "{} {} → {} ({} cues, {} low-confidence) {}",
                    style("✓").green().bold(),
                    job_label(&song),
                    song.output.display(),
                    subtitles.cues.len(),
                    subtitles.low_confidence_count(),
                    style(format!("[{}]", format_duration(start.elapsed()))).dim()
                )),
                Err(e) => bar.finish_with_message(format!(
                    "{} {}: {}",
                    style("✗").red().bold(),
                    job_label(&song),
                    e
                )),
            }
            result.is_ok()
        });
    }

    let mut succeeded = 0;
    let mut failed = 0;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(true) => succeeded += 1,
            Ok(false) => failed += 1,
            Err(e) => {
                tracing::error!(error = %e, "batch task panicked");
                failed += 1;
            }
        }
    }

    println!(
        "\n{} {} succeeded, {} failed in {}\n",
        style("Batch:").dim(),
        style(succeeded).green().bold(),
        style(failed).red().bold(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    if failed > 0 {
        anyhow::bail!("{} of {} songs failed", failed, succeeded + failed);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Align {
            audio,
            lyrics,
            output,
            transcription,
            align,
        } => run_align(audio, lyrics, output, transcription, align).await,
        Command::Realign {
            transcript,
            lyrics,
            output,
            align,
        } => run_realign(transcript, lyrics, output, align).await,
        Command::Batch {
            manifest,
            jobs,
            transcription,
            align,
        } => run_batch(manifest, jobs, transcription, align).await,
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_align_flags() {
        let cli = Cli::try_parse_from([
            "lyricsync",
            "align",
            "song.mp3",
            "song.txt",
            "-b",
            "deepgram",
            "-l",
            "te",
            "--threshold",
            "0.45",
        ])
        .unwrap();

        let Command::Align {
            transcription,
            align,
            ..
        } = cli.command
        else {
            panic!("expected align");
        };
        assert_eq!(Backend::from(transcription.backend), Backend::Deepgram);
        assert_eq!(transcription.hints().language.as_deref(), Some("te"));
        let config = align.apply(AlignConfig::default()).unwrap();
        assert_eq!(config.acceptance_threshold, 0.45);
        assert_eq!(config.min_duration, AlignConfig::DEFAULT_MIN_DURATION);
    }

    #[test]
    fn flags_override_manifest_config() {
        let args = AlignArgs {
            threshold: None,
            tolerance: Some(0),
            min_duration: None,
        };
        let base = AlignConfig {
            acceptance_threshold: 0.6,
            ..AlignConfig::default()
        };

        let config = args.apply(base).unwrap();

        assert_eq!(config.acceptance_threshold, 0.6);
        assert_eq!(config.count_tolerance, 0);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let args = AlignArgs {
            threshold: Some(2.0),
            tolerance: None,
            min_duration: None,
        };
        assert!(args.apply(AlignConfig::default()).is_err());
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
