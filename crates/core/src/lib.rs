//! Lyricsync Core Library
//!
//! Aligns speech transcription timestamps with reference lyrics and renders
//! the result as SubRip subtitles.

pub mod alignment;
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod lyrics;
pub mod pipeline;
pub mod provider;
pub mod similarity;
pub mod srt;
pub mod transcription;
pub mod types;

// Re-export commonly used items at crate root
pub use alignment::align;
pub use cache::{get_cache_dir, get_root_cache_dir, get_transcript_path, get_wav_path};
pub use config::AlignConfig;
pub use error::{LyricsyncError, Result};
pub use format::{format_alignment_summary, format_time, parse_time};
pub use lyrics::{parse_lyrics, read_lyrics};
pub use pipeline::{
    Subtitles, build_subtitles, ensure_model, extract_audio, load_transcript, save_transcript,
    transcribe_cached, write_subtitles,
};
pub use provider::{Backend, BackendConfig};
pub use similarity::similarity;
pub use transcription::{TranscriptionHints, TranscriptionProvider};
pub use types::{AlignedCue, LyricLine, MatchQuality, SrtEntry, Transcript, TranscriptSegment};
