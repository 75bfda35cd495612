use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lyricsync_core::{AlignConfig, TranscriptionHints};
use serde::Deserialize;

use crate::job::{SongJob, default_output_path};

/// Batch manifest: a list of songs plus optional shared alignment settings.
///
/// ```json
/// {
///   "align": { "acceptance_threshold": 0.4 },
///   "songs": [
///     { "audio": "bilvashtakam.mp3", "lyrics": "bilvashtakam.txt", "language": "te" }
///   ]
/// }
/// ```
///
/// Relative paths resolve against the manifest's directory.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub align: Option<AlignConfig>,
    pub songs: Vec<ManifestSong>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestSong {
    pub audio: PathBuf,
    pub lyrics: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl Manifest {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading manifest {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing manifest {}", path.display()))
    }

    /// Turn manifest entries into jobs. Song-level language/prompt override
    /// the command line defaults in `hints`.
    pub fn into_jobs(
        self,
        base_dir: &Path,
        hints: &TranscriptionHints,
        prompt_with_lyrics: bool,
    ) -> Vec<SongJob> {
        self.songs
            .into_iter()
            .map(|song| {
                let audio = base_dir.join(song.audio);
                let output = song
                    .output
                    .map(|o| base_dir.join(o))
                    .unwrap_or_else(|| default_output_path(&audio));
                SongJob {
                    lyrics: base_dir.join(song.lyrics),
                    output,
                    hints: TranscriptionHints {
                        language: song.language.or_else(|| hints.language.clone()),
                        prompt: song.prompt.or_else(|| hints.prompt.clone()),
                    },
                    prompt_with_lyrics,
                    audio,
                }
            })
            .collect()
    }
}
