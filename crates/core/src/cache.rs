use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use crate::{provider::Backend, transcription::TranscriptionHints};

/// Get the cache directory for a given audio file
pub fn get_cache_dir(audio_path: &Path) -> PathBuf {
    get_cache_dir_in(&get_root_cache_dir(), audio_path)
}

pub fn get_cache_dir_in(root: &Path, audio_path: &Path) -> PathBuf {
    let key = std::fs::canonicalize(audio_path).unwrap_or_else(|_| audio_path.to_path_buf());
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let path_hash = hasher.finish();

    root.join(path_hash.to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("lyricsync")
}

pub fn get_model_dir(root_cache_dir: &Path) -> PathBuf {
    root_cache_dir.join("models")
}

/// Get the path for the converted 16 kHz mono audio
pub fn get_wav_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("audio.wav")
}

/// Get the path for a cached transcript.
///
/// The file name carries the backend and a fingerprint of the model and the
/// recognition hints, so changing any of them transcribes again.
pub fn get_transcript_path(
    cache_dir: &Path,
    backend: &Backend,
    model: &str,
    hints: &TranscriptionHints,
) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    hints.language.hash(&mut hasher);
    hints.prompt.hash(&mut hasher);

    cache_dir.join(format!(
        "transcript_{}_{:016x}.json",
        backend.slug(),
        hasher.finish()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_audio_maps_to_same_dir() {
        let root = Path::new("/cache");
        let a = get_cache_dir_in(root, Path::new("/music/song.mp3"));
        let b = get_cache_dir_in(root, Path::new("/music/song.mp3"));
        let c = get_cache_dir_in(root, Path::new("/music/other.mp3"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with(root));
    }

    #[test]
    fn transcript_path_is_backend_specific() {
        let dir = Path::new("/cache/123");
        let hints = TranscriptionHints::default();

        let path = get_transcript_path(dir, &Backend::Deepgram, "nova-3", &hints);
        assert!(path.starts_with(dir));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("transcript_deepgram_"));
        assert!(name.ends_with(".json"));

        assert_ne!(
            get_transcript_path(dir, &Backend::Whisper, "m", &hints),
            get_transcript_path(dir, &Backend::Elevenlabs, "m", &hints)
        );
    }

    #[test]
    fn transcript_path_follows_model_and_hints() {
        let dir = Path::new("/cache/123");
        let base = TranscriptionHints::default();
        let telugu = TranscriptionHints {
            language: Some("te".into()),
            prompt: None,
        };
        let prompted = TranscriptionHints {
            language: None,
            prompt: Some("bilvashtakam".into()),
        };
        let path = |model: &str, hints: &TranscriptionHints| {
            get_transcript_path(dir, &Backend::Whisper, model, hints)
        };

        assert_eq!(path("ggml-medium-q5_0.bin", &base), path("ggml-medium-q5_0.bin", &base));
        assert_ne!(path("ggml-medium-q5_0.bin", &base), path("ggml-small.bin", &base));
        assert_ne!(path("ggml-medium-q5_0.bin", &base), path("ggml-medium-q5_0.bin", &telugu));
        assert_ne!(path("ggml-medium-q5_0.bin", &base), path("ggml-medium-q5_0.bin", &prompted));
    }
}
