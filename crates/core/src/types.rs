use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub language: String,
}

impl Transcript {
    pub fn from_segments(segments: Vec<TranscriptSegment>, language: impl Into<String>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            segments,
            language: language.into(),
        }
    }

    /// End time of the last segment, in seconds.
    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }
}

/// One timed utterance as reported by a transcription provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// A reference lyric line with its 0-based position in the lyrics source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    pub text: String,
    pub index: usize,
}

impl LyricLine {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            index,
        }
    }
}

/// How a cue obtained its timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchQuality {
    /// Paired index-for-index because the counts agreed.
    Positional,
    /// Best forward match at or above the acceptance threshold.
    Similar { score: f64 },
    /// Nothing scored above the threshold; took the next unmatched segment.
    LowConfidence { score: f64 },
    /// Segments ran out; timing was synthesized after the last match.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedCue {
    pub sequence_number: usize,
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub quality: MatchQuality,
}

impl AlignedCue {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_low_confidence(&self) -> bool {
        matches!(
            self.quality,
            MatchQuality::LowConfidence { .. } | MatchQuality::Synthetic
        )
    }
}

/// A block read back from a SubRip file.
#[derive(Debug, Clone, PartialEq)]
pub struct SrtEntry {
    pub sequence_number: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}
