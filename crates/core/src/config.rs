use serde::{Deserialize, Serialize};

use crate::error::{LyricsyncError, Result};

/// Tunables for the alignment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Largest segment/lyric count difference still paired index-for-index.
    pub count_tolerance: usize,
    /// Minimum similarity for a recovery-path match to be trusted.
    pub acceptance_threshold: f64,
    /// Duration in seconds given to synthetic cues and to degenerate ones.
    pub min_duration: f64,
}

impl AlignConfig {
    pub const DEFAULT_COUNT_TOLERANCE: usize = 1;
    pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.3;
    pub const DEFAULT_MIN_DURATION: f64 = 1.0;

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(LyricsyncError::invalid_input(format!(
                "acceptance_threshold must be within [0, 1], got {}",
                self.acceptance_threshold
            )));
        }
        if !self.min_duration.is_finite() || self.min_duration <= 0.0 {
            return Err(LyricsyncError::invalid_input(format!(
                "min_duration must be a positive number of seconds, got {}",
                self.min_duration
            )));
        }
        Ok(())
    }
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            count_tolerance: Self::DEFAULT_COUNT_TOLERANCE,
            acceptance_threshold: Self::DEFAULT_ACCEPTANCE_THRESHOLD,
            min_duration: Self::DEFAULT_MIN_DURATION,
        }
    }
}
