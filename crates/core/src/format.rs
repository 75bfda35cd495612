use crate::{
    error::{LyricsyncError, Result},
    types::{AlignedCue, MatchQuality},
};

/// Format seconds as a SubRip `H:MM:SS,mmm` timestamp.
///
/// Hours are not padded and never wrap. Sub-millisecond precision is
/// truncated, not rounded.
pub fn format_time(seconds: f64) -> Result<String> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(LyricsyncError::InvalidDuration { seconds });
    }

    let total_ms = truncate_millis(seconds);
    let millis = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs / 60) % 60;
    let secs = total_secs % 60;

    Ok(format!("{}:{:02}:{:02},{:03}", hours, mins, secs, millis))
}

/// Whole milliseconds in `seconds`, rounding down.
///
/// A product that lands a few ulps below an integer (1.001 * 1000 is
/// 1000.9999999999999) counts as that integer. The tolerance is relative, so
/// genuine sub-millisecond remainders are still dropped.
fn truncate_millis(seconds: f64) -> u64 {
    let scaled = seconds * 1000.0;
    let floor = scaled.floor();
    if floor + 1.0 - scaled <= scaled * f64::EPSILON * 4.0 {
        (floor + 1.0) as u64
    } else {
        floor as u64
    }
}

/// Parse a `H:MM:SS,mmm` timestamp back into seconds.
pub fn parse_time(text: &str) -> Result<f64> {
    let invalid = || LyricsyncError::invalid_input(format!("bad timestamp {:?}", text));

    let (clock, millis) = text.trim().split_once(',').ok_or_else(invalid)?;
    if millis.len() != 3 || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let field = |p: &str, max: Option<u64>| -> Result<u64> {
        if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u64 = p.parse().map_err(|_| invalid())?;
        match max {
            Some(max) if value >= max => Err(invalid()),
            _ => Ok(value),
        }
    };

    let hours = field(h, None)?;
    let mins = field(m, Some(60))?;
    let secs = field(s, Some(60))?;
    let millis = field(millis, None)?;

    let total_ms = ((hours * 60 + mins) * 60 + secs) * 1000 + millis;
    Ok(total_ms as f64 / 1000.0)
}

/// Human-readable listing of aligned cues, one per line, with the match
/// quality of each.
pub fn format_alignment_summary(cues: &[AlignedCue]) -> String {
    let mut output = String::new();

    for cue in cues {
        let start = format_time(cue.start).unwrap_or_else(|_| "?".to_string());
        let end = format_time(cue.end).unwrap_or_else(|_| "?".to_string());
        let quality = match cue.quality {
            MatchQuality::Positional => "positional".to_string(),
            MatchQuality::Similar { score } => format!("match {:.2}", score),
            MatchQuality::LowConfidence { score } => format!("LOW {:.2}", score),
            MatchQuality::Synthetic => "SYNTHETIC".to_string(),
        };
        output.push_str(&format!(
            "{:>4}. {} → {}  [{}]  {}\n",
            cue.sequence_number, start, end, quality, cue.text
        ));
    }

    let low = cues.iter().filter(|c| c.is_low_confidence()).count();
    if low > 0 {
        output.push_str(&format!(
            "\n{} of {} cues are low-confidence\n",
            low,
            cues.len()
        ));
    }

    output
}
