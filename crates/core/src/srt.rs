use crate::{
    error::{LyricsyncError, Result},
    format::{format_time, parse_time},
    types::{AlignedCue, SrtEntry},
};

/// Render cues as SubRip text: counter, `START --> END`, text, blank line.
pub fn render(cues: &[AlignedCue]) -> Result<String> {
    let mut output = String::new();

    for cue in cues {
        let start = format_time(cue.start)?;
        let end = format_time(cue.end)?;
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.sequence_number, start, end, cue.text
        ));
    }

    Ok(output)
}

/// Parse SubRip text back into entries.
///
/// Accepts `\r\n` line endings, runs of blank lines between blocks, and cue
/// text spanning several lines (joined with `\n`).
pub fn parse(text: &str) -> Result<Vec<SrtEntry>> {
    let mut entries = Vec::new();
    let mut lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .enumerate()
        .peekable();

    loop {
        // skip separators
        while lines.next_if(|(_, l)| l.trim().is_empty()).is_some() {}

        let Some((counter_idx, counter)) = lines.next() else {
            break;
        };
        let sequence_number: usize =
            counter
                .trim()
                .trim_start_matches('\u{feff}')
                .parse()
                .map_err(|_| LyricsyncError::InvalidSubtitle {
                    line: counter_idx + 1,
                    reason: format!("expected a cue counter, got {:?}", counter),
                })?;

        let Some((timing_idx, timing)) = lines.next() else {
            return Err(LyricsyncError::InvalidSubtitle {
                line: counter_idx + 2,
                reason: "missing timing line".to_string(),
            });
        };
        let (start, end) = parse_timing(timing).map_err(|reason| {
            LyricsyncError::InvalidSubtitle {
                line: timing_idx + 1,
                reason,
            }
        })?;

        let mut body = Vec::new();
        while let Some((_, line)) = lines.next_if(|(_, l)| !l.trim().is_empty()) {
            body.push(line);
        }

        entries.push(SrtEntry {
            sequence_number,
            start,
            end,
            text: body.join("\n"),
        });
    }

    Ok(entries)
}

fn parse_timing(line: &str) -> std::result::Result<(f64, f64), String> {
    let (start, end) = line
        .split_once("-->")
        .ok_or_else(|| format!("expected `START --> END`, got {:?}", line))?;
    let start = parse_time(start).map_err(|e| e.to_string())?;
    let end = parse_time(end).map_err(|e| e.to_string())?;
    Ok((start, end))
}
