use std::path::Path;

use tokio::fs;

use crate::{error::Result, types::LyricLine};

/// Split reference lyrics into trimmed, non-empty lines, indexed in order.
pub fn parse_lyrics(text: &str) -> Vec<LyricLine> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| LyricLine::new(index, line))
        .collect()
}

/// Read a UTF-8 lyrics file
pub async fn read_lyrics(path: &Path) -> Result<Vec<LyricLine>> {
    let text = fs::read_to_string(path).await?;
    Ok(parse_lyrics(text.trim_start_matches('\u{feff}')))
}
