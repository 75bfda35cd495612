//! Lyrics-to-timestamp alignment.
//!
//! Maps reference lyric lines onto recognizer segments. When the counts
//! roughly agree the lines are paired index-for-index; otherwise each line
//! searches forward for its most similar segment. Lyric lines are never
//! dropped: lines left over once the segments run out receive synthetic
//! timing after the last match.

use tracing::{debug, warn};

use crate::{
    config::AlignConfig,
    error::{LyricsyncError, Result},
    similarity::similarity,
    types::{AlignedCue, LyricLine, MatchQuality, TranscriptSegment},
};

#[derive(Debug, Clone, Copy)]
struct SegmentMatch {
    segment: usize,
    quality: MatchQuality,
}

/// Align `lyrics` against `segments`, producing exactly one cue per lyric
/// line in lyric order.
///
/// Fails only on structurally invalid input: a segment with `start > end`,
/// a non-finite timestamp, or a blank lyric line.
pub fn align(
    segments: &[TranscriptSegment],
    lyrics: &[LyricLine],
    config: &AlignConfig,
) -> Result<Vec<AlignedCue>> {
    config.validate()?;
    let segments = prepare_segments(segments)?;
    validate_lyrics(lyrics)?;

    if lyrics.is_empty() {
        return Ok(Vec::new());
    }

    let matches = if segments.len().abs_diff(lyrics.len()) <= config.count_tolerance {
        debug!(
            segments = segments.len(),
            lyrics = lyrics.len(),
            "counts agree, pairing positionally"
        );
        pair_positionally(segments.len(), lyrics.len())
    } else {
        debug!(
            segments = segments.len(),
            lyrics = lyrics.len(),
            "count mismatch, matching by similarity"
        );
        match_by_similarity(&segments, lyrics, config)
    };

    let cues = build_cues(&segments, lyrics, &matches, config);

    let low = cues.iter().filter(|c| c.is_low_confidence()).count();
    if low > 0 {
        warn!(low, total = cues.len(), "alignment contains low-confidence cues");
    }

    Ok(cues)
}

fn prepare_segments(segments: &[TranscriptSegment]) -> Result<Vec<TranscriptSegment>> {
    let mut prepared = Vec::with_capacity(segments.len());

    for (i, seg) in segments.iter().enumerate() {
        if !seg.start.is_finite() || !seg.end.is_finite() {
            return Err(LyricsyncError::invalid_input(format!(
                "segment {} has a non-finite timestamp ({}, {})",
                i, seg.start, seg.end
            )));
        }
        if seg.start > seg.end {
            return Err(LyricsyncError::invalid_input(format!(
                "segment {} starts after it ends ({} > {})",
                i, seg.start, seg.end
            )));
        }

        let mut seg = seg.clone();
        if seg.start < 0.0 {
            warn!(segment = i, start = seg.start, "clamping negative timestamp to 0");
            seg.start = 0.0;
            seg.end = seg.end.max(0.0);
        }
        prepared.push(seg);
    }

    if !prepared.is_sorted_by(|a, b| a.start <= b.start) {
        warn!("segments are not ordered by start time, reordering");
        prepared.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    Ok(prepared)
}

fn validate_lyrics(lyrics: &[LyricLine]) -> Result<()> {
    if !lyrics.is_empty() && lyrics.iter().all(|l| l.text.trim().is_empty()) {
        return Err(LyricsyncError::invalid_input(
            "lyrics contain only whitespace",
        ));
    }
    if let Some(blank) = lyrics.iter().find(|l| l.text.trim().is_empty()) {
        return Err(LyricsyncError::invalid_input(format!(
            "lyric line {} is blank",
            blank.index
        )));
    }
    Ok(())
}

fn pair_positionally(segment_count: usize, lyric_count: usize) -> Vec<Option<SegmentMatch>> {
    (0..lyric_count)
        .map(|i| {
            (i < segment_count).then_some(SegmentMatch {
                segment: i,
                quality: MatchQuality::Positional,
            })
        })
        .collect()
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Greedy forward search. `segments` must be sorted by start time.
fn match_by_similarity(
    segments: &[TranscriptSegment],
    lyrics: &[LyricLine],
    config: &AlignConfig,
) -> Vec<Option<SegmentMatch>> {
    let normalized: Vec<String> = segments.iter().map(|s| normalize(&s.text)).collect();
    let mut matches = Vec::with_capacity(lyrics.len());
    let mut cursor = 0;
    let mut prev_end = f64::NEG_INFINITY;

    for (k, lyric) in lyrics.iter().enumerate() {
        if cursor >= segments.len() {
            matches.push(None);
            continue;
        }

        // leave one segment for every following line while there are enough,
        // otherwise every remaining segment is a candidate
        let following = lyrics.len() - k - 1;
        let last = if segments.len() - cursor > following {
            segments.len() - following - 1
        } else {
            segments.len() - 1
        };

        let target = normalize(&lyric.text);
        let mut best: Option<(usize, f64)> = None;
        for idx in cursor..=last {
            if segments[idx].start < prev_end {
                continue;
            }
            let score = similarity(&normalized[idx], &target);
            // strict comparison keeps the earliest segment on ties
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((idx, score));
            }
        }

        let chosen = match best {
            Some((idx, score)) if score >= config.acceptance_threshold => {
                debug!(line = lyric.index, segment = idx, score, "matched by similarity");
                SegmentMatch {
                    segment: idx,
                    quality: MatchQuality::Similar { score },
                }
            }
            _ => {
                let score = similarity(&normalized[cursor], &target);
                warn!(
                    line = lyric.index,
                    segment = cursor,
                    score,
                    "no segment above threshold, falling back to next segment"
                );
                SegmentMatch {
                    segment: cursor,
                    quality: MatchQuality::LowConfidence { score },
                }
            }
        };

        cursor = chosen.segment + 1;
        prev_end = segments[chosen.segment].end;
        matches.push(Some(chosen));
    }

    matches
}

fn build_cues(
    segments: &[TranscriptSegment],
    lyrics: &[LyricLine],
    matches: &[Option<SegmentMatch>],
    config: &AlignConfig,
) -> Vec<AlignedCue> {
    let mut cues: Vec<AlignedCue> = Vec::with_capacity(lyrics.len());

    for (lyric, matched) in lyrics.iter().zip(matches) {
        let (start, mut end, quality) = match matched {
            Some(m) => {
                let seg = &segments[m.segment];
                (seg.start, seg.end, m.quality)
            }
            None => {
                let anchor = cues.last().map(|c| c.end).unwrap_or(0.0);
                debug!(line = lyric.index, anchor, "segments exhausted, synthesizing cue");
                (anchor, anchor + config.min_duration, MatchQuality::Synthetic)
            }
        };

        if end <= start {
            end = start + config.min_duration;
        }

        cues.push(AlignedCue {
            sequence_number: cues.len() + 1,
            text: lyric.text.clone(),
            start,
            end,
            quality,
        });
    }

    cues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    fn lines(texts: &[&str]) -> Vec<LyricLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| LyricLine::new(i, *t))
            .collect()
    }

    fn spans(cues: &[AlignedCue]) -> Vec<(usize, &str, f64, f64)> {
        cues.iter()
            .map(|c| (c.sequence_number, c.text.as_str(), c.start, c.end))
            .collect()
    }

    #[test]
    fn equal_counts_pair_in_order() {
        let segments = vec![seg(0.0, 2.0, "a"), seg(2.0, 4.0, "b")];
        let lyrics = lines(&["Line One", "Line Two"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!(
            spans(&cues),
            vec![(1, "Line One", 0.0, 2.0), (2, "Line Two", 2.0, 4.0)]
        );
        assert!(cues.iter().all(|c| c.quality == MatchQuality::Positional));
    }

    #[test]
    fn one_extra_segment_stays_on_fast_path() {
        let segments = vec![seg(0.0, 1.0, "a"), seg(1.0, 2.0, "b"), seg(2.0, 3.0, "c")];
        let lyrics = lines(&["x", "y"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!(spans(&cues), vec![(1, "x", 0.0, 1.0), (2, "y", 1.0, 2.0)]);
    }

    #[test]
    fn one_missing_segment_gets_synthetic_tail() {
        let segments = vec![seg(0.0, 1.5, "a")];
        let lyrics = lines(&["x", "y"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!(spans(&cues), vec![(1, "x", 0.0, 1.5), (2, "y", 1.5, 2.5)]);
        assert_eq!(cues[1].quality, MatchQuality::Synthetic);
    }

    #[test]
    fn more_lyrics_than_segments() {
        let segments = vec![seg(0.0, 3.0, "x")];
        let lyrics = lines(&["first", "second", "third"]);
        let cfg = AlignConfig::default();

        let cues = align(&segments, &lyrics, &cfg).unwrap();

        assert_eq!(cues.len(), 3);
        assert_eq!((cues[0].start, cues[0].end), (0.0, 3.0));
        assert!(matches!(cues[0].quality, MatchQuality::LowConfidence { .. }));
        for cue in &cues[1..] {
            assert_eq!(cue.quality, MatchQuality::Synthetic);
            assert!(cue.duration() >= cfg.min_duration);
        }
        assert!(cues.windows(2).all(|w| w[0].start <= w[1].start));
        assert_eq!((cues[1].start, cues[2].start), (3.0, 4.0));
    }

    #[test]
    fn short_transcript_still_searches_ahead() {
        let segments = vec![
            seg(0.0, 2.0, "instrumental noise"),
            seg(10.0, 13.0, "hello there my friend"),
        ];
        let lyrics = lines(&["hello there my friend", "second", "third", "fourth"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!(
            spans(&cues),
            vec![
                (1, "hello there my friend", 10.0, 13.0),
                (2, "second", 13.0, 14.0),
                (3, "third", 14.0, 15.0),
                (4, "fourth", 15.0, 16.0),
            ]
        );
        assert!(matches!(cues[0].quality, MatchQuality::Similar { .. }));
        assert!(cues[1..].iter().all(|c| c.quality == MatchQuality::Synthetic));
    }

    #[test]
    fn empty_segments_yield_spaced_synthetic_cues() {
        let lyrics = lines(&["one", "two"]);
        let cfg = AlignConfig::default();

        let cues = align(&[], &lyrics, &cfg).unwrap();

        assert_eq!(spans(&cues), vec![(1, "one", 0.0, 1.0), (2, "two", 1.0, 2.0)]);
        assert!(cues.iter().all(|c| c.quality == MatchQuality::Synthetic));
    }

    #[test]
    fn empty_lyrics_yield_nothing() {
        let segments = vec![seg(0.0, 1.0, "a")];
        let cues = align(&segments, &[], &AlignConfig::default()).unwrap();
        assert!(cues.is_empty());
    }

    #[test]
    fn recovery_skips_noise_segments() {
        let segments = vec![
            seg(0.0, 2.0, "intro music"),
            seg(2.0, 5.0, " Twinkle twinkle little star"),
            seg(5.0, 5.5, "uh"),
            seg(6.0, 9.0, " how I wonder what you are"),
            seg(9.0, 10.0, "applause"),
        ];
        let lyrics = lines(&["Twinkle twinkle little star", "How I wonder what you are"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!(
            spans(&cues),
            vec![
                (1, "Twinkle twinkle little star", 2.0, 5.0),
                (2, "How I wonder what you are", 6.0, 9.0),
            ]
        );
        assert!(cues
            .iter()
            .all(|c| matches!(c.quality, MatchQuality::Similar { .. })));
    }

    #[test]
    fn ties_prefer_earliest_segment() {
        let segments = vec![
            seg(0.0, 1.0, "la la"),
            seg(1.0, 2.0, "la la"),
            seg(2.0, 3.0, "la la"),
            seg(3.0, 4.0, "end"),
        ];
        let lyrics = lines(&["la la", "end"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!(spans(&cues), vec![(1, "la la", 0.0, 1.0), (2, "end", 3.0, 4.0)]);
    }

    #[test]
    fn never_matches_a_segment_overlapping_the_previous_match() {
        let segments = vec![
            seg(0.0, 4.0, "hello world"),
            seg(3.0, 5.0, "goodbye"),
            seg(5.0, 6.0, "noise"),
            seg(6.0, 7.0, "goodbye"),
        ];
        let lyrics = lines(&["hello world", "goodbye"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!((cues[1].start, cues[1].end), (6.0, 7.0));
    }

    #[test]
    fn poor_similarity_falls_back_positionally() {
        let segments = vec![
            seg(0.0, 1.0, "zzz"),
            seg(1.0, 2.0, "qqq"),
            seg(2.0, 3.0, "www"),
            seg(3.0, 4.0, "vvv"),
        ];
        let lyrics = lines(&["alpha", "beta"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!(spans(&cues), vec![(1, "alpha", 0.0, 1.0), (2, "beta", 1.0, 2.0)]);
        assert!(cues.iter().all(|c| c.is_low_confidence()));
        assert_eq!(cues[0].quality, MatchQuality::LowConfidence { score: 0.0 });
    }

    #[test]
    fn zero_threshold_accepts_best_candidate() {
        let segments = vec![
            seg(0.0, 1.0, "zzz"),
            seg(1.0, 2.0, "alphx"),
            seg(2.0, 3.0, "www"),
            seg(3.0, 4.0, "vvv"),
        ];
        let lyrics = lines(&["alpha", "vvv"]);
        let cfg = AlignConfig {
            acceptance_threshold: 0.0,
            ..AlignConfig::default()
        };

        let cues = align(&segments, &lyrics, &cfg).unwrap();

        assert_eq!((cues[0].start, cues[1].start), (1.0, 3.0));
        assert!(cues.iter().all(|c| !c.is_low_confidence()));
    }

    #[test]
    fn duplicate_lines_are_matched_independently() {
        let segments = vec![
            seg(0.0, 1.0, "chorus"),
            seg(1.0, 2.0, "breath"),
            seg(2.0, 3.0, "chorus"),
            seg(3.0, 4.0, "breath"),
            seg(4.0, 5.0, "outro"),
        ];
        let lyrics = lines(&["Chorus", "Chorus"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!((cues[0].start, cues[1].start), (0.0, 2.0));
    }

    #[test]
    fn out_of_order_segments_are_reordered() {
        let segments = vec![seg(2.0, 4.0, "b"), seg(0.0, 2.0, "a")];
        let lyrics = lines(&["first", "second"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!(spans(&cues), vec![(1, "first", 0.0, 2.0), (2, "second", 2.0, 4.0)]);
    }

    #[test]
    fn degenerate_duration_is_extended() {
        let segments = vec![seg(1.0, 1.0, "a")];
        let lyrics = lines(&["only"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!((cues[0].start, cues[0].end), (1.0, 2.0));
    }

    #[test]
    fn negative_timestamps_are_clamped() {
        let segments = vec![seg(-0.5, 1.0, "a")];
        let lyrics = lines(&["only"]);

        let cues = align(&segments, &lyrics, &AlignConfig::default()).unwrap();

        assert_eq!((cues[0].start, cues[0].end), (0.0, 1.0));
    }

    #[test]
    fn rejects_inverted_segment() {
        let segments = vec![seg(3.0, 2.0, "a")];
        let err = align(&segments, &lines(&["x"]), &AlignConfig::default()).unwrap_err();
        assert!(matches!(err, LyricsyncError::InvalidInput { .. }));
        assert!(!err.is_provider_failure());
    }

    #[test]
    fn rejects_non_finite_timestamps() {
        for bad in [seg(f64::NAN, 1.0, "a"), seg(0.0, f64::INFINITY, "a")] {
            let err = align(&[bad], &lines(&["x"]), &AlignConfig::default()).unwrap_err();
            assert!(matches!(err, LyricsyncError::InvalidInput { .. }));
        }
    }

    #[test]
    fn rejects_whitespace_only_lyrics() {
        let lyrics = lines(&["   ", "\t"]);
        let err = align(&[seg(0.0, 1.0, "a")], &lyrics, &AlignConfig::default()).unwrap_err();
        assert!(matches!(err, LyricsyncError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = AlignConfig {
            min_duration: -1.0,
            ..AlignConfig::default()
        };
        assert!(align(&[], &lines(&["x"]), &cfg).is_err());
    }
}
