//! Splits a quote into display segments and prices each one.
//!
//! Segmentation aims for roughly equal character counts while only ever
//! cutting on word boundaries. Each cut is nudged forward or backward to
//! the nearest space; when a segment cannot be made to end on a space the
//! whole split is retried with one segment fewer.

use itertools::Itertools;
use serde::Serialize;

use crate::speed::wpm;
use crate::util::round_half_even;

/// A stretch of the quote with its typed and raw speeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSpeed {
    pub text: String,
    pub wpm: f64,
    pub raw_wpm: f64,
}

/// Splits `text` into word-aligned segments of roughly equal length.
///
/// With `n = None` the segment count defaults to one per ten characters,
/// capped at ten. Texts of sixty characters or fewer, and texts with no
/// more words than segments, fall back to one word per segment. Every
/// segment except the last keeps its trailing space, so the segments
/// concatenate back to the input.
pub fn segment_texts(text: &str, n: Option<usize>) -> Vec<String> {
    let char_len = text.chars().count();
    let n = n.unwrap_or_else(|| (round_half_even(char_len as f64 / 10.0) as usize).min(10));
    build_segments(text, n)
}

fn build_segments(text: &str, n: usize) -> Vec<String> {
    let words = text.split(' ').collect_vec();
    let chars = text.chars().collect_vec();
    if n == 0 || words.len() <= n || chars.len() <= 60 {
        return word_segments(&words);
    }

    let line_size = chars.len() as f64 / n as f64;
    let mut segments: Vec<Vec<char>> = (0..n)
        .map(|i| {
            let start = round_half_even(line_size * i as f64) as usize;
            let end = (round_half_even(line_size * (i as f64 + 1.0)) as usize).min(chars.len());
            chars[start.min(end)..end].to_vec()
        })
        .collect();

    let mut full_words: Vec<Vec<char>> = Vec::with_capacity(n);
    for i in 0..segments.len() {
        if i == segments.len() - 1 {
            full_words.push(segments[i].clone());
            break;
        }

        let mut segment = segments[i].clone();
        let original_segment = segment.clone();
        let original_next = segments[i + 1].clone();
        let mut next = std::mem::take(&mut segments[i + 1]);

        // Chars this segment would shed to reach its last space, versus
        // chars it would take from the next segment to reach one.
        let drop_chars = match segment.iter().rposition(|&c| c == ' ') {
            Some(p) => segment.len() - p - 1,
            None => segment.len(),
        };
        let add_chars = next.iter().position(|&c| c == ' ').map_or(0, |p| p + 1);
        let grow_first = i == 0 || drop_chars >= add_chars;

        let mut aligned = if grow_first {
            grow(&mut segment, &mut next)
        } else {
            shrink(&mut segment, &mut next)
        };
        if !aligned {
            segment = original_segment;
            next = original_next;
            aligned = if grow_first {
                shrink(&mut segment, &mut next)
            } else {
                grow(&mut segment, &mut next)
            };
        }
        if !aligned {
            return build_segments(text, n - 1);
        }

        segments[i + 1] = next;
        full_words.push(segment);
    }

    // A short opening pair like "aa bb cc " + "dd " reads better split
    // two-and-two.
    if full_words.len() >= 2 {
        let first = drop_last(&full_words[0]);
        let second = drop_last(&full_words[1]);
        let words_1 = first.split(' ').collect_vec();
        let words_2 = second.split(' ').collect_vec();
        if words_1.len() == 3 && words_2.len() == 1 {
            full_words[0] = format!("{} {} ", words_1[0], words_1[1]).chars().collect();
            full_words[1] = format!("{} {} ", words_1[2], words_2[0]).chars().collect();
        }
    }

    full_words
        .into_iter()
        .map(|segment| segment.into_iter().collect())
        .collect()
}

fn word_segments(words: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = words[..words.len().saturating_sub(1)]
        .iter()
        .map(|word| format!("{word} "))
        .collect();
    if let Some(last) = words.last() {
        out.push((*last).to_string());
    }
    out
}

/// Pulls characters off the front of `next` until `segment` ends on a
/// space. Fails when either side runs out before that happens.
fn grow(segment: &mut Vec<char>, next: &mut Vec<char>) -> bool {
    loop {
        match segment.last() {
            None => return false,
            Some(' ') => return true,
            Some(_) => {
                if next.is_empty() {
                    return false;
                }
                segment.push(next.remove(0));
            }
        }
    }
}

/// Pushes characters from the tail of `segment` onto the front of `next`
/// until `segment` ends on a space.
fn shrink(segment: &mut Vec<char>, next: &mut Vec<char>) -> bool {
    loop {
        match segment.last().copied() {
            None => return false,
            Some(' ') => return true,
            Some(c) => {
                segment.pop();
                next.insert(0, c);
            }
        }
    }
}

fn drop_last(chars: &[char]) -> String {
    chars[..chars.len().saturating_sub(1)].iter().collect()
}

/// Speeds per display segment, sliced out of the per-keystroke delays.
/// `raw_delays` may be shorter than `delays` (trailing zeros stripped);
/// slices clamp instead of panicking.
pub fn segment_speeds(
    quote: &str,
    delays: &[f64],
    raw_delays: &[f64],
    multiplier: f64,
) -> Vec<SegmentSpeed> {
    let mut speeds = Vec::new();
    let mut i = 0;
    for text in segment_texts(quote, None) {
        let len = text.chars().count();
        let slice = clamped(delays, i, i + len);
        let raw = clamped(raw_delays, i, i + len);
        speeds.push(SegmentSpeed {
            wpm: wpm(slice.len(), slice.iter().sum(), multiplier),
            raw_wpm: wpm(raw.len(), raw.iter().sum(), multiplier),
            text,
        });
        i += len;
    }
    speeds
}

/// Speeds per word. The delay of a word's first character belongs to the
/// preceding space, so each word is priced over its remaining characters;
/// one-letter words have no remaining characters and price as infinite.
pub fn word_speeds(
    quote: &str,
    delays: &[f64],
    raw_delays: &[f64],
    multiplier: f64,
) -> Vec<SegmentSpeed> {
    let mut speeds = Vec::new();
    let mut i = 0;
    for word in quote.split(' ') {
        let char_count = word.chars().count();
        let slice = clamped(delays, i + 1, i + char_count);
        let raw = clamped(raw_delays, i + 1, i + char_count);
        speeds.push(SegmentSpeed {
            text: word.to_string(),
            wpm: wpm(slice.len(), slice.iter().sum(), multiplier),
            raw_wpm: wpm(raw.len(), raw.iter().sum(), multiplier),
        });
        i += char_count + 1;
    }
    speeds
}

fn clamped(delays: &[f64], start: usize, end: usize) -> &[f64] {
    let start = start.min(delays.len());
    let end = end.max(start).min(delays.len());
    &delays[start..end]
}
