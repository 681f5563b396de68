//! Wire-format decoder for raw typing logs.
//!
//! A modern log is `header,delay-half|t1,t2,t3,0+...action-half`. The delay
//! half interleaves millisecond delays with the characters of the finished
//! quote; the action half records every keystroke (inserts, deletes and the
//! out-of-order first-character marker) grouped by timestamp. Logs predating
//! the action format carry only the delay half, in a slightly different
//! escape grammar.
//!
//! Everything downstream (speed models, curves, segments, mistake markers)
//! consumes the [`DecodedLog`] produced here and never sees escape
//! sequences or token soup.

use crate::error::LogError;
use serde::Serialize;

/// Markers that force the next character to be read as quote payload even if
/// it is a digit. The upstream transport emits 0x08; one observed transport
/// shifts control bytes up by one, turning it into a tab.
const LITERAL_MARKERS: [char; 2] = ['\u{8}', '\t'];

/// Payload markers of the legacy delay-only grammar (NUL, with the same
/// shifted variant).
const LEGACY_MARKERS: [char; 2] = ['\0', '\u{1}'];

/// What a single keystroke did to the in-progress text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    /// Insert a character at the keystroke's position.
    Insert,
    /// Remove the character at the keystroke's position.
    Delete,
    /// Overwrite the character at the keystroke's position. The upstream
    /// service uses this (`$` on the wire) to patch in the first character
    /// of the quote, which its transport records out of order.
    Replace,
}

/// One keystroke inside an [`ActionGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Keystroke {
    /// Caret position the edit applies to, in current-buffer coordinates.
    pub position: usize,
    pub character: char,
    pub action: Action,
}

/// Keystrokes that share one recorded timestamp. `delay_ms` is the time
/// since the previous group; every keystroke after the first in a group is
/// instantaneous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionGroup {
    pub delay_ms: u64,
    pub keystrokes: Vec<Keystroke>,
}

/// Flattened view of one keystroke with its own delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypingLogEvent {
    pub character: char,
    pub delay_ms: u64,
    pub action: Action,
}

/// A fully decoded typing log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedLog {
    /// The finished quote text, as recovered from the delay half.
    pub quote: String,
    /// Milliseconds per surviving character, in quote order. May carry one
    /// trailing bookkeeping delay with no matching character.
    pub delays: Vec<u64>,
    /// The raw keystroke record, grouped by timestamp. `None` for legacy
    /// logs, which never carried one.
    pub actions: Option<Vec<ActionGroup>>,
}

impl DecodedLog {
    /// Total recorded duration: the literal sum of the per-character delays.
    pub fn total_ms(&self) -> u64 {
        self.delays.iter().sum()
    }

    /// Every keystroke flattened into `(character, delay, action)` events.
    /// The first keystroke of each group carries the group delay; the rest
    /// of the group is instantaneous.
    pub fn events(&self) -> Vec<TypingLogEvent> {
        let mut events = Vec::new();
        if let Some(groups) = &self.actions {
            for group in groups {
                for (i, keystroke) in group.keystrokes.iter().enumerate() {
                    events.push(TypingLogEvent {
                        character: keystroke.character,
                        delay_ms: if i == 0 { group.delay_ms } else { 0 },
                        action: keystroke.action,
                    });
                }
            }
        }
        events
    }

    /// Replays every keystroke and returns the resulting text.
    ///
    /// `decode` runs this once to validate the log, so on a decoded log the
    /// result always equals `quote`; it stays available as the round-trip
    /// check for tests and for callers replaying edited action lists.
    pub fn replay(&self) -> Result<String, LogError> {
        match &self.actions {
            Some(groups) => replay_actions(groups).map(|chars| chars.into_iter().collect()),
            None => Ok(self.quote.clone()),
        }
    }
}

/// Decodes a raw escaped typing log into quote, delays and keystrokes.
///
/// Fails with [`LogError`] when the escape scheme or the keystroke grammar
/// cannot be parsed, or when replaying the keystrokes does not reproduce
/// the quote. Degenerate timings (all-zero delays and the like) are not
/// errors; the speed engine models those as infinite rates.
pub fn decode(raw_log: &str) -> Result<DecodedLog, LogError> {
    let log = unescape(raw_log)?;
    if log.is_empty() {
        return Err(LogError::Empty);
    }

    match split_log(&log) {
        Some((delay_data, action_data)) => {
            let (quote, delays) = separate_delays(&delay_data, &LITERAL_MARKERS, true);
            let actions = parse_actions(&action_data)?;
            let replayed: String = replay_actions(&actions)?.into_iter().collect();
            if replayed != quote {
                return Err(LogError::ReplayMismatch {
                    replayed,
                    quote,
                });
            }
            Ok(DecodedLog {
                quote,
                delays,
                actions: Some(actions),
            })
        }
        None => {
            let (quote, delays) = separate_delays(&log, &LEGACY_MARKERS, false);
            Ok(DecodedLog {
                quote,
                delays,
                actions: None,
            })
        }
    }
}

/// Decodes `\uXXXX`, `\xXX` and single-character textual escapes into the
/// literal characters the tokenizers expect. Unknown escapes pass through
/// unchanged; malformed hex fails with `BadEscape`.
fn unescape(raw: &str) -> Result<String, LogError> {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' || i + 1 == chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        match chars[i + 1] {
            'u' => {
                out.push(hex_escape(&chars, i + 2, 4).ok_or(LogError::BadEscape { position: i })?);
                i += 6;
            }
            'x' => {
                out.push(hex_escape(&chars, i + 2, 2).ok_or(LogError::BadEscape { position: i })?);
                i += 4;
            }
            'n' => {
                out.push('\n');
                i += 2;
            }
            'r' => {
                out.push('\r');
                i += 2;
            }
            't' => {
                out.push('\t');
                i += 2;
            }
            'b' => {
                out.push('\u{8}');
                i += 2;
            }
            'f' => {
                out.push('\u{c}');
                i += 2;
            }
            'v' => {
                out.push('\u{b}');
                i += 2;
            }
            'a' => {
                out.push('\u{7}');
                i += 2;
            }
            '0' => {
                out.push('\0');
                i += 2;
            }
            '\\' | '\'' | '"' => {
                out.push(chars[i + 1]);
                i += 2;
            }
            other => {
                // The transport leaves unrecognized escapes intact.
                out.push('\\');
                out.push(other);
                i += 2;
            }
        }
    }

    Ok(out)
}

fn hex_escape(chars: &[char], start: usize, len: usize) -> Option<char> {
    if start + len > chars.len() {
        return None;
    }
    let mut value = 0u32;
    for c in &chars[start..start + len] {
        value = value * 16 + c.to_digit(16)?;
    }
    char::from_u32(value)
}

/// Locates the `|t1,t2,t3,0+` separator between the delay half and the
/// action half. Returns `(delay_data, action_data)` with the delay half's
/// three header fields stripped, or `None` for legacy delay-only logs.
fn split_log(log: &str) -> Option<(String, String)> {
    let chars: Vec<char> = log.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == '|' && separator_follows(&chars[i + 1..]) {
            let first_half: String = chars[..i].iter().collect();
            let action_data: String = chars[i + 1..].iter().collect();
            // Drop the three leading header fields; commas inside the quote
            // itself survive because only the first three splits count.
            let delay_data = first_half
                .splitn(4, ',')
                .nth(3)
                .unwrap_or_default()
                .to_string();
            return Some((delay_data, action_data));
        }
    }

    None
}

/// Checks for `digits,digits,digits,0` and a keystroke operator at the
/// start of `chars`. The first keystroke is usually an insert, but the
/// out-of-order first-character marker (`0$`) and a leading delete (`0-`)
/// open real logs too.
fn separator_follows(chars: &[char]) -> bool {
    let mut i = 0;
    for _ in 0..3 {
        let digits = chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return false;
        }
        i += digits;
        if chars.get(i) != Some(&',') {
            return false;
        }
        i += 1;
    }
    chars.get(i) == Some(&'0') && matches!(chars.get(i + 1), Some('+' | '-' | '$'))
}

/// Tokenizes a delay half into the quote and the per-character delays.
///
/// The stream is a flat interleaving of delay numbers and payload
/// characters; a marker forces the next character to be payload. Digits run
/// greedily, so payload digits are always marker-escaped upstream. With
/// `signed`, a `-` immediately before a digit starts a negative delay,
/// which is clamped to zero (the upstream clock can step backwards).
fn separate_delays(data: &str, markers: &[char], signed: bool) -> (String, Vec<u64>) {
    let chars: Vec<char> = data.chars().collect();
    let mut quote = String::new();
    let mut delays = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let negative = signed && c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());

        if c.is_ascii_digit() || negative {
            if negative {
                i += 1;
            }
            let mut value: u64 = 0;
            while i < chars.len() && chars[i].is_ascii_digit() {
                value = value
                    .saturating_mul(10)
                    .saturating_add(chars[i] as u64 - '0' as u64);
                i += 1;
            }
            delays.push(if negative { 0 } else { value });
        } else if markers.contains(&c) && i + 1 < chars.len() {
            quote.push(chars[i + 1]);
            i += 2;
        } else {
            // A trailing marker with nothing after it is payload itself.
            quote.push(c);
            i += 1;
        }
    }

    (quote, delays)
}

/// Parses the action half into timestamped keystroke groups.
///
/// The grammar is a run of `delay,(position op char)+,` groups where `op`
/// is `+` (insert), `-` (delete) or `$` (replace). Content between groups
/// (the `t1,t2` header fields, stray fragments) is skipped, matching the
/// upstream scan; a group cut off mid-token at the end of the log is a
/// `TruncatedToken` error.
fn parse_actions(action_data: &str) -> Result<Vec<ActionGroup>, LogError> {
    let chars: Vec<char> = action_data.chars().collect();
    let mut groups = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match parse_group(&chars, i)? {
            Some((group, next)) => {
                groups.push(group);
                i = next;
            }
            None => i += 1,
        }
    }

    Ok(groups)
}

/// Attempts to parse one `delay,(position op char)+,` group at `start`.
/// Returns the group and the index just past its closing comma, `None` if
/// `start` does not begin a group, or an error if the log ends inside one.
fn parse_group(chars: &[char], start: usize) -> Result<Option<(ActionGroup, usize)>, LogError> {
    let mut i = start;

    let delay_ms = match read_number(chars, &mut i) {
        Some(n) => n,
        None => return Ok(None),
    };
    if chars.get(i) != Some(&',') {
        return Ok(None);
    }
    i += 1;

    let mut keystrokes = Vec::new();
    loop {
        let position = match read_number(chars, &mut i) {
            Some(n) => n as usize,
            None => return Ok(None),
        };
        let action = match chars.get(i) {
            Some('+') => Action::Insert,
            Some('-') => Action::Delete,
            Some('$') => Action::Replace,
            Some(_) => return Ok(None),
            None if keystrokes.is_empty() => return Ok(None),
            None => return Err(LogError::TruncatedToken { position: i }),
        };
        i += 1;

        let character = match chars.get(i) {
            Some(&c) => c,
            None => return Err(LogError::TruncatedToken { position: i }),
        };
        i += 1;
        keystrokes.push(Keystroke {
            position,
            character,
            action,
        });

        match chars.get(i) {
            Some(',') => {
                i += 1;
                return Ok(Some((
                    ActionGroup {
                        delay_ms,
                        keystrokes,
                    },
                    i,
                )));
            }
            Some(c) if c.is_ascii_digit() => continue,
            Some(_) => return Ok(None),
            None => return Err(LogError::TruncatedToken { position: i }),
        }
    }
}

fn read_number(chars: &[char], i: &mut usize) -> Option<u64> {
    let mut seen = false;
    let mut value: u64 = 0;
    while let Some(c) = chars.get(*i) {
        if !c.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add(*c as u64 - '0' as u64);
        seen = true;
        *i += 1;
    }
    seen.then_some(value)
}

/// Replays every keystroke positionally against an edit buffer.
///
/// Inserts past the end of the buffer append (the upstream player does the
/// same); a replace exactly at the end also appends, which is how the
/// out-of-order first character lands when nothing precedes it. Deletes or
/// replaces beyond the buffer fail with `EditOutOfBounds`.
pub(crate) fn replay_actions(groups: &[ActionGroup]) -> Result<Vec<char>, LogError> {
    let mut text: Vec<char> = Vec::new();
    let mut index = 0;

    for group in groups {
        for keystroke in &group.keystrokes {
            let pos = keystroke.position;
            match keystroke.action {
                Action::Insert => {
                    text.insert(pos.min(text.len()), keystroke.character);
                }
                Action::Replace => {
                    if pos < text.len() {
                        text[pos] = keystroke.character;
                    } else if pos == text.len() {
                        text.push(keystroke.character);
                    } else {
                        return Err(LogError::EditOutOfBounds {
                            keystroke: index,
                            position: pos,
                            buffer_len: text.len(),
                        });
                    }
                }
                Action::Delete => {
                    if pos < text.len() {
                        text.remove(pos);
                    } else {
                        return Err(LogError::EditOutOfBounds {
                            keystroke: index,
                            position: pos,
                            buffer_len: text.len(),
                        });
                    }
                }
            }
            index += 1;
        }
    }

    Ok(text)
}
