//! Locates mistakes by replaying the keystroke record against the quote.
//!
//! The typed buffer is compared word by word with the expected text; the
//! first keystroke that diverges from the current word opens a typo, and
//! the typo closes once the buffer agrees with the expected text again.
//! Deletions never open a typo (backspacing is the fix, not the mistake).

use crate::decoder::{Action, ActionGroup};
use itertools::Itertools;
use serde::Serialize;

/// One detected mistake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Typo {
    /// Index of the word the mistake happened in.
    pub word_index: usize,
    /// Character index in final-quote coordinates where the wrong
    /// keystroke landed, accounting for everything typed before it.
    pub char_index: usize,
    /// The word being typed when the mistake happened.
    pub word: String,
}

/// Replays the action groups and reports every typo in order.
///
/// Expects keystrokes that already replayed cleanly in the decoder;
/// out-of-range edits are ignored rather than reported, so a hand-built
/// action list cannot panic here.
pub fn typos(quote: &str, groups: &[ActionGroup]) -> Vec<Typo> {
    let quote_len = quote.chars().count();
    let words = quote.split(' ').collect_vec();
    let quote_words: Vec<Vec<char>> = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let mut chars = word.chars().collect_vec();
            if i + 1 < words.len() {
                chars.push(' ');
            }
            chars
        })
        .collect();

    let mut found = Vec::new();
    let mut typo_open = false;
    let mut word_index = 0;
    let mut completed_chars = 0;
    let mut text_box: Vec<char> = Vec::new();

    'groups: for group in groups {
        for keystroke in &group.keystrokes {
            if word_index >= quote_words.len() {
                break 'groups;
            }

            let pos = keystroke.position;
            match keystroke.action {
                Action::Insert => {
                    text_box.insert(pos.min(text_box.len()), keystroke.character);
                }
                Action::Replace => {
                    if pos < text_box.len() {
                        text_box[pos] = keystroke.character;
                    } else if pos == text_box.len() {
                        text_box.push(keystroke.character);
                    }
                }
                Action::Delete => {
                    if pos < text_box.len() {
                        text_box.remove(pos);
                    }
                }
            }

            let current_word = &quote_words[word_index];
            let overlap = text_box.len().min(current_word.len());
            let is_typo = text_box[..overlap] != current_word[..overlap];

            if is_typo && !typo_open && keystroke.action != Action::Delete {
                typo_open = true;
                let char_index = (completed_chars + text_box.len()).saturating_sub(1);
                let word: String = current_word.iter().collect();
                found.push(Typo {
                    word_index,
                    char_index,
                    word: word.trim_end().to_string(),
                });
            } else if !is_typo && typo_open {
                typo_open = false;
            }
        }

        // Retire every fully typed word at the front of the buffer. This
        // runs per group, like the upstream replayer.
        while word_index < quote_words.len() {
            let word = &quote_words[word_index];
            if text_box.len() < word.len() || text_box[..word.len()] != word[..] {
                break;
            }
            completed_chars += word.len();
            text_box.drain(..word.len());
            word_index += 1;
        }

        if completed_chars == quote_len && word_index >= quote_words.len() {
            break;
        }
    }

    found
}
