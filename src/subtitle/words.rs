//! Karaoke word timing
//!
//! Automatic captions carry per-word timestamps inline:
//! `first<00:00:01.000><c> second</c><00:00:01.400><c> third</c>`.
//! This module expands such a line into an ordered word/time list.

use lazy_static::lazy_static;
use regex::Regex;

use super::parser::parse_timestamp;

lazy_static! {
    static ref KARAOKE_TAG: Regex = Regex::new(r"<(\d{2}:\d{2}:\d{2}\.\d{3})><c>(.*?)</c>").unwrap();
}

/// A word (or untagged phrase) and the time it starts being spoken
#[derive(Debug, Clone, PartialEq)]
pub struct TimedWord {
    pub text: String,
    /// Seconds
    pub start_time: f64,
}

impl TimedWord {
    pub fn new(text: impl Into<String>, start_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
        }
    }
}

/// Whether the line carries at least one karaoke tag
pub fn has_word_timing(line: &str) -> bool {
    KARAOKE_TAG.is_match(line)
}

fn push_untagged(words: &mut Vec<TimedWord>, text: &str, cue_start: f64) {
    let text = text.trim();
    if !text.is_empty() {
        words.push(TimedWord::new(text, cue_start));
    }
}

/// Expand one cue line into timed words.
///
/// Untagged lines are split on whitespace and every word starts at
/// `cue_start`. Tagged lines are scanned left to right: untagged runs between
/// tags become one entry timed at `cue_start`, tag contents take the tag's
/// timestamp.
pub fn reconstruct_words(line: &str, cue_start: f64) -> Vec<TimedWord> {
    if !has_word_timing(line) {
        return line
            .split_whitespace()
            .map(|word| TimedWord::new(word, cue_start))
            .collect();
    }

    let mut words = Vec::new();
    let mut last_index = 0;

    for caps in KARAOKE_TAG.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last_index {
            push_untagged(&mut words, &line[last_index..whole.start()], cue_start);
        }

        let start_time = match parse_timestamp(&caps[1]) {
            Ok(time) => time,
            Err(e) => {
                log::warn!("Bad karaoke timestamp, using cue start: {}", e);
                cue_start
            }
        };
        let text = caps[2].trim();
        if !text.is_empty() {
            words.push(TimedWord::new(text, start_time));
        }
        last_index = whole.end();
    }

    if last_index < line.len() {
        push_untagged(&mut words, &line[last_index..], cue_start);
    }

    words
}
