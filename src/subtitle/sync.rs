//! Playback synchronization
//!
//! Maps a playback time sample to the lines that should be on screen, with
//! every word classified as spoken, active (with sweep progress) or pending.
//! Each call produces a fresh [`SyncState`]; nothing is carried between ticks.

use serde::Serialize;

use super::parser::{Cue, CueSequence};
use super::words::{has_word_timing, reconstruct_words, TimedWord};

/// Per-word render classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WordMark {
    Spoken,
    /// Currently spoken; `progress` in `[0, 1]` drives the color sweep
    Active { progress: f64 },
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedWord {
    pub text: String,
    pub mark: WordMark,
}

/// One rendered caption line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedLine {
    pub words: Vec<RenderedWord>,
    /// Only set on karaoke lines once the first word has started
    pub active_word: Option<usize>,
    /// Sweep progress of the active word, 0 when there is none
    pub progress: f64,
}

impl RenderedLine {
    /// Space-joined words, as displayed
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
    }
}

/// Render instruction for one playback sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState {
    /// Index of the active cue in its sequence
    pub active_cue: Option<usize>,
    /// Empty when no cue is active: the renderer clears the overlay
    pub lines: Vec<RenderedLine>,
}

impl SyncState {
    pub fn idle() -> Self {
        Self {
            active_cue: None,
            lines: Vec::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active_cue.is_none()
    }
}

/// Index of the word being spoken at `time`.
///
/// Scans in order and stops at the first word that has not started yet, so a
/// trailing untagged phrase (timed at the cue start) only becomes active after
/// the tagged words before it.
pub fn active_word_index(words: &[TimedWord], time: f64) -> Option<usize> {
    let mut active = None;
    for (i, word) in words.iter().enumerate() {
        if time >= word.start_time {
            active = Some(i);
        } else {
            break;
        }
    }
    active
}

/// Sweep progress of `words[index]`, ending at the next word's start or at
/// `cue_end` for the last word. An index past the end yields `0.0`.
pub fn word_progress(words: &[TimedWord], index: usize, cue_end: f64, time: f64) -> f64 {
    let Some(word) = words.get(index) else {
        return 0.0;
    };
    let start = word.start_time;
    let end = words.get(index + 1).map_or(cue_end, |next| next.start_time);
    let span = end - start;
    if span <= 0.0 {
        return 1.0;
    }
    ((time - start) / span).clamp(0.0, 1.0)
}

fn render_timed_line(words: Vec<TimedWord>, cue_end: f64, time: f64) -> RenderedLine {
    let active_word = active_word_index(&words, time);
    let progress = active_word.map_or(0.0, |i| word_progress(&words, i, cue_end, time));

    let words = words
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            let mark = match active_word {
                Some(active) if i < active => WordMark::Spoken,
                Some(active) if i == active => WordMark::Active { progress },
                _ => WordMark::Pending,
            };
            RenderedWord { text: word.text, mark }
        })
        .collect();

    RenderedLine {
        words,
        active_word,
        progress,
    }
}

/// Render one line of the active cue at `time`
pub fn render_line(line: &str, cue: &Cue, time: f64) -> RenderedLine {
    let words = reconstruct_words(line, cue.start);
    if has_word_timing(line) {
        return render_timed_line(words, cue.end, time);
    }

    // Plain lines are shown fully lit
    RenderedLine {
        words: words
            .into_iter()
            .map(|word| RenderedWord {
                text: word.text,
                mark: WordMark::Spoken,
            })
            .collect(),
        active_word: None,
        progress: 0.0,
    }
}

/// Compute the render state of `cues` at playback time `current_time`
pub fn sync(cues: &CueSequence, current_time: f64) -> SyncState {
    let Some(index) = cues.active_index(current_time) else {
        return SyncState::idle();
    };
    let Some(cue) = cues.get(index) else {
        return SyncState::idle();
    };

    SyncState {
        active_cue: Some(index),
        lines: cue
            .lines
            .iter()
            .map(|line| render_line(line, cue, current_time))
            .collect(),
    }
}

/// Owns the cue sequence of one subtitle source
#[derive(Debug, Clone, Default)]
pub struct PlaybackSynchronizer {
    cues: CueSequence,
}

impl PlaybackSynchronizer {
    pub fn new(cues: CueSequence) -> Self {
        Self { cues }
    }

    pub fn cues(&self) -> &CueSequence {
        &self.cues
    }

    /// Replace the cue sequence; the previous one is dropped
    pub fn load(&mut self, cues: CueSequence) {
        self.cues = cues;
    }

    pub fn sync(&self, current_time: f64) -> SyncState {
        sync(&self.cues, current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::parser::parse_vtt;

    fn karaoke_cues() -> CueSequence {
        parse_vtt(
            "WEBVTT\n\n00:00:00.000 --> 00:00:04.000\n<00:00:00.000><c>a</c><00:00:02.000><c>b</c>\n\n00:00:05.000 --> 00:00:07.000\nplain words here\n",
        )
    }

    #[test]
    fn test_progress_halfway_through_first_word() {
        let state = sync(&karaoke_cues(), 1.0);
        assert_eq!(state.active_cue, Some(0));
        let line = &state.lines[0];
        assert_eq!(line.active_word, Some(0));
        assert_eq!(line.progress, 0.5);
        assert_eq!(line.words[0].mark, WordMark::Active { progress: 0.5 });
        assert_eq!(line.words[1].mark, WordMark::Pending);
    }

    #[test]
    fn test_last_word_runs_to_cue_end() {
        let state = sync(&karaoke_cues(), 3.0);
        let line = &state.lines[0];
        assert_eq!(line.active_word, Some(1));
        assert_eq!(line.words[0].mark, WordMark::Spoken);
        assert_eq!(line.words[1].mark, WordMark::Active { progress: 0.5 });
    }

    #[test]
    fn test_no_active_cue_clears() {
        let state = sync(&karaoke_cues(), 4.5);
        assert!(state.is_idle());
        assert!(state.lines.is_empty());
        assert_eq!(state, SyncState::idle());
    }

    #[test]
    fn test_plain_line_fully_spoken() {
        let state = sync(&karaoke_cues(), 6.0);
        assert_eq!(state.active_cue, Some(1));
        let line = &state.lines[0];
        assert_eq!(line.active_word, None);
        assert_eq!(line.text(), "plain words here");
        assert!(line.words.iter().all(|w| w.mark == WordMark::Spoken));
    }

    #[test]
    fn test_first_word_not_started() {
        let words = vec![TimedWord::new("x", 1.0), TimedWord::new("y", 2.0)];
        assert_eq!(active_word_index(&words, 0.5), None);
        let cue = Cue::new(0.0, 3.0, vec![]);
        let line = render_timed_line(words, cue.end, 0.5);
        assert!(line.words.iter().all(|w| w.mark == WordMark::Pending));
        assert_eq!(line.progress, 0.0);
    }

    #[test]
    fn test_scan_stops_at_future_word() {
        let words = vec![
            TimedWord::new("lead", 0.0),
            TimedWord::new("tag", 3.0),
            TimedWord::new("trailing", 0.0),
        ];
        assert_eq!(active_word_index(&words, 1.0), Some(0));
        assert_eq!(active_word_index(&words, 3.5), Some(2));
    }

    #[test]
    fn test_progress_clamped_and_zero_span() {
        let words = vec![TimedWord::new("a", 2.0), TimedWord::new("b", 2.0)];
        assert_eq!(word_progress(&words, 0, 5.0, 2.0), 1.0);
        assert_eq!(word_progress(&words, 1, 5.0, 8.0), 1.0);
        assert_eq!(word_progress(&words, 1, 5.0, 2.0), 0.0);
    }

    #[test]
    fn test_progress_out_of_range_index() {
        let words = vec![TimedWord::new("a", 0.0)];
        assert_eq!(word_progress(&words, 1, 4.0, 1.0), 0.0);
        assert_eq!(word_progress(&[], 0, 4.0, 1.0), 0.0);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let sync_state = PlaybackSynchronizer::new(karaoke_cues());
        let first = sync_state.sync(2.7);
        let second = sync_state.sync(2.7);
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_replaces_sequence() {
        let mut synchronizer = PlaybackSynchronizer::new(karaoke_cues());
        synchronizer.load(CueSequence::default());
        assert!(synchronizer.sync(1.0).is_idle());
    }
}
