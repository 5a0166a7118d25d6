//! Cue parser for the WebVTT dialect served by the caption track
//!
//! Parsing is total: a malformed block is dropped and logged, the rest of the
//! payload still produces cues.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{OverlayError, Result};

lazy_static! {
    /// `start --> end`, anything after the end timestamp (layout settings) is ignored
    static ref CUE_TIMING: Regex = Regex::new(r"(\S+)\s+-->\s+(\S+)").unwrap();
}

/// One caption block
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Raw text lines, karaoke tags included
    pub lines: Vec<String>,
}

impl Cue {
    pub fn new(start: f64, end: f64, lines: Vec<String>) -> Self {
        Self { start, end, lines }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` falls inside the cue, both bounds inclusive
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }

    /// Serialize back to a WebVTT block
    pub fn to_vtt_block(&self) -> String {
        let mut block = format!("{} --> {}\n", format_timestamp(self.start), format_timestamp(self.end));
        for line in &self.lines {
            block.push_str(line);
            block.push('\n');
        }
        block
    }
}

/// Cues of one subtitle source, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CueSequence {
    cues: Vec<Cue>,
}

impl CueSequence {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    pub fn as_slice(&self) -> &[Cue] {
        &self.cues
    }

    /// Index of the first cue containing `time`; overlapping cues resolve to
    /// the earliest declared one.
    pub fn active_index(&self, time: f64) -> Option<usize> {
        self.cues.iter().position(|cue| cue.contains(time))
    }

    /// Serialize the whole sequence as a WebVTT document
    pub fn to_vtt(&self) -> String {
        let mut out = String::from("WEBVTT\n");
        for cue in &self.cues {
            out.push('\n');
            out.push_str(&cue.to_vtt_block());
        }
        out
    }
}

impl<'a> IntoIterator for &'a CueSequence {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

/// Convert `HH:MM:SS.mmm` into seconds.
///
/// The string is split on `:` and `.` into exactly four integer components.
/// The sum is computed in whole milliseconds so `01:02:03.456` is exactly
/// `3723.456`.
pub fn parse_timestamp(time_str: &str) -> Result<f64> {
    let parts: Vec<&str> = time_str.trim().split(|c: char| c == ':' || c == '.').collect();
    if parts.len() != 4 {
        return Err(OverlayError::InvalidTimestamp(format!(
            "expected HH:MM:SS.mmm, got {:?}",
            time_str
        )));
    }

    let mut values = [0u64; 4];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part.parse::<u64>().map_err(|_| {
            OverlayError::InvalidTimestamp(format!("non-numeric component {:?} in {:?}", part, time_str))
        })?;
    }
    let [hours, minutes, seconds, millis] = values;

    let total_ms = hours
        .checked_mul(3_600_000)
        .and_then(|h| minutes.checked_mul(60_000).and_then(|m| h.checked_add(m)))
        .and_then(|hm| seconds.checked_mul(1000).and_then(|s| hm.checked_add(s)))
        .and_then(|hms| hms.checked_add(millis))
        .ok_or_else(|| OverlayError::InvalidTimestamp(format!("out of range: {:?}", time_str)))?;

    Ok(total_ms as f64 / 1000.0)
}

/// Format seconds as `HH:MM:SS.mmm`
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

fn parse_timing_line(line: &str) -> Option<Result<(f64, f64)>> {
    let caps = CUE_TIMING.captures(line)?;
    let timing = parse_timestamp(&caps[1]).and_then(|start| {
        let end = parse_timestamp(&caps[2])?;
        if start > end {
            return Err(OverlayError::SubtitleParsing(format!(
                "cue ends before it starts: {:?}",
                line
            )));
        }
        Ok((start, end))
    });
    Some(timing)
}

/// Parse a caption payload into cues.
///
/// Everything before the first `-->` line (the `WEBVTT` header, metadata) is
/// skipped. Numeric cue identifiers are skipped as ordinary non-timing lines.
/// A cue with no text lines, or with a malformed timing line, is dropped.
pub fn parse_vtt(content: &str) -> CueSequence {
    let lines: Vec<&str> = content.trim().lines().collect();
    let mut cues = Vec::new();
    let mut dropped = 0usize;

    let mut i = 0;
    while i < lines.len() && !lines[i].contains("-->") {
        i += 1;
    }

    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;
        if line.is_empty() {
            continue;
        }

        let Some(timing) = parse_timing_line(line) else {
            continue;
        };

        let mut text_lines = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            text_lines.push(lines[i].trim().to_string());
            i += 1;
        }

        match timing {
            Ok((start, end)) if !text_lines.is_empty() => {
                cues.push(Cue::new(start, end, text_lines));
            }
            Ok(_) => {}
            Err(e) => {
                dropped += 1;
                log::warn!("Dropping cue at line {}: {}", i, e);
            }
        }
    }

    if dropped > 0 {
        log::warn!("Parsed {} cues, dropped {} malformed", cues.len(), dropped);
    } else {
        log::info!("Parsed {} cues", cues.len());
    }
    CueSequence::new(cues)
}

/// Read and parse a caption file
pub fn parse_vtt_file<P: AsRef<Path>>(vtt_file_path: P) -> Result<CueSequence> {
    let content = std::fs::read_to_string(&vtt_file_path).map_err(|e| {
        OverlayError::SubtitleParsing(format!(
            "Failed to read {}: {}",
            vtt_file_path.as_ref().display(),
            e
        ))
    })?;
    Ok(parse_vtt(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("01:02:03.456").unwrap(), 3723.456);
        assert_eq!(parse_timestamp("00:00:01.000").unwrap(), 1.0);
        assert_eq!(parse_timestamp(" 00:01:30.500 ").unwrap(), 90.5);
    }

    #[test]
    fn test_parse_timestamp_rejects_malformed() {
        assert!(matches!(parse_timestamp("00:aa:01.000"), Err(OverlayError::InvalidTimestamp(_))));
        assert!(parse_timestamp("01:30.500").is_err());
        assert!(parse_timestamp("invalid").is_err());
        assert!(parse_timestamp("00:00:-1.000").is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(3723.456), "01:02:03.456");
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(59.9996), "00:01:00.000");
    }

    #[test]
    fn test_parse_basic_vtt() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: fr\n\n1\n00:00:01.000 --> 00:00:03.000\nBonjour à tous\n\n2\n00:00:03.500 --> 00:00:05.000 align:start position:0%\nDeuxième ligne\ntroisième ligne\n";
        let cues = parse_vtt(vtt);

        assert_eq!(cues.len(), 2);
        let first = cues.get(0).unwrap();
        assert_eq!(first.start, 1.0);
        assert_eq!(first.end, 3.0);
        assert_eq!(first.lines, vec!["Bonjour à tous"]);

        let second = cues.get(1).unwrap();
        assert_eq!(second.start, 3.5);
        assert_eq!(second.end, 5.0);
        assert_eq!(second.lines, vec!["Deuxième ligne", "troisième ligne"]);
    }

    #[test]
    fn test_last_cue_without_trailing_blank_line() {
        let vtt = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nfirst\n\n00:00:02.000 --> 00:00:04.000\nlast one";
        let cues = parse_vtt(vtt);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues.get(1).unwrap().lines, vec!["last one"]);
    }

    #[test]
    fn test_empty_cue_discarded() {
        let vtt = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n\n00:00:02.000 --> 00:00:03.000\ntext\n";
        let cues = parse_vtt(vtt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues.get(0).unwrap().start, 2.0);
    }

    #[test]
    fn test_malformed_cue_dropped_rest_kept() {
        let vtt = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nok\n\n00:xx:02.000 --> 00:00:03.000\nbroken text\n\n00:00:05.000 --> 00:00:04.000\nbackwards\n\n00:00:06.000 --> 00:00:07.000\nfine\n";
        let cues = parse_vtt(vtt);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues.get(0).unwrap().lines, vec!["ok"]);
        assert_eq!(cues.get(1).unwrap().lines, vec!["fine"]);
    }

    #[test]
    fn test_garbage_input_yields_empty_sequence() {
        assert!(parse_vtt("").is_empty());
        assert!(parse_vtt("WEBVTT\n\nno timings here\n").is_empty());
        assert!(parse_vtt("\r\n\r\n").is_empty());
    }

    #[test]
    fn test_crlf_payload() {
        let vtt = "WEBVTT\r\n\r\n00:00:01.000 --> 00:00:02.000\r\nhola\r\n";
        let cues = parse_vtt(vtt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues.get(0).unwrap().lines, vec!["hola"]);
    }

    #[test]
    fn test_round_trip_preserves_intervals() {
        let vtt = "WEBVTT\n\n00:00:01.234 --> 00:00:02.345\nun\n\n01:00:00.001 --> 01:00:10.999\ndeux\ntrois\n";
        let cues = parse_vtt(vtt);
        let reparsed = parse_vtt(&cues.to_vtt());
        assert_eq!(reparsed, cues);
        assert_eq!(format_timestamp(reparsed.get(1).unwrap().end), "01:00:10.999");
    }

    #[test]
    fn test_active_index_first_match_wins() {
        let cues = CueSequence::new(vec![
            Cue::new(0.0, 5.0, vec!["a".to_string()]),
            Cue::new(4.0, 8.0, vec!["b".to_string()]),
        ]);
        assert_eq!(cues.active_index(4.5), Some(0));
        assert_eq!(cues.active_index(5.0), Some(0));
        assert_eq!(cues.active_index(6.0), Some(1));
        assert_eq!(cues.active_index(9.0), None);
    }

    #[test]
    fn test_parse_vtt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.vtt");
        std::fs::write(&path, "WEBVTT\n\n00:00:00.500 --> 00:00:01.500\nGuten Tag\n").unwrap();

        let cues = parse_vtt_file(&path).unwrap();
        assert_eq!(cues.len(), 1);

        let missing = parse_vtt_file(dir.path().join("missing.vtt"));
        assert!(matches!(missing, Err(OverlayError::SubtitleParsing(_))));
    }
}
