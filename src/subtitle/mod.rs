//! Subtitle handling
//!
//! Parsing of the caption payload, karaoke word timing and synchronization
//! against playback time.

pub mod parser;
pub mod words;
pub mod sync;

pub use parser::{parse_timestamp, parse_vtt, parse_vtt_file, Cue, CueSequence};
pub use sync::{PlaybackSynchronizer, RenderedLine, RenderedWord, SyncState, WordMark};
pub use words::{reconstruct_words, TimedWord};
