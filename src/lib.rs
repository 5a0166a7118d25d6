//! dualsub: a second, word-translatable subtitle track over a video player
//!
//! The library parses WebVTT captions with karaoke word timing, keeps a
//! caption window in step with playback, and translates hovered words on
//! demand through a coalescing cache. Drawing is left to an
//! [`OverlayObserver`]; the page itself is reached through [`PlayerHost`],
//! [`CaptionFetcher`] and [`SubtitleSourceLocator`].

pub mod config;
pub mod error;
pub mod logging;
pub mod observer;
pub mod session;
pub mod setup;
pub mod source;
pub mod subtitle;
pub mod translation;

#[cfg(test)]
mod test_support;

pub use crate::config::OverlayConfig;
pub use crate::error::{OverlayError, Result};
pub use crate::observer::{
    ChannelObserver, CompositeObserver, LogObserver, MemoryObserver, OverlayEvent, OverlayObserver,
};
pub use crate::session::{NavigationOutcome, OverlaySession, SessionContext, SessionManager};
pub use crate::setup::{CaptionFetcher, HttpCaptionFetcher, PlayerHost, RetryPolicy};
pub use crate::source::{CaptionTrack, CaptionTrackProvider, SubtitleSourceLocator, TrackListLocator};
pub use crate::subtitle::{Cue, CueSequence, PlaybackSynchronizer, SyncState, WordMark};
pub use crate::translation::{
    GoogleTranslateClient, HoveredWord, TranslationBackend, TranslationCache, TranslationDisplay,
};
