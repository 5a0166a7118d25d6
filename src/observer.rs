//! Render sinks
//!
//! The overlay never draws anything itself. Render instructions and
//! translation display changes are pushed to an [`OverlayObserver`], which is
//! the seam to whatever renders the caption window.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::subtitle::SyncState;
use crate::translation::TranslationDisplay;

/// Everything an observer can be told
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OverlayEvent {
    Render(SyncState),
    Translation(TranslationDisplay),
}

/// Receives render instructions.
///
/// Callbacks may run while internal overlay state is locked; implementations
/// must not call back into the session.
pub trait OverlayObserver: Send + Sync {
    /// Called on every playback tick
    fn on_render(&self, state: &SyncState);

    /// Called when the translation box is shown or hidden
    fn on_translation(&self, display: &TranslationDisplay);
}

/// Logs every event at debug level
#[derive(Debug, Default)]
pub struct LogObserver {
    prefix: Option<String>,
}

impl LogObserver {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl OverlayObserver for LogObserver {
    fn on_render(&self, state: &SyncState) {
        let prefix = self.prefix.as_deref().unwrap_or("");
        let text = state
            .lines
            .iter()
            .map(|line| line.text())
            .collect::<Vec<_>>()
            .join(" / ");
        log::debug!("{}cue {:?}: {}", prefix, state.active_cue, text);
    }

    fn on_translation(&self, display: &TranslationDisplay) {
        let prefix = self.prefix.as_deref().unwrap_or("");
        match display {
            TranslationDisplay::Hidden => log::debug!("{}translation hidden", prefix),
            TranslationDisplay::Shown { word, translation } => {
                log::debug!("{}{:?} -> {:?}", prefix, word.text, translation)
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryObserver {
    history: Arc<Mutex<Vec<OverlayEvent>>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<OverlayEvent> {
        self.history.lock().clone()
    }

    /// Translation display changes only, oldest first
    pub fn translations(&self) -> Vec<TranslationDisplay> {
        self.history
            .lock()
            .iter()
            .filter_map(|event| match event {
                OverlayEvent::Translation(display) => Some(display.clone()),
                OverlayEvent::Render(_) => None,
            })
            .collect()
    }

    /// Render states only, oldest first
    pub fn renders(&self) -> Vec<SyncState> {
        self.history
            .lock()
            .iter()
            .filter_map(|event| match event {
                OverlayEvent::Render(state) => Some(state.clone()),
                OverlayEvent::Translation(_) => None,
            })
            .collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl OverlayObserver for MemoryObserver {
    fn on_render(&self, state: &SyncState) {
        self.history.lock().push(OverlayEvent::Render(state.clone()));
    }

    fn on_translation(&self, display: &TranslationDisplay) {
        self.history.lock().push(OverlayEvent::Translation(display.clone()));
    }
}

/// Forwards events over an unbounded channel
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<OverlayEvent>,
}

impl ChannelObserver {
    pub fn new(sender: mpsc::UnboundedSender<OverlayEvent>) -> Self {
        Self { sender }
    }
}

impl OverlayObserver for ChannelObserver {
    fn on_render(&self, state: &SyncState) {
        // A closed receiver just means nobody renders anymore
        let _ = self.sender.send(OverlayEvent::Render(state.clone()));
    }

    fn on_translation(&self, display: &TranslationDisplay) {
        let _ = self.sender.send(OverlayEvent::Translation(display.clone()));
    }
}

/// Fans events out to several observers
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn OverlayObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: Arc<dyn OverlayObserver>) {
        self.observers.push(observer);
    }
}

impl OverlayObserver for CompositeObserver {
    fn on_render(&self, state: &SyncState) {
        for observer in &self.observers {
            observer.on_render(state);
        }
    }

    fn on_translation(&self, display: &TranslationDisplay) {
        for observer in &self.observers {
            observer.on_translation(display);
        }
    }
}
