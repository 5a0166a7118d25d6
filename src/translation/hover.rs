//! Hover-to-translate controller
//!
//! Entering a word starts a quiescence timer; only the word still hovered when
//! the timer fires is looked up. Leaving hides the translation immediately.
//! A lookup that resolves after the pointer has moved on is discarded
//! (last hover wins); the network request itself is never aborted.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::observer::OverlayObserver;
use super::cache::TranslationCache;

/// Position and text of a hovered word in the rendered overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoveredWord {
    pub line: usize,
    pub index: usize,
    pub text: String,
}

impl HoveredWord {
    pub fn new(line: usize, index: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            index,
            text: text.into(),
        }
    }
}

/// What the translation box shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TranslationDisplay {
    Hidden,
    Shown { word: HoveredWord, translation: String },
}

enum HoverSlot {
    Idle,
    /// Waiting for the quiescence window to elapse
    Debouncing { timer: JoinHandle<()> },
    /// Lookup in flight for the current generation
    Resolving,
}

struct HoverState {
    /// Bumped on every enter/leave; a task only acts for its own generation
    generation: u64,
    slot: HoverSlot,
    display: TranslationDisplay,
}

impl HoverState {
    fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        if let HoverSlot::Debouncing { timer } = std::mem::replace(&mut self.slot, HoverSlot::Idle) {
            timer.abort();
        }
        self.generation
    }
}

/// Debounced hover handling for one overlay session
pub struct HoverController {
    cache: Arc<TranslationCache>,
    observer: Arc<dyn OverlayObserver>,
    debounce: Duration,
    state: Arc<Mutex<HoverState>>,
}

impl HoverController {
    pub fn new(cache: Arc<TranslationCache>, observer: Arc<dyn OverlayObserver>, debounce: Duration) -> Self {
        Self {
            cache,
            observer,
            debounce,
            state: Arc::new(Mutex::new(HoverState {
                generation: 0,
                slot: HoverSlot::Idle,
                display: TranslationDisplay::Hidden,
            })),
        }
    }

    /// Pointer entered `word`. Replaces any pending timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enter(&self, word: HoveredWord) {
        let mut state = self.state.lock();
        let generation = state.invalidate();

        let timer = tokio::spawn(lookup_after_quiescence(
            Arc::clone(&self.state),
            Arc::clone(&self.cache),
            Arc::clone(&self.observer),
            self.debounce,
            generation,
            word,
        ));
        state.slot = HoverSlot::Debouncing { timer };
    }

    /// Pointer left the hovered word: hide right away
    pub fn leave(&self) {
        let mut state = self.state.lock();
        state.invalidate();
        state.display = TranslationDisplay::Hidden;
        self.observer.on_translation(&state.display);
    }

    /// Cancel the pending timer and ignore any lookup in flight, without
    /// notifying the observer
    pub fn cancel(&self) {
        self.state.lock().invalidate();
    }

    pub fn display(&self) -> TranslationDisplay {
        self.state.lock().display.clone()
    }

    /// Whether a timer or lookup is outstanding
    pub fn is_busy(&self) -> bool {
        !matches!(self.state.lock().slot, HoverSlot::Idle)
    }
}

impl Drop for HoverController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn lookup_after_quiescence(
    state: Arc<Mutex<HoverState>>,
    cache: Arc<TranslationCache>,
    observer: Arc<dyn OverlayObserver>,
    debounce: Duration,
    generation: u64,
    word: HoveredWord,
) {
    tokio::time::sleep(debounce).await;

    {
        let mut state = state.lock();
        if state.generation != generation {
            return;
        }
        // Past this point the task is no longer abortable
        state.slot = HoverSlot::Resolving;
    }

    let translation = cache.translate(&word.text).await;

    let mut state = state.lock();
    if state.generation != generation {
        log::debug!("Discarding stale translation of {:?}", word.text);
        return;
    }
    state.slot = HoverSlot::Idle;
    state.display = TranslationDisplay::Shown { word, translation };
    observer.on_translation(&state.display);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::error::Result;
    use crate::observer::MemoryObserver;
    use crate::translation::TranslationBackend;
    use async_trait::async_trait;

    struct RecordingBackend {
        requests: Mutex<Vec<String>>,
        latency: Duration,
    }

    #[async_trait]
    impl TranslationBackend for RecordingBackend {
        async fn translate(&self, text: &str, _target_lang: &str) -> Result<String> {
            self.requests.lock().push(text.to_string());
            tokio::time::sleep(self.latency).await;
            Ok(format!("<{}>", text))
        }
    }

    fn controller(latency_ms: u64) -> (HoverController, Arc<RecordingBackend>, MemoryObserver) {
        let backend = Arc::new(RecordingBackend {
            requests: Mutex::new(Vec::new()),
            latency: Duration::from_millis(latency_ms),
        });
        let config = OverlayConfig::default();
        let cache = Arc::new(TranslationCache::new(backend.clone(), &config));
        let observer = MemoryObserver::new();
        let controller = HoverController::new(cache, Arc::new(observer.clone()), config.debounce());
        (controller, backend, observer)
    }

    fn shown(word: HoveredWord, translation: &str) -> TranslationDisplay {
        TranslationDisplay::Shown {
            word,
            translation: translation.to_string(),
        }
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_word_in_window_is_fetched() {
        let (controller, backend, observer) = controller(20);
        let a = HoveredWord::new(0, 0, "eins");
        let b = HoveredWord::new(0, 1, "zwei");

        controller.enter(a);
        sleep_ms(100).await;
        controller.enter(b.clone());
        sleep_ms(1000).await;

        assert_eq!(*backend.requests.lock(), vec!["zwei".to_string()]);
        assert_eq!(controller.display(), shown(b.clone(), "<zwei>"));
        assert_eq!(observer.translations(), vec![shown(b, "<zwei>")]);
        assert!(!controller.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_before_window_cancels_lookup() {
        let (controller, backend, observer) = controller(20);

        controller.enter(HoveredWord::new(0, 0, "chien"));
        sleep_ms(100).await;
        controller.leave();
        sleep_ms(1000).await;

        assert!(backend.requests.lock().is_empty());
        assert_eq!(observer.translations(), vec![TranslationDisplay::Hidden]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_hides_immediately() {
        let (controller, _backend, observer) = controller(20);
        let word = HoveredWord::new(1, 2, "кошка");

        controller.enter(word.clone());
        sleep_ms(500).await;
        assert_eq!(controller.display(), shown(word.clone(), "<кошка>"));

        controller.leave();
        assert_eq!(controller.display(), TranslationDisplay::Hidden);
        assert_eq!(observer.translations(), vec![shown(word, "<кошка>"), TranslationDisplay::Hidden]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_lookup_is_discarded() {
        let (controller, backend, observer) = controller(500);
        let a = HoveredWord::new(0, 0, "lent");
        let b = HoveredWord::new(0, 1, "rapide");

        controller.enter(a);
        // Window elapsed, lookup for "lent" now in flight
        sleep_ms(300).await;
        controller.enter(b.clone());
        sleep_ms(2000).await;

        assert_eq!(backend.requests.lock().len(), 2);
        assert_eq!(observer.translations(), vec![shown(b, "<rapide>")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_silent() {
        let (controller, backend, observer) = controller(20);

        controller.enter(HoveredWord::new(0, 0, "still"));
        controller.cancel();
        sleep_ms(1000).await;

        assert!(backend.requests.lock().is_empty());
        assert!(observer.translations().is_empty());
        assert!(!controller.is_busy());
    }
}
