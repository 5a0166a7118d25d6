//! Overlay session lifecycle
//!
//! An [`OverlaySession`] lives as long as one video page: it owns the parsed
//! cues, the translation cache and the hover controller. The
//! [`SessionManager`] reacts to page navigation by tearing the previous
//! session down and establishing a new one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::observer::OverlayObserver;
use crate::setup::{CaptionFetcher, HttpCaptionFetcher, PlayerHost};
use crate::source::SubtitleSourceLocator;
use crate::subtitle::{parse_vtt, CueSequence, PlaybackSynchronizer, SyncState};
use crate::translation::{
    GoogleTranslateClient, HoverController, HoveredWord, TranslationBackend, TranslationCache,
    TranslationDisplay,
};

/// Collaborators shared by every session
#[derive(Clone)]
pub struct SessionContext {
    pub config: OverlayConfig,
    pub host: Arc<dyn PlayerHost>,
    pub fetcher: Arc<dyn CaptionFetcher>,
    pub backend: Arc<dyn TranslationBackend>,
    pub observer: Arc<dyn OverlayObserver>,
}

impl SessionContext {
    pub fn new(
        config: OverlayConfig,
        host: Arc<dyn PlayerHost>,
        fetcher: Arc<dyn CaptionFetcher>,
        backend: Arc<dyn TranslationBackend>,
        observer: Arc<dyn OverlayObserver>,
    ) -> Self {
        Self {
            config,
            host,
            fetcher,
            backend,
            observer,
        }
    }

    /// Context fetching captions and translations over HTTP
    pub fn with_http(
        config: OverlayConfig,
        host: Arc<dyn PlayerHost>,
        observer: Arc<dyn OverlayObserver>,
    ) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(HttpCaptionFetcher::new(&config)?);
        let backend = Arc::new(GoogleTranslateClient::new(&config)?);
        Ok(Self::new(config, host, fetcher, backend, observer))
    }
}

/// One overlay attached to one video
pub struct OverlaySession {
    id: Uuid,
    subtitle_url: String,
    synchronizer: PlaybackSynchronizer,
    cache: Arc<TranslationCache>,
    hover: HoverController,
    observer: Arc<dyn OverlayObserver>,
    last_render: Mutex<SyncState>,
    torn_down: AtomicBool,
}

impl OverlaySession {
    pub fn new(
        subtitle_url: impl Into<String>,
        cues: CueSequence,
        backend: Arc<dyn TranslationBackend>,
        observer: Arc<dyn OverlayObserver>,
        config: &OverlayConfig,
    ) -> Self {
        let cache = Arc::new(TranslationCache::new(backend, config));
        let hover = HoverController::new(Arc::clone(&cache), Arc::clone(&observer), config.debounce());

        Self {
            id: Uuid::new_v4(),
            subtitle_url: subtitle_url.into(),
            synchronizer: PlaybackSynchronizer::new(cues),
            cache,
            hover,
            observer,
            last_render: Mutex::new(SyncState::idle()),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Fetch, parse and attach under the configured retry policy.
    ///
    /// Every attempt re-runs the whole step: video check, payload fetch,
    /// parse and overlay attachment.
    pub async fn establish(ctx: &SessionContext, subtitle_url: &str) -> Result<Self> {
        let policy = ctx.config.retry_policy();
        let cues = policy.attempt(|| prepare(ctx, subtitle_url)).await?;

        let session = Self::new(
            subtitle_url,
            cues,
            Arc::clone(&ctx.backend),
            Arc::clone(&ctx.observer),
            &ctx.config,
        );
        log::info!(
            "Session {} established with {} cues",
            session.id,
            session.synchronizer.cues().len()
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subtitle_url(&self) -> &str {
        &self.subtitle_url
    }

    pub fn cues(&self) -> &CueSequence {
        self.synchronizer.cues()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn translation_display(&self) -> TranslationDisplay {
        self.hover.display()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Playback tick. Renders the overlay for `current_time` and hides the
    /// translation box when the active cue changes.
    pub fn on_time_update(&self, current_time: f64) -> SyncState {
        let state = self.synchronizer.sync(current_time);
        if self.is_torn_down() {
            return state;
        }

        let cue_changed = {
            let mut last = self.last_render.lock();
            let changed = last.active_cue != state.active_cue;
            *last = state.clone();
            changed
        };

        if cue_changed {
            // The hovered word is gone from the caption window
            if matches!(self.hover.display(), TranslationDisplay::Shown { .. }) {
                self.hover.leave();
            } else if self.hover.is_busy() {
                self.hover.cancel();
            }
        }

        self.observer.on_render(&state);
        state
    }

    /// Pointer entered a word of the caption window.
    ///
    /// Must be called from within a tokio runtime.
    pub fn hover_enter(&self, word: HoveredWord) {
        if self.is_torn_down() {
            return;
        }
        self.hover.enter(word);
    }

    /// Hover the word at `index` of rendered line `line`. Returns `false` when
    /// the last render has no such word.
    ///
    /// Must be called from within a tokio runtime.
    pub fn hover_word_at(&self, line: usize, index: usize) -> bool {
        let word = {
            let last = self.last_render.lock();
            last.lines
                .get(line)
                .and_then(|rendered| rendered.words.get(index))
                .map(|rendered| HoveredWord::new(line, index, rendered.text.clone()))
        };

        match word {
            Some(word) => {
                self.hover_enter(word);
                true
            }
            None => false,
        }
    }

    pub fn hover_leave(&self) {
        if self.is_torn_down() {
            return;
        }
        self.hover.leave();
    }

    /// Cancel the pending hover and drop the cache. Idempotent.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.hover.cancel();
        self.cache.clear();
        log::info!("Session {} torn down", self.id);
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn prepare(ctx: &SessionContext, subtitle_url: &str) -> Result<CueSequence> {
    if !ctx.host.has_video() {
        return Err(OverlayError::Setup("no video element on the page".to_string()));
    }

    let payload = ctx.fetcher.fetch(subtitle_url).await?;
    let cues = parse_vtt(&payload);
    if cues.is_empty() {
        return Err(OverlayError::SubtitleParsing(
            "caption payload contains no cues".to_string(),
        ));
    }

    ctx.host.attach_overlay()?;
    Ok(cues)
}

/// What a navigation event led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Same URL as last time
    Unchanged,
    /// Another session is being constructed; the event was dropped
    Busy,
    /// Previous session (if any) torn down, no subtitles for the new page
    NoSubtitles,
    Established(Uuid),
    /// Setup retries were exhausted
    Failed,
}

struct ConstructionGuard<'a>(&'a AtomicBool);

impl<'a> ConstructionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Keeps at most one live session in step with page navigation
pub struct SessionManager {
    ctx: SessionContext,
    locator: Arc<dyn SubtitleSourceLocator>,
    last_url: Mutex<Option<String>>,
    constructing: AtomicBool,
    current: Mutex<Option<Arc<OverlaySession>>>,
}

impl SessionManager {
    pub fn new(ctx: SessionContext, locator: Arc<dyn SubtitleSourceLocator>) -> Self {
        Self {
            ctx,
            locator,
            last_url: Mutex::new(None),
            constructing: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<Arc<OverlaySession>> {
        self.current.lock().clone()
    }

    pub fn is_constructing(&self) -> bool {
        self.constructing.load(Ordering::SeqCst)
    }

    /// React to the page URL changing.
    ///
    /// A navigation arriving while a session is being built is reported as
    /// [`NavigationOutcome::Busy`]; the construction in flight then catches up
    /// with the latest URL before returning.
    pub async fn on_location_change(&self, url: &str) -> NavigationOutcome {
        {
            let mut last_url = self.last_url.lock();
            if last_url.as_deref() == Some(url) {
                return NavigationOutcome::Unchanged;
            }
            *last_url = Some(url.to_string());
        }

        let Some(_guard) = ConstructionGuard::acquire(&self.constructing) else {
            log::debug!("Session construction in progress, deferring navigation to {}", url);
            return NavigationOutcome::Busy;
        };

        let mut target = url.to_string();
        loop {
            let outcome = self.rebuild(&target).await;

            let latest = self.last_url.lock().clone();
            match latest {
                Some(latest) if latest != target => {
                    log::info!("Page moved to {} during setup, rebuilding", latest);
                    target = latest;
                }
                _ => return outcome,
            }
        }
    }

    async fn rebuild(&self, url: &str) -> NavigationOutcome {
        self.teardown_current();

        let Some(subtitle_url) = self.locator.locate(url).await else {
            log::info!("No subtitles for {}", url);
            return NavigationOutcome::NoSubtitles;
        };

        match OverlaySession::establish(&self.ctx, &subtitle_url).await {
            Ok(session) => {
                let id = session.id();
                *self.current.lock() = Some(Arc::new(session));
                NavigationOutcome::Established(id)
            }
            Err(e) => {
                log::error!("Could not set up overlay for {}: {}", url, e);
                NavigationOutcome::Failed
            }
        }
    }

    /// Tear down the live session, if any
    pub fn teardown_current(&self) {
        let previous = self.current.lock().take();
        if let Some(session) = previous {
            session.teardown();
        }
    }
}
