//! In-memory translation cache with request coalescing
//!
//! One entry per `(target language, exact source text)`. A miss starts a
//! single shared fetch; every caller asking for the same key while it is in
//! flight awaits that same fetch. The cache lives as long as its session and
//! is never persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::config::OverlayConfig;
use super::client::TranslationBackend;

type SharedTranslation = Shared<BoxFuture<'static, std::result::Result<String, String>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    target_lang: String,
    text: String,
}

enum CacheEntry {
    Ready(String),
    Pending { id: u64, fetch: SharedTranslation },
}

enum Lookup {
    Hit(String),
    Wait { id: u64, fetch: SharedTranslation },
}

/// Session-scoped translation cache
pub struct TranslationCache {
    backend: Arc<dyn TranslationBackend>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    target_lang: String,
    cache_failures: bool,
    next_fetch_id: AtomicU64,
    requests: AtomicUsize,
}

impl TranslationCache {
    pub fn new(backend: Arc<dyn TranslationBackend>, config: &OverlayConfig) -> Self {
        Self {
            backend,
            entries: Mutex::new(HashMap::new()),
            target_lang: config.target_lang.clone(),
            cache_failures: config.cache_failed_translations,
            next_fetch_id: AtomicU64::new(0),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// Translate into the configured target language
    pub async fn translate(&self, text: &str) -> String {
        let target_lang = self.target_lang.clone();
        self.translate_to(text, &target_lang).await
    }

    /// Translate `text` into `target_lang`.
    ///
    /// Never fails: on any backend error the source text is returned.
    pub async fn translate_to(&self, text: &str, target_lang: &str) -> String {
        let key = CacheKey {
            target_lang: target_lang.to_string(),
            text: text.to_string(),
        };

        let (id, fetch) = match self.lookup_or_start(&key) {
            Lookup::Hit(translated) => return translated,
            Lookup::Wait { id, fetch } => (id, fetch),
        };

        let outcome = fetch.await;
        self.settle(&key, id, &outcome);

        match outcome {
            Ok(translated) => translated,
            Err(_) => text.to_string(),
        }
    }

    fn lookup_or_start(&self, key: &CacheKey) -> Lookup {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(CacheEntry::Ready(translated)) => {
                log::debug!("Translation cache hit for {:?}", key.text);
                Lookup::Hit(translated.clone())
            }
            Some(CacheEntry::Pending { id, fetch }) => {
                log::debug!("Joining in-flight translation of {:?}", key.text);
                Lookup::Wait {
                    id: *id,
                    fetch: fetch.clone(),
                }
            }
            None => {
                log::debug!("Translation cache miss for {:?}", key.text);
                let id = self.next_fetch_id.fetch_add(1, Ordering::SeqCst);
                self.requests.fetch_add(1, Ordering::SeqCst);

                let backend = Arc::clone(&self.backend);
                let text = key.text.clone();
                let target_lang = key.target_lang.clone();
                let fetch = async move {
                    backend
                        .translate(&text, &target_lang)
                        .await
                        .map_err(|e| e.to_string())
                }
                .boxed()
                .shared();

                entries.insert(key.clone(), CacheEntry::Pending { id, fetch: fetch.clone() });
                Lookup::Wait { id, fetch }
            }
        }
    }

    /// Replace the pending entry with the fetch outcome. Only the fetch that
    /// created the entry may settle it, and a cleared cache stays cleared.
    fn settle(&self, key: &CacheKey, id: u64, outcome: &std::result::Result<String, String>) {
        let mut entries = self.entries.lock();
        let owns_entry = matches!(entries.get(key), Some(CacheEntry::Pending { id: pending, .. }) if *pending == id);
        if !owns_entry {
            return;
        }

        match outcome {
            Ok(translated) => {
                entries.insert(key.clone(), CacheEntry::Ready(translated.clone()));
            }
            Err(e) => {
                log::warn!("Translation of {:?} failed, showing source text: {}", key.text, e);
                if self.cache_failures {
                    entries.insert(key.clone(), CacheEntry::Ready(key.text.clone()));
                } else {
                    entries.remove(key);
                }
            }
        }
    }

    /// Number of settled translations
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|entry| matches!(entry, CacheEntry::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Outbound requests issued since creation
    pub fn requests_issued(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Drop every entry; fetches still in flight will not repopulate it
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        log::debug!("Clearing translation cache ({} entries)", entries.len());
        entries.clear();
    }
}
