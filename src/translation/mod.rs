//! On-demand word translation
//!
//! Backend client, session-scoped coalescing cache and the debounced hover
//! controller built on top of them.

pub mod client;
pub mod cache;
pub mod hover;

pub use cache::TranslationCache;
pub use client::{extract_translation, GoogleTranslateClient, TranslationBackend};
pub use hover::{HoverController, HoveredWord, TranslationDisplay};
