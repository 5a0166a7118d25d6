//! Session setup: fetching the caption payload and attaching the overlay to
//! the player, under a bounded retry policy.

pub mod fetch;
pub mod retry;

pub use fetch::{CaptionFetcher, HttpCaptionFetcher};
pub use retry::RetryPolicy;

use crate::error::Result;

/// The page hosting the video element
pub trait PlayerHost: Send + Sync {
    /// Whether a video element is currently displayed
    fn has_video(&self) -> bool;

    /// Insert the caption window into the player
    fn attach_overlay(&self) -> Result<()>;
}
