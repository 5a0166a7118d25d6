//! Subtitle source location
//!
//! Recognises a watch page, picks the foreign-language caption track from the
//! player's track list and turns it into a WebVTT URL. Reading the track list
//! out of the page is left to a [`CaptionTrackProvider`].

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::setup::RetryPolicy;

lazy_static! {
    static ref VIDEO_ID_PATTERNS: [Regex; 3] = [
        Regex::new(r"(?:https?://)?(?:www\.)?youtube\.com/watch\?v=([^&]+)").unwrap(),
        Regex::new(r"(?:https?://)?(?:www\.)?youtube\.com/embed/([^?]+)").unwrap(),
        Regex::new(r"(?:https?://)?(?:www\.)?youtu\.be/([^?]+)").unwrap(),
    ];
    static ref TRACK_VIDEO_ID: Regex = Regex::new(r"[?&]v=([^&]+)").unwrap();
}

/// One entry of the player's caption track list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    /// `a.<lang>` for automatic captions, `.<lang>` for uploaded ones
    pub vss_id: String,
    pub base_url: String,
}

impl CaptionTrack {
    pub fn is_auto_generated(&self) -> bool {
        self.vss_id.starts_with("a.")
    }

    /// Video id embedded in the track URL
    pub fn video_id(&self) -> Option<&str> {
        TRACK_VIDEO_ID
            .captures(&self.base_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Parse the `captionTracks` array of a player response
pub fn parse_caption_tracks(json: &str) -> Result<Vec<CaptionTrack>> {
    Ok(serde_json::from_str(json)?)
}

/// Extract the video id from a watch, embed or short URL
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether the track list belongs to `video_id`. Right after navigation the
/// player still exposes the previous video's tracks.
pub fn tracks_match_video(tracks: &[CaptionTrack], video_id: &str) -> bool {
    tracks
        .first()
        .and_then(CaptionTrack::video_id)
        .map_or(false, |id| id == video_id)
}

/// Pick the caption track to overlay and return its WebVTT URL.
///
/// Automatic captions in one of `languages` win over uploaded ones, since
/// only they carry word timing. A track list left over from the previous
/// video yields `None`.
pub fn select_track(tracks: &[CaptionTrack], video_id: &str, languages: &[String]) -> Option<String> {
    if !tracks_match_video(tracks, video_id) {
        return None;
    }

    let has_foreign = tracks
        .iter()
        .any(|track| languages.iter().any(|lang| track.vss_id.contains(lang.as_str())));
    if !has_foreign {
        return None;
    }

    let auto_generated = tracks.iter().find(|track| {
        languages
            .iter()
            .any(|lang| track.vss_id == format!("a.{}", lang))
    });
    let uploaded = tracks
        .iter()
        .find(|track| languages.iter().any(|lang| track.vss_id.contains(lang.as_str())));

    auto_generated
        .or(uploaded)
        .map(|track| format!("{}&fmt=vtt", track.base_url))
}

/// Finds the subtitle URL for a page
#[async_trait]
pub trait SubtitleSourceLocator: Send + Sync {
    /// `None` when the page is not a supported video or has no usable track
    async fn locate(&self, page_url: &str) -> Option<String>;
}

/// Reads the caption track list out of the host page
#[async_trait]
pub trait CaptionTrackProvider: Send + Sync {
    /// `None` while the player has not published its tracks yet
    async fn caption_tracks(&self) -> Option<Vec<CaptionTrack>>;
}

/// Locator that polls a [`CaptionTrackProvider`] until the track list is
/// available for the current video
pub struct TrackListLocator<P> {
    provider: P,
    languages: Vec<String>,
    poll: RetryPolicy,
}

impl<P: CaptionTrackProvider> TrackListLocator<P> {
    pub fn new(provider: P, config: &OverlayConfig) -> Self {
        Self {
            provider,
            languages: config.source_languages.clone(),
            poll: config.retry_policy(),
        }
    }

    pub fn with_poll_policy(mut self, poll: RetryPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn current_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let tracks = self
            .provider
            .caption_tracks()
            .await
            .ok_or_else(|| OverlayError::Setup("player has no caption tracks yet".to_string()))?;
        if !tracks_match_video(&tracks, video_id) {
            return Err(OverlayError::Setup(format!(
                "caption tracks do not belong to video {}",
                video_id
            )));
        }
        Ok(tracks)
    }
}

#[async_trait]
impl<P: CaptionTrackProvider> SubtitleSourceLocator for TrackListLocator<P> {
    async fn locate(&self, page_url: &str) -> Option<String> {
        let video_id = extract_video_id(page_url)?;

        let tracks = match self.poll.attempt(|| self.current_tracks(&video_id)).await {
            Ok(tracks) => tracks,
            Err(e) => {
                log::warn!("No caption tracks for video {}: {}", video_id, e);
                return None;
            }
        };

        let url = select_track(&tracks, &video_id, &self.languages);
        match &url {
            Some(url) => log::info!("Subtitle URL for video {}: {}", video_id, url),
            None => log::info!("Video {} has no caption track in {:?}", video_id, self.languages),
        }
        url
    }
}
