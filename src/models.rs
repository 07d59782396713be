use crate::error::{AdServerError, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use url::Url;

use crate::tracking::TrackingEventType;

/// Ad system name reported in `<AdSystem>` when the caller does not set one
pub const DEFAULT_AD_SYSTEM: &str = "Ad Server";

/// Media file delivery method
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    #[default]
    Progressive,
    Streaming,
}

impl Delivery {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delivery::Progressive => "progressive",
            Delivery::Streaming => "streaming",
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One playable asset variant for a creative
///
/// Loosely-typed input (e.g. an ad file) is normalized through serde with
/// per-field defaults; only the URL has to be supplied.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Absolute URL of the media asset
    pub url: String,

    /// Delivery method (progressive or streaming)
    #[serde(default)]
    pub delivery: Delivery,

    /// MIME type of the asset
    #[serde(alias = "type", default = "default_mime_type")]
    pub mime_type: String,

    /// Video width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Video height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Bitrate in kbps
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,

    /// Whether the player may scale the video
    #[serde(default = "default_true")]
    pub scalable: bool,

    /// Whether the aspect ratio must be kept when scaling
    #[serde(default = "default_true")]
    pub maintain_aspect_ratio: bool,
}

fn default_mime_type() -> String {
    "video/mp4".to_string()
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    360
}

fn default_bitrate() -> u32 {
    500
}

fn default_true() -> bool {
    true
}

impl MediaFile {
    /// Create a media file for `url` with default attributes.
    pub fn new(url: impl Into<String>) -> Self {
        MediaFile {
            url: url.into(),
            delivery: Delivery::default(),
            mime_type: default_mime_type(),
            width: default_width(),
            height: default_height(),
            bitrate: default_bitrate(),
            scalable: true,
            maintain_aspect_ratio: true,
        }
    }

    /// Check required fields and formats, failing on the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(AdServerError::MissingField("url"));
        }
        Url::parse(&self.url).map_err(|e| AdServerError::InvalidField {
            field: "url",
            reason: format!("'{}' is not an absolute URL: {e}", self.url),
        })?;
        if self.width == 0 || self.height == 0 {
            return Err(AdServerError::InvalidField {
                field: "width/height",
                reason: "dimensions must be positive".to_string(),
            });
        }
        if self.bitrate == 0 {
            return Err(AdServerError::InvalidField {
                field: "bitrate",
                reason: "bitrate must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Caller-supplied tracking URLs for the five playback milestones
///
/// Absent milestones simply omit that `<Tracking>` element. Unknown keys in
/// input are rejected; the wider interaction-event vocabulary is reachable
/// through [`crate::builder::VastBuilder::add_tracking_event`].
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrackingEvents {
    pub start: Option<String>,
    pub first_quartile: Option<String>,
    pub midpoint: Option<String>,
    pub third_quartile: Option<String>,
    pub complete: Option<String>,
}

impl TrackingEvents {
    /// Present (event, url) pairs in canonical milestone order.
    pub fn iter(&self) -> impl Iterator<Item = (TrackingEventType, &str)> {
        [
            (TrackingEventType::Start, &self.start),
            (TrackingEventType::FirstQuartile, &self.first_quartile),
            (TrackingEventType::Midpoint, &self.midpoint),
            (TrackingEventType::ThirdQuartile, &self.third_quartile),
            (TrackingEventType::Complete, &self.complete),
        ]
        .into_iter()
        .filter_map(|(event, url)| url.as_ref().map(|u| (event, u.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    fn validate(&self) -> Result<()> {
        for (event, url) in self.iter() {
            Url::parse(url).map_err(|e| AdServerError::InvalidField {
                field: "trackingEvents",
                reason: format!("URL for '{event}' is invalid: {e}"),
            })?;
        }
        Ok(())
    }
}

/// The full description of one ad
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdData {
    /// Unique ad identifier
    pub id: String,

    /// Ad title
    pub title: String,

    /// Optional ad description
    #[serde(default)]
    pub description: Option<String>,

    /// Ad system name (defaults to [`DEFAULT_AD_SYSTEM`] at build time)
    #[serde(default)]
    pub system: Option<String>,

    /// Playable asset variants, at least one required; order is preserved
    pub media_files: Vec<MediaFile>,

    /// Playback duration in `HH:MM:SS` form; an integer second count is
    /// accepted in input and normalized
    #[serde(deserialize_with = "deserialize_duration")]
    pub duration: String,

    /// Landing page opened when the ad is clicked
    #[serde(default)]
    pub click_through: Option<String>,

    /// Additional click tracking URLs
    #[serde(default)]
    pub click_tracking: Vec<String>,

    /// Caller-supplied milestone tracking URLs, appended after the defaults
    #[serde(default)]
    pub tracking_events: TrackingEvents,
}

impl AdData {
    /// Check required fields first, then formats, failing on the first
    /// violation with the offending field named.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(AdServerError::MissingField("id"));
        }
        if self.title.is_empty() {
            return Err(AdServerError::MissingField("title"));
        }
        if self.media_files.is_empty() {
            return Err(AdServerError::MissingField("mediaFiles"));
        }
        if self.duration.is_empty() {
            return Err(AdServerError::MissingField("duration"));
        }

        if !is_valid_duration(&self.duration) {
            return Err(AdServerError::InvalidField {
                field: "duration",
                reason: format!("'{}' is not in HH:MM:SS format", self.duration),
            });
        }
        for media_file in &self.media_files {
            media_file.validate()?;
        }
        if let Some(click_through) = &self.click_through {
            Url::parse(click_through).map_err(|e| AdServerError::InvalidField {
                field: "clickThrough",
                reason: e.to_string(),
            })?;
        }
        for url in &self.click_tracking {
            Url::parse(url).map_err(|e| AdServerError::InvalidField {
                field: "clickTracking",
                reason: e.to_string(),
            })?;
        }
        self.tracking_events.validate()
    }
}

/// Builder-wide generation settings
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Base URL all tracking-event query parameters are appended to
    pub tracking_base_url: String,
}

impl GenerationConfig {
    pub fn new(tracking_base_url: impl Into<String>) -> Self {
        GenerationConfig {
            tracking_base_url: tracking_base_url.into(),
        }
    }

    /// Check that the tracking base is present and an absolute URL.
    pub fn validate(&self) -> Result<()> {
        if self.tracking_base_url.is_empty() {
            return Err(AdServerError::MissingField("trackingBaseUrl"));
        }
        Url::parse(&self.tracking_base_url).map_err(|e| AdServerError::InvalidField {
            field: "trackingBaseUrl",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// True when `duration` is exactly `HH:MM:SS`, zero-padded
pub fn is_valid_duration(duration: &str) -> bool {
    let bytes = duration.as_bytes();
    bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && [0, 1, 3, 4, 6, 7]
            .iter()
            .all(|&i| bytes[i].is_ascii_digit())
}

/// Format a second count as a canonical `HH:MM:SS` duration
pub fn duration_from_seconds(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Accept a duration as either an `HH:MM:SS` string or a second count
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an HH:MM:SS string or a number of seconds")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<String, E> {
            Ok(value.to_owned())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<String, E> {
            Ok(duration_from_seconds(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<String, E> {
            u64::try_from(value)
                .map(duration_from_seconds)
                .map_err(|_| E::custom("duration seconds must be non-negative"))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
