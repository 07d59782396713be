use crate::error::{AdServerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Event name used for impression tracking URLs (not a `<Tracking>` event)
pub const IMPRESSION_EVENT: &str = "impression";

/// Playback milestone and interaction events a player may report
///
/// This is the closed set of values accepted in `<Tracking event="…">`
/// elements; anything outside it is rejected at the input boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackingEventType {
    // Video playback milestones
    Start,
    FirstQuartile,
    Midpoint,
    ThirdQuartile,
    Complete,

    // User interaction events
    Mute,
    Unmute,
    Pause,
    Resume,
    Fullscreen,
    Skip,
    Click,
    Close,
}

/// The five canonical playback milestones, in reporting order
pub const VIDEO_MILESTONES: [TrackingEventType; 5] = [
    TrackingEventType::Start,
    TrackingEventType::FirstQuartile,
    TrackingEventType::Midpoint,
    TrackingEventType::ThirdQuartile,
    TrackingEventType::Complete,
];

impl TrackingEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingEventType::Start => "start",
            TrackingEventType::FirstQuartile => "firstQuartile",
            TrackingEventType::Midpoint => "midpoint",
            TrackingEventType::ThirdQuartile => "thirdQuartile",
            TrackingEventType::Complete => "complete",
            TrackingEventType::Mute => "mute",
            TrackingEventType::Unmute => "unmute",
            TrackingEventType::Pause => "pause",
            TrackingEventType::Resume => "resume",
            TrackingEventType::Fullscreen => "fullscreen",
            TrackingEventType::Skip => "skip",
            TrackingEventType::Click => "click",
            TrackingEventType::Close => "close",
        }
    }
}

impl fmt::Display for TrackingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingEventType {
    type Err = AdServerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(TrackingEventType::Start),
            "firstQuartile" => Ok(TrackingEventType::FirstQuartile),
            "midpoint" => Ok(TrackingEventType::Midpoint),
            "thirdQuartile" => Ok(TrackingEventType::ThirdQuartile),
            "complete" => Ok(TrackingEventType::Complete),
            "mute" => Ok(TrackingEventType::Mute),
            "unmute" => Ok(TrackingEventType::Unmute),
            "pause" => Ok(TrackingEventType::Pause),
            "resume" => Ok(TrackingEventType::Resume),
            "fullscreen" => Ok(TrackingEventType::Fullscreen),
            "skip" => Ok(TrackingEventType::Skip),
            "click" => Ok(TrackingEventType::Click),
            "close" => Ok(TrackingEventType::Close),
            other => Err(AdServerError::InvalidField {
                field: "event",
                reason: format!("unknown tracking event type '{other}'"),
            }),
        }
    }
}

/// Builds tracking URLs by appending event query parameters to a base URL
///
/// Pre-existing query parameters on the base URL are left untouched; the
/// `event` parameter comes next, followed by caller-supplied parameters in
/// the order given. Identical inputs always produce identical output.
#[derive(Debug, Clone)]
pub struct TrackingUrlBuilder {
    base_url: Url,
}

impl TrackingUrlBuilder {
    /// Create a builder for the given tracking base URL.
    /// Fails if the base is not an absolute, parseable URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(TrackingUrlBuilder { base_url })
    }

    /// Build a tracking URL for `event` with additional query parameters.
    pub fn build_url(&self, event: &str, params: &[(&str, &str)]) -> String {
        let mut url = self.base_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("event", event);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        url.to_string()
    }

    /// Build the impression tracking URL for an ad.
    pub fn impression_url(&self, ad_id: &str) -> String {
        self.build_url(IMPRESSION_EVENT, &[("adId", ad_id)])
    }

    /// Build a video event tracking URL for an ad.
    pub fn video_event_url(&self, event: TrackingEventType, ad_id: &str) -> String {
        self.build_url(event.as_str(), &[("adId", ad_id)])
    }

    /// Build the click tracking URL for an ad.
    pub fn click_url(&self, ad_id: &str) -> String {
        self.build_url(TrackingEventType::Click.as_str(), &[("adId", ad_id)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_appends_event_then_params() {
        let builder = TrackingUrlBuilder::new("https://tracking.example.com/events").unwrap();
        let url = builder.build_url("start", &[("adId", "ad-1"), ("slot", "pre")]);
        assert_eq!(
            url,
            "https://tracking.example.com/events?event=start&adId=ad-1&slot=pre"
        );
    }

    #[test]
    fn build_url_preserves_existing_query() {
        let builder = TrackingUrlBuilder::new("https://x.example/t?key=abc").unwrap();
        let url = builder.build_url("complete", &[("adId", "ad-9")]);
        assert_eq!(url, "https://x.example/t?key=abc&event=complete&adId=ad-9");
    }

    #[test]
    fn build_url_is_deterministic() {
        let builder = TrackingUrlBuilder::new("https://x.example/t").unwrap();
        let first = builder.build_url("start", &[("adId", "X")]);
        let second = builder.build_url("start", &[("adId", "X")]);
        assert_eq!(first, second);
    }

    #[test]
    fn build_url_differs_only_in_ad_id() {
        let builder = TrackingUrlBuilder::new("https://x.example/t").unwrap();
        let a = builder.build_url("start", &[("adId", "A")]);
        let b = builder.build_url("start", &[("adId", "B")]);
        assert_eq!(a.replace("adId=A", "adId=B"), b);
    }

    #[test]
    fn build_url_encodes_reserved_characters() {
        let builder = TrackingUrlBuilder::new("https://x.example/t").unwrap();
        let url = builder.build_url("start", &[("adId", "a b&c")]);
        assert!(url.ends_with("adId=a+b%26c"));
    }

    #[test]
    fn rejects_relative_base_url() {
        assert!(TrackingUrlBuilder::new("/events").is_err());
        assert!(TrackingUrlBuilder::new("").is_err());
    }

    #[test]
    fn impression_and_click_urls() {
        let builder = TrackingUrlBuilder::new("https://x.example/t").unwrap();
        assert_eq!(
            builder.impression_url("ad-1"),
            "https://x.example/t?event=impression&adId=ad-1"
        );
        assert_eq!(
            builder.click_url("ad-1"),
            "https://x.example/t?event=click&adId=ad-1"
        );
    }

    #[test]
    fn event_type_round_trips_through_strings() {
        for event in VIDEO_MILESTONES {
            assert_eq!(event.as_str().parse::<TrackingEventType>().unwrap(), event);
        }
        assert!("pageview".parse::<TrackingEventType>().is_err());
    }
}
