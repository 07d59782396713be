use crate::error::Result;
use crate::models::{GenerationConfig, MediaFile, DEFAULT_AD_SYSTEM};
use crate::tracking::{TrackingEventType, TrackingUrlBuilder, VIDEO_MILESTONES};
use crate::xml::{self, Element};

/// Schema version of every document this builder emits
pub const VAST_VERSION: &str = "3.0";

/// Staged builder for a single-ad VAST document
///
/// Stages may run in any order and re-running a stage overwrites its field
/// (`add_*` stages append); [`VastBuilder::build`] is the terminal call and
/// assembles a fresh document tree, so one builder produces the same output
/// however often it is serialized. The builder performs no I/O.
#[derive(Debug, Clone)]
pub struct VastBuilder {
    tracking: TrackingUrlBuilder,
    ad_id: String,
    system: String,
    title: String,
    description: String,
    impression_url: String,
    duration: String,
    media_files: Vec<MediaFile>,
    click_through: Option<String>,
    click_tracking: Vec<String>,
    tracking_events: Vec<(TrackingEventType, String)>,
}

impl VastBuilder {
    /// Create a builder; fails if the tracking base URL does not parse.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let tracking = TrackingUrlBuilder::new(&config.tracking_base_url)?;
        Ok(VastBuilder {
            tracking,
            ad_id: String::new(),
            system: DEFAULT_AD_SYSTEM.to_string(),
            title: String::new(),
            description: String::new(),
            impression_url: String::new(),
            duration: String::new(),
            media_files: Vec::new(),
            click_through: None,
            click_tracking: Vec::new(),
            tracking_events: Vec::new(),
        })
    }

    /// Set ad identity and derive the impression tracking URL from it.
    pub fn set_ad_info(
        mut self,
        id: &str,
        title: &str,
        description: Option<&str>,
        system: Option<&str>,
    ) -> Self {
        self.ad_id = id.to_string();
        self.title = title.to_string();
        self.description = description.unwrap_or_default().to_string();
        self.system = system.unwrap_or(DEFAULT_AD_SYSTEM).to_string();
        self.impression_url = self.tracking.impression_url(id);
        self
    }

    /// Append one media file; call order is preserved in the output.
    pub fn add_media_file(mut self, media_file: &MediaFile) -> Self {
        self.media_files.push(media_file.clone());
        self
    }

    /// Set the playback duration; the last call wins.
    pub fn set_duration(mut self, duration: &str) -> Self {
        self.duration = duration.to_string();
        self
    }

    /// Set the optional click-through URL and append click-tracking URLs.
    pub fn set_click_urls(mut self, click_through: Option<&str>, click_tracking: &[String]) -> Self {
        self.click_through = click_through.map(str::to_string);
        self.click_tracking.extend(click_tracking.iter().cloned());
        self
    }

    /// Append one `<Tracking>` element for `event`.
    pub fn add_tracking_event(mut self, event: TrackingEventType, url: &str) -> Self {
        self.tracking_events.push((event, url.to_string()));
        self
    }

    /// Append the five canonical milestone events, in order, with URLs
    /// built from the tracking base for `ad_id`.
    pub fn add_default_tracking(mut self, ad_id: &str) -> Self {
        for event in VIDEO_MILESTONES {
            let url = self.tracking.video_event_url(event, ad_id);
            self.tracking_events.push((event, url));
        }
        self
    }

    /// Assemble the VAST document tree from the accumulated fields.
    pub fn document(&self) -> Element {
        let mut media_files = Element::new("MediaFiles");
        for media_file in &self.media_files {
            media_files = media_files.child(media_file_element(media_file));
        }

        let mut video_clicks = Element::new("VideoClicks");
        if let Some(click_through) = &self.click_through {
            video_clicks =
                video_clicks.child(Element::new("ClickThrough").cdata(click_through.clone()));
        }
        for url in &self.click_tracking {
            video_clicks = video_clicks.child(Element::new("ClickTracking").cdata(url.clone()));
        }

        let mut tracking_events = Element::new("TrackingEvents");
        for (event, url) in &self.tracking_events {
            tracking_events = tracking_events.child(
                Element::new("Tracking")
                    .attr("event", event.as_str())
                    .cdata(url.clone()),
            );
        }

        let linear = Element::new("Linear")
            .child(text_element("Duration", &self.duration))
            .child(media_files)
            .child(video_clicks)
            .child(tracking_events);

        let inline = Element::new("InLine")
            .child(text_element("AdSystem", &self.system))
            .child(text_element("AdTitle", &self.title))
            .child(text_element("Description", &self.description))
            .child(Element::new("Impression").cdata(self.impression_url.clone()))
            .child(Element::new("Creatives").child(Element::new("Creative").child(linear)));

        Element::new("VAST")
            .attr("version", VAST_VERSION)
            .child(Element::new("Ad").attr("id", &self.ad_id).child(inline))
    }

    /// Serialize the accumulated document to a pretty-printed XML string.
    pub fn build(&self) -> String {
        xml::render_document(&self.document())
    }
}

fn text_element(name: &str, value: &str) -> Element {
    if value.is_empty() {
        Element::new(name)
    } else {
        Element::new(name).text(value)
    }
}

fn media_file_element(media_file: &MediaFile) -> Element {
    Element::new("MediaFile")
        .attr("delivery", media_file.delivery.as_str())
        .attr("type", &media_file.mime_type)
        .attr("width", media_file.width)
        .attr("height", media_file.height)
        .attr("bitrate", media_file.bitrate)
        .attr("scalable", media_file.scalable)
        .attr("maintainAspectRatio", media_file.maintain_aspect_ratio)
        .cdata(media_file.url.clone())
}
