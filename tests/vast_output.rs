//! Round-trip tests: parse generated documents and compare against the input.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::str::from_utf8;

use vast_ad_server::create_vast_xml;
use vast_ad_server::models::{AdData, GenerationConfig, MediaFile, TrackingEvents};

/// Values re-extracted from a generated VAST document
#[derive(Debug, Default)]
struct ExtractedVast {
    version: String,
    ad_id: String,
    ad_title: String,
    duration: String,
    impression: String,
    click_through: Option<String>,
    media_urls: Vec<String>,
    tracking_events: Vec<(String, String)>,
}

/// Walk the document with a streaming reader and pull out the fields the
/// round-trip assertions need. Fails the test on any malformed XML.
fn extract(xml: &str) -> ExtractedVast {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut result = ExtractedVast::default();
    let mut path: Vec<String> = Vec::new();
    let mut current_event: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = from_utf8(e.name().as_ref()).unwrap().to_string();
                for attr in e.attributes().flatten() {
                    let value = from_utf8(&attr.value).unwrap().to_string();
                    match (name.as_str(), attr.key.as_ref()) {
                        ("VAST", b"version") => result.version = value,
                        ("Ad", b"id") => result.ad_id = value,
                        ("Tracking", b"event") => current_event = Some(value),
                        _ => (),
                    }
                }
                path.push(name);
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap().into_owned();
                match path.last().map(String::as_str) {
                    Some("AdTitle") => result.ad_title = text,
                    Some("Duration") => result.duration = text,
                    _ => (),
                }
            }
            Ok(Event::CData(e)) => {
                let text = from_utf8(&e).unwrap().to_string();
                match path.last().map(String::as_str) {
                    Some("Impression") => result.impression = text,
                    Some("ClickThrough") => result.click_through = Some(text),
                    Some("MediaFile") => result.media_urls.push(text),
                    Some("Tracking") => {
                        let event = current_event.take().unwrap_or_default();
                        result.tracking_events.push((event, text));
                    }
                    _ => (),
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => panic!("generated XML failed to parse: {e:?}"),
            _ => (),
        }
        buf.clear();
    }

    assert!(path.is_empty(), "unbalanced elements: {path:?}");
    result
}

fn config() -> GenerationConfig {
    GenerationConfig::new("https://tracking.example.com/events")
}

fn full_ad() -> AdData {
    let mut high = MediaFile::new("https://cdn.example.com/spot-1080.mp4?profile=hd&sig=a%2Fb");
    high.width = 1920;
    high.height = 1080;
    high.bitrate = 2000;

    AdData {
        id: "ad-77".to_string(),
        title: "Summer Launch".to_string(),
        description: Some("Summer launch spot".to_string()),
        system: Some("Acme Ads".to_string()),
        media_files: vec![MediaFile::new("https://cdn.example.com/spot-360.mp4"), high],
        duration: "00:00:15".to_string(),
        click_through: Some("https://example.com/landing".to_string()),
        click_tracking: vec!["https://tracking.example.com/ct".to_string()],
        tracking_events: TrackingEvents {
            complete: Some("https://partner.example.com/done".to_string()),
            ..TrackingEvents::default()
        },
    }
}

#[test]
fn generated_document_round_trips() {
    let ad = full_ad();
    let xml = create_vast_xml(&config(), &ad).unwrap();
    let extracted = extract(&xml);

    assert_eq!(extracted.version, "3.0");
    assert_eq!(extracted.ad_id, ad.id);
    assert_eq!(extracted.ad_title, ad.title);
    assert_eq!(extracted.duration, ad.duration);
    assert_eq!(
        extracted.media_urls,
        vec![
            "https://cdn.example.com/spot-360.mp4",
            "https://cdn.example.com/spot-1080.mp4?profile=hd&sig=a%2Fb",
        ]
    );
    assert_eq!(extracted.click_through.as_deref(), Some("https://example.com/landing"));
}

#[test]
fn default_tracking_events_come_first_with_ad_id() {
    let ad = full_ad();
    let xml = create_vast_xml(&config(), &ad).unwrap();
    let extracted = extract(&xml);

    let events: Vec<&str> = extracted
        .tracking_events
        .iter()
        .map(|(event, _)| event.as_str())
        .collect();
    assert_eq!(
        events,
        vec![
            "start",
            "firstQuartile",
            "midpoint",
            "thirdQuartile",
            "complete",
            // the caller-supplied milestone URL appends after the defaults
            "complete",
        ]
    );

    for (_, url) in &extracted.tracking_events[..5] {
        assert!(url.contains("adId=ad-77"), "default URL missing adId: {url}");
    }
    assert_eq!(
        extracted.tracking_events[5].1,
        "https://partner.example.com/done"
    );
    assert!(extracted.impression.contains("event=impression"));
    assert!(extracted.impression.contains("adId=ad-77"));
}

#[test]
fn ampersand_urls_stay_literal_inside_cdata() {
    let mut ad = full_ad();
    ad.media_files = vec![MediaFile::new("https://x.example/a?b=1&c=2")];
    let xml = create_vast_xml(&config(), &ad).unwrap();

    assert!(xml.contains("<MediaFile"));
    assert!(xml.contains("<![CDATA[https://x.example/a?b=1&c=2]]>"));

    let extracted = extract(&xml);
    assert_eq!(extracted.media_urls, vec!["https://x.example/a?b=1&c=2"]);
}

#[test]
fn minimal_ad_keeps_required_containers() {
    let ad = AdData {
        id: "ad-min".to_string(),
        title: "Minimal".to_string(),
        description: None,
        system: None,
        media_files: vec![MediaFile::new("https://cdn.example.com/a.mp4")],
        duration: "00:00:10".to_string(),
        click_through: None,
        click_tracking: Vec::new(),
        tracking_events: TrackingEvents::default(),
    };
    let xml = create_vast_xml(&config(), &ad).unwrap();
    let extracted = extract(&xml);

    // Only the five defaults, no click-through, but containers present
    assert_eq!(extracted.tracking_events.len(), 5);
    assert_eq!(extracted.click_through, None);
    assert!(xml.contains("<VideoClicks/>"));
    assert!(xml.contains("<TrackingEvents>"));
}

#[test]
fn reserved_characters_in_titles_survive_the_round_trip() {
    let mut ad = full_ad();
    ad.title = "Cats & Dogs <Uncut>".to_string();
    let xml = create_vast_xml(&config(), &ad).unwrap();

    assert!(xml.contains("<AdTitle>Cats &amp; Dogs &lt;Uncut&gt;</AdTitle>"));
    assert_eq!(extract(&xml).ad_title, "Cats & Dogs <Uncut>");
}
