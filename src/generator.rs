use crate::builder::VastBuilder;
use crate::error::Result;
use crate::models::{AdData, GenerationConfig};

/// Generate a VAST XML document for `ad` against `config`
///
/// Both inputs are validated before the builder is constructed, so no
/// partial XML is ever produced for malformed input. The transform is pure:
/// identical inputs yield byte-identical documents.
pub fn create_vast_xml(config: &GenerationConfig, ad: &AdData) -> Result<String> {
    config.validate()?;
    ad.validate()?;

    let mut builder = VastBuilder::new(config)?.set_ad_info(
        &ad.id,
        &ad.title,
        ad.description.as_deref(),
        ad.system.as_deref(),
    );

    for media_file in &ad.media_files {
        builder = builder.add_media_file(media_file);
    }

    builder = builder
        .set_duration(&ad.duration)
        .set_click_urls(ad.click_through.as_deref(), &ad.click_tracking)
        .add_default_tracking(&ad.id);

    for (event, url) in ad.tracking_events.iter() {
        builder = builder.add_tracking_event(event, url);
    }

    Ok(builder.build())
}
