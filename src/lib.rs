pub mod builder;
pub mod error;
pub mod generator;
pub mod models;
pub mod server;
pub mod store;
pub mod tracking;
pub mod xml;

pub use builder::VastBuilder;
pub use error::{AdServerError, Result};
pub use generator::create_vast_xml;
pub use models::{AdData, GenerationConfig, MediaFile, TrackingEvents};
