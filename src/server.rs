//! HTTP surface: VAST ad requests and event-tracking beacons.

use crate::generator::create_vast_xml;
use crate::models::{AdData, GenerationConfig};
use crate::store::{EventRecord, EventStore};
use crate::tracking::IMPRESSION_EVENT;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// 1x1 transparent GIF served to image-context beacons
const TRANSPARENT_GIF_BASE64: &str = "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// Shared application state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub generation: GenerationConfig,
    /// The ad served for every request; a placeholder for a selection layer
    pub ad: AdData,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, generation: GenerationConfig, ad: AdData) -> Self {
        AppState {
            store,
            generation,
            ad,
            start_time: Instant::now(),
        }
    }
}

/// Build the application router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/requestAds", get(request_ads))
        .route("/events", get(track_event))
        .route("/impressions", get(record_impression))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Structured HTTP error with the `{"error":{"code","message"}}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn invalid_parameter(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_PARAMETER",
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND",
            message: "The requested resource was not found".to_string(),
        }
    }

    fn internal() -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            message: "An internal error occurred while processing the request".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    success: bool,
    event_id: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

/// GET /requestAds — serve the VAST document for the configured ad.
async fn request_ads(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    for required in ["appId", "adSlotId"] {
        if params.get(required).map(String::as_str).unwrap_or("").is_empty() {
            warn!(parameter = required, "Ad request missing required parameter");
            return Err(ApiError::invalid_parameter(format!(
                "'{required}' is a required parameter"
            )));
        }
    }

    info!(
        app_id = %params["appId"],
        ad_slot_id = %params["adSlotId"],
        ad_id = %state.ad.id,
        "Ad request received"
    );

    match create_vast_xml(&state.generation, &state.ad) {
        Ok(xml) => Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response()),
        Err(e) => {
            error!(error = %e, ad_id = %state.ad.id, "VAST generation failed");
            Err(ApiError::internal())
        }
    }
}

/// GET /events — record a playback event beacon.
async fn track_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let Some(event) = params.get("event").filter(|e| !e.is_empty()).cloned() else {
        warn!("Event beacon missing 'event' parameter");
        return Err(ApiError::invalid_parameter("'event' is a required parameter"));
    };

    let record = event_record(event, params, &headers);
    record_and_respond(&state, record, &headers)
}

/// GET /impressions — record an impression beacon.
async fn record_impression(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let record = event_record(IMPRESSION_EVENT.to_string(), params, &headers);
    record_and_respond(&state, record, &headers)
}

/// GET /health — service health and uptime.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Assemble an event record from the query and client metadata.
fn event_record(
    event: String,
    params: BTreeMap<String, String>,
    headers: &HeaderMap,
) -> EventRecord {
    let mut record = EventRecord::new(event, params);
    record.user_agent = header_value(headers, header::USER_AGENT);
    record.referer = header_value(headers, header::REFERER);
    record.ip = client_ip(headers);
    record
}

fn record_and_respond(
    state: &AppState,
    record: EventRecord,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let event = record.event.clone();

    let event_id = state.store.append(record).map_err(|e| {
        error!(error = %e, event = %event, "Failed to record event");
        ApiError::internal()
    })?;

    info!(event = %event, event_id = %event_id, "Event recorded");

    if wants_image(headers) {
        let pixel = BASE64.decode(TRANSPARENT_GIF_BASE64).map_err(|e| {
            error!(error = %e, "Beacon pixel decode failed");
            ApiError::internal()
        })?;
        Ok(([(header::CONTENT_TYPE, "image/gif")], pixel).into_response())
    } else {
        Ok(Json(EventResponse {
            success: true,
            event_id,
        })
        .into_response())
    }
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Client IP as reported by the fronting proxy (first x-forwarded-for hop).
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .unwrap_or("")
        .trim()
        .to_string()
}

fn wants_image(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("image/"))
}
