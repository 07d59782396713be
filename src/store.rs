use crate::error::Result;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Length of the opaque identifiers the store assigns
const EVENT_ID_LEN: usize = 20;

/// One recorded playback or impression event
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Event name (impression, start, complete, ...)
    pub event: String,

    /// All query parameters captured from the beacon request
    pub params: BTreeMap<String, String>,

    /// Client metadata
    pub user_agent: String,
    pub ip: String,
    pub referer: String,

    /// Server-assigned creation timestamp
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(event: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        EventRecord {
            event: event.into(),
            params,
            user_agent: String::new(),
            ip: String::new(),
            referer: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Append-only store for event records
///
/// Handlers hold an `Arc<dyn EventStore>`; the handle is constructed once at
/// startup and shared across requests. Append failures are independent of
/// VAST generation, which never touches the store.
pub trait EventStore: Send + Sync {
    /// Persist one record and return its store-assigned identifier.
    fn append(&self, record: EventRecord) -> Result<String>;
}

/// A stored record together with its assigned identifier
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoredEvent {
    pub id: String,
    #[serde(flatten)]
    pub record: EventRecord,
}

/// In-memory store, also used to capture events in tests
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        InMemoryEventStore {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<StoredEvent> {
        self.events.lock().expect("event store mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event store mutex poisoned").len()
    }

    pub fn find(&self, id: &str) -> Option<StoredEvent> {
        self.events
            .lock()
            .expect("event store mutex poisoned")
            .iter()
            .find(|stored| stored.id == id)
            .cloned()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, record: EventRecord) -> Result<String> {
        let id = new_event_id();
        self.events
            .lock()
            .expect("event store mutex poisoned")
            .push(StoredEvent {
                id: id.clone(),
                record,
            });
        Ok(id)
    }
}

/// Convenience: create a shared in-memory store.
pub fn in_memory_store() -> Arc<InMemoryEventStore> {
    Arc::new(InMemoryEventStore::new())
}

/// Generate an opaque alphanumeric event identifier
fn new_event_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(EVENT_ID_LEN)
        .map(char::from)
        .collect()
}
