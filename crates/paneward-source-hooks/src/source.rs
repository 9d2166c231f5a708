//! Event-store backed [`StatusSource`].

use std::collections::HashMap;

use paneward_core::{DetectionKind, Status, StatusSource};

use crate::store::EventStore;

/// Reads the whole store once per poll.
///
/// A live occupant with no record yet is `Idle`: a freshly started session
/// should not look alarming before its first event lands.
#[derive(Debug, Clone)]
pub struct EventStoreSource {
    store: EventStore,
}

impl EventStoreSource {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }
}

impl StatusSource for EventStoreSource {
    fn kind(&self) -> DetectionKind {
        DetectionKind::Events
    }

    fn observe(&self, pane_ids: &[&str]) -> HashMap<String, Status> {
        let records = self.store.read_all();
        pane_ids
            .iter()
            .map(|id| {
                let status = records.get(*id).map_or(Status::Idle, |r| r.raw_status());
                (id.to_string(), status)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EventRecord, EventStoreConfig};
    use chrono::Utc;

    #[test]
    fn maps_records_and_defaults_to_idle() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = EventStore::new(EventStoreConfig::new(tmp.path()));
        let now = Utc::now();
        store.write(&EventRecord::new("%1", "working", now)).expect("write");
        store.write(&EventRecord::new("%2", "stopped", now)).expect("write");
        store.write(&EventRecord::new("%3", "mystery", now)).expect("write");

        let source = EventStoreSource::new(store);
        let out = source.observe(&["%1", "%2", "%3", "%4"]);
        assert_eq!(out["%1"], Status::Working);
        assert_eq!(out["%2"], Status::Exited);
        assert_eq!(out["%3"], Status::Unknown);
        assert_eq!(out["%4"], Status::Idle);
        assert_eq!(source.kind(), DetectionKind::Events);
    }

    #[test]
    fn only_requested_panes_are_returned() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = EventStore::new(EventStoreConfig::new(tmp.path()));
        store
            .write(&EventRecord::new("%9", "working", Utc::now()))
            .expect("write");
        let out = EventStoreSource::new(store).observe(&["%1"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out["%1"], Status::Idle);
    }
}
