//! paneward-source-hooks: lifecycle-event detection.
//!
//! The monitored program calls `paneward hook <event>` from its own hook
//! configuration. That entry point ([`notify`]) writes one record per pane
//! into the [`store`]; the poller reads them back through [`source`].

pub mod error;
pub mod notify;
pub mod source;
pub mod store;

pub use error::StoreError;
pub use notify::{HOOK_EVENTS, HookOutcome, HookPayload, map_event_to_status, record_hook_event};
pub use source::EventStoreSource;
pub use store::{CleanupReport, EventRecord, EventStore, EventStoreConfig, WriteOutcome};
