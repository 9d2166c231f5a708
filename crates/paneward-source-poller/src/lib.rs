//! paneward-source-poller: passive pane-text detection.
//!
//! Fallback for setups without lifecycle hooks. Reads the visible text of
//! each pane and infers status from the monitored program's status bar.

pub mod classify;
pub mod source;

pub use classify::{ClassifierMarkers, classify_pane_text};
pub use source::{PaneTextReader, PaneTextSource};
