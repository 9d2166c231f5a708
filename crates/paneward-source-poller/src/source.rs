//! Pane-text backed [`StatusSource`].

use std::collections::HashMap;
use std::fmt::Display;

use paneward_core::{DetectionKind, Status, StatusSource};

use crate::classify::{ClassifierMarkers, classify_pane_text};

/// Reads the currently visible text of a pane.
pub trait PaneTextReader: Send + Sync {
    type Error: Display;

    fn capture_visible(&self, pane_id: &str) -> Result<String, Self::Error>;
}

/// Captures each occupied pane and classifies its bottom lines.
pub struct PaneTextSource<R> {
    reader: R,
    markers: ClassifierMarkers,
}

impl<R: PaneTextReader> PaneTextSource<R> {
    pub fn new(reader: R, markers: ClassifierMarkers) -> Self {
        Self { reader, markers }
    }
}

impl<R: PaneTextReader> StatusSource for PaneTextSource<R> {
    fn kind(&self) -> DetectionKind {
        DetectionKind::PaneText
    }

    /// A failed capture only affects that pane, which reads as `Unknown`.
    fn observe(&self, pane_ids: &[&str]) -> HashMap<String, Status> {
        pane_ids
            .iter()
            .map(|id| {
                let status = match self.reader.capture_visible(id) {
                    Ok(text) => classify_pane_text(&text, &self.markers),
                    Err(e) => {
                        tracing::debug!(pane_id = %id, error = %e, "capture failed");
                        Status::Unknown
                    }
                };
                (id.to_string(), status)
            })
            .collect()
    }
}
