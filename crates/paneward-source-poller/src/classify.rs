//! Status-bar classification of captured pane text.
//!
//! Only the bottom of the pane is trusted, and only lines carrying the
//! status-bar marker count for the working/idle decision. Earlier tool
//! output routinely contains the same words the status bar uses.

use paneward_core::Status;

/// Lines scanned for the status bar.
pub const STATUS_BAR_SCAN_LINES: usize = 5;
/// Lines scanned for the error marker and prompt glyph.
pub const PROMPT_SCAN_LINES: usize = 8;

// ─── Markers ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierMarkers {
    /// Present on the status bar whenever the program has focus.
    pub status_bar: String,
    /// Present on the status bar only while a request is in flight.
    pub running: String,
    pub error: String,
    /// Input prompt prefix.
    pub prompt: String,
}

impl Default for ClassifierMarkers {
    fn default() -> Self {
        Self {
            status_bar: "esc to interrupt".to_string(),
            running: "(running)".to_string(),
            error: "APIError".to_string(),
            prompt: "\u{276f}".to_string(),
        }
    }
}

// ─── Classification ──────────────────────────────────────────────

/// Classify the visible text of a pane.
///
/// Returns `Unknown` for an all-blank capture, otherwise one of `Working`,
/// `Idle` or `Error`. An occupied pane with no recognizable marker is
/// assumed idle.
pub fn classify_pane_text(text: &str, markers: &ClassifierMarkers) -> Status {
    let bottom_up: Vec<&str> = text
        .lines()
        .rev()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if bottom_up.is_empty() {
        return Status::Unknown;
    }

    let status_bar: Vec<&str> = bottom_up
        .iter()
        .take(STATUS_BAR_SCAN_LINES)
        .copied()
        .filter(|l| l.contains(markers.status_bar.as_str()))
        .collect();
    if status_bar.iter().any(|l| l.contains(markers.running.as_str())) {
        return Status::Working;
    }
    if !status_bar.is_empty() {
        return Status::Idle;
    }

    for line in bottom_up.iter().take(PROMPT_SCAN_LINES) {
        if line.contains(markers.error.as_str()) {
            return Status::Error;
        }
        if line.starts_with(markers.prompt.as_str()) {
            return Status::Idle;
        }
    }
    Status::Idle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Status {
        classify_pane_text(text, &ClassifierMarkers::default())
    }

    #[test]
    fn blank_capture_is_unknown() {
        assert_eq!(classify(""), Status::Unknown);
        assert_eq!(classify("\n   \n\t\n"), Status::Unknown);
    }

    #[test]
    fn running_status_bar_is_working() {
        let text = "some output\n\u{2733} Thinking\u{2026} (running) \u{00b7} esc to interrupt\n";
        assert_eq!(classify(text), Status::Working);
    }

    #[test]
    fn status_bar_without_running_is_idle() {
        let text = "some output\n  ? for shortcuts \u{00b7} esc to interrupt\n";
        assert_eq!(classify(text), Status::Idle);
    }

    #[test]
    fn trailing_blank_padding_is_ignored() {
        let bar = "\u{2733} Working (running) \u{00b7} esc to interrupt";
        let text = format!("history\n{bar}\n\n   \n\n\n\n");
        assert_eq!(classify(&text), Status::Working);

        let idle = format!("history\n{}\n\n   \n\n\n\n", bar.replace("(running) ", ""));
        assert_eq!(classify(&idle), Status::Idle);
    }

    #[test]
    fn running_in_history_without_marker_is_not_working() {
        let text = "tool (running) finished\nall good (running)\n\u{276f} \n";
        assert_eq!(classify(text), Status::Idle);
    }

    #[test]
    fn status_bar_above_scan_window_is_ignored() {
        let text = "x (running) esc to interrupt\n1\n2\n3\n4\n5\n";
        assert_eq!(classify(text), Status::Idle);
    }

    #[test]
    fn running_marker_on_unmarked_line_does_not_count() {
        let text = "job (running)\nesc to interrupt\n";
        assert_eq!(classify(text), Status::Idle);
    }

    #[test]
    fn api_error_near_bottom_is_error() {
        let text = "APIError: overloaded\n\u{276f} \n";
        assert_eq!(classify(text), Status::Error);
    }

    #[test]
    fn prompt_before_error_wins_when_closer_to_bottom() {
        let text = "APIError: old\n\u{276f} retry\n";
        assert_eq!(classify(text), Status::Idle);
    }

    #[test]
    fn error_beyond_eight_lines_is_ignored() {
        let mut text = String::from("APIError: ancient\n");
        for i in 0..8 {
            text.push_str(&format!("line {i}\n"));
        }
        assert_eq!(classify(&text), Status::Idle);
    }

    #[test]
    fn custom_markers() {
        let markers = ClassifierMarkers {
            status_bar: "ctrl-c to stop".to_string(),
            running: "[busy]".to_string(),
            ..ClassifierMarkers::default()
        };
        assert_eq!(
            classify_pane_text("[busy] ctrl-c to stop", &markers),
            Status::Working
        );
    }
}
