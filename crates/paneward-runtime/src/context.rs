//! Display helpers for CLI output: path shortening, relative time, color.

use paneward_core::Status;

/// Return the last two path segments, collapsing $HOME to `~`.
///
/// ```text
/// "/Users/me/src/org/paneward/worktrees/feature-x" -> "worktrees/feature-x"
/// "/Users/me/api"                                  -> "~/api"
/// ```
pub fn short_path(path: &str) -> String {
    let home = std::env::var("HOME").unwrap_or_default();
    short_path_with_home(path, &home)
}

fn short_path_with_home(path: &str, home: &str) -> String {
    let collapsed = match path.strip_prefix(home) {
        Some(rest) if !home.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
            format!("~{rest}")
        }
        _ => path.to_string(),
    };

    let trimmed = collapsed.trim_end_matches('/');
    let segments: Vec<&str> = trimmed
        .rsplit('/')
        .take(2)
        .filter(|s| !s.is_empty())
        .collect();

    match segments.len() {
        0 => collapsed,
        1 => segments[0].to_string(),
        _ => format!("{}/{}", segments[1], segments[0]),
    }
}

/// Relative-time helper: seconds -> human string.
pub fn relative_time(seconds: i64) -> String {
    let s = seconds.unsigned_abs();
    if s < 60 {
        "just now".to_string()
    } else if s < 3600 {
        format!("{}m", s / 60)
    } else if s < 86400 {
        format!("{}h", s / 3600)
    } else if s < 86400 * 30 {
        format!("{}d", s / 86400)
    } else {
        format!("{}w", s / (86400 * 7))
    }
}

pub fn resolve_color(color: &str) -> bool {
    use std::io::IsTerminal;
    match color {
        "always" => true,
        "never" => false,
        _ => std::io::stdout().is_terminal(),
    }
}

/// ANSI SGR code for a status label.
fn status_sgr(status: Status) -> &'static str {
    match status {
        Status::Working => "33",
        Status::Paused => "1;35",
        Status::Unread => "1;32",
        Status::Done => "32",
        Status::Error => "1;31",
        Status::Idle | Status::Exited | Status::Unknown => "2",
    }
}

pub fn paint_status(status: Status, use_color: bool) -> String {
    if use_color {
        format!("\x1b[{}m{}\x1b[0m", status_sgr(status), status.label())
    } else {
        status.label().to_string()
    }
}

pub fn dim(text: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[2m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}
