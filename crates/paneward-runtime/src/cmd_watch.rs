//! `paneward watch`: live dashboard. Redraws only when the daemon reports a
//! new revision or a different banner, and rings the bell on attention.

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use paneward_tmux::{DASHBOARD_PANE_TITLE, set_pane_title};

use crate::cli::WatchOpts;
use crate::client;
use crate::cmd_ls::format_sessions;
use crate::context::{dim, resolve_color};
use crate::poll_loop::build_executor;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Sessions {
        revision: u64,
        error: Option<String>,
    },
    Unreachable(String),
}

/// Ring only on an increase seen after the first sample. A lower value means
/// the daemon restarted.
fn should_ring(last: Option<u64>, next: u64) -> bool {
    last.is_some_and(|prev| next > prev)
}

fn ring_bell() {
    // The dashboard's stdout may be piped; the bell belongs to the terminal.
    let written = std::fs::OpenOptions::new()
        .write(true)
        .open("/dev/tty")
        .and_then(|mut tty| tty.write_all(b"\x07"));
    if written.is_err() {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }
}

/// Title our own pane so `jump` never focuses the dashboard itself.
async fn title_own_pane() {
    let Ok(pane_id) = std::env::var("TMUX_PANE") else {
        return;
    };
    let result = tokio::task::spawn_blocking(move || {
        set_pane_title(&build_executor(None), &pane_id, DASHBOARD_PANE_TITLE)
    })
    .await;
    if let Ok(Err(e)) = result {
        eprintln!("paneward: cannot set pane title: {e}");
    }
}

/// Entry point for `paneward watch`.
pub async fn cmd_watch(socket_path: &str, opts: &WatchOpts) -> anyhow::Result<()> {
    let use_color = resolve_color(&opts.color);
    title_own_pane().await;

    let mut last_frame: Option<Frame> = None;
    let mut last_attention: Option<u64> = None;

    loop {
        let (frame, body) = match client::list_sessions(socket_path).await {
            Ok(list) => {
                if !opts.no_bell && should_ring(last_attention, list.attention_seq) {
                    ring_bell();
                }
                last_attention = Some(list.attention_seq);
                let frame = Frame::Sessions {
                    revision: list.revision,
                    error: list.error.clone(),
                };
                (frame, format_sessions(&list, use_color, Utc::now()))
            }
            Err(e) => {
                let msg = format!("Cannot connect to daemon: {e}");
                (Frame::Unreachable(msg.clone()), msg)
            }
        };

        if last_frame.as_ref() != Some(&frame) {
            // Clear screen + cursor home
            print!("\x1b[2J\x1b[H");
            println!("{body}");
            println!("\n{}", dim("paneward watch - Ctrl-C to quit", use_color));
            let _ = std::io::stdout().flush();
            last_frame = Some(frame);
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(opts.interval_ms)) => {}
            _ = tokio::signal::ctrl_c() => { break; }
        }
    }

    Ok(())
}
