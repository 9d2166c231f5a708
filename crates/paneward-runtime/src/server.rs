//! UDS JSON-RPC server: minimal hand-rolled implementation.
//! Connection-per-request, newline-delimited JSON.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::Mutex;

use paneward_core::PaneSession;

use crate::poll_loop::DaemonState;

const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// `list_sessions` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionList {
    pub revision: u64,
    pub attention_seq: u64,
    pub error: Option<String>,
    pub sessions: Vec<PaneSession>,
}

impl SessionList {
    fn from_state(st: &DaemonState) -> Self {
        Self {
            revision: st.revision,
            attention_seq: st.attention_seq,
            error: st.error.clone(),
            sessions: st.sessions.clone(),
        }
    }
}

/// Run the UDS JSON-RPC server.
pub async fn run_server(socket_path: &str, state: Arc<Mutex<DaemonState>>) -> anyhow::Result<()> {
    // Create socket directory with mode 0700
    let socket_dir = std::path::Path::new(socket_path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid socket path"))?;

    std::fs::create_dir_all(socket_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    // Check for stale socket
    if std::path::Path::new(socket_path).exists() {
        if tokio::net::UnixStream::connect(socket_path).await.is_err() {
            std::fs::remove_file(socket_path)?;
            tracing::info!("removed stale socket at {socket_path}");
        } else {
            anyhow::bail!("another daemon is already running at {socket_path}");
        }
    }

    let listener = UnixListener::bind(socket_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("UDS server listening on {socket_path}");

    loop {
        let (stream, _) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                tracing::debug!("connection error: {e}");
            }
        });
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    state: Arc<Mutex<DaemonState>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let request: serde_json::Value = serde_json::from_str(line.trim())?;
    let id = request["id"].clone();

    let response = match dispatch(&request, &state).await? {
        Ok(result) => serde_json::json!({
            "jsonrpc": "2.0",
            "result": result,
            "id": id,
        }),
        Err((code, message)) => serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": code, "message": message},
            "id": id,
        }),
    };
    let mut resp = serde_json::to_string(&response)?;
    resp.push('\n');
    writer.write_all(resp.as_bytes()).await?;

    Ok(())
}

type RpcResult = Result<serde_json::Value, (i64, &'static str)>;

async fn dispatch(
    request: &serde_json::Value,
    state: &Arc<Mutex<DaemonState>>,
) -> anyhow::Result<RpcResult> {
    let method = request["method"].as_str().unwrap_or("");

    let result = match method {
        "list_sessions" => {
            let st = state.lock().await;
            Ok(serde_json::to_value(SessionList::from_state(&st))?)
        }
        "mark_seen" => match request["params"]["target"].as_str() {
            Some(target) if !target.is_empty() => {
                state.lock().await.mark_seen(target, Utc::now());
                tracing::debug!(group_target = target, "marked seen");
                Ok(serde_json::json!({"ok": true}))
            }
            _ => Err((INVALID_PARAMS, "missing target")),
        },
        _ => Err((METHOD_NOT_FOUND, "method not found")),
    };
    Ok(result)
}
