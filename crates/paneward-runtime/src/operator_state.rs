//! Persisted operator state: seen markers keyed by group target.
//!
//! Missing or unparsable files load as empty. Saves go through a temp
//! file and rename so a crash never leaves a half-written file behind.

use std::path::{Path, PathBuf};

use paneward_core::SeenMarkers;

pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn state_path(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_FILE_NAME)
}

pub fn load(path: &Path) -> SeenMarkers {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "cannot read operator state");
            }
            return SeenMarkers::new();
        }
    };
    match serde_json::from_slice::<SeenMarkers>(&raw) {
        Ok(markers) => markers,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable operator state");
            SeenMarkers::new()
        }
    }
}

pub fn save(path: &Path, markers: &SeenMarkers) -> Result<(), StateError> {
    let io_err = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    let mut body = serde_json::to_string_pretty(markers)?;
    body.push('\n');

    let tmp = path.with_extension(format!("json.tmp-{}", std::process::id()));
    std::fs::write(&tmp, body).map_err(io_err)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    Ok(())
}
