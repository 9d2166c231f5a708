//! Install `paneward hook <event>` entries into the monitored program's
//! settings.json.

use std::path::{Path, PathBuf};

use paneward_source_hooks::HOOK_EVENTS;

use crate::cli::SetupHooksOpts;

/// Seconds the program waits for a hook command.
const HOOK_TIMEOUT_SECS: u64 = 5;

/// Resolve the settings.json path based on scope.
pub fn settings_path(scope: &str) -> anyhow::Result<PathBuf> {
    match scope {
        "project" => Ok(PathBuf::from(".claude/settings.json")),
        "user" => {
            let home = std::env::var("HOME")
                .map_err(|_| anyhow::anyhow!("HOME not set; cannot resolve user scope"))?;
            Ok(PathBuf::from(home).join(".claude/settings.json"))
        }
        _ => anyhow::bail!("invalid scope: {scope:?} (expected \"project\" or \"user\")"),
    }
}

/// Absolute path of the running binary, symlinks resolved.
fn current_binary() -> anyhow::Result<String> {
    let exe = std::env::current_exe()?;
    let exe = std::fs::canonicalize(&exe).unwrap_or(exe);
    Ok(exe.to_string_lossy().into_owned())
}

/// Shell-quote a path for safe embedding in a shell command string.
///
/// Wraps in single quotes if the path contains whitespace, quotes, or backslashes.
/// Single quotes inside the path are escaped as `'\''`.
fn shell_quote(path: &str) -> String {
    if path.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"' || c == '\\') {
        format!("'{}'", path.replace('\'', "'\\''"))
    } else {
        path.to_string()
    }
}

fn hook_command(bin: &str, event: &str) -> String {
    format!("{} hook {event}", shell_quote(bin))
}

/// Matcher groups we own are recognised by their command, whatever binary
/// path wrote them.
fn is_ours(group: &serde_json::Value) -> bool {
    group["hooks"].as_array().is_some_and(|hooks| {
        hooks.iter().any(|h| {
            h["command"]
                .as_str()
                .is_some_and(|c| c.contains("paneward hook") || c.contains("paneward' hook"))
        })
    })
}

/// Replace our entries for every hook event, keeping everything else.
pub fn merge_hooks(settings: &mut serde_json::Value, bin: &str) -> anyhow::Result<()> {
    let obj = settings
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("settings.json is not a JSON object"))?;
    let hooks = obj
        .entry("hooks")
        .or_insert_with(|| serde_json::json!({}))
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("settings.json \"hooks\" is not a JSON object"))?;

    for (hook_name, event) in HOOK_EVENTS {
        let mut groups: Vec<serde_json::Value> = hooks
            .get(*hook_name)
            .and_then(|v| v.as_array())
            .map(|groups| groups.iter().filter(|g| !is_ours(g)).cloned().collect())
            .unwrap_or_default();
        groups.push(serde_json::json!({
            "hooks": [{
                "type": "command",
                "command": hook_command(bin, event),
                "timeout": HOOK_TIMEOUT_SECS,
            }]
        }));
        hooks.insert((*hook_name).to_string(), serde_json::Value::Array(groups));
    }
    Ok(())
}

/// Whether every hook event has one of our entries.
pub fn hooks_installed(settings: &serde_json::Value) -> bool {
    HOOK_EVENTS.iter().all(|(hook_name, _)| {
        settings["hooks"][*hook_name]
            .as_array()
            .is_some_and(|groups| groups.iter().any(is_ours))
    })
}

fn read_settings(path: &Path) -> anyhow::Result<serde_json::Value> {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("cannot parse {}: {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::json!({})),
        Err(e) => Err(e.into()),
    }
}

pub fn apply_hooks_at(path: &Path, bin: &str) -> anyhow::Result<()> {
    let mut settings = read_settings(path)?;
    merge_hooks(&mut settings, bin)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let output = serde_json::to_string_pretty(&settings)?;
    std::fs::write(path, format!("{output}\n"))?;
    Ok(())
}

/// `paneward setup-hooks`: returns the settings path and whether hooks are
/// (now) installed. With `--check` nothing is written.
pub fn run(opts: &SetupHooksOpts) -> anyhow::Result<(PathBuf, bool)> {
    let path = settings_path(&opts.scope)?;
    if opts.check {
        let installed = hooks_installed(&read_settings(&path)?);
        return Ok((path, installed));
    }
    apply_hooks_at(&path, &current_binary()?)?;
    Ok((path, true))
}

// ─── Tests ────────────────────────────────────────────────────────
