// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External-files inventory plugin.
//!
//! Watches `<agent_dir>/external.d` for JSON declarations of the form
//! `{"files":[{"path":"/abs/path"}]}` and reports size, permissions,
//! ownership, content hash, and file type for every declared path.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use md5::{Digest, Md5};
use notify::{EventKind, RecursiveMode, Watcher};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use lookout_core::{AgentContext, InventoryDataset, Plugin, PluginId, PluginOutput, Sortable};

/// Interval of the bootstrap ticker that waits for `external.d` to appear.
const BOOTSTRAP_TICK: Duration = Duration::from_millis(1);

/// Value reported when a regular file's content cannot be read.
const MD5_UNKNOWN: &str = "unknown";

/// Paths that are never inventoried: logs and message spools churn too
/// fast to be useful.
#[allow(clippy::expect_used)]
static IGNORED_PATHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\.log$|/syslog$|/messages$|/log/|\bmotd$)")
        .expect("constant regex pattern is valid")
});

/// One watched file's characterization, keyed by path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WatchedFile {
    pub path: String,
    pub size: u64,
    pub mode: String,
    pub owner: u32,
    pub group: u32,
    pub md5: String,
    pub file_type: String,
}

impl Sortable for WatchedFile {
    fn sort_key(&self) -> String {
        self.path.clone()
    }
}

/// True when a declared path must not be watched or inventoried.
pub fn ignored(path: &Path) -> bool {
    let text = path.to_string_lossy();
    if IGNORED_PATHS.is_match(&text) {
        return true;
    }
    match std::fs::symlink_metadata(path) {
        Ok(meta) => meta.is_dir(),
        Err(_) => true,
    }
}

/// Characterize one path. `None` when the file disappeared underneath us.
pub fn inspect(path: &Path) -> Option<WatchedFile> {
    let meta = std::fs::symlink_metadata(path).ok()?;
    let file_type = file_type_tag(&meta.file_type());
    let md5 = if meta.is_file() { content_md5(path) } else { String::new() };

    Some(WatchedFile {
        path: path.to_string_lossy().into_owned(),
        size: meta.len(),
        mode: mode_string(&meta),
        owner: owner_of(&meta),
        group: group_of(&meta),
        md5,
        file_type: file_type.to_string(),
    })
}

/// Best-effort MD5 of file content.
fn content_md5(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => {
            let digest = Md5::digest(&bytes);
            digest.iter().map(|b| format!("{b:02x}")).collect()
        }
        Err(e) => {
            warn!(path = %path.display(), "cannot hash file content: {e}");
            MD5_UNKNOWN.to_string()
        }
    }
}

#[cfg(unix)]
fn file_type_tag(ft: &std::fs::FileType) -> &'static str {
    use std::os::unix::fs::FileTypeExt;
    if ft.is_file() {
        "regular file"
    } else if ft.is_dir() {
        "directory"
    } else if ft.is_symlink() {
        "symlink"
    } else if ft.is_block_device() || ft.is_char_device() {
        "device"
    } else if ft.is_fifo() {
        "named pipe"
    } else if ft.is_socket() {
        "socket"
    } else {
        ""
    }
}

#[cfg(not(unix))]
fn file_type_tag(ft: &std::fs::FileType) -> &'static str {
    if ft.is_file() {
        "regular file"
    } else if ft.is_dir() {
        "directory"
    } else if ft.is_symlink() {
        "symlink"
    } else {
        ""
    }
}

#[cfg(unix)]
fn mode_string(meta: &std::fs::Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    format!("{:04o}", meta.mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_string(meta: &std::fs::Metadata) -> String {
    if meta.permissions().readonly() { "0444".to_string() } else { "0644".to_string() }
}

#[cfg(unix)]
fn owner_of(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.uid()
}

#[cfg(not(unix))]
fn owner_of(_meta: &std::fs::Metadata) -> u32 {
    0
}

#[cfg(unix)]
fn group_of(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.gid()
}

#[cfg(not(unix))]
fn group_of(_meta: &std::fs::Metadata) -> u32 {
    0
}

#[derive(Debug, Deserialize)]
struct Declaration {
    #[serde(default)]
    files: Vec<DeclaredFile>,
}

#[derive(Debug, Deserialize)]
struct DeclaredFile {
    #[serde(default)]
    path: String,
}

/// Parse every `*.json` declaration in the directory into a deduplicated
/// set of absolute paths.
pub fn parse_declarations(dir: &Path) -> BTreeSet<PathBuf> {
    let mut paths = BTreeSet::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), "cannot read declarations directory: {e}");
            return paths;
        }
    };
    for entry in entries.flatten() {
        let file = entry.path();
        if file.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let raw = match std::fs::read_to_string(&file) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(file = %file.display(), "cannot read declaration: {e}");
                continue;
            }
        };
        let declaration: Declaration = match serde_json::from_str(&raw) {
            Ok(declaration) => declaration,
            Err(e) => {
                warn!(file = %file.display(), "cannot parse declaration: {e}");
                continue;
            }
        };
        for declared in declaration.files {
            if declared.path.is_empty() {
                warn!(file = %file.display(), "ignoring declaration with empty path");
                continue;
            }
            let path = PathBuf::from(&declared.path);
            if !path.is_absolute() {
                warn!(path = %declared.path, "ignoring non-absolute declared path");
                continue;
            }
            paths.insert(path);
        }
    }
    paths
}

/// Compute the dataset for the currently declared paths, skipping ignored
/// and vanished files.
pub fn compute_dataset(paths: &BTreeSet<PathBuf>) -> InventoryDataset {
    let records = paths
        .iter()
        .filter(|p| !ignored(p))
        .filter_map(|p| inspect(p));
    match InventoryDataset::from_records(records) {
        Ok(data) => data,
        Err(e) => {
            warn!("cannot serialize watched files: {e}");
            InventoryDataset::empty()
        }
    }
}

/// The plugin itself. All state lives inside `run`.
#[derive(Default)]
pub struct ExternalFilesPlugin;

impl ExternalFilesPlugin {
    pub fn plugin_id() -> PluginId {
        PluginId::new("files", "external")
    }
}

#[async_trait]
impl Plugin for ExternalFilesPlugin {
    fn id(&self) -> PluginId {
        Self::plugin_id()
    }

    async fn run(&self, ctx: AgentContext) {
        let dir = ctx.config.external_files_dir();
        let flush_interval = ctx.config.external_files_flush_interval();

        // Fast ticker until the declarations directory exists.
        while !dir.exists() {
            tokio::select! {
                _ = ctx.cancel.cancelled() => return,
                _ = tokio::time::sleep(BOOTSTRAP_TICK) => {}
            }
        }

        let (fs_tx, mut fs_rx) = mpsc::unbounded_channel();
        let mut watcher = match notify::recommended_watcher(move |result| {
            let _ = fs_tx.send(result);
        }) {
            Ok(watcher) => watcher,
            Err(e) => {
                warn!("cannot create filesystem watcher: {e}");
                return;
            }
        };
        if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
            warn!(dir = %dir.display(), "cannot watch declarations directory: {e}");
            return;
        }

        let mut declared = parse_declarations(&dir);
        watch_all(&mut watcher, &declared);
        let mut rewatch: BTreeSet<PathBuf> = BTreeSet::new();
        let mut dirty = true;

        let mut flush = tokio::time::interval(flush_interval);
        flush.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ctx.cancel.cancelled() => break,
                event = fs_rx.recv() => {
                    let Some(event) = event else { break };
                    let event = match event {
                        Ok(event) => event,
                        Err(e) => {
                            warn!("watcher error: {e}");
                            continue;
                        }
                    };
                    if !dir.exists() {
                        // The declarations directory was removed after it
                        // existed once; stay dormant until the next start.
                        warn!(dir = %dir.display(), "declarations directory removed, stopping watch");
                        break;
                    }
                    if touches_declarations(&event, &dir) {
                        let next = parse_declarations(&dir);
                        for gone in declared.difference(&next) {
                            let _ = watcher.unwatch(gone);
                        }
                        for added in next.difference(&declared) {
                            if !ignored(added) {
                                if let Err(e) = watcher.watch(added, RecursiveMode::NonRecursive) {
                                    debug!(path = %added.display(), "cannot watch declared path: {e}");
                                }
                            }
                        }
                        declared = next;
                        dirty = true;
                    } else if touches_watched(&event, &declared) {
                        if matches!(event.kind, EventKind::Modify(notify::event::ModifyKind::Name(_))) {
                            // Re-add the watch on the next flush; the rename
                            // replaced the inode we were watching.
                            rewatch.extend(event.paths.iter().cloned());
                        }
                        dirty = true;
                    }
                }
                _ = flush.tick() => {
                    if !dirty {
                        continue;
                    }
                    for path in std::mem::take(&mut rewatch) {
                        if declared.contains(&path) && !ignored(&path) {
                            let _ = watcher.watch(&path, RecursiveMode::NonRecursive);
                        }
                    }
                    let data = compute_dataset(&declared);
                    ctx.send_data(PluginOutput {
                        id: self.id(),
                        entity_key: ctx.agent_key(),
                        data,
                    });
                    dirty = false;
                }
            }
        }
    }
}

fn watch_all(watcher: &mut notify::RecommendedWatcher, paths: &BTreeSet<PathBuf>) {
    for path in paths {
        if ignored(path) {
            continue;
        }
        if let Err(e) = watcher.watch(path, RecursiveMode::NonRecursive) {
            debug!(path = %path.display(), "cannot watch declared path: {e}");
        }
    }
}

/// Does this event concern the declarations directory itself?
fn touches_declarations(event: &notify::Event, dir: &Path) -> bool {
    event.paths.iter().any(|p| p == dir || p.parent() == Some(dir))
}

/// Does this event concern any declared path?
fn touches_watched(event: &notify::Event, declared: &BTreeSet<PathBuf>) -> bool {
    event.paths.iter().any(|p| declared.contains(p))
}

#[cfg(test)]
#[path = "external_files_tests.rs"]
mod tests;
