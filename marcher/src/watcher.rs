//! # Shader Hot-Reloading
//!
//! Watches a single WGSL file and raises a flag when it is written. The frame
//! loop polls the flag between frames and recompiles the kernel, so the
//! notify callback thread never touches the backend.
//!
//! The file watcher is implemented using the [`notify`](https://crates.io/crates/notify)
//! crate. Editors often replace a file instead of writing it in place, so the
//! parent directory is watched and events are filtered by file name.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tracing::{debug, error, info};

/// Keeps the underlying watcher alive and exposes the change flag.
pub struct ShaderWatcher {
    _watcher: RecommendedWatcher,
    changed: Arc<AtomicBool>,
}

impl ShaderWatcher {
    /// Returns `true` once per burst of changes since the last call.
    pub fn take_change(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

/// Starts watching `shader`.
///
/// # Errors
///
/// Fails if the file has no parent directory or `notify` cannot watch it.
pub fn start(shader: &Path) -> Result<ShaderWatcher> {
    let shader = shader
        .canonicalize()
        .with_context(|| format!("shader file {} not found", shader.display()))?;
    let directory = shader
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("shader path {} has no parent", shader.display()))?;

    let changed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&changed);
    let target = shader.clone();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        match result {
            Ok(event) if is_relevant(&event, &target) => {
                debug!(path = %target.display(), "shader changed");
                flag.store(true, Ordering::Release);
            }
            Ok(_) => {}
            Err(e) => error!("File watcher error: {e:?}"),
        }
    })
    .context("failed to create file watcher")?;

    watcher
        .watch(&directory, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", directory.display()))?;

    info!(path = %shader.display(), "Shader watcher active");
    Ok(ShaderWatcher { _watcher: watcher, changed })
}

fn is_relevant(event: &Event, target: &Path) -> bool {
    if !event.kind.is_modify() && !event.kind.is_create() {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| path.file_name() == target.file_name())
}
