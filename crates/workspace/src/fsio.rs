//! Directory round-trip for a workspace.

use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::Workspace;

const MAX_DEPTH: usize = 6;

/// Loads every readable UTF-8 file under `root` into a workspace, keyed by
/// its forward-slash relative path. Hidden entries and unreadable (binary)
/// files are skipped.
pub fn load_dir(root: &Path) -> Result<Workspace> {
    let mut ws = Workspace::new();
    let walker = WalkDir::new(root)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            tracing::debug!(path = %entry.path().display(), "skipping non-text file");
            continue;
        };
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        ws.set_file(&rel, &content);
    }
    Ok(ws)
}

/// Writes every workspace file under `root`, creating parent directories.
/// The in-memory workspace is the source of truth; a failed write surfaces
/// with the offending path and leaves the workspace itself untouched.
pub fn save_dir(ws: &Workspace, root: &Path) -> Result<()> {
    for (rel, content) in ws.iter() {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}
