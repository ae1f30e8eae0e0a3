//! Writing extracted file blocks into a project directory.
//!
//! Materialization is best-effort per file: one bad path or failed write is
//! logged, recorded in the report, and the rest of the batch proceeds. Only a
//! project directory that cannot be created at all aborts the batch. Writes
//! fully overwrite existing files; there is no merge, no append, and no
//! rollback of earlier files when a later one fails.

use crate::blocks::{collapse_last_wins, FileBlock};
use crate::error::Result;
use crate::{io, paths};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// MaterializeReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Structured outcome of one materialization batch, so callers can summarize
/// what landed on disk without re-reading the log trail.
#[derive(Debug, Default, Serialize)]
pub struct MaterializeReport {
    pub written: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

impl MaterializeReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.skipped.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Path containment
// ---------------------------------------------------------------------------

/// Lexically verify that `path` stays inside the project directory.
///
/// Model-emitted paths are untrusted; absolute paths and any `..` component
/// are rejected outright rather than truncated. The check is lexical because
/// the target does not exist yet.
fn contained_relative(path: &str) -> std::result::Result<PathBuf, String> {
    if path.is_empty() {
        return Err("empty path".to_string());
    }
    let p = Path::new(path);
    if p.is_absolute() {
        return Err("absolute path".to_string());
    }
    for component in p.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err("path escapes the project directory".to_string());
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err("absolute path".to_string());
            }
        }
    }
    Ok(p.to_path_buf())
}

// ---------------------------------------------------------------------------
// Materialization
// ---------------------------------------------------------------------------

/// Write every block under `project_dir`, creating intermediate directories
/// as needed. Duplicate paths collapse to the last occurrence before writing.
///
/// Returns the per-file report; `Err` only when the project directory itself
/// cannot be created (the batch never started).
pub fn materialize(project_dir: &Path, blocks: Vec<FileBlock>) -> Result<MaterializeReport> {
    io::ensure_dir(project_dir)?;

    let mut report = MaterializeReport::default();
    for block in collapse_last_wins(blocks) {
        let rel = match contained_relative(&block.path) {
            Ok(rel) => rel,
            Err(reason) => {
                tracing::warn!(path = %block.path, %reason, "skipping file");
                report.skipped.push(SkippedFile {
                    path: block.path,
                    reason,
                });
                continue;
            }
        };

        let target = project_dir.join(rel);
        let outcome = (|| -> std::io::Result<()> {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, block.content.as_bytes())
        })();

        match outcome {
            Ok(()) => {
                tracing::info!(path = %block.path, "wrote file");
                report.written.push(block.path);
            }
            Err(e) => {
                tracing::warn!(path = %block.path, error = %e, "failed to write file");
                report.skipped.push(SkippedFile {
                    path: block.path,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Persist the raw agent output verbatim to `debug_result.txt` inside the
/// project directory, for postmortem diagnosis when parsing goes wrong.
///
/// Best-effort: a failure here is logged and never blocks the parse or the
/// write batch that follows.
pub fn persist_raw(project_dir: &Path, raw: &str) {
    let path = paths::debug_result_path(project_dir);
    let outcome = std::fs::create_dir_all(project_dir).and_then(|_| std::fs::write(&path, raw));
    match outcome {
        Ok(()) => tracing::debug!(path = %path.display(), "saved raw agent output"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to save raw agent output"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
