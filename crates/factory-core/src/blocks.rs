//! Extraction of file blocks from raw agent output.
//!
//! Code-producing agents are prompted to answer in the sentinel format:
//!
//! ```text
//! --- src/pages/index.js ---
//! <content>
//! --- styles/global.css ---
//! <content>
//! ```
//!
//! Some runs instead come back in a bold-marker convention
//! (`**File: /app/<project>/<path>**` followed by a fenced code block).
//! [`extract_blocks`] tries the sentinel format first and falls back to the
//! bold-marker format only when the sentinel pass finds nothing. Documents
//! mixing both conventions are unsupported: a non-empty sentinel pass
//! suppresses the fallback entirely.
//!
//! There is no escaping mechanism. A path or content that itself contains the
//! `--- <path> ---` sequence splits the document there; prompt templates rely
//! on this exact behavior, so it is preserved as-is.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// FileBlock
// ---------------------------------------------------------------------------

/// One file extracted from agent output: a relative path as emitted by the
/// model (not yet validated for traversal safety) and its trimmed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub path: String,
    pub content: String,
}

/// Which output convention a parse pass matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFormat {
    Sentinel,
    FencedFallback,
}

impl BlockFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockFormat::Sentinel => "sentinel",
            BlockFormat::FencedFallback => "fenced-fallback",
        }
    }
}

// ---------------------------------------------------------------------------
// Primary parser: `--- <path> ---` sentinels
// ---------------------------------------------------------------------------

static SENTINEL_RE: OnceLock<Regex> = OnceLock::new();

/// `--- <path> ---` with insignificant whitespace around the hyphens and the
/// path; the path itself is a run of non-whitespace characters. `\S*?` rather
/// than `\S+?` so a pathological empty path (`------`) still yields a block
/// instead of being skipped; the materializer rejects it per-entry.
fn sentinel_re() -> &'static Regex {
    SENTINEL_RE.get_or_init(|| Regex::new(r"---\s*(\S*?)\s*---").unwrap())
}

/// Parse the sentinel format with a two-pass scan: locate every sentinel,
/// then slice each block's content from the end of its sentinel to the start
/// of the next one (or end of document). N sentinels yield exactly N blocks,
/// in document order, content trimmed of surrounding whitespace.
///
/// Zero sentinels yield an empty vec; that is an expected outcome, not an
/// error, and the caller decides whether to try the fallback format.
pub fn parse_sentinel_blocks(text: &str) -> Vec<FileBlock> {
    let sentinels: Vec<(usize, usize, &str)> = sentinel_re()
        .captures_iter(text)
        .map(|c| {
            let whole = c.get(0).expect("match has a whole capture");
            let path = c.get(1).map(|m| m.as_str()).unwrap_or("");
            (whole.start(), whole.end(), path)
        })
        .collect();

    let mut blocks = Vec::with_capacity(sentinels.len());
    for (i, (_, content_start, path)) in sentinels.iter().enumerate() {
        let content_end = sentinels
            .get(i + 1)
            .map(|next| next.0)
            .unwrap_or(text.len());
        let content = text[*content_start..content_end].trim();
        blocks.push(FileBlock {
            path: (*path).to_string(),
            content: content.to_string(),
        });
    }
    blocks
}

// ---------------------------------------------------------------------------
// Fallback parser: `**File: /app/<project>/<path>**` + fenced code
// ---------------------------------------------------------------------------

/// Parse the bold-marker fallback convention. The marker names the fixed
/// `/app/<project_name>/` prefix the model was shown in its prompt; the fence
/// may carry a language tag from a closed set. The fence interior, trimmed,
/// becomes the content.
pub fn parse_fallback_blocks(text: &str, project_name: &str) -> Vec<FileBlock> {
    let pattern = format!(
        r"\*\*File: /app/{}/(\S+?)\*\*\s*```(?:html|css|javascript|python)?\s*(.*?)\s*```",
        regex::escape(project_name)
    );
    let re = RegexBuilder::new(&pattern)
        .dot_matches_new_line(true)
        .build()
        .expect("escaped fallback pattern always compiles");

    re.captures_iter(text)
        .map(|c| FileBlock {
            path: c[1].to_string(),
            content: c[2].trim().to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Extraction entry point
// ---------------------------------------------------------------------------

/// Extract file blocks from one raw agent output document.
///
/// The sentinel format wins whenever it matches at all; the fallback is
/// attempted only on an empty sentinel pass. Running the same document
/// through this function is idempotent and preserves document order.
pub fn extract_blocks(text: &str, project_name: &str) -> (Vec<FileBlock>, BlockFormat) {
    let primary = parse_sentinel_blocks(text);
    if !primary.is_empty() {
        return (primary, BlockFormat::Sentinel);
    }
    (
        parse_fallback_blocks(text, project_name),
        BlockFormat::FencedFallback,
    )
}

/// Collapse duplicate paths to a single entry each: the last occurrence's
/// content wins, the first occurrence's position is kept.
pub fn collapse_last_wins(blocks: Vec<FileBlock>) -> Vec<FileBlock> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<FileBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match index.get(&block.path) {
            Some(&i) => out[i] = block,
            None => {
                index.insert(block.path.clone(), out.len());
                out.push(block);
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
