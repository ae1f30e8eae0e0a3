//! Best-effort natural-language intent parsing for the prompt entry point.
//!
//! A prompt is either a pre-tokenized argument string (starts with `--`,
//! forwarded to the CLI parser untouched) or free text, from which keyword
//! matching extracts: edit vs generate, the target framework, a project
//! name, and the feature/change description. This is deliberately shallow —
//! heavier entity extraction belongs to an external NLP service, and wrong
//! guesses are cheap because `--dry-run` shows the parse before anything
//! runs.

use crate::commands::Framework;
use crate::error::{FactoryError, Result};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Generate {
        project: String,
        framework: Framework,
        features: String,
    },
    Edit {
        project: String,
        changes: String,
    },
}

/// Fallback project name when the prompt never names one.
pub const DEFAULT_PROJECT_NAME: &str = "generated-app";

const EDIT_KEYWORDS: &[&str] = &["edit", "modify", "change", "fix"];

// "called X" / "named X" bind tighter than "project X" / "app X".
const STRONG_MARKERS: &[&str] = &["named", "called"];
const WEAK_MARKERS: &[&str] = &["project", "app", "application", "site"];

// Tokens that can follow a marker without being the name.
const NON_NAMES: &[&str] = &[
    "a", "an", "the", "with", "that", "for", "using", "in", "and", "named", "called", "project",
    "app", "application", "site",
];

/// True when the prompt is really a CLI argument string
/// (`--project todo --framework flask …`) rather than natural language.
pub fn looks_like_args(prompt: &str) -> bool {
    prompt.trim_start().starts_with("--")
}

/// Parse free text into an [`Intent`]. Only an empty prompt is an error;
/// everything else resolves with documented defaults.
pub fn parse_intent(prompt: &str) -> Result<Intent> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(FactoryError::EmptyPrompt);
    }

    let lower = prompt.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    let project = extract_project_name(prompt).unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());

    if words.iter().any(|w| EDIT_KEYWORDS.contains(w)) {
        return Ok(Intent::Edit {
            project,
            changes: prompt.to_string(),
        });
    }

    let framework = if lower.contains("flask") {
        Framework::Flask
    } else {
        // Next.js is the default scaffold when the prompt names nothing.
        Framework::NextJs
    };

    // The feature description is everything after the first "with", when
    // present; otherwise the whole prompt stands in.
    let tokens: Vec<&str> = prompt.split_whitespace().collect();
    let features = tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case("with"))
        .map(|i| tokens[i + 1..].join(" "))
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| prompt.to_string());

    Ok(Intent::Generate {
        project,
        framework,
        features,
    })
}

/// Pull a project name out of the prompt: a quoted name wins, then the token
/// following a naming marker ("project", "called", …). The result is
/// sanitized into a valid directory name.
fn extract_project_name(prompt: &str) -> Option<String> {
    if let Some(quoted) = extract_quoted(prompt) {
        return sanitize_name(&quoted);
    }

    let tokens: Vec<&str> = prompt.split_whitespace().collect();
    for markers in [STRONG_MARKERS, WEAK_MARKERS] {
        for (i, token) in tokens.iter().enumerate() {
            let bare = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if !markers.contains(&bare.as_str()) {
                continue;
            }
            let Some(next) = tokens.get(i + 1) else {
                continue;
            };
            let next_bare = next
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if NON_NAMES.contains(&next_bare.as_str()) {
                continue;
            }
            if let Some(name) = sanitize_name(next) {
                return Some(name);
            }
        }
    }
    None
}

fn extract_quoted(prompt: &str) -> Option<String> {
    for quote in ['"', '\''] {
        // Both quotes must be present; a lone apostrophe is not a name.
        let parts: Vec<&str> = prompt.split(quote).collect();
        if parts.len() >= 3 && !parts[1].trim().is_empty() {
            return Some(parts[1].to_string());
        }
    }
    None
}

/// Keep alphanumerics, dots, dashes, and underscores; collapse everything
/// else to a dash. `None` when nothing usable remains or the token is a
/// stopword-ish fragment.
fn sanitize_name(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| !c.is_alphanumeric()) {
        return None;
    }
    Some(cleaned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_prompt_is_detected() {
        assert!(looks_like_args("--project todo --framework flask"));
        assert!(looks_like_args("  --edit --project todo"));
        assert!(!looks_like_args("create a todo app"));
    }

    #[test]
    fn empty_prompt_is_an_error() {
        assert!(matches!(parse_intent("   "), Err(FactoryError::EmptyPrompt)));
    }

    #[test]
    fn generate_with_named_project_and_flask() {
        let intent = parse_intent("create a todo app called TaskMaster with flask and user auth")
            .unwrap();
        assert_eq!(
            intent,
            Intent::Generate {
                project: "TaskMaster".to_string(),
                framework: Framework::Flask,
                features: "flask and user auth".to_string(),
            }
        );
    }

    #[test]
    fn generate_defaults_to_nextjs() {
        let intent = parse_intent("generate a blog with comments").unwrap();
        match intent {
            Intent::Generate { framework, features, .. } => {
                assert_eq!(framework, Framework::NextJs);
                assert_eq!(features, "comments");
            }
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn quoted_project_name_wins() {
        let intent = parse_intent("build the project \"My Shop\" with next.js").unwrap();
        match intent {
            Intent::Generate { project, .. } => assert_eq!(project, "My-Shop"),
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn missing_name_falls_back_to_default() {
        let intent = parse_intent("generate something nice").unwrap();
        match intent {
            Intent::Generate { project, .. } => assert_eq!(project, DEFAULT_PROJECT_NAME),
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn edit_keyword_selects_edit_intent() {
        let intent = parse_intent("edit project todo and make the header blue").unwrap();
        assert_eq!(
            intent,
            Intent::Edit {
                project: "todo".to_string(),
                changes: "edit project todo and make the header blue".to_string(),
            }
        );
    }

    #[test]
    fn whole_prompt_is_features_without_with_clause() {
        let intent = parse_intent("a flask api for notes").unwrap();
        match intent {
            Intent::Generate { features, framework, .. } => {
                assert_eq!(features, "a flask api for notes");
                assert_eq!(framework, Framework::Flask);
            }
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn intent_serializes_with_tag() {
        let intent = parse_intent("edit project todo").unwrap();
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["intent"], "edit");
        assert_eq!(json["project"], "todo");
    }
}
