//! The project plan produced by the planner agent.
//!
//! The planner is prompted for a JSON object with `file_structure`,
//! `supabase_tables`, and `components` keys. Models occasionally wrap the
//! object in a ```json fence; both shapes are accepted. Anything else
//! degrades to an empty plan with a logged warning rather than aborting the
//! pipeline.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// ProjectPlan
// ---------------------------------------------------------------------------

/// A table the planner wants created, with its columns as free-form SQL-ish
/// definition strings ("id UUID PRIMARY KEY").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTable {
    pub name: String,
    #[serde(default)]
    pub schema: Vec<String>,
}

impl PlannedTable {
    /// A usable table needs a name and at least one column definition;
    /// anything less is logged and skipped by the caller.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.schema.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectPlan {
    /// Planned file layout, passed verbatim into the code generation prompt.
    #[serde(default)]
    pub file_structure: serde_json::Value,
    #[serde(default)]
    pub supabase_tables: Vec<PlannedTable>,
    #[serde(default)]
    pub components: Vec<String>,
}

static JSON_FENCE_RE: OnceLock<regex::Regex> = OnceLock::new();

fn json_fence_re() -> &'static regex::Regex {
    JSON_FENCE_RE.get_or_init(|| {
        RegexBuilder::new(r"```(?:json)?\s*(.*?)\s*```")
            .dot_matches_new_line(true)
            .build()
            .unwrap()
    })
}

impl ProjectPlan {
    /// Parse a planner response, tolerating a fenced JSON body. Unparseable
    /// output degrades to the empty plan; the pipeline then simply has no
    /// tables to create and no structure hints for codegen.
    pub fn parse(text: &str) -> ProjectPlan {
        if let Ok(plan) = serde_json::from_str::<ProjectPlan>(text.trim()) {
            return plan;
        }
        if let Some(caps) = json_fence_re().captures(text) {
            if let Ok(plan) = serde_json::from_str::<ProjectPlan>(&caps[1]) {
                return plan;
            }
        }
        tracing::warn!("planner output did not parse as a plan; continuing with an empty plan");
        ProjectPlan::default()
    }

    /// The planned tables that carry enough information to create.
    pub fn valid_tables(&self) -> impl Iterator<Item = &PlannedTable> {
        self.supabase_tables.iter().filter(|t| {
            if !t.is_valid() {
                tracing::warn!(table = %t.name, "incomplete table definition in plan; skipping");
            }
            t.is_valid()
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let text = r#"{"file_structure": {"src": ["index.js"]},
            "supabase_tables": [{"name": "todos", "schema": ["id UUID PRIMARY KEY"]}],
            "components": ["TodoList"]}"#;
        let plan = ProjectPlan::parse(text);
        assert_eq!(plan.supabase_tables.len(), 1);
        assert_eq!(plan.supabase_tables[0].name, "todos");
        assert_eq!(plan.components, vec!["TodoList"]);
    }

    #[test]
    fn parses_fenced_json() {
        let text = "Here is the plan:\n```json\n{\"components\": [\"Nav\"]}\n```\nDone.";
        let plan = ProjectPlan::parse(text);
        assert_eq!(plan.components, vec!["Nav"]);
    }

    #[test]
    fn garbage_degrades_to_empty_plan() {
        let plan = ProjectPlan::parse("I could not produce a plan, sorry.");
        assert!(plan.supabase_tables.is_empty());
        assert!(plan.components.is_empty());
        assert!(plan.file_structure.is_null());
    }

    #[test]
    fn missing_keys_default() {
        let plan = ProjectPlan::parse("{}");
        assert!(plan.supabase_tables.is_empty());
    }

    #[test]
    fn valid_tables_filters_incomplete_entries() {
        let plan = ProjectPlan::parse(
            r#"{"supabase_tables": [
                {"name": "todos", "schema": ["id UUID PRIMARY KEY"]},
                {"name": "", "schema": ["id UUID"]},
                {"name": "empty_schema"}
            ]}"#,
        );
        let valid: Vec<_> = plan.valid_tables().collect();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].name, "todos");
    }
}
