//! Re-run block extraction and materialization on a saved raw agent output,
//! such as a prior `debug_result.txt`. Gives the extraction protocol a
//! directly scriptable surface with no agent involved.

use anyhow::Context;
use factory_core::materialize::{self, MaterializeReport};
use factory_core::{blocks, paths};
use std::path::Path;

use crate::output;

pub fn run(projects_root: &Path, project: &str, input: &Path, json: bool) -> anyhow::Result<()> {
    paths::validate_project_name(project)?;
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read raw output file {}", input.display()))?;

    let (file_blocks, format) = blocks::extract_blocks(&raw, project);
    if file_blocks.is_empty() {
        tracing::warn!("no file blocks found in {}", input.display());
    }

    let project_dir = paths::project_dir(projects_root, project);
    let report = materialize::materialize(&project_dir, file_blocks)?;

    if json {
        output::print_json(&serde_json::json!({
            "project_name": project,
            "format": format.as_str(),
            "written": report.written,
            "skipped": report.skipped,
        }))
    } else {
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &MaterializeReport) {
    if report.is_empty() {
        println!("No file blocks found.");
        return;
    }
    let mut rows: Vec<Vec<String>> = report
        .written
        .iter()
        .map(|p| vec![p.clone(), "written".to_string(), String::new()])
        .collect();
    rows.extend(
        report
            .skipped
            .iter()
            .map(|s| vec![s.path.clone(), "skipped".to_string(), s.reason.clone()]),
    );
    output::print_table(&["PATH", "STATUS", "REASON"], rows);
}
