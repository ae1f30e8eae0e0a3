use clap::Subcommand;
use factory_core::paths;
use factory_core::runs::RunStore;
use std::path::Path;

use crate::output;

#[derive(Subcommand)]
pub enum RunsSubcommand {
    /// List recorded runs, most recent first
    List,

    /// Show the latest framework/features metadata for a project
    Show { project: String },
}

pub fn run(projects_root: &Path, subcommand: RunsSubcommand, json: bool) -> anyhow::Result<()> {
    let store = RunStore::open(&paths::runs_db_path(projects_root))?;

    match subcommand {
        RunsSubcommand::List => {
            let records = store.list()?;
            if json {
                return output::print_json(&records);
            }
            let rows = records
                .iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.project_name.clone(),
                        r.framework.clone(),
                        r.status.clone(),
                        r.started_at.clone(),
                        r.deployment_url.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            output::print_table(
                &["ID", "PROJECT", "FRAMEWORK", "STATUS", "STARTED", "URL"],
                rows,
            );
            Ok(())
        }
        RunsSubcommand::Show { project } => {
            let metadata = store
                .latest_for_project(&project)?
                .ok_or_else(|| anyhow::anyhow!("no runs recorded for project '{project}'"))?;
            if json {
                return output::print_json(&metadata);
            }
            println!("framework: {}", metadata.framework);
            println!("features:  {}", metadata.features);
            Ok(())
        }
    }
}
