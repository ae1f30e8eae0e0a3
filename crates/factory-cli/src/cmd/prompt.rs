//! The natural-language entry point: parse a prompt into an intent, then
//! dispatch to the generate or edit pipeline.
//!
//! Prompts that start with `--` are treated as a pre-tokenized argument
//! string (the web panel forwards them verbatim) and parsed with the same
//! flag names the original generator understood.

use clap::Parser;
use factory_core::intent::{self, Intent};
use std::path::{Path, PathBuf};

use crate::cmd::{edit, generate};
use crate::output;

/// Flags accepted inside an argument-style prompt.
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct PromptArgs {
    #[arg(long)]
    project: Option<String>,

    #[arg(long)]
    framework: Option<String>,

    #[arg(long)]
    features: Option<String>,

    #[arg(long)]
    edit: bool,

    #[arg(long)]
    changes: Option<String>,

    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(projects_root: &Path, prompt: &str, dry_run: bool) -> anyhow::Result<()> {
    if intent::looks_like_args(prompt) {
        let args = PromptArgs::try_parse_from(prompt.split_whitespace())
            .map_err(|e| anyhow::anyhow!("could not parse argument-style prompt: {e}"))?;
        return dispatch_args(projects_root, args, dry_run);
    }

    let parsed = intent::parse_intent(prompt)?;
    if dry_run {
        return output::print_json(&parsed);
    }

    match parsed {
        Intent::Generate {
            project,
            framework,
            features,
        } => generate::run(
            projects_root,
            generate::GenerateArgs {
                project: Some(project),
                framework: Some(framework.as_str().to_string()),
                features: Some(features),
                config: None,
                skip_tests: false,
                skip_deploy: false,
            },
        ),
        Intent::Edit { project, changes } => edit::run(projects_root, &project, &changes, None),
    }
}

fn dispatch_args(projects_root: &Path, args: PromptArgs, dry_run: bool) -> anyhow::Result<()> {
    if args.edit {
        let project = args
            .project
            .ok_or_else(|| anyhow::anyhow!("--project is required in edit mode"))?;
        let changes = args
            .changes
            .ok_or_else(|| anyhow::anyhow!("--changes is required in edit mode"))?;
        if dry_run {
            return output::print_json(&Intent::Edit { project, changes });
        }
        return edit::run(projects_root, &project, &changes, None);
    }

    if dry_run {
        // Surface what would run without invoking any agent.
        let preview = serde_json::json!({
            "intent": "generate",
            "project": args.project,
            "framework": args.framework,
            "features": args.features,
            "config": args.config,
        });
        return output::print_json(&preview);
    }
    generate::run(
        projects_root,
        generate::GenerateArgs {
            project: args.project,
            framework: args.framework,
            features: args.features,
            config: args.config,
            skip_tests: false,
            skip_deploy: false,
        },
    )
}
