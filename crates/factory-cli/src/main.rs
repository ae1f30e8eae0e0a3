mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::runs::RunsSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "webfactory",
    about = "Agent-driven web project generator — plan, generate, review, test, and deploy",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory holding generated projects (default: ./projects)
    #[arg(long, global = true, env = "WEBFACTORY_ROOT")]
    projects_root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new project through the full agent pipeline
    Generate {
        /// Name of the project (may also come from --config)
        #[arg(long)]
        project: Option<String>,

        /// Framework to use (Next.js or Flask)
        #[arg(long)]
        framework: Option<String>,

        /// Feature description passed to the agents
        #[arg(long)]
        features: Option<String>,

        /// YAML file supplying framework/features (and optionally the name)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip running the generated test suite
        #[arg(long)]
        skip_tests: bool,

        /// Skip git bootstrap and deployment
        #[arg(long)]
        skip_deploy: bool,
    },

    /// Apply a described change to an existing project
    Edit {
        /// Name of the project
        #[arg(long)]
        project: String,

        /// Description of the changes to implement
        #[arg(long)]
        changes: String,

        /// YAML file overriding agent role definitions
        #[arg(long)]
        roles: Option<PathBuf>,
    },

    /// Parse a natural-language prompt and run the matching pipeline
    Prompt {
        /// Free text, or a pre-tokenized argument string starting with --
        #[arg(allow_hyphen_values = true)]
        prompt: String,

        /// Print the parsed intent without running anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-run block extraction on a saved raw agent output file
    Apply {
        /// Name of the project to materialize into
        #[arg(long)]
        project: String,

        /// Path to the raw output file (e.g. a prior debug_result.txt)
        input: PathBuf,
    },

    /// Inspect recorded generation runs
    Runs {
        #[command(subcommand)]
        subcommand: RunsSubcommand,
    },

    /// Start the HTTP facade
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3141")]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let projects_root = cli
        .projects_root
        .unwrap_or_else(|| PathBuf::from(factory_core::paths::PROJECTS_DIR));

    let result = match cli.command {
        Commands::Generate {
            project,
            framework,
            features,
            config,
            skip_tests,
            skip_deploy,
        } => cmd::generate::run(
            &projects_root,
            cmd::generate::GenerateArgs {
                project,
                framework,
                features,
                config,
                skip_tests,
                skip_deploy,
            },
        ),
        Commands::Edit {
            project,
            changes,
            roles,
        } => cmd::edit::run(&projects_root, &project, &changes, roles.as_deref()),
        Commands::Prompt { prompt, dry_run } => {
            cmd::prompt::run(&projects_root, &prompt, dry_run)
        }
        Commands::Apply { project, input } => {
            cmd::apply::run(&projects_root, &project, &input, cli.json)
        }
        Commands::Runs { subcommand } => cmd::runs::run(&projects_root, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&projects_root, port),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
