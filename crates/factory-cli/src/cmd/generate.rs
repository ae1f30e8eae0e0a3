//! The staged generation pipeline: plan → tables → code → review → quality →
//! tests → deploy.
//!
//! Stage policy mirrors what each stage produces. Planning and code
//! generation are load-bearing and abort the run; review, quality, tests,
//! and deployment are best-effort refinements that log and continue.

use anyhow::Context;
use factory_agent::{roles, run_task, AgentExec, AgentOptions, CliAgent, RateLimiter, TaskSpec};
use factory_core::blocks;
use factory_core::commands::{self, Framework};
use factory_core::config::GenerationConfig;
use factory_core::materialize::{self, MaterializeReport, SkippedFile};
use factory_core::plan::ProjectPlan;
use factory_core::quality::{self, QualityIssue};
use factory_core::runs::{RunStatus, RunStore};
use factory_core::{io, paths, supabase, webhook};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::output;

// ---------------------------------------------------------------------------
// Arguments and summary
// ---------------------------------------------------------------------------

pub struct GenerateArgs {
    pub project: Option<String>,
    pub framework: Option<String>,
    pub features: Option<String>,
    pub config: Option<PathBuf>,
    pub skip_tests: bool,
    pub skip_deploy: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerationSummary {
    pub status: String,
    pub project_name: String,
    pub framework: String,
    pub features: String,
    pub files_written: Vec<String>,
    pub files_skipped: Vec<SkippedFile>,
    pub tables_created: Vec<String>,
    pub tests: String,
    pub deployment_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(projects_root: &Path, args: GenerateArgs) -> anyhow::Result<()> {
    let (project, framework, features) = resolve_params(
        args.project,
        args.framework,
        args.features,
        args.config.as_deref(),
    )?;
    paths::validate_project_name(&project)?;

    let project_dir = paths::project_dir(projects_root, &project);
    io::ensure_dir(&project_dir)
        .with_context(|| format!("cannot prepare project directory {}", project_dir.display()))?;

    let store = RunStore::open(&paths::runs_db_path(projects_root))?;
    let run_id = store.record_start(&project, framework.as_str(), &features)?;

    let opts = AgentOptions::from_env();
    let exec = CliAgent::from_options(&opts).in_dir(&project_dir);
    let mut pipeline = Pipeline {
        exec: &exec,
        limiter: RateLimiter::from_options(&opts),
        opts: &opts,
        project: &project,
        project_dir: &project_dir,
        framework,
        features: &features,
        skip_tests: args.skip_tests,
        skip_deploy: args.skip_deploy,
    };

    tracing::info!(%project, framework = %framework, %features, "starting generation");

    match pipeline.execute() {
        Ok(mut summary) => {
            let status = if args.skip_deploy {
                RunStatus::Completed
            } else {
                RunStatus::Deployed
            };
            summary.status = status.as_str().to_string();
            store.finish(run_id, status, summary.deployment_url.as_deref(), None)?;
            io::atomic_write(
                &paths::summary_path(&project_dir),
                serde_json::to_string_pretty(&summary)?.as_bytes(),
            )?;
            send_webhook(&summary);
            output::print_json(&summary)
        }
        Err(e) => {
            let notes = format!("{e:#}");
            if let Err(db_err) = store.mark_failed(run_id, &notes) {
                tracing::error!(error = %db_err, "could not record run failure");
            }
            Err(e)
        }
    }
}

/// Framework and features come from flags, falling back to the config file;
/// the project name comes from the flag or the config file.
fn resolve_params(
    project: Option<String>,
    framework: Option<String>,
    features: Option<String>,
    config: Option<&Path>,
) -> anyhow::Result<(String, Framework, String)> {
    let mut project = project;
    let mut framework = framework;
    let mut features = features;

    if project.is_none() || framework.is_none() || features.is_none() {
        if let Some(path) = config {
            let cfg = GenerationConfig::load(path)?;
            framework = framework.or(Some(cfg.framework));
            features = features.or(Some(cfg.features));
            project = project.or(cfg.project_name);
        }
    }

    let project = project.ok_or_else(|| anyhow::anyhow!("--project is required"))?;
    let framework = framework
        .ok_or_else(|| anyhow::anyhow!("--framework and --features (or --config) are required"))?;
    let features = features
        .ok_or_else(|| anyhow::anyhow!("--framework and --features (or --config) are required"))?;
    anyhow::ensure!(!features.trim().is_empty(), "features must not be empty");

    Ok((project, Framework::from_str(&framework)?, features))
}

fn send_webhook(summary: &GenerationSummary) {
    match webhook::url_from_env() {
        Some(url) => {
            webhook::notify(
                &url,
                &webhook::WebhookPayload {
                    project_name: summary.project_name.clone(),
                    framework: Some(summary.framework.clone()),
                    features: Some(summary.features.clone()),
                    changes: None,
                    status: summary.status.clone(),
                    deployment_url: summary.deployment_url.clone(),
                },
            );
        }
        None => tracing::debug!("N8N_WEBHOOK_URL not set; skipping webhook"),
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

struct Pipeline<'a> {
    exec: &'a dyn AgentExec,
    limiter: RateLimiter,
    opts: &'a AgentOptions,
    project: &'a str,
    project_dir: &'a Path,
    framework: Framework,
    features: &'a str,
    skip_tests: bool,
    skip_deploy: bool,
}

impl Pipeline<'_> {
    fn execute(&mut self) -> anyhow::Result<GenerationSummary> {
        // Plan
        let plan_raw = self
            .agent_task(roles::project_planner(), self.plan_task())
            .context("planning stage failed")?;
        let plan = ProjectPlan::parse(&plan_raw);

        // Tables
        let tables_created = self.create_tables(&plan);

        // Code generation
        let raw = self
            .agent_task(roles::code_generator(), self.codegen_task(&plan))
            .context("code generation stage failed")?;
        let mut report = self.materialize_output(&raw)?;

        // Review
        if let Err(e) = self.review_stage(&mut report) {
            tracing::warn!(error = %format!("{e:#}"), "review stage failed; continuing");
        }

        // Quality
        if let Err(e) = self.quality_stage(&mut report) {
            tracing::warn!(error = %format!("{e:#}"), "quality stage failed; continuing");
        }

        // Tests
        let tests = if self.skip_tests {
            "skipped".to_string()
        } else {
            match self.tests_stage(&mut report) {
                Ok(true) => "passed".to_string(),
                Ok(false) => "failed".to_string(),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "test stage failed; continuing");
                    "failed".to_string()
                }
            }
        };

        // Deploy
        let deployment_url = if self.skip_deploy {
            None
        } else {
            match self.deploy_stage(&mut report) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "deploy stage failed; continuing");
                    None
                }
            }
        };

        // A path rewritten by a later stage appears once, first position kept.
        let mut seen = std::collections::HashSet::new();
        let mut files_written = report.written;
        files_written.retain(|p| seen.insert(p.clone()));

        Ok(GenerationSummary {
            status: String::new(),
            project_name: self.project.to_string(),
            framework: self.framework.as_str().to_string(),
            features: self.features.to_string(),
            files_written,
            files_skipped: report.skipped,
            tables_created,
            tests,
            deployment_url,
        })
    }

    fn agent_task(&mut self, role: factory_agent::RoleSpec, task: TaskSpec) -> anyhow::Result<String> {
        Ok(run_task(self.exec, &mut self.limiter, self.opts, &role, &task)?)
    }

    /// Debug sink, block extraction, and materialization for one stage's raw
    /// agent output.
    fn materialize_output(&self, raw: &str) -> anyhow::Result<MaterializeReport> {
        materialize::persist_raw(self.project_dir, raw);
        let (file_blocks, format) = blocks::extract_blocks(raw, self.project);
        if file_blocks.is_empty() {
            tracing::warn!("no file blocks parsed from agent output; check debug_result.txt");
        } else {
            tracing::info!(
                count = file_blocks.len(),
                format = format.as_str(),
                "parsed file blocks"
            );
        }
        Ok(materialize::materialize(self.project_dir, file_blocks)?)
    }

    fn create_tables(&self, plan: &ProjectPlan) -> Vec<String> {
        let mut created = Vec::new();
        match supabase::SupabaseConfig::from_env() {
            Some(cfg) => {
                for table in plan.valid_tables() {
                    match supabase::create_table(&cfg, &table.name, &table.schema) {
                        Ok(()) => created.push(table.name.clone()),
                        Err(e) => {
                            tracing::warn!(table = %table.name, error = %e, "table creation failed")
                        }
                    }
                }
            }
            None => {
                if !plan.supabase_tables.is_empty() {
                    tracing::warn!(
                        "SUPABASE_URL/SUPABASE_SERVICE_KEY not set; skipping table creation"
                    );
                }
            }
        }
        created
    }

    fn review_stage(&mut self, report: &mut MaterializeReport) -> anyhow::Result<()> {
        let raw = self.agent_task(roles::code_reviewer(), self.review_task())?;
        let corrections = self.materialize_output(&raw)?;
        if corrections.written.is_empty() {
            tracing::info!("reviewer suggested no corrections");
        }
        merge(report, corrections);
        Ok(())
    }

    fn quality_stage(&mut self, report: &mut MaterializeReport) -> anyhow::Result<()> {
        let assessment = self.agent_task(roles::quality_analyst(), self.quality_task())?;
        tracing::info!(chars = assessment.len(), "quality assessment complete");

        let Some(sonar_url) = std::env::var("SONARQUBE_URL").ok().filter(|u| !u.is_empty())
        else {
            tracing::warn!("SONARQUBE_URL not set; skipping static analysis integration");
            return Ok(());
        };
        let token = std::env::var("SONARQUBE_TOKEN").ok();

        let issues = quality::fetch_issues(&sonar_url, token.as_deref(), self.project)?;
        if issues.is_empty() {
            tracing::info!("static analysis reported no issues");
            return Ok(());
        }
        tracing::info!(count = issues.len(), "feeding analysis issues to the improvement agent");

        let raw = self.agent_task(
            roles::improvement_specialist(),
            self.improve_task(&issues)?,
        )?;
        merge(report, self.materialize_output(&raw)?);
        Ok(())
    }

    fn tests_stage(&mut self, report: &mut MaterializeReport) -> anyhow::Result<bool> {
        let raw = self.agent_task(roles::test_generator(), self.test_task())?;
        merge(report, self.materialize_output(&raw)?);

        let out = commands::run_shell(self.project_dir, self.framework.test_command())?;
        if !out.success() {
            tracing::warn!(status = out.status, "generated test suite failed");
        }
        Ok(out.success())
    }

    fn deploy_stage(&mut self, report: &mut MaterializeReport) -> anyhow::Result<Option<String>> {
        let raw = self.agent_task(roles::deployment_specialist(), self.deploy_task())?;
        merge(report, self.materialize_output(&raw)?);

        if let Err(e) = commands::git_bootstrap(self.project_dir) {
            tracing::warn!(error = %e, "git bootstrap failed");
        }

        let out = commands::run_shell(self.project_dir, self.framework.deploy_command())?;
        if !out.success() {
            tracing::warn!(status = out.status, "deploy command failed");
            return Ok(None);
        }
        Ok(commands::extract_deployment_url(&out.stdout))
    }

    // -----------------------------------------------------------------------
    // Task definitions
    // -----------------------------------------------------------------------

    fn plan_task(&self) -> TaskSpec {
        TaskSpec::new(
            format!(
                "Create a detailed implementation plan for project {} using the {} framework \
                 with these features: {}. The plan must include the file structure, the \
                 required Supabase tables (names and columns), and the key components to \
                 implement.",
                self.project,
                self.framework.as_str(),
                self.features
            ),
            "A JSON object with keys: 'file_structure', 'supabase_tables' (a list of objects \
             with 'name' and 'schema', where 'schema' is a list of column definition strings), \
             and 'components'.",
        )
    }

    fn codegen_task(&self, plan: &ProjectPlan) -> TaskSpec {
        TaskSpec::new(
            format!(
                "Generate the complete source code for project {} using the {} framework with \
                 these features: {}. Integrate Supabase using the SUPABASE_URL and \
                 SUPABASE_SERVICE_KEY environment variables. Follow this file structure: {}. \
                 Implement these components: {}.\n{}",
                self.project,
                self.framework.as_str(),
                self.features,
                self.plan_json(&plan.file_structure),
                plan.components.join(", "),
                OUTPUT_FORMAT,
            ),
            "The full content of every generated file in the \
             '--- <path> --- <content>' format.",
        )
    }

    fn review_task(&self) -> TaskSpec {
        TaskSpec::new(
            format!(
                "Review the source code of project {} in directory '{}'. Check for bugs, {} \
                 best practices, and correct Supabase integration. If you find problems, \
                 return the corrected files.\n{}",
                self.project,
                self.project_dir.display(),
                self.framework.as_str(),
                OUTPUT_FORMAT,
            ),
            "A review report; corrected files, if any, in the \
             '--- <path> --- <content>' format.",
        )
    }

    fn quality_task(&self) -> TaskSpec {
        TaskSpec::new(
            format!(
                "Assess the overall quality of project {} in directory '{}': maintainability, \
                 correctness risks, and missing error handling.",
                self.project,
                self.project_dir.display(),
            ),
            "A concise quality report listing concrete findings.",
        )
    }

    fn improve_task(&self, issues: &[QualityIssue]) -> anyhow::Result<TaskSpec> {
        Ok(TaskSpec::new(
            format!(
                "Static analysis reported the following issues for project {}:\n{}\n\
                 Fix each issue and return the corrected files.\n{}",
                self.project,
                serde_json::to_string_pretty(issues)?,
                OUTPUT_FORMAT,
            ),
            "The corrected files in the '--- <path> --- <content>' format.",
        ))
    }

    fn test_task(&self) -> TaskSpec {
        let tooling = match self.framework {
            Framework::NextJs => "Playwright or Jest",
            Framework::Flask => "pytest",
        };
        TaskSpec::new(
            format!(
                "Generate automated tests for project {} in directory '{}' using {}. Cover the \
                 key features, including Supabase integration (CRUD, authentication).\n{}",
                self.project,
                self.project_dir.display(),
                tooling,
                OUTPUT_FORMAT,
            ),
            "The full content of every test file in the '--- <path> --- <content>' format.",
        )
    }

    fn deploy_task(&self) -> TaskSpec {
        let platform = match self.framework {
            Framework::NextJs => "Vercel (vercel.json)",
            Framework::Flask => "Render (render.yaml)",
        };
        TaskSpec::new(
            format!(
                "Prepare project {} in directory '{}' for deployment to {}. Generate the \
                 necessary configuration files and an INSTRUCTIONS.md, making sure the \
                 SUPABASE_URL and SUPABASE_SERVICE_KEY environment variables are wired \
                 through.\n{}",
                self.project,
                self.project_dir.display(),
                platform,
                OUTPUT_FORMAT,
            ),
            "The full content of every configuration file in the \
             '--- <path> --- <content>' format.",
        )
    }

    fn plan_json(&self, value: &serde_json::Value) -> String {
        if value.is_null() {
            "(no structure planned)".to_string()
        } else {
            value.to_string()
        }
    }
}

/// Output contract shared by every code-producing task. The sentinel format
/// here is what the block parser expects back.
const OUTPUT_FORMAT: &str = "Return the full content of each file in the format:\n\
--- <path relative to the project directory> ---\n\
<content>\n\
For example:\n\
--- src/pages/index.js ---\n\
// JavaScript code\n\
--- styles/global.css ---\n\
/* CSS code */";

fn merge(into: &mut MaterializeReport, from: MaterializeReport) {
    into.written.extend(from.written);
    into.skipped.extend(from.skipped);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
