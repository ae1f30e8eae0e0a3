//! Built-in agent roles for the generation and edit pipelines.
//!
//! Each role is a data-only record consumed by [`crate::runner::run_task`];
//! specializing an agent means writing a different record, not a subclass.
//! Edit mode can override any of these from a YAML roles file.

use crate::types::RoleSpec;

pub fn project_planner() -> RoleSpec {
    RoleSpec::new(
        "Project Planner",
        "Produce a concrete implementation plan: file structure, required \
         database tables with columns, and the key components to build",
        "Software architect who has scoped hundreds of web applications",
    )
}

pub fn database_manager() -> RoleSpec {
    RoleSpec::new(
        "Database Manager",
        "Design safe, minimal table schemas for the application's data",
        "Postgres specialist focused on Supabase-backed applications",
    )
}

pub fn code_generator() -> RoleSpec {
    RoleSpec::new(
        "Code Generator",
        "Generate complete, working source files for the planned application",
        "Experienced developer with expertise in Next.js and Flask",
    )
}

pub fn code_reviewer() -> RoleSpec {
    RoleSpec::new(
        "Code Reviewer",
        "Find bugs and deviations from framework best practices, and return \
         corrected files where needed",
        "Meticulous reviewer who reads every generated file",
    )
}

pub fn test_generator() -> RoleSpec {
    RoleSpec::new(
        "Test Generator",
        "Write automated tests covering the application's key flows",
        "QA engineer fluent in Playwright and pytest",
    )
}

pub fn deployment_specialist() -> RoleSpec {
    RoleSpec::new(
        "Deployment Specialist",
        "Prepare the project for hosting: platform config files and \
         deployment instructions",
        "Operations engineer who ships to Vercel and Render daily",
    )
}

pub fn quality_analyst() -> RoleSpec {
    RoleSpec::new(
        "Quality Assurance Specialist",
        "Assess the generated code for maintainability and correctness risks",
        "QA engineer with static-analysis expertise",
    )
}

pub fn improvement_specialist() -> RoleSpec {
    RoleSpec::new(
        "Code Improvement Specialist",
        "Fix the concrete issues reported by static analysis, returning \
         corrected files",
        "Refactoring specialist who resolves analyzer findings one by one",
    )
}

pub fn project_editor() -> RoleSpec {
    RoleSpec::new(
        "Project Editor",
        "Apply a requested change to an existing generated project, \
         returning every modified file in full",
        "Veteran maintainer of generated codebases",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_roles_are_complete_records() {
        let roles = [
            project_planner(),
            database_manager(),
            code_generator(),
            code_reviewer(),
            test_generator(),
            deployment_specialist(),
            quality_analyst(),
            improvement_specialist(),
            project_editor(),
        ];
        for role in &roles {
            assert!(!role.role.is_empty());
            assert!(!role.goal.is_empty());
            assert!(!role.backstory.is_empty());
        }
    }

    #[test]
    fn role_names_are_distinct() {
        let names = [
            project_planner().role,
            code_generator().role,
            code_reviewer().role,
            project_editor().role,
        ];
        let mut deduped = names.to_vec();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }
}
