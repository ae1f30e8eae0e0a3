//! `factory-agent` — synchronous driver for the LLM agent CLI.
//!
//! The generation pipelines delegate all "hard" work (planning, code
//! generation, review) to an external agent binary. This crate wraps that
//! binary behind a small seam:
//!
//! ```text
//! RoleSpec + TaskSpec
//!     │
//!     ▼
//! compose_prompt      ← role/goal/backstory folded into one prompt
//!     │
//!     ▼
//! run_task            ← rate limiting + quota-aware retries
//!     │
//!     ▼
//! AgentExec           ← trait seam; CliAgent spawns `<agent> --print …`
//! ```
//!
//! Execution is deliberately blocking: pipelines are single-threaded and run
//! one agent task at a time.

pub mod error;
pub mod exec;
pub mod roles;
pub mod runner;
pub mod types;

pub use error::AgentError;
pub use exec::{AgentExec, CliAgent};
pub use runner::{compose_prompt, is_quota_error, run_task, RateLimiter};
pub use types::{AgentOptions, RoleSpec, TaskSpec};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AgentError>;
