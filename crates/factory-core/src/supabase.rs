//! Supabase Management API client for creating planned tables.
//!
//! Credentials come from `SUPABASE_URL` / `SUPABASE_SERVICE_KEY`; a missing
//! pair means the table-creation stage is skipped, not failed. The client is
//! an explicit config struct passed at call time — no process-wide handle.

use crate::error::{FactoryError, Result};
use crate::schema;
use std::time::Duration;

/// Base URL of the hosted Management API. Overridable for tests.
pub const MANAGEMENT_API_BASE: &str = "https://api.supabase.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// SupabaseConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// The project URL, `https://<project_ref>.supabase.co`.
    pub url: String,
    pub service_key: String,
    pub management_base: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_key: service_key.into(),
            management_base: MANAGEMENT_API_BASE.to_string(),
        }
    }

    /// Read credentials from the environment. `None` when either variable is
    /// absent — the caller logs and skips table creation.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUPABASE_URL").ok()?;
        let service_key = std::env::var("SUPABASE_SERVICE_KEY").ok()?;
        Some(Self::new(url, service_key))
    }

    /// Extract the project ref from the project URL
    /// (`https://<project_ref>.supabase.co`).
    pub fn project_ref(&self) -> Result<String> {
        let rest = self
            .url
            .split_once("//")
            .map(|(_, rest)| rest)
            .ok_or_else(|| FactoryError::SupabaseUrl(self.url.clone()))?;
        let project_ref = rest.split('.').next().unwrap_or("");
        if project_ref.is_empty() {
            return Err(FactoryError::SupabaseUrl(self.url.clone()));
        }
        Ok(project_ref.to_string())
    }
}

// ---------------------------------------------------------------------------
// Table creation
// ---------------------------------------------------------------------------

/// Create `table` in the public schema via the Management API.
///
/// `schema_defs` are the planner's column definition strings; they are parsed
/// into structured columns first, and a table whose definitions all fail to
/// parse is an error.
pub fn create_table(cfg: &SupabaseConfig, table: &str, schema_defs: &[String]) -> Result<()> {
    let columns = schema::parse_schema(schema_defs);
    if columns.is_empty() {
        return Err(FactoryError::EmptySchema(table.to_string()));
    }

    let project_ref = cfg.project_ref()?;
    let endpoint = format!(
        "{}/v1/projects/{}/tables",
        cfg.management_base, project_ref
    );
    let payload = serde_json::json!({
        "name": table,
        "columns": columns,
        "schema": "public",
    });

    tracing::info!(table, %endpoint, "creating table via management api");
    tracing::debug!(payload = %payload, "table creation payload");

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let response = client
        .post(&endpoint)
        .header("apikey", &cfg.service_key)
        .header("Authorization", format!("Bearer {}", cfg.service_key))
        .json(&payload)
        .send()?;

    let status = response.status();
    let body = response.text().unwrap_or_default();
    if status.is_success() {
        tracing::info!(table, %status, "table created");
        Ok(())
    } else {
        Err(FactoryError::Supabase(format!(
            "failed to create table '{}': {}",
            table,
            extract_error_message(status.as_u16(), &body)
        )))
    }
}

/// Mine an error response body for a human-readable message; API errors carry
/// one of `message`, `error`, or `details` depending on the failure.
fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "details"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    format!("HTTP {status}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
