//! Fetching analysis issues from a SonarQube-compatible API.
//!
//! The scanner itself runs out-of-process; this module only pulls the
//! resulting issues so the improvement agent can be fed concrete findings.

use crate::error::{FactoryError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Issue types worth feeding back into the improvement loop.
pub const ISSUE_TYPES: &str = "CODE_SMELL,BUG,VULNERABILITY,SECURITY_HOTSPOT";

/// Page size for the issues search endpoint.
pub const PAGE_SIZE: u32 = 500;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// QualityIssue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub key: String,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct IssuesPage {
    #[serde(default)]
    issues: Vec<QualityIssue>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    ps: u64,
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetch all issues for `project`, following pagination until the reported
/// total is covered. Any request or parse failure aborts the whole fetch;
/// the caller treats that as "no results" for the quality stage.
pub fn fetch_issues(
    base_url: &str,
    token: Option<&str>,
    project: &str,
) -> Result<Vec<QualityIssue>> {
    let endpoint = format!("{}/api/issues/search", base_url.trim_end_matches('/'));
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let mut all_issues = Vec::new();
    let mut page: u64 = 1;
    loop {
        tracing::info!(project, page, "fetching quality issues");
        let page_size = PAGE_SIZE.to_string();
        let page_number = page.to_string();
        let mut request = client.get(&endpoint).query(&[
            ("componentKeys", project),
            ("types", ISSUE_TYPES),
            ("ps", page_size.as_str()),
            ("p", page_number.as_str()),
        ]);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FactoryError::Quality(format!(
                "issues search returned HTTP {status}"
            )));
        }
        let body: IssuesPage = response
            .json()
            .map_err(|e| FactoryError::Quality(format!("failed to parse issues response: {e}")))?;

        all_issues.extend(body.issues);

        // A zero page size would never terminate the loop.
        if body.ps == 0 || page * body.ps >= body.total {
            break;
        }
        page += 1;
    }

    tracing::info!(count = all_issues.len(), project, "fetched quality issues");
    Ok(all_issues)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
