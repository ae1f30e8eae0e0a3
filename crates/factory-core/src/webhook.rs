//! Best-effort completion webhook, fired after generate/edit runs so an
//! external automation flow (n8n) can react. Delivery failures are logged
//! and never affect the run outcome.

use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub project_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_url: Option<String>,
}

/// Webhook endpoint from the environment, when configured.
pub fn url_from_env() -> Option<String> {
    std::env::var("N8N_WEBHOOK_URL").ok().filter(|u| !u.is_empty())
}

/// POST the payload to `url`. Returns whether delivery succeeded; failures
/// are logged at warn and swallowed.
pub fn notify(url: &str, payload: &WebhookPayload) -> bool {
    tracing::info!(%url, project = %payload.project_name, "calling completion webhook");
    let client = match reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "could not build webhook client");
            return false;
        }
    };

    match client.post(url).json(payload).send() {
        Ok(response) if response.status().is_success() => {
            tracing::info!(status = %response.status(), "webhook delivered");
            true
        }
        Ok(response) => {
            tracing::warn!(status = %response.status(), "webhook rejected");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "webhook call failed");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
