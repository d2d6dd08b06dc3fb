//! Staff notification for new contact submissions.

use std::time::Duration;

use serde_json::json;

use crate::db::models::ContactSubmission;

#[derive(Debug, Clone, Default)]
pub struct Notifier {
    http: reqwest::Client,
    webhook: Option<String>,
}

impl Notifier {
    pub fn new(webhook: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http, webhook }
    }

    /// Never fails: the webhook runs in the background and only logs on error.
    pub fn contact_received(&self, submission: &ContactSubmission) {
        tracing::info!(
            contact_id = submission.id,
            event_type = %submission.event_type,
            "new contact submission"
        );

        let Some(url) = self.webhook.clone() else {
            return;
        };
        let http = self.http.clone();
        let payload = json!({
            "type": "contact.created",
            "id": submission.id,
            "name": submission.name,
            "email": submission.email,
            "phone": submission.phone,
            "eventType": submission.event_type,
            "message": submission.message,
            "createdAt": submission.created_at,
        });
        let contact_id = submission.id;

        tokio::spawn(async move {
            match http.post(&url).json(&payload).send().await {
                Ok(res) if res.status().is_success() => {
                    tracing::debug!(contact_id, "contact webhook delivered");
                }
                Ok(res) => {
                    tracing::warn!(contact_id, status = %res.status(), "contact webhook rejected");
                }
                Err(e) => {
                    tracing::warn!(contact_id, error = %e, "contact webhook failed");
                }
            }
        });
    }
}
