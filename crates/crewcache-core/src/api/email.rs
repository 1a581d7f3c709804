//! Client for the transactional notification service.
//!
//! The service takes a recipient, a subject, and a flat map of template
//! fields, and renders/sends the mail itself. Sends are fire-and-forget
//! from the portal's point of view: a failure is surfaced as a warning and
//! never rolls back the write that preceded it.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Role;

/// Send timeout in seconds. Mail relays can be slow; match the store timeout.
const SEND_TIMEOUT_SECS: u64 = 30;

/// Subject line for new-account mail.
const WELCOME_SUBJECT: &str = "Welcome - Your Account Credentials";

/// One outgoing notification.
#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    #[serde(rename = "recipientEmail")]
    pub recipient: String,
    pub subject: String,
    #[serde(rename = "templateData")]
    pub template: BTreeMap<String, String>,
}

impl EmailRequest {
    /// Welcome mail for a freshly created account, carrying the generated
    /// temporary password. The credential lives only in this mail; the
    /// store never sees it.
    pub fn welcome(
        recipient: &str,
        name: &str,
        role: Role,
        temp_password: &str,
        company_name: &str,
        portal_url: &str,
    ) -> Self {
        let mut template = BTreeMap::new();
        template.insert("company_name".to_string(), company_name.to_string());
        template.insert("to_name".to_string(), name.to_string());
        template.insert("user_role".to_string(), role.as_str().to_string());
        template.insert("user_email".to_string(), recipient.to_string());
        template.insert("user_password".to_string(), temp_password.to_string());
        template.insert("website_link".to_string(), portal_url.to_string());
        template.insert("from_name".to_string(), "Admin Team".to_string());

        Self {
            recipient: recipient.to_string(),
            subject: WELCOME_SUBJECT.to_string(),
            template,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    base_url: String,
}

impl EmailClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send one notification. Returns Err on transport failure or when the
    /// service reports failure in its body.
    pub async fn send(&self, request: &EmailRequest) -> Result<()> {
        let url = format!("{}/send-email", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .context("Failed to reach the notification service")?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            anyhow::bail!("Notification service returned {}: {}", status, text);
        }

        // The service reports failures in-body with a 200 in some paths
        if let Ok(parsed) = serde_json::from_str::<SendResponse>(&text) {
            if parsed.success == Some(false) {
                let reason = parsed
                    .message
                    .or(parsed.error)
                    .unwrap_or_else(|| "unknown send failure".to_string());
                anyhow::bail!("Notification service refused the send: {}", reason);
            }
        }

        debug!(recipient = %request.recipient, "Notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_request_wire_shape() {
        let request = EmailRequest::welcome(
            "new.hire@example.com",
            "New Hire",
            Role::Employee,
            "Zx9mQ24TpA",
            "Acme",
            "https://portal.acme.example",
        );

        let json = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(json["recipientEmail"], "new.hire@example.com");
        assert_eq!(json["subject"], WELCOME_SUBJECT);
        assert_eq!(json["templateData"]["to_name"], "New Hire");
        assert_eq!(json["templateData"]["user_role"], "employee");
        assert_eq!(json["templateData"]["user_password"], "Zx9mQ24TpA");
        assert_eq!(json["templateData"]["company_name"], "Acme");
    }

    #[test]
    fn test_send_response_parses_both_shapes() {
        let ok: SendResponse =
            serde_json::from_str(r#"{"success": true, "message": "sent"}"#).expect("should parse");
        assert_eq!(ok.success, Some(true));

        let failed: SendResponse =
            serde_json::from_str(r#"{"success": false, "error": "SMTP timeout"}"#)
                .expect("should parse");
        assert_eq!(failed.success, Some(false));
        assert_eq!(failed.error.as_deref(), Some("SMTP timeout"));
    }
}
