//! Transactional email relay client (Resend-compatible API).

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Client for the email provider. Unconfigured instances no-op.
#[derive(Clone, Debug)]
pub struct Mailer {
    api_key: Option<String>,
    from: Option<String>,
    base_url: String,
    client: Client,
}

impl Mailer {
    pub fn new(api_key: Option<String>, from: Option<String>, base_url: Option<String>) -> Self {
        Self {
            api_key,
            from,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client: Client::new(),
        }
    }

    /// Whether both a credential and a sender address are configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.from.is_some()
    }

    /// Send a plain-text email. Returns `Ok(false)` without any outbound
    /// call when the mailer is not configured.
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<bool> {
        let (Some(api_key), Some(from)) = (self.api_key.as_deref(), self.from.as_deref()) else {
            warn!("Email provider not configured, skipping send");
            return Ok(false);
        };

        let url = format!("{}/emails", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&SendRequest {
                from,
                to,
                subject,
                text,
            })
            .send()
            .await
            .context("Failed to send email request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Email request failed with {}: {}", status, detail);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_requires_key_and_sender() {
        assert!(!Mailer::new(None, None, None).is_configured());
        assert!(!Mailer::new(Some("re_test".to_string()), None, None).is_configured());
        assert!(
            !Mailer::new(None, Some("sales@example.com".to_string()), None).is_configured()
        );
        assert!(Mailer::new(
            Some("re_test".to_string()),
            Some("sales@example.com".to_string()),
            None
        )
        .is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_skips_send() {
        let mailer = Mailer::new(None, None, None);
        let sent = mailer.send("a@b.example", "Hi", "Body").await.unwrap();
        assert!(!sent);
    }
}
