//! Follow-up drafting via an OpenAI-compatible chat-completion API.

use anyhow::{Context, Result};
use followup_types::MeetingRecap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.7;

/// Instruction preamble sent as the system message. The payload follows as
/// the serialized user message; no conversation history, no retries.
const PREAMBLE: &str = "You are a sales assistant. Draft a concise, friendly follow-up email \
to the customer based on the meeting recap that follows. Reference the topics discussed and \
the agreed next steps. Start your reply with a line of the form 'Subject: <subject>' followed \
by the email body in plain text.";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for the completion provider.
#[derive(Clone, Debug)]
pub struct Drafter {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: Client,
}

impl Drafter {
    pub fn new(api_key: Option<String>, model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client: Client::new(),
        }
    }

    /// Whether a credential is configured. When false, `draft` never makes
    /// an outbound call.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Draft a follow-up email for the recap.
    ///
    /// Returns `Ok(None)` when no credential is configured; the caller
    /// degrades to its fallback content instead of failing the request.
    pub async fn draft(&self, recap: &MeetingRecap) -> Result<Option<String>> {
        let Some(ref api_key) = self.api_key else {
            warn!("Completion provider not configured, skipping draft");
            return Ok(None);
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(recap)?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send completion request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion request failed with {}: {}", status, detail);
        }

        let completion: ChatResponse = response
            .json()
            .await
            .context("Failed to parse completion response")?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Completion response contained no choices")?;
        Ok(Some(text))
    }

    fn build_request_body(&self, recap: &MeetingRecap) -> Result<ChatRequest> {
        let payload =
            serde_json::to_string_pretty(recap).context("Failed to serialize recap")?;
        Ok(ChatRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: PREAMBLE.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: payload,
                },
            ],
        })
    }
}

/// A drafted follow-up email, split into subject and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub subject: String,
    pub body: String,
}

impl Draft {
    /// Split a completion into subject and body.
    ///
    /// A leading `Subject: <text>` line becomes the subject and the rest the
    /// body; otherwise the subject is synthesized from the company name and
    /// the full text is used as the body unchanged.
    pub fn from_completion(text: &str, company: &str) -> Self {
        if let Some(rest) = text.strip_prefix("Subject:") {
            let (subject, body) = match rest.split_once('\n') {
                Some((subject, body)) => (subject, body),
                None => (rest, ""),
            };
            return Self {
                subject: subject.trim().to_string(),
                body: body.trim_start_matches('\n').to_string(),
            };
        }
        Self {
            subject: format!("Sales meeting recap: {}", company),
            body: text.to_string(),
        }
    }
}
