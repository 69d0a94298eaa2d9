//! The `send_meeting_recap` tool.
//!
//! Validates the recap payload, drafts a follow-up email through the
//! completion provider, and relays the draft through the email provider when
//! both are configured. Drafting and delivery are best-effort: the tool call
//! itself only fails on validation errors.

use crate::draft::Draft;
use crate::mcp::handler::ToolError;
use crate::state::AppState;
use followup_types::MeetingRecap;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Name of the single tool this gateway exposes.
pub const TOOL_NAME: &str = "send_meeting_recap";

/// Tool content returned when no draft could be produced.
pub const FALLBACK_CONTENT: &str = "saved";

/// Tool descriptor for `tools/list`.
pub fn descriptor() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": "Record a sales meeting recap and draft a follow-up email to the customer",
        "inputSchema": {
            "type": "object",
            "properties": {
                "company": {
                    "type": "string",
                    "description": "Name of the company the meeting was held with"
                },
                "summary": {
                    "type": "string",
                    "description": "Free-text summary of what was discussed"
                },
                "meeting_date": {
                    "type": "string",
                    "description": "When the meeting took place"
                },
                "attendees": {
                    "type": "array",
                    "description": "People present at the meeting",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "role": { "type": "string" }
                        },
                        "required": ["name"]
                    }
                },
                "pain_points": {
                    "type": "array",
                    "description": "Customer pain points raised during the meeting",
                    "items": { "type": "string" }
                },
                "action_items": {
                    "type": "array",
                    "description": "Agreed action items",
                    "items": { "type": "string" }
                },
                "next_steps": {
                    "type": "string",
                    "description": "Next steps agreed with the customer"
                },
                "recipient_email": {
                    "type": "string",
                    "description": "Where to send the drafted follow-up. If omitted, no email is sent."
                }
            },
            "required": ["company", "summary"]
        }
    })
}

/// Execute the tool against a decoded `arguments` value.
pub async fn send_meeting_recap(state: &AppState, args: Value) -> Result<Value, ToolError> {
    let recap: MeetingRecap =
        serde_json::from_value(args).map_err(|e| ToolError::Internal(e.into()))?;

    // Reject before any side effect, naming every violated field.
    recap.check().map_err(ToolError::Validation)?;

    info!(
        "Recap received for {} ({} attendees)",
        recap.company,
        recap.attendees.len()
    );

    let content = match state.drafter.draft(&recap).await {
        Ok(Some(text)) => {
            let draft = Draft::from_completion(&text, &recap.company);
            debug!("Drafted follow-up: subject={:?}", draft.subject);
            relay_draft(state, &recap, &draft).await;
            text
        }
        Ok(None) => {
            // Completion provider not configured; the recap is still accepted.
            FALLBACK_CONTENT.to_string()
        }
        Err(e) => {
            warn!("Drafting failed, returning fallback content: {:#}", e);
            FALLBACK_CONTENT.to_string()
        }
    };

    Ok(json!({
        "content": [{
            "type": "text",
            "text": content
        }]
    }))
}

/// Best-effort email relay. Failures are logged and swallowed; they never
/// fail the tool call.
async fn relay_draft(state: &AppState, recap: &MeetingRecap, draft: &Draft) {
    let Some(recipient) = recap.recipient_email.as_deref() else {
        debug!("No recipient_email in payload, skipping email relay");
        return;
    };
    match state.mailer.send(recipient, &draft.subject, &draft.body).await {
        Ok(true) => info!("Follow-up email sent to {}", recipient),
        Ok(false) => {} // mailer not configured; already warned at startup
        Err(e) => warn!("Email relay failed (tool call still succeeds): {:#}", e),
    }
}
