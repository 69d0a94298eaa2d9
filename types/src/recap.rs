//! Meeting recap payload passed to the `send_meeting_recap` tool.
//!
//! Every field carries `#[serde(default)]` so that deserialization never
//! short-circuits on a missing field; `validate()` then reports the full set
//! of violations in one pass instead of stopping at the first one.

use garde::Validate;
use serde::{Deserialize, Serialize};

/// A person who attended the meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[garde(allow_unvalidated)]
pub struct Contact {
    /// Full name of the contact.
    #[garde(length(min = 1))]
    pub name: String,
    /// Role or title, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Structured recap of a sales meeting.
///
/// `company` and `summary` are mandatory; everything else is optional
/// context that improves the drafted follow-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[garde(allow_unvalidated)]
pub struct MeetingRecap {
    /// Name of the company the meeting was held with.
    #[serde(default)]
    #[garde(length(min = 1))]
    pub company: String,
    /// Free-text summary of what was discussed.
    #[serde(default)]
    #[garde(length(min = 1))]
    pub summary: String,
    /// When the meeting took place, in whatever form the client recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<String>,
    /// People present at the meeting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[garde(dive)]
    pub attendees: Vec<Contact>,
    /// Customer pain points raised during the meeting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pain_points: Vec<String>,
    /// Agreed action items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_items: Vec<String>,
    /// Next steps agreed with the customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
    /// Where to send the drafted follow-up. When absent, no email is sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(contains("@"))]
    pub recipient_email: Option<String>,
}

/// One violated field from payload validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Dotted path of the offending field, e.g. `attendees[0].name`.
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl MeetingRecap {
    /// Validate the payload, returning every violated field at once.
    pub fn check(&self) -> Result<(), Vec<ValidationFailure>> {
        match self.validate() {
            Ok(()) => Ok(()),
            Err(report) => Err(report
                .iter()
                .map(|(path, error)| ValidationFailure {
                    field: path.to_string(),
                    message: error.to_string(),
                })
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_recap() -> MeetingRecap {
        MeetingRecap {
            company: "Acme Corp".to_string(),
            summary: "Discussed rollout timeline for Q3".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_recap_passes() {
        assert!(valid_recap().check().is_ok());
    }

    #[test]
    fn test_missing_summary_named() {
        let recap: MeetingRecap =
            serde_json::from_value(json!({ "company": "Acme Corp" })).unwrap();
        let failures = recap.check().unwrap_err();
        assert!(failures.iter().any(|f| f.field == "summary"));
        assert!(!failures.iter().any(|f| f.field == "company"));
    }

    #[test]
    fn test_empty_payload_enumerates_all_violations() {
        let recap: MeetingRecap = serde_json::from_value(json!({})).unwrap();
        let failures = recap.check().unwrap_err();
        let fields: Vec<&str> = failures.iter().map(|f| f.field.as_str()).collect();
        assert!(fields.contains(&"company"));
        assert!(fields.contains(&"summary"));
    }

    #[test]
    fn test_nested_contact_name_required() {
        let mut recap = valid_recap();
        recap.attendees.push(Contact {
            name: String::new(),
            role: Some("CTO".to_string()),
        });
        let failures = recap.check().unwrap_err();
        assert!(failures.iter().any(|f| f.field.contains("name")));
    }

    #[test]
    fn test_bad_recipient_email_rejected() {
        let mut recap = valid_recap();
        recap.recipient_email = Some("not-an-address".to_string());
        let failures = recap.check().unwrap_err();
        assert!(failures.iter().any(|f| f.field == "recipient_email"));
    }

    #[test]
    fn test_absent_recipient_email_ok() {
        let mut recap = valid_recap();
        recap.recipient_email = None;
        assert!(recap.check().is_ok());

        recap.recipient_email = Some("jordan@acme.example".to_string());
        assert!(recap.check().is_ok());
    }

    #[test]
    fn test_unknown_fields_tolerated() {
        let recap: MeetingRecap = serde_json::from_value(json!({
            "company": "Acme Corp",
            "summary": "Intro call",
            "deal_size": "$40k"
        }))
        .unwrap();
        assert!(recap.check().is_ok());
    }
}
