//! Enrollment result classification.
//!
//! Apollo answers `add_contact_ids` with a list of enrolled contacts and a
//! map of skipped contact ids to reason codes. Two reason codes are
//! business refusals that need a human; anything else is an error.

use std::fmt;

use outreach_apollo_client::RawEnrollmentResult;

pub const CODE_OTHER_ACTIVE_CAMPAIGN: &str = "contacts_active_in_other_campaigns";
pub const CODE_RECENT_JOB_CHANGE: &str = "contacts_with_job_change";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Contact is already active in another sequence.
    OtherActiveCampaign,
    /// Apollo flagged a recent job change.
    RecentJobChange,
    /// Any reason code we do not recognize, kept verbatim.
    Other(String),
}

impl SkipReason {
    pub fn from_code(code: &str) -> Self {
        match code {
            CODE_OTHER_ACTIVE_CAMPAIGN => SkipReason::OtherActiveCampaign,
            CODE_RECENT_JOB_CHANGE => SkipReason::RecentJobChange,
            other => SkipReason::Other(other.to_string()),
        }
    }

    /// The wire reason code.
    pub fn code(&self) -> &str {
        match self {
            SkipReason::OtherActiveCampaign => CODE_OTHER_ACTIVE_CAMPAIGN,
            SkipReason::RecentJobChange => CODE_RECENT_JOB_CHANGE,
            SkipReason::Other(code) => code,
        }
    }

    /// Whether this skip goes on the manual follow-up list.
    pub fn needs_manual_action(&self) -> bool {
        self.remediation().is_some()
    }

    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            SkipReason::OtherActiveCampaign => {
                Some("Remove from current sequence in Apollo, then re-run `outreach enroll`.")
            }
            SkipReason::RecentJobChange => {
                Some("Review contact details in Apollo and manually add if appropriate.")
            }
            SkipReason::Other(_) => None,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SkipReason::OtherActiveCampaign => "Active in another sequence",
            SkipReason::RecentJobChange => "Recent job change",
            SkipReason::Other(code) => code,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Added,
    Skipped(SkipReason),
    Error(String),
}

/// Interpret the raw enrollment result for `contact_id`.
///
/// A skip entry for the contact wins over a non-empty contact list.
pub fn classify(contact_id: &str, raw: &RawEnrollmentResult) -> EnrollmentOutcome {
    let response = match raw {
        Ok(response) => response,
        Err(e) => return EnrollmentOutcome::Error(e.to_string()),
    };

    if let Some(code) = response.skip_reason(contact_id) {
        return EnrollmentOutcome::Skipped(SkipReason::from_code(&code));
    }

    if response.has_contacts() {
        EnrollmentOutcome::Added
    } else {
        EnrollmentOutcome::Error("unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_apollo_client::{ApolloError, EnrollmentResponse};
    use serde_json::json;

    fn response(body: serde_json::Value) -> RawEnrollmentResult {
        Ok(serde_json::from_value::<EnrollmentResponse>(body).unwrap())
    }

    #[test]
    fn test_added() {
        let raw = response(json!({ "contacts": [{ "id": "c_1" }], "skipped_contact_ids": {} }));
        assert_eq!(classify("c_1", &raw), EnrollmentOutcome::Added);
    }

    #[test]
    fn test_skipped_other_campaign() {
        let raw = response(json!({
            "contacts": [],
            "skipped_contact_ids": { "c_1": "contacts_active_in_other_campaigns" }
        }));
        let outcome = classify("c_1", &raw);
        assert_eq!(
            outcome,
            EnrollmentOutcome::Skipped(SkipReason::OtherActiveCampaign)
        );
    }

    #[test]
    fn test_skipped_job_change() {
        let raw = response(json!({
            "skipped_contact_ids": { "c_1": "contacts_with_job_change" }
        }));
        assert_eq!(
            classify("c_1", &raw),
            EnrollmentOutcome::Skipped(SkipReason::RecentJobChange)
        );
    }

    #[test]
    fn test_skip_wins_over_contacts() {
        let raw = response(json!({
            "contacts": [{ "id": "c_1" }],
            "skipped_contact_ids": { "c_1": "contacts_unsubscribed" }
        }));
        let outcome = classify("c_1", &raw);
        assert_eq!(
            outcome,
            EnrollmentOutcome::Skipped(SkipReason::Other("contacts_unsubscribed".into()))
        );
    }

    #[test]
    fn test_skip_for_other_contact_is_ignored() {
        let raw = response(json!({
            "contacts": [{ "id": "c_1" }],
            "skipped_contact_ids": { "c_2": "contacts_with_job_change" }
        }));
        assert_eq!(classify("c_1", &raw), EnrollmentOutcome::Added);
    }

    #[test]
    fn test_empty_response_is_unknown_error() {
        let raw = response(json!({}));
        assert_eq!(
            classify("c_1", &raw),
            EnrollmentOutcome::Error("unknown".into())
        );
    }

    #[test]
    fn test_transport_error_keeps_body() {
        let raw: RawEnrollmentResult = Err(ApolloError::Http {
            status: 422,
            body: "{\"error\":\"mailbox not found\"}".into(),
        });
        match classify("c_1", &raw) {
            EnrollmentOutcome::Error(detail) => {
                assert!(detail.contains("422"));
                assert!(detail.contains("mailbox not found"));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_reason_round_trip_and_remediation() {
        assert_eq!(
            SkipReason::from_code(CODE_OTHER_ACTIVE_CAMPAIGN).code(),
            CODE_OTHER_ACTIVE_CAMPAIGN
        );
        assert!(SkipReason::RecentJobChange.needs_manual_action());
        assert!(!SkipReason::Other("x".into()).needs_manual_action());
        assert_eq!(
            SkipReason::OtherActiveCampaign.remediation(),
            Some("Remove from current sequence in Apollo, then re-run `outreach enroll`.")
        );
    }
}
