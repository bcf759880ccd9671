//! Wire types for the Apollo endpoints this crate calls.
//!
//! Only the fields the enrollment run reads are modeled. Everything is
//! lenient: Apollo returns `null` for absent objects as often as it omits
//! them, so optional fields default instead of failing the decode.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// `#[serde(default)]` covers a missing key; this also maps an explicit
/// `null` to the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A person profile from `/people/match`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub organization: Option<Organization>,
    /// Set when the person is already a contact in the account.
    #[serde(default)]
    pub contact: Option<LinkedContact>,
}

impl Person {
    /// Id of the linked contact, if the person already is one.
    pub fn contact_id(&self) -> Option<&str> {
        self.contact
            .as_ref()
            .and_then(|c| c.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn organization_name(&self) -> &str {
        self.organization
            .as_ref()
            .and_then(|o| o.name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkedContact {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MatchResponse {
    #[serde(default)]
    pub person: Option<Person>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CreateContactResponse {
    #[serde(default)]
    pub contact: Option<LinkedContact>,
}

/// One sequence ("emailer campaign") from the listing endpoint.
///
/// An entry with an empty `id` cannot be enrolled into; the listing drops it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Campaign {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CampaignPage {
    #[serde(default)]
    pub emailer_campaigns: Option<Vec<Campaign>>,
}

/// Decoded body of `add_contact_ids`. Interpretation is left to the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentResponse {
    /// Contacts now in the sequence.
    #[serde(default)]
    pub contacts: Option<Vec<serde_json::Value>>,
    /// Contact id → reason code, for every contact Apollo refused.
    #[serde(default)]
    pub skipped_contact_ids: Option<HashMap<String, serde_json::Value>>,
}

impl EnrollmentResponse {
    /// Skip reason Apollo gave for `contact_id`, if it was skipped.
    pub fn skip_reason(&self, contact_id: &str) -> Option<String> {
        let reason = self.skipped_contact_ids.as_ref()?.get(contact_id)?;
        Some(match reason {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn has_contacts(&self) -> bool {
        self.contacts.as_ref().is_some_and(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_with_linked_contact() {
        let person: Person = serde_json::from_value(serde_json::json!({
            "id": "p_1",
            "title": "VP Data",
            "organization": { "name": "Acme" },
            "contact": { "id": "c_1" }
        }))
        .unwrap();
        assert_eq!(person.contact_id(), Some("c_1"));
        assert_eq!(person.organization_name(), "Acme");
    }

    #[test]
    fn test_person_nulls_default() {
        let person: Person = serde_json::from_value(serde_json::json!({
            "id": "p_1",
            "title": null,
            "organization": null,
            "contact": null
        }))
        .unwrap();
        assert_eq!(person.contact_id(), None);
        assert_eq!(person.organization_name(), "");
    }

    #[test]
    fn test_empty_contact_id_is_not_a_contact() {
        let person: Person = serde_json::from_value(serde_json::json!({
            "id": "p_1",
            "contact": { "id": "" }
        }))
        .unwrap();
        assert_eq!(person.contact_id(), None);
    }

    #[test]
    fn test_enrollment_skip_reason() {
        let resp: EnrollmentResponse = serde_json::from_value(serde_json::json!({
            "contacts": [],
            "skipped_contact_ids": { "c_1": "contacts_with_job_change" }
        }))
        .unwrap();
        assert_eq!(
            resp.skip_reason("c_1").as_deref(),
            Some("contacts_with_job_change")
        );
        assert_eq!(resp.skip_reason("c_2"), None);
        assert!(!resp.has_contacts());
    }

    #[test]
    fn test_enrollment_null_fields() {
        let resp: EnrollmentResponse = serde_json::from_value(serde_json::json!({
            "contacts": null,
            "skipped_contact_ids": null
        }))
        .unwrap();
        assert_eq!(resp.skip_reason("c_1"), None);
        assert!(!resp.has_contacts());
    }

    #[test]
    fn test_campaign_defaults() {
        let c: Campaign = serde_json::from_value(serde_json::json!({ "id": "s_1" })).unwrap();
        assert_eq!(c.name, "");
        assert!(!c.active);
    }

    #[test]
    fn test_campaign_null_fields_default() {
        let c: Campaign = serde_json::from_value(serde_json::json!({
            "id": "s_2",
            "name": null,
            "active": null
        }))
        .unwrap();
        assert_eq!(c.id, "s_2");
        assert_eq!(c.name, "");
        assert!(!c.active);

        let c: Campaign = serde_json::from_value(serde_json::json!({ "id": null })).unwrap();
        assert_eq!(c.id, "");
    }

    #[test]
    fn test_campaign_page_with_nulls_decodes() {
        let page: CampaignPage = serde_json::from_value(serde_json::json!({
            "emailer_campaigns": [
                { "id": "s1", "name": "Nurture", "active": true },
                { "id": "s2", "name": "Draft", "active": null },
                { "id": "s3", "name": null, "active": false }
            ]
        }))
        .unwrap();
        assert_eq!(page.emailer_campaigns.map(|c| c.len()), Some(3));
    }
}
