//! Sequence name resolution.
//!
//! The CRM report names sequences the way marketing writes them. Webinar
//! follow-ups exist in Apollo as a pair, `"<name> ATTENDED"` and
//! `"<name> NO SHOW"`, while the report usually carries only `"<name>"`.
//! The prospect's last-activity marker picks between the two.

use std::collections::HashMap;

use outreach_apollo_client::{ApolloClient, Campaign};
use tracing::{debug, warn};

pub const ATTENDED_SUFFIX: &str = "ATTENDED";
pub const NO_SHOW_SUFFIX: &str = "NO SHOW";

/// How a sequence id was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Exact,
    Attended,
    NoShow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: String,
    pub name: String,
    pub variant: Variant,
}

/// Run-scoped sequence cache: the full listing, fetched at most once, and
/// every positive resolution keyed by (name, has activity).
#[derive(Debug, Default)]
pub struct SequenceCache {
    listing: Option<Vec<Campaign>>,
    resolved: HashMap<(String, bool), Resolution>,
}

impl SequenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_listing(campaigns: Vec<Campaign>) -> Self {
        Self {
            listing: Some(campaigns),
            resolved: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn listing(&self) -> Option<&[Campaign]> {
        self.listing.as_deref()
    }

    #[cfg(test)]
    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }

    fn listing_or_fetch(&mut self, client: &ApolloClient) -> &[Campaign] {
        self.listing.get_or_insert_with(|| {
            let listing = client.list_all_sequences();
            debug!(
                count = listing.campaigns.len(),
                pages = listing.pages,
                complete = listing.error.is_none(),
                "loaded sequence listing"
            );
            listing.campaigns
        })
    }
}

fn has_activity(activity: Option<&str>) -> bool {
    activity.is_some_and(|a| !a.trim().is_empty())
}

/// Resolve `name` to a sequence, fetching the listing on first use.
///
/// Only successful resolutions are cached; an unresolved name rescans the
/// memoized listing without another remote call.
pub fn resolve(
    cache: &mut SequenceCache,
    client: &ApolloClient,
    name: &str,
    activity: Option<&str>,
) -> Option<Resolution> {
    let key = (name.to_string(), has_activity(activity));
    if let Some(hit) = cache.resolved.get(&key) {
        return Some(hit.clone());
    }

    let found = find_in_listing(cache.listing_or_fetch(client), name, key.1);
    match found {
        Some(resolution) => {
            debug!(name, id = %resolution.id, variant = ?resolution.variant, "resolved sequence");
            cache.resolved.insert(key, resolution.clone());
            Some(resolution)
        }
        None => {
            warn!(sequence = name, "sequence not found in Apollo");
            None
        }
    }
}

/// Pure lookup against a listing.
pub fn find_in_listing(listing: &[Campaign], name: &str, has_activity: bool) -> Option<Resolution> {
    let by_name = |wanted: &str| listing.iter().find(|c| c.name == wanted);

    if let Some(c) = by_name(name) {
        return Some(Resolution {
            id: c.id.clone(),
            name: c.name.clone(),
            variant: Variant::Exact,
        });
    }

    if !name.to_lowercase().contains("webinar") {
        return None;
    }

    let attended = by_name(&format!("{} {}", name, ATTENDED_SUFFIX));
    let no_show = by_name(&format!("{} {}", name, NO_SHOW_SUFFIX));

    let (campaign, variant) = match (attended, no_show) {
        (Some(a), Some(_)) if has_activity => (a, Variant::Attended),
        (Some(_), Some(n)) => (n, Variant::NoShow),
        (Some(a), None) => (a, Variant::Attended),
        (None, Some(n)) => (n, Variant::NoShow),
        (None, None) => return None,
    };

    Some(Resolution {
        id: campaign.id.clone(),
        name: campaign.name.clone(),
        variant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn campaign(id: &str, name: &str) -> Campaign {
        Campaign {
            id: id.into(),
            name: name.into(),
            active: true,
        }
    }

    fn webinar_pair() -> Vec<Campaign> {
        vec![
            campaign("seq_att", "X Webinar ATTENDED"),
            campaign("seq_ns", "X Webinar NO SHOW"),
            campaign("seq_other", "Nurture"),
        ]
    }

    #[test]
    fn test_exact_match() {
        let r = find_in_listing(&webinar_pair(), "Nurture", false).unwrap();
        assert_eq!(r.id, "seq_other");
        assert_eq!(r.variant, Variant::Exact);
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        assert!(find_in_listing(&webinar_pair(), "nurture", false).is_none());
    }

    #[test]
    fn test_webinar_pair_uses_activity() {
        let listing = webinar_pair();
        let attended = find_in_listing(&listing, "X Webinar", true).unwrap();
        assert_eq!(attended.id, "seq_att");
        assert_eq!(attended.variant, Variant::Attended);

        let no_show = find_in_listing(&listing, "X Webinar", false).unwrap();
        assert_eq!(no_show.id, "seq_ns");
        assert_eq!(no_show.variant, Variant::NoShow);
    }

    #[test]
    fn test_single_variant_ignores_activity() {
        let listing = vec![campaign("seq_ns", "X Webinar NO SHOW")];
        assert_eq!(find_in_listing(&listing, "X Webinar", true).unwrap().id, "seq_ns");
        assert_eq!(find_in_listing(&listing, "X Webinar", false).unwrap().id, "seq_ns");

        let listing = vec![campaign("seq_att", "X Webinar ATTENDED")];
        assert_eq!(find_in_listing(&listing, "X Webinar", false).unwrap().id, "seq_att");
    }

    #[test]
    fn test_exact_beats_variants() {
        let mut listing = webinar_pair();
        listing.push(campaign("seq_base", "X Webinar"));
        for activity in [true, false] {
            let r = find_in_listing(&listing, "X Webinar", activity).unwrap();
            assert_eq!(r.id, "seq_base");
            assert_eq!(r.variant, Variant::Exact);
        }
    }

    #[test]
    fn test_webinar_check_ignores_case() {
        let listing = vec![campaign("seq_ns", "Spring WEBINAR NO SHOW")];
        assert_eq!(find_in_listing(&listing, "Spring WEBINAR", true).unwrap().id, "seq_ns");
    }

    #[test]
    fn test_variants_only_for_webinars() {
        let listing = vec![campaign("seq_att", "Demo ATTENDED")];
        assert!(find_in_listing(&listing, "Demo", true).is_none());
    }

    #[test]
    fn test_not_found() {
        assert!(find_in_listing(&webinar_pair(), "Y Webinar", true).is_none());
        assert!(find_in_listing(&[], "anything", false).is_none());
    }

    #[test]
    fn test_resolve_fetches_listing_once() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(POST).path("/emailer_campaigns/search");
            then.status(200).json_body(json!({
                "emailer_campaigns": [
                    { "id": "seq_att", "name": "X Webinar ATTENDED", "active": true },
                    { "id": "seq_ns", "name": "X Webinar NO SHOW", "active": true }
                ]
            }));
        });
        let client = ApolloClient::new("key", "mailbox", server.base_url()).unwrap();
        let mut cache = SequenceCache::new();

        let first = resolve(&mut cache, &client, "X Webinar", Some("2026-03-01")).unwrap();
        let again = resolve(&mut cache, &client, "X Webinar", Some("2026-03-01")).unwrap();
        let other_day = resolve(&mut cache, &client, "X Webinar", Some("yesterday")).unwrap();
        let no_show = resolve(&mut cache, &client, "X Webinar", Some("   ")).unwrap();
        assert!(resolve(&mut cache, &client, "Missing", None).is_none());
        assert!(resolve(&mut cache, &client, "Missing", None).is_none());

        assert_eq!(first, again);
        assert_eq!(first, other_day);
        assert_eq!(first.id, "seq_att");
        assert_eq!(no_show.id, "seq_ns");
        assert_eq!(cache.resolved_len(), 2);
        listing.assert_calls(1);
    }

    #[test]
    fn test_resolve_pages_until_empty_and_caches_listing() {
        let server = MockServer::start();
        let full: Vec<serde_json::Value> = (0..100)
            .map(|i| json!({ "id": format!("seq_{}", i), "name": format!("Sequence {}", i), "active": true }))
            .collect();
        let page1 = server.mock(|when, then| {
            when.method(POST)
                .path("/emailer_campaigns/search")
                .json_body_includes(r#"{"page": 1}"#);
            then.status(200).json_body(json!({ "emailer_campaigns": full }));
        });
        let page2 = server.mock(|when, then| {
            when.method(POST)
                .path("/emailer_campaigns/search")
                .json_body_includes(r#"{"page": 2}"#);
            then.status(200).json_body(json!({ "emailer_campaigns": [] }));
        });
        let client = ApolloClient::new("key", "mailbox", server.base_url()).unwrap();
        let mut cache = SequenceCache::new();

        assert_eq!(resolve(&mut cache, &client, "Sequence 99", None).unwrap().id, "seq_99");
        assert_eq!(resolve(&mut cache, &client, "Sequence 0", None).unwrap().id, "seq_0");

        assert_eq!(cache.listing().map(|l| l.len()), Some(100));
        page1.assert_calls(1);
        page2.assert_calls(1);
    }

    #[test]
    fn test_failed_listing_is_not_refetched() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(POST).path("/emailer_campaigns/search");
            then.status(500).body("boom");
        });
        let client = ApolloClient::new("key", "mailbox", server.base_url()).unwrap();
        let mut cache = SequenceCache::new();

        assert!(resolve(&mut cache, &client, "Nurture", None).is_none());
        assert!(resolve(&mut cache, &client, "Nurture", None).is_none());
        assert_eq!(cache.listing().map(|l| l.len()), Some(0));
        listing.assert_calls(1);
    }

    #[test]
    fn test_seeded_cache_makes_no_calls() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(POST).path("/emailer_campaigns/search");
            then.status(200).json_body(json!({ "emailer_campaigns": [] }));
        });
        let client = ApolloClient::new("key", "mailbox", server.base_url()).unwrap();
        let mut cache = SequenceCache::with_listing(vec![campaign("seq_1", "Nurture")]);

        assert_eq!(resolve(&mut cache, &client, "Nurture", None).unwrap().id, "seq_1");
        listing.assert_calls(0);
    }

    proptest! {
        #[test]
        fn blank_activity_resolves_like_absent(ws in "[ \t\n]{0,5}") {
            let listing = webinar_pair();
            let blank = find_in_listing(&listing, "X Webinar", has_activity(Some(&ws)));
            let absent = find_in_listing(&listing, "X Webinar", has_activity(None));
            prop_assert_eq!(blank, absent);
        }

        #[test]
        fn exact_name_always_resolves(name in "[A-Za-z0-9 ]{1,30}", activity: bool) {
            let listing = vec![campaign("seq_x", &name)];
            let r = find_in_listing(&listing, &name, activity).unwrap();
            prop_assert_eq!(r.variant, Variant::Exact);
            prop_assert_eq!(r.id, "seq_x");
        }
    }
}
