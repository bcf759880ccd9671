//! Row-by-row enrollment.
//!
//! Each prospect goes through the same steps in order: name check,
//! sequence check, contact lookup, sequence resolution, enrollment. The
//! first step that fails decides the row's outcome. Nothing a single row
//! does can stop the run.

use std::io::Read;

use outreach_apollo_client::{ApolloClient, ContactMatch};
use tracing::{debug, warn};

use super::classify::{classify, EnrollmentOutcome, SkipReason};
use super::pacing::Pacer;
use super::prospect::{Prospect, ProspectReader};
use super::resolver::{self, SequenceCache};

/// What happened to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The row could not be decoded.
    Unreadable(String),
    MissingName,
    NoSequence,
    ContactNotFound,
    /// The contact lookup itself failed; counted as not found.
    LookupFailed(String),
    SequenceNotFound,
    Added { contact_id: String },
    Skipped { contact_id: String, reason: SkipReason },
    EnrollFailed { contact_id: String, detail: String },
}

impl RowOutcome {
    pub fn label(&self) -> String {
        match self {
            RowOutcome::Unreadable(detail) => format!("unreadable row ({})", detail),
            RowOutcome::MissingName => "missing first or last name".to_string(),
            RowOutcome::NoSequence => "no sequence recommended".to_string(),
            RowOutcome::ContactNotFound => "contact not found".to_string(),
            RowOutcome::LookupFailed(detail) => format!("contact lookup failed ({})", detail),
            RowOutcome::SequenceNotFound => "sequence not found".to_string(),
            RowOutcome::Added { .. } => "added".to_string(),
            RowOutcome::Skipped { reason, .. } => format!("skipped: {}", reason),
            RowOutcome::EnrollFailed { detail, .. } => format!("error: {}", detail),
        }
    }

    /// Text for the error list, for outcomes counted under `errors`.
    fn error_detail(&self) -> Option<String> {
        match self {
            RowOutcome::Unreadable(detail) => Some(format!("unreadable row: {}", detail)),
            RowOutcome::MissingName => Some("missing first or last name".to_string()),
            RowOutcome::SequenceNotFound => Some("sequence not found".to_string()),
            RowOutcome::Skipped {
                reason: SkipReason::Other(code),
                ..
            } => Some(format!("skipped: {}", code)),
            RowOutcome::EnrollFailed { detail, .. } => Some(detail.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub added: usize,
    pub not_found: usize,
    /// Subset of `not_found` where the lookup call failed.
    pub lookup_failures: usize,
    pub no_sequence: usize,
    pub skipped_in_other_sequence: usize,
    pub skipped_job_change: usize,
    pub errors: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &RowOutcome) {
        self.total += 1;
        match outcome {
            RowOutcome::Unreadable(_)
            | RowOutcome::MissingName
            | RowOutcome::SequenceNotFound
            | RowOutcome::EnrollFailed { .. } => self.errors += 1,
            RowOutcome::NoSequence => self.no_sequence += 1,
            RowOutcome::ContactNotFound => self.not_found += 1,
            RowOutcome::LookupFailed(_) => {
                self.not_found += 1;
                self.lookup_failures += 1;
            }
            RowOutcome::Added { .. } => self.added += 1,
            RowOutcome::Skipped { reason, .. } => match reason {
                SkipReason::OtherActiveCampaign => self.skipped_in_other_sequence += 1,
                SkipReason::RecentJobChange => self.skipped_job_change += 1,
                SkipReason::Other(_) => self.errors += 1,
            },
        }
    }
}

/// A prospect Apollo refused for a business reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualAction {
    pub name: String,
    pub email: String,
    pub target_sequence: String,
    pub contact_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// 1-based data row (the header is not counted).
    pub row: usize,
    pub name: String,
    pub email: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stats: RunStats,
    pub manual: Vec<ManualAction>,
    pub errors: Vec<ErrorRecord>,
}

impl RunReport {
    fn record(&mut self, row: usize, prospect: Option<&Prospect>, outcome: &RowOutcome) {
        self.stats.record(outcome);

        let (name, email) = prospect
            .map(|p| (p.full_name(), p.email.clone()))
            .unwrap_or_default();

        if let RowOutcome::Skipped { contact_id, reason } = outcome {
            if reason.needs_manual_action() {
                self.manual.push(ManualAction {
                    name: name.clone(),
                    email: email.clone(),
                    target_sequence: prospect.map(|p| p.sequence.clone()).unwrap_or_default(),
                    contact_id: contact_id.clone(),
                    reason: reason.clone(),
                });
            }
        }

        if let Some(detail) = outcome.error_detail() {
            self.errors.push(ErrorRecord {
                row,
                name,
                email,
                detail,
            });
        }
    }
}

pub struct BatchRunner<'a, P: Pacer> {
    client: &'a ApolloClient,
    pacer: P,
    show_progress: bool,
}

impl<'a, P: Pacer> BatchRunner<'a, P> {
    pub fn new(client: &'a ApolloClient, pacer: P) -> Self {
        Self {
            client,
            pacer,
            show_progress: false,
        }
    }

    /// Print one progress line per row to stderr.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    #[cfg(test)]
    pub fn into_pacer(self) -> P {
        self.pacer
    }

    /// Process every row of `reader`, pausing after each one.
    pub fn run<R: Read>(
        &mut self,
        reader: &mut ProspectReader<R>,
        cache: &mut SequenceCache,
    ) -> RunReport {
        let mut report = RunReport::default();

        for (idx, row) in reader.rows().enumerate() {
            let row_no = idx + 1;
            let (prospect, outcome) = match row {
                Ok(prospect) => {
                    let outcome = self.process(&prospect, cache);
                    (Some(prospect), outcome)
                }
                Err(detail) => {
                    warn!(row = row_no, error = %detail, "skipping unreadable CSV row");
                    (None, RowOutcome::Unreadable(detail))
                }
            };

            if self.show_progress {
                let who = prospect
                    .as_ref()
                    .map(|p| p.full_name())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "(no name)".to_string());
                eprintln!("[{}] {}: {}", row_no, who, outcome.label());
            }

            report.record(row_no, prospect.as_ref(), &outcome);
            self.pacer.pause();
        }

        report
    }

    /// Decide one row. Exactly one outcome per row.
    pub fn process(&self, prospect: &Prospect, cache: &mut SequenceCache) -> RowOutcome {
        if !prospect.has_name() {
            return RowOutcome::MissingName;
        }
        if prospect.sequence.is_empty() {
            return RowOutcome::NoSequence;
        }

        let contact = self.client.find_or_create_contact(
            &prospect.first_name,
            &prospect.last_name,
            &prospect.email,
        );
        let contact_id = match contact {
            Ok(ContactMatch::Existing(id)) => id,
            Ok(ContactMatch::Created(id)) => {
                debug!(email = %prospect.email, contact_id = %id, "created contact");
                id
            }
            Ok(ContactMatch::NotFound) => return RowOutcome::ContactNotFound,
            Err(e) => {
                warn!(email = %prospect.email, error = %e, "contact lookup failed");
                return RowOutcome::LookupFailed(e.to_string());
            }
        };

        let sequence = match resolver::resolve(
            cache,
            self.client,
            &prospect.sequence,
            prospect.last_activity.as_deref(),
        ) {
            Some(resolution) => resolution,
            None => return RowOutcome::SequenceNotFound,
        };

        let raw = self.client.enroll_contact(&contact_id, &sequence.id);
        if let Err(e) = &raw {
            warn!(contact_id = %contact_id, sequence = %sequence.name, error = %e, "enrollment failed");
        }

        match classify(&contact_id, &raw) {
            EnrollmentOutcome::Added => RowOutcome::Added { contact_id },
            EnrollmentOutcome::Skipped(reason) => RowOutcome::Skipped { contact_id, reason },
            EnrollmentOutcome::Error(detail) => RowOutcome::EnrollFailed { contact_id, detail },
        }
    }
}
