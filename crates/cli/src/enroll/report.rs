// End-of-run report: summary counts, manual follow-ups grouped by reason,
// then every row counted as an error.

use std::io::{self, Write};

use super::classify::SkipReason;
use super::runner::{ManualAction, RunReport};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Manual-action groups, in print order.
const MANUAL_GROUPS: [SkipReason; 2] = [SkipReason::OtherActiveCampaign, SkipReason::RecentJobChange];

pub fn write_report<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    let s = &report.stats;

    writeln!(out, "{}", RULE)?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{:<30}{}", "Total prospects:", s.total)?;
    writeln!(out, "{:<30}{}", "Added to sequence:", s.added)?;
    if s.lookup_failures > 0 {
        writeln!(
            out,
            "{:<30}{} ({} lookup failures)",
            "Not found in Apollo:", s.not_found, s.lookup_failures
        )?;
    } else {
        writeln!(out, "{:<30}{}", "Not found in Apollo:", s.not_found)?;
    }
    writeln!(out, "{:<30}{}", "No sequence recommended:", s.no_sequence)?;
    writeln!(out, "{:<30}{}", "Skipped (other sequence):", s.skipped_in_other_sequence)?;
    writeln!(out, "{:<30}{}", "Skipped (job change):", s.skipped_job_change)?;
    writeln!(out, "{:<30}{}", "Errors:", s.errors)?;

    if !report.manual.is_empty() {
        writeln!(out)?;
        writeln!(out, "MANUAL ACTION REQUIRED ({})", report.manual.len())?;
        writeln!(out, "{}", THIN_RULE)?;

        for reason in &MANUAL_GROUPS {
            let group: Vec<&ManualAction> =
                report.manual.iter().filter(|m| &m.reason == reason).collect();
            if group.is_empty() {
                continue;
            }

            writeln!(out, "{} ({})", reason.title(), group.len())?;
            if let Some(fix) = reason.remediation() {
                writeln!(out, "  Action: {}", fix)?;
            }
            for m in group {
                writeln!(
                    out,
                    "  - {} <{}>  sequence: {}  contact: {}  reason: {}",
                    m.name, m.email, m.target_sequence, m.contact_id, m.reason
                )?;
            }
            writeln!(out)?;
        }
    }

    if !report.errors.is_empty() {
        if report.manual.is_empty() {
            writeln!(out)?;
        }
        writeln!(out, "ERRORS ({})", report.errors.len())?;
        writeln!(out, "{}", THIN_RULE)?;
        for e in &report.errors {
            let who = if e.name.is_empty() { "(no name)" } else { e.name.as_str() };
            if e.email.is_empty() {
                writeln!(out, "  row {}: {}: {}", e.row, who, e.detail)?;
            } else {
                writeln!(out, "  row {}: {} <{}>: {}", e.row, who, e.email, e.detail)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enroll::runner::{ErrorRecord, RunStats};

    fn render(report: &RunReport) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn manual(name: &str, reason: SkipReason) -> ManualAction {
        ManualAction {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            target_sequence: "Nurture".into(),
            contact_id: format!("c_{}", name.to_lowercase()),
            reason,
        }
    }

    #[test]
    fn test_summary_only() {
        let report = RunReport {
            stats: RunStats {
                total: 4,
                added: 3,
                no_sequence: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let text = render(&report);
        assert!(text.contains("SUMMARY"));
        assert!(text.contains(&format!("{:<30}4\n", "Total prospects:")));
        assert!(text.contains(&format!("{:<30}3\n", "Added to sequence:")));
        assert!(!text.contains("MANUAL ACTION"));
        assert!(!text.contains("ERRORS"));
        assert!(!text.contains("lookup failures"));
    }

    #[test]
    fn test_manual_list_grouped_with_remediation() {
        let report = RunReport {
            stats: RunStats {
                total: 3,
                skipped_in_other_sequence: 2,
                skipped_job_change: 1,
                ..Default::default()
            },
            manual: vec![
                manual("Grace", SkipReason::RecentJobChange),
                manual("Ada", SkipReason::OtherActiveCampaign),
                manual("Alan", SkipReason::OtherActiveCampaign),
            ],
            errors: vec![],
        };
        let text = render(&report);

        let other = text.find("Active in another sequence (2)").unwrap();
        let job = text.find("Recent job change (1)").unwrap();
        assert!(other < job);
        assert!(text.contains("Remove from current sequence in Apollo, then re-run `outreach enroll`."));
        assert!(text.contains("Review contact details in Apollo and manually add if appropriate."));
        assert!(text.contains("reason: contacts_active_in_other_campaigns"));

        let ada = text.find("Ada <ada@example.com>").unwrap();
        assert!(other < ada && ada < job);
    }

    #[test]
    fn test_error_list() {
        let report = RunReport {
            stats: RunStats {
                total: 2,
                not_found: 1,
                lookup_failures: 1,
                errors: 1,
                ..Default::default()
            },
            manual: vec![],
            errors: vec![ErrorRecord {
                row: 2,
                name: String::new(),
                email: String::new(),
                detail: "unreadable row: line 3: found record with 2 fields".into(),
            }],
        };
        let text = render(&report);
        assert!(text.contains("(1 lookup failures)"));
        assert!(text.contains("ERRORS (1)"));
        assert!(text.contains("  row 2: (no name): unreadable row"));
    }
}
