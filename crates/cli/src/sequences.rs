// `outreach sequences`: list Apollo sequences, and help find the name a
// CRM report should use for one.

use std::io::{self, Write};
use std::path::PathBuf;

use outreach_apollo_client::{ApolloClient, Campaign};
use outreach_config::{Overrides, Settings};

use crate::CliError;

/// Words this short are too common to suggest candidates.
const MIN_KEYWORD_LEN: usize = 4;

/// Most close matches offered for one name.
const MAX_CLOSE_MATCHES: usize = 5;

/// Minimum normalized similarity (0.0..=1.0) for a close match.
const CLOSE_MATCH_CUTOFF: f64 = 0.6;

#[derive(Debug, PartialEq, Eq)]
pub enum FindResult<'a> {
    Exact(&'a Campaign),
    /// Near-miss spellings, best first.
    Close(Vec<&'a Campaign>),
    Candidates(Vec<&'a Campaign>),
    NoCandidates,
}

/// Exact name, else the closest spellings, else every sequence containing
/// one of the name's longer words.
pub fn find_sequence<'a>(listing: &'a [Campaign], name: &str) -> FindResult<'a> {
    if let Some(c) = listing.iter().find(|c| c.name == name) {
        return FindResult::Exact(c);
    }

    let close = close_matches(listing, name);
    if !close.is_empty() {
        return FindResult::Close(close);
    }

    let keywords: Vec<String> = name
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect();

    let candidates: Vec<&Campaign> = listing
        .iter()
        .filter(|c| {
            let lower = c.name.to_lowercase();
            keywords.iter().any(|k| lower.contains(k.as_str()))
        })
        .collect();

    if candidates.is_empty() {
        FindResult::NoCandidates
    } else {
        FindResult::Candidates(candidates)
    }
}

/// Up to [`MAX_CLOSE_MATCHES`] names within edit distance of `name`,
/// compared case-insensitively. Ties keep listing order.
fn close_matches<'a>(listing: &'a [Campaign], name: &str) -> Vec<&'a Campaign> {
    let wanted = name.to_lowercase();
    let mut scored: Vec<(f64, &Campaign)> = listing
        .iter()
        .map(|c| (strsim::normalized_levenshtein(&wanted, &c.name.to_lowercase()), c))
        .filter(|(score, _)| *score >= CLOSE_MATCH_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(MAX_CLOSE_MATCHES)
        .map(|(_, c)| c)
        .collect()
}

/// Sort by name and apply `--filter` / `--active-only`.
pub fn select<'a>(listing: &'a [Campaign], filter: Option<&str>, active_only: bool) -> Vec<&'a Campaign> {
    let needle = filter.map(str::to_lowercase);
    let mut out: Vec<&Campaign> = listing
        .iter()
        .filter(|c| !active_only || c.active)
        .filter(|c| match &needle {
            Some(n) => c.name.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    out
}

fn write_line<W: Write>(out: &mut W, c: &Campaign) -> io::Result<()> {
    let marker = if c.active { "*" } else { " " };
    writeln!(out, "{} {}  ({})", marker, c.name, c.id)
}

pub fn cmd_sequences(
    config: Option<PathBuf>,
    overrides: Overrides,
    filter: Option<String>,
    active_only: bool,
    find: Vec<String>,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = Settings::load(config.as_deref(), &overrides).map_err(CliError::config)?;
    let api = settings.validate().map_err(CliError::config)?;

    let client = ApolloClient::with_timeout(
        &api.api_key,
        &api.email_account_id,
        &api.api_url,
        api.timeout,
    )
    .map_err(CliError::remote)?;

    let show_progress = !quiet && atty::is(atty::Stream::Stderr);
    if show_progress {
        eprintln!("Fetching sequences from {}...", client.api_base());
    }

    let listing = client.list_all_sequences();
    if let Some(e) = listing.error {
        return Err(CliError::remote(e));
    }
    let campaigns = listing.campaigns;

    if show_progress {
        eprintln!("{} sequences in {} page(s)", campaigns.len(), listing.pages);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let io_err = |e: io::Error| CliError::io(e.to_string());

    if find.is_empty() {
        for c in select(&campaigns, filter.as_deref(), active_only) {
            write_line(&mut out, c).map_err(io_err)?;
        }
        return Ok(());
    }

    for (i, name) in find.iter().enumerate() {
        if i > 0 {
            writeln!(out).map_err(io_err)?;
        }
        match find_sequence(&campaigns, name) {
            FindResult::Exact(c) => {
                writeln!(out, "{:?}: exact match", name).map_err(io_err)?;
                write_line(&mut out, c).map_err(io_err)?;
            }
            FindResult::Close(found) => {
                writeln!(out, "{:?}: not found, {} close match(es)", name, found.len())
                    .map_err(io_err)?;
                for c in found {
                    write_line(&mut out, c).map_err(io_err)?;
                }
            }
            FindResult::Candidates(found) => {
                writeln!(out, "{:?}: not found, {} candidate(s)", name, found.len())
                    .map_err(io_err)?;
                for c in found {
                    write_line(&mut out, c).map_err(io_err)?;
                }
            }
            FindResult::NoCandidates => {
                writeln!(out, "{:?}: not found, no candidates", name).map_err(io_err)?;
            }
        }
    }

    Ok(())
}
