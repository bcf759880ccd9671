//! `outreach enroll`: enroll every prospect in a CSV into its recommended
//! Apollo sequence.

pub mod classify;
pub mod pacing;
pub mod prospect;
pub mod report;
pub mod resolver;
pub mod runner;

use std::io::{self, Write};
use std::path::PathBuf;

use outreach_apollo_client::ApolloClient;
use outreach_config::{Overrides, Settings};
use tracing::info;

use crate::CliError;
use pacing::FixedDelay;
use prospect::ProspectReader;
use resolver::SequenceCache;
use runner::BatchRunner;

pub fn cmd_enroll(
    csv_path: PathBuf,
    config: Option<PathBuf>,
    overrides: Overrides,
    quiet: bool,
) -> Result<(), CliError> {
    // 1. Configuration problems stop the run before any row is read
    let settings = Settings::load(config.as_deref(), &overrides).map_err(CliError::config)?;
    let api = settings.validate().map_err(CliError::config)?;

    // 2. Open and header-check the CSV
    let mut reader = ProspectReader::open(&csv_path)?;

    let client = ApolloClient::with_timeout(
        &api.api_key,
        &api.email_account_id,
        &api.api_url,
        api.timeout,
    )
    .map_err(CliError::remote)?;

    let stderr_tty = atty::is(atty::Stream::Stderr);
    let show_progress = !quiet && stderr_tty;

    if show_progress {
        eprintln!("Enrolling prospects from {}...", csv_path.display());
    }
    info!(
        csv = %csv_path.display(),
        api = %client.api_base(),
        delay_ms = api.delay.as_millis() as u64,
        "starting enrollment run"
    );

    // 3. Process every row
    let mut cache = SequenceCache::new();
    let mut runner = BatchRunner::new(&client, FixedDelay(api.delay)).with_progress(show_progress);
    let run = runner.run(&mut reader, &mut cache);

    info!(
        total = run.stats.total,
        added = run.stats.added,
        errors = run.stats.errors,
        "enrollment run finished"
    );

    // 4. Report
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    report::write_report(&mut handle, &run).map_err(|e| CliError::io(e.to_string()))?;
    handle.flush().map_err(|e| CliError::io(e.to_string()))?;

    Ok(())
}
