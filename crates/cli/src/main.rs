// outreach CLI - enroll CRM prospects into Apollo sequences

mod doctor;
mod enroll;
mod exit_codes;
mod sequences;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use outreach_apollo_client::ApolloError;
use outreach_config::{ConfigError, Overrides};
use tracing_subscriber::EnvFilter;

use exit_codes::{
    config_exit_code, remote_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "outreach")]
#[command(about = "Enroll prospects from a CRM export into Apollo outreach sequences")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Connection settings shared by the commands that call Apollo.
#[derive(Args)]
struct ApiArgs {
    /// Config file (default: <config dir>/outreach/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Apollo API key (overrides APOLLO_API_KEY, keychain and config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Email account id to send from (overrides APOLLO_EMAIL_ACCOUNT_ID)
    #[arg(long)]
    email_account_id: Option<String>,

    /// Apollo API base URL (overrides APOLLO_API_URL)
    #[arg(long)]
    api_url: Option<String>,
}

impl ApiArgs {
    fn overrides(&self, delay_ms: Option<u64>) -> Overrides {
        Overrides {
            api_key: self.api_key.clone(),
            email_account_id: self.email_account_id.clone(),
            api_url: self.api_url.clone(),
            delay_ms,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll every prospect in a CSV into its recommended sequence
    #[command(after_help = "\
The CSV needs the columns First Name, Last Name, Email and
Recommended Outreach Sequence. Last Activity is optional; when present it
picks the ATTENDED variant of a webinar sequence over NO SHOW.

Examples:
  outreach enroll prospects.csv
  outreach enroll prospects.csv --delay-ms 1000
  APOLLO_API_KEY=... outreach enroll prospects.csv -q")]
    Enroll {
        /// Prospect CSV exported from the CRM
        csv: PathBuf,

        #[command(flatten)]
        api: ApiArgs,

        /// Pause after every row, in milliseconds (default 500)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Suppress per-row progress
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// List Apollo sequences, or look up names a CSV refers to
    #[command(after_help = "\
Examples:
  outreach sequences --active-only
  outreach sequences --filter webinar
  outreach sequences --find \"[MKTG] Q1 Webinar\" --find \"Nurture\"")]
    Sequences {
        #[command(flatten)]
        api: ApiArgs,

        /// Only names containing TEXT (case-insensitive)
        #[arg(long, value_name = "TEXT")]
        filter: Option<String>,

        /// Only active sequences
        #[arg(long)]
        active_only: bool,

        /// Report the exact match or candidates for NAME (repeatable)
        #[arg(long, value_name = "NAME")]
        find: Vec<String>,

        /// Suppress progress
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Show where each setting comes from and whether it is usable
    Doctor {
        /// Config file to inspect
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a config template first (never overwrites)
        #[arg(long)]
        init: bool,
    },

    /// Manage the Apollo API key in the system keychain
    #[command(subcommand)]
    Key(KeyCommands),
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Store the API key
    Set {
        /// Apollo API key
        key: String,
    },
    /// Remove the stored API key
    Delete,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Enroll {
            csv,
            api,
            delay_ms,
            quiet,
        } => {
            let overrides = api.overrides(delay_ms);
            enroll::cmd_enroll(csv, api.config, overrides, quiet)
        }
        Commands::Sequences {
            api,
            filter,
            active_only,
            find,
            quiet,
        } => {
            let overrides = api.overrides(None);
            sequences::cmd_sequences(api.config, overrides, filter, active_only, find, quiet)
        }
        Commands::Doctor { config, init } => doctor::cmd_doctor(config, init),
        Commands::Key(key_cmd) => match key_cmd {
            KeyCommands::Set { key } => doctor::cmd_key_set(key),
            KeyCommands::Delete => doctor::cmd_key_delete(),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from a config error with proper exit code.
    pub fn config(err: ConfigError) -> Self {
        let code = config_exit_code(&err);
        let hint = match &err {
            ConfigError::Missing { .. } | ConfigError::Placeholder { .. } => {
                Some("run `outreach doctor` to see where each value comes from".to_string())
            }
            ConfigError::Parse { .. } => {
                Some("run `outreach doctor --init` against a new path for a template".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Create error from an Apollo API error with proper exit code.
    pub fn remote(err: ApolloError) -> Self {
        let code = remote_exit_code(&err);
        let hint = if err.is_auth() {
            Some("check the Apollo API key (outreach doctor)".to_string())
        } else {
            None
        };
        Self { code, message: err.to_string(), hint }
    }
}
