//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts that wrap `outreach` branch on these values.
//!
//! Per-row failures during `outreach enroll` never change the exit code:
//! they are counted in the run report and the process still exits 0. Only
//! conditions that stop a run before (or instead of) processing rows get a
//! non-zero code.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 10-19   | input            | Prospect CSV problems                    |
//! | 20-29   | config           | Credentials / config file / keychain     |
//! | 50-59   | remote           | Apollo API failures (non-enroll commands)|
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use outreach_apollo_client::ApolloError;
use outreach_config::ConfigError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (10-19)
// =============================================================================

/// Prospect CSV cannot be opened or read.
pub const EXIT_INPUT_OPEN: u8 = 10;

/// Prospect CSV header is missing a required column.
pub const EXIT_INPUT_COLUMNS: u8 = 11;

/// Prospect CSV header row is unreadable (not UTF-8, empty file).
pub const EXIT_INPUT_FORMAT: u8 = 12;

// =============================================================================
// Config (20-29)
// =============================================================================

/// A required value is missing, still a template placeholder, or malformed.
pub const EXIT_CONFIG_INVALID: u8 = 20;

/// Config file exists but cannot be read or parsed.
pub const EXIT_CONFIG_FILE: u8 = 21;

/// Keychain error (cannot read/write credentials).
pub const EXIT_CONFIG_KEYCHAIN: u8 = 22;

// =============================================================================
// Remote (50-59)
// =============================================================================

/// Auth rejected by Apollo (401/403).
pub const EXIT_REMOTE_AUTH: u8 = 51;

/// Apollo returned an error status, an unreadable body, or was unreachable.
pub const EXIT_REMOTE_UPSTREAM: u8 = 54;

/// Map a ConfigError to its exit code.
pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Io { .. } | ConfigError::Parse { .. } => EXIT_CONFIG_FILE,
        ConfigError::Missing { .. }
        | ConfigError::Placeholder { .. }
        | ConfigError::InvalidUrl(_) => EXIT_CONFIG_INVALID,
    }
}

/// Map an ApolloError to its exit code.
pub fn remote_exit_code(err: &ApolloError) -> u8 {
    if err.is_auth() {
        EXIT_REMOTE_AUTH
    } else {
        EXIT_REMOTE_UPSTREAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_exit_codes() {
        let parse = ConfigError::Parse {
            path: PathBuf::from("config.toml"),
            message: "expected value".into(),
        };
        assert_eq!(config_exit_code(&parse), EXIT_CONFIG_FILE);
        assert_eq!(
            config_exit_code(&ConfigError::InvalidUrl("x".into())),
            EXIT_CONFIG_INVALID
        );
    }

    #[test]
    fn test_remote_exit_codes() {
        let auth = ApolloError::Http {
            status: 403,
            body: String::new(),
        };
        assert_eq!(remote_exit_code(&auth), EXIT_REMOTE_AUTH);
        let down = ApolloError::Network("connection refused".into());
        assert_eq!(remote_exit_code(&down), EXIT_REMOTE_UPSTREAM);
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_INPUT_OPEN,
            EXIT_INPUT_COLUMNS,
            EXIT_INPUT_FORMAT,
            EXIT_CONFIG_INVALID,
            EXIT_CONFIG_FILE,
            EXIT_CONFIG_KEYCHAIN,
            EXIT_REMOTE_AUTH,
            EXIT_REMOTE_UPSTREAM,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
