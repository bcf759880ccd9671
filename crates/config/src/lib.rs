// Configuration loading
//
// Three values must be known before any row is processed: the Apollo API
// key, the mailbox (email account) enrollments are sent from, and the API
// base URL. They come from, highest priority first:
//   1. CLI flags
//   2. Environment (APOLLO_API_KEY, APOLLO_EMAIL_ACCOUNT_ID, APOLLO_API_URL)
//   3. System keychain (API key only)
//   4. ~/.config/outreach/config.toml

pub mod keychain;
pub mod settings;

pub use settings::{
    ApiSettings, ConfigError, FileConfig, Overrides, Setting, Settings, ValueSource,
    mask_secret, API_KEY_ENV, API_URL_ENV, DEFAULT_API_URL, EMAIL_ACCOUNT_ENV,
};
